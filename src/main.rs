//! # Company Sleuth CLI
//!
//! Command-line interface for the Company Sleuth library (`company_sleuth_core`).
//! This binary parses arguments, sets up configuration, opens the browser
//! session, validates one company name or a file of names, and handles output.

use company_sleuth_core::{
    initialize_validator, validate_companies, CompanyValidator, Config, ConfigBuilder,
    ValidationResult, ValidationStatus,
};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Validates that company names refer to real organizations.",
    long_about = "Company Sleuth probes likely company domains and searches LinkedIn and Wikipedia through a headless browser, then scores the evidence into a 0-100 confidence."
)]
struct AppArgs {
    /// Path to the input JSON file containing an array of company names (file mode).
    #[arg(short, long, default_value = "companies.json", env = "COMPANY_SLEUTH_INPUT")]
    input: String,

    /// Path to the output JSON file where results will be saved.
    #[arg(
        short,
        long,
        default_value = "results.json",
        env = "COMPANY_SLEUTH_OUTPUT"
    )]
    output: String,

    /// Company name to validate (enables single company CLI mode).
    #[arg(long, env = "COMPANY_SLEUTH_COMPANY")]
    company: Option<String>,

    /// Print the single-company result as JSON instead of a summary.
    #[arg(long, default_value = "false", env = "COMPANY_SLEUTH_JSON")]
    json: bool,

    /// Path to a configuration file (TOML format) to load settings from. CLI args override file settings.
    #[arg(long, env = "COMPANY_SLEUTH_CONFIG")]
    config_file: Option<String>,

    /// URL of a running WebDriver instance.
    #[arg(long, env = "COMPANY_SLEUTH_WEBDRIVER_URL")]
    webdriver_url: Option<String>,

    /// Path to a chromedriver executable to launch instead of connecting to --webdriver-url.
    #[arg(long, env = "COMPANY_SLEUTH_CHROMEDRIVER_PATH")]
    chromedriver_path: Option<String>,

    /// Maximum number of companies validated concurrently.
    #[arg(short, long, env = "COMPANY_SLEUTH_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Search engine web UI used for LinkedIn and Wikipedia lookups.
    #[arg(long, env = "COMPANY_SLEUTH_SEARCH_ENGINE_URL")]
    search_engine_url: Option<String>,

    /// Overall deadline in seconds for the concurrent search lookups.
    #[arg(long, env = "COMPANY_SLEUTH_FANOUT_TIMEOUT")]
    fanout_timeout: Option<u64>,

    /// Search for an official website when no company domain could be confirmed.
    #[arg(long, action = clap::ArgAction::SetTrue, env = "COMPANY_SLEUTH_ENABLE_OFFICIAL_SITE_FALLBACK")]
    enable_official_site_fallback: Option<bool>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_thread_names(true)
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Setting up tracing subscriber failed")?;

    tracing::info!(
        "Company Sleuth CLI v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let args = AppArgs::parse();
    tracing::debug!("Parsed CLI arguments: {:?}", args);

    let mut config_builder = ConfigBuilder::new();

    if let Some(ref path) = args.config_file {
        config_builder = config_builder.config_file(path);
    }
    if let Some(ref url) = args.webdriver_url {
        config_builder = config_builder.webdriver_url(url);
    }
    if let Some(ref path) = args.chromedriver_path {
        config_builder = config_builder.chromedriver_path(Some(path));
    }
    if let Some(c) = args.concurrency {
        config_builder = config_builder.max_concurrency(c);
    }
    if let Some(ref url) = args.search_engine_url {
        config_builder = config_builder.search_engine_url(url);
    }
    if let Some(t) = args.fanout_timeout {
        config_builder = config_builder.fanout_timeout(Duration::from_secs(t));
    }
    if args.enable_official_site_fallback == Some(true) {
        config_builder = config_builder.enable_official_site_fallback(true);
    }

    let config = match config_builder.build() {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            return Err(anyhow::anyhow!("Failed to build configuration: {}", e));
        }
    };
    tracing::debug!("Effective configuration loaded: {:?}", *config);

    let validator = match initialize_validator(&config).await {
        Ok(v) => Arc::new(v),
        Err(e) => {
            tracing::error!("Initialization error: {}", e);
            return Err(anyhow::anyhow!(
                "Failed to initialize CompanyValidator: {}",
                e
            ));
        }
    };

    let start_time = Instant::now();
    let execution_result = match args.company {
        Some(ref company) => process_cli_mode(&validator, company, args.json).await,
        None => process_file_mode(config.clone(), validator.clone(), &args, start_time).await,
    };

    if let Err(e) = validator.shutdown().await {
        tracing::warn!("Browser session did not shut down cleanly: {}", e);
    }

    if let Err(e) = execution_result {
        tracing::error!("Execution failed: {}", e);
        return Err(e);
    }

    tracing::info!(
        "Finished successfully. Total duration: {:.2?}",
        start_time.elapsed()
    );
    Ok(())
}

async fn process_cli_mode(validator: &CompanyValidator, company: &str, json: bool) -> Result<()> {
    tracing::info!("Running in Single Company CLI mode for '{}'.", company);
    let result = validator.validate_company(company).await;

    if json {
        let rendered = serde_json::to_string_pretty(&result)
            .context("Failed to serialize result to JSON")?;
        println!("{}", rendered);
    } else {
        print_cli_results(&result);
    }
    Ok(())
}

async fn process_file_mode(
    config: Arc<Config>,
    validator: Arc<CompanyValidator>,
    args: &AppArgs,
    start_time: Instant,
) -> Result<()> {
    tracing::info!(
        "Running in File Processing mode. Input: '{}', Output: '{}'",
        args.input,
        args.output
    );
    let input_path = Path::new(&args.input);
    let output_path = Path::new(&args.output);

    if !input_path.is_file() {
        return Err(anyhow::anyhow!(
            "Input file not found or is not a file: {}",
            args.input
        ));
    }
    if let Some(parent_dir) = output_path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            tracing::debug!("Creating output directory: {}", parent_dir.display());
            std::fs::create_dir_all(parent_dir).with_context(|| {
                format!(
                    "Failed to create output directory '{}'",
                    parent_dir.display()
                )
            })?;
        }
    }

    tracing::info!("Loading company names from '{}'...", args.input);
    let names = load_company_names(&args.input)?;
    let total = names.len();
    if total == 0 {
        tracing::warn!(
            "Input file '{}' contains no company names. Saving empty results file.",
            args.input
        );
        save_results(&[], &args.output)?;
        return Ok(());
    }

    tracing::info!(
        "Validating {} companies (Concurrency: {})...",
        total,
        config.max_concurrency
    );
    let pb = ProgressBar::new(total as u64);
    pb.set_style(ProgressStyle::default_bar()
         .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) | ETA: {eta} | {msg}")
         .context("Failed to set progress bar template")?
         .progress_chars("=> "));
    pb.set_message("Validating companies...");
    pb.enable_steady_tick(Duration::from_millis(200));

    let results = validate_companies(config, validator, names).await;

    pb.set_position(results.len() as u64);
    pb.finish_with_message(format!("Validated {} companies", results.len()));

    tracing::info!("Saving results to '{}'...", args.output);
    save_results(&results, &args.output)?;
    tracing::info!("Results saved successfully.");

    log_summary(&results, start_time.elapsed());
    Ok(())
}

fn load_company_names(file_path: &str) -> Result<Vec<String>> {
    tracing::debug!("Opening input file: {}", file_path);
    let file = File::open(file_path)
        .with_context(|| format!("Failed to open input file '{}'", file_path))?;
    let reader = BufReader::new(file);

    let names: Vec<String> = serde_json::from_reader(reader).with_context(|| {
        format!(
            "Failed to parse JSON from '{}'. Ensure it's an array of company name strings.",
            file_path
        )
    })?;
    Ok(names)
}

/// Saves results as pretty-printed JSON.
fn save_results(results: &[ValidationResult], file_path: &str) -> Result<()> {
    let file = File::create(file_path)
        .with_context(|| format!("Failed to create/truncate output file '{}'", file_path))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, results)
        .with_context(|| format!("Failed to serialize results to JSON for '{}'", file_path))?;
    Ok(())
}

fn log_summary(results: &[ValidationResult], duration: Duration) {
    let count = |status: ValidationStatus| results.iter().filter(|r| r.status == status).count();
    let errors = results.iter().filter(|r| r.error().is_some()).count();

    tracing::info!("-------------------- Validation Summary --------------------");
    tracing::info!("Companies Processed : {}", results.len());
    tracing::info!("  - Valid           : {}", count(ValidationStatus::Valid));
    tracing::info!("  - Ambiguous       : {}", count(ValidationStatus::Ambiguous));
    tracing::info!("  - Invalid         : {}", count(ValidationStatus::Invalid) - errors);
    tracing::info!("  - Errors          : {}", errors);
    tracing::info!("Total Time Taken    : {:.2?}", duration);
    if duration.as_secs_f64() > 0.01 && !results.is_empty() {
        let rate = (results.len() as f64) / duration.as_secs_f64();
        tracing::info!("Processing Rate     : {:.2} companies/sec", rate);
    }
    tracing::info!("------------------------------------------------------------");
}

/// Prints the result for a single company to standard output (CLI mode).
fn print_cli_results(result: &ValidationResult) {
    const BLUE: &str = "\x1b[34m";
    const GREEN: &str = "\x1b[32m";
    const YELLOW: &str = "\x1b[33m";
    const RED: &str = "\x1b[31m";
    const RESET: &str = "\x1b[0m";

    println!("\n{BLUE}===== Company Sleuth Results ====={RESET}");
    println!("Company:    {}", result.company_name);

    if let Some(error) = result.error() {
        println!("\n{RED}Status: ERROR{RESET}");
        println!("Error:      {}", error);
    } else {
        let colour = match result.status {
            ValidationStatus::Valid => GREEN,
            ValidationStatus::Ambiguous => YELLOW,
            ValidationStatus::Invalid => RED,
        };
        println!(
            "\n{colour}Status: {}{RESET}",
            result.status.to_string().to_uppercase()
        );
        println!("Confidence: {}/100", result.confidence);
        println!("Message:    {}", result.message);
    }

    if !result.sources.is_empty() {
        println!("\n{BLUE}Sources:{RESET}");
        for source in &result.sources {
            println!("- {}", source);
        }
    }

    let evidence: Vec<_> = result
        .details
        .iter()
        .filter(|(key, _)| key.as_str() != "error")
        .filter_map(|(key, value)| value.get("url").and_then(|u| u.as_str()).map(|u| (key, u)))
        .collect();
    if !evidence.is_empty() {
        println!("\n{BLUE}Evidence:{RESET}");
        for (key, url) in evidence {
            println!("- {}: {}", key, url);
        }
    }

    println!("{BLUE}=================================={RESET}\n");
}
