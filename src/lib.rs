//! # Company Sleuth Core Library
//!
//! This crate validates that a company name refers to a real organization by
//! probing likely company domains and searching third-party indexes through a
//! headless browser, then scoring the evidence into a 0-100 confidence.
//!
//! It is designed to be used either directly as a library or via the
//! `company-sleuth` command-line tool (which uses this library).

mod core;
mod utils;
mod verification;

pub use crate::core::config::{Config, ConfigBuilder, ConfigFile};
pub use crate::core::error::{AppError, Result};
pub use crate::core::models::{SourceKind, StrategyFinding, ValidationResult, ValidationStatus};
pub use crate::core::validator::CompanyValidator;
pub use crate::verification::headless::{Browser, BrowserSession, Link, NavigationOutcome, Page};

use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;

/// Opens the browser session and builds a `CompanyValidator` around it.
///
/// Fails with `AppError::BrowserUnavailable` when no WebDriver endpoint can
/// be reached.
pub async fn initialize_validator(config: &Config) -> Result<CompanyValidator> {
    CompanyValidator::new(config).await
}

/// Validates many names with at most `config.max_concurrency` in flight.
///
/// # Returns
/// * One `ValidationResult` per input name, in input order.
pub async fn validate_companies(
    config: Arc<Config>,
    validator: Arc<CompanyValidator>,
    names: Vec<String>,
) -> Vec<ValidationResult> {
    let total = names.len();
    if total == 0 {
        return Vec::new();
    }

    let mut tasks = FuturesUnordered::new();
    let mut results: Vec<Option<ValidationResult>> = vec![None; total];

    for (index, name) in names.iter().enumerate() {
        while tasks.len() >= config.max_concurrency.max(1) {
            match tasks.next().await {
                Some(finished) => store_result(&mut results, &names, finished),
                None => {
                    tracing::warn!("Task queue unexpectedly empty while limiting concurrency.");
                    break;
                }
            }
        }

        let validator_clone = Arc::clone(&validator);
        let name_clone = name.clone();
        let handle =
            tokio::spawn(async move { validator_clone.validate_company(&name_clone).await });
        tasks.push(async move { (index, handle.await) });
    }

    while let Some(finished) = tasks.next().await {
        store_result(&mut results, &names, finished);
    }

    results
        .into_iter()
        .zip(names.iter())
        .map(|(result, name)| {
            result.unwrap_or_else(|| ValidationResult::failure(name, "validation task was lost"))
        })
        .collect()
}

fn store_result(
    results: &mut [Option<ValidationResult>],
    names: &[String],
    (index, joined): (usize, std::result::Result<ValidationResult, tokio::task::JoinError>),
) {
    let result = match joined {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("A validation task failed to join: {}", e);
            ValidationResult::failure(&names[index], AppError::Internal(e.to_string()))
        }
    };
    results[index] = Some(result);
}
