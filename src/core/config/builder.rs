//! Provides the `ConfigBuilder` for fluent configuration construction.

use super::loading::{apply_file_config, load_config_file};
use super::validation::validate_config;
use super::{Config, ConfigFile, Result};
use crate::AppError;
use std::path::Path;
use std::time::Duration;

/// Builder pattern for creating `Config` instances fluently.
///
/// Precedence, lowest first: defaults, the TOML file (explicit path, else the
/// first default location that exists), then the overrides set on the builder.
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
    config_file_path: Option<String>,
    overrides: ConfigFile,
    durations: DurationOverrides,
}

/// Duration overrides kept at full precision; the file format only has
/// whole seconds for most of these.
#[derive(Default)]
struct DurationOverrides {
    probe_navigation_timeout: Option<Duration>,
    search_navigation_timeout: Option<Duration>,
    selector_wait_timeout: Option<Duration>,
    render_delay: Option<Duration>,
    fanout_timeout: Option<Duration>,
}

impl DurationOverrides {
    fn apply(&self, config: &mut Config) {
        if let Some(timeout) = self.probe_navigation_timeout {
            config.probe_navigation_timeout = timeout;
        }
        if let Some(timeout) = self.search_navigation_timeout {
            config.search_navigation_timeout = timeout;
        }
        if let Some(timeout) = self.selector_wait_timeout {
            config.selector_wait_timeout = timeout;
        }
        if let Some(delay) = self.render_delay {
            config.render_delay = delay;
        }
        if let Some(timeout) = self.fanout_timeout {
            config.fanout_timeout = timeout;
        }
    }
}

impl ConfigBuilder {
    /// Creates a new builder with default configuration values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Specify an optional configuration file path to load.
    pub fn config_file(mut self, path: impl Into<String>) -> Self {
        self.config_file_path = Some(path.into());
        self
    }

    pub fn webdriver_url(mut self, url: impl Into<String>) -> Self {
        self.overrides.browser.webdriver_url = Some(url.into());
        self
    }
    pub fn chromedriver_path(mut self, path: Option<impl Into<String>>) -> Self {
        self.overrides.browser.chromedriver_path = path.map(|s| s.into());
        self
    }
    pub fn chromedriver_port(mut self, port: u16) -> Self {
        self.overrides.browser.chromedriver_port = Some(port);
        self
    }
    pub fn user_agents(mut self, agents: Vec<String>) -> Self {
        self.overrides.browser.user_agents = Some(agents);
        self
    }
    pub fn probe_navigation_timeout(mut self, duration: Duration) -> Self {
        self.durations.probe_navigation_timeout = Some(duration);
        self
    }
    pub fn max_domain_candidates(mut self, value: usize) -> Self {
        self.overrides.probe.max_candidates = Some(value);
        self
    }
    pub fn search_engine_url(mut self, url: impl Into<String>) -> Self {
        self.overrides.search.search_engine_url = Some(url.into());
        self
    }
    pub fn search_navigation_timeout(mut self, duration: Duration) -> Self {
        self.durations.search_navigation_timeout = Some(duration);
        self
    }
    pub fn result_selector(mut self, selector: impl Into<String>) -> Self {
        self.overrides.search.result_selector = Some(selector.into());
        self
    }
    pub fn result_link_selector(mut self, selector: impl Into<String>) -> Self {
        self.overrides.search.result_link_selector = Some(selector.into());
        self
    }
    pub fn selector_wait_timeout(mut self, duration: Duration) -> Self {
        self.durations.selector_wait_timeout = Some(duration);
        self
    }
    pub fn render_delay(mut self, duration: Duration) -> Self {
        self.durations.render_delay = Some(duration);
        self
    }
    pub fn max_links_scanned(mut self, value: usize) -> Self {
        self.overrides.search.max_links = Some(value);
        self
    }
    pub fn fanout_timeout(mut self, duration: Duration) -> Self {
        self.durations.fanout_timeout = Some(duration);
        self
    }
    pub fn enable_official_site_fallback(mut self, enable: bool) -> Self {
        self.overrides.search.enable_official_site_fallback = Some(enable);
        self
    }
    pub fn cache_ttl_hours(mut self, hours: u64) -> Self {
        self.overrides.cache.ttl_hours = Some(hours);
        self
    }
    pub fn cache_capacity(mut self, value: usize) -> Self {
        self.overrides.cache.capacity = Some(value);
        self
    }
    pub fn max_concurrency(mut self, value: usize) -> Self {
        self.overrides.processing.max_concurrency = Some(value);
        self
    }

    /// Builds the final `Config` object, applying defaults, file settings, overrides, and validation.
    pub fn build(mut self) -> Result<Config> {
        let mut loaded_path: Option<String> = None;

        if let Some(ref path) = self.config_file_path {
            match load_config_file(path) {
                Ok(file_config) => {
                    apply_file_config(&mut self.config, &file_config).map_err(|e| {
                        AppError::Config(format!(
                            "Invalid settings in configuration file '{}': {}",
                            path, e
                        ))
                    })?;
                    loaded_path = Some(path.clone());
                    tracing::info!("Loaded base configuration from specified file: {}", path);
                }
                Err(e) => {
                    tracing::error!("Failed to load specified config file '{}': {}", path, e);
                    return Err(AppError::Config(format!(
                        "Failed to load specified configuration file '{}': {}",
                        path, e
                    )));
                }
            }
        } else {
            tracing::debug!("No config file specified, checking default locations.");
            for path_str in ["./company-sleuth.toml", "./config.toml"] {
                if Path::new(path_str).exists() {
                    tracing::debug!("Found potential default config file: {}", path_str);
                    let loaded = load_config_file(path_str).and_then(|file_config| {
                        let mut candidate = self.config.clone();
                        apply_file_config(&mut candidate, &file_config)
                            .map_err(|e| anyhow::anyhow!("{}", e))?;
                        Ok(candidate)
                    });
                    match loaded {
                        Ok(candidate) => {
                            self.config = candidate;
                            loaded_path = Some(path_str.to_string());
                            tracing::info!(
                                "Loaded base configuration from default location: {}",
                                path_str
                            );
                            break;
                        }
                        Err(e) => {
                            tracing::warn!(
                                "Failed to load or parse default config '{}': {}",
                                path_str,
                                e
                            );
                        }
                    }
                }
            }
            if loaded_path.is_none() {
                tracing::info!("No configuration file found. Using default values and overrides.");
            }
        }

        apply_file_config(&mut self.config, &self.overrides)?;
        self.durations.apply(&mut self.config);
        self.config.loaded_config_path = loaded_path;
        validate_config(&mut self.config)?;

        tracing::debug!("Final configuration built successfully.");
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_values() {
        let config = ConfigBuilder::new().build().unwrap();
        assert_eq!(config.probe_navigation_timeout, Duration::from_secs(5));
        assert_eq!(config.search_navigation_timeout, Duration::from_secs(8));
        assert_eq!(config.fanout_timeout, Duration::from_secs(10));
        assert_eq!(config.render_delay, Duration::from_secs(2));
        assert_eq!(config.cache_ttl, Duration::from_secs(24 * 3600));
        assert_eq!(config.max_domain_candidates, 5);
        assert_eq!(config.max_links_scanned, 10);
        assert_eq!(config.user_agents.len(), 3);
        assert!(!config.enable_official_site_fallback);
    }

    #[test]
    fn overrides_are_applied() {
        let config = ConfigBuilder::new()
            .max_concurrency(9)
            .fanout_timeout(Duration::from_secs(4))
            .render_delay(Duration::from_millis(250))
            .search_engine_url("https://search.example.org/html/")
            .enable_official_site_fallback(true)
            .build()
            .unwrap();
        assert_eq!(config.max_concurrency, 9);
        assert_eq!(config.fanout_timeout, Duration::from_secs(4));
        assert_eq!(config.render_delay, Duration::from_millis(250));
        assert_eq!(config.search_engine_url, "https://search.example.org/html/");
        assert!(config.enable_official_site_fallback);
    }

    #[test]
    fn file_settings_load_and_overrides_win() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[browser]
webdriver_url = "http://selenium.local:4444"

[search]
fanout_timeout = 6
max_links = 15

[cache]
ttl_hours = 2
capacity = 64

[processing]
max_concurrency = 2
"#
        )
        .unwrap();
        let path = file.path().to_string_lossy().to_string();

        let config = ConfigBuilder::new()
            .config_file(path.clone())
            .max_concurrency(8)
            .build()
            .unwrap();

        assert_eq!(config.loaded_config_path.as_deref(), Some(path.as_str()));
        assert_eq!(config.webdriver_url, "http://selenium.local:4444");
        assert_eq!(config.fanout_timeout, Duration::from_secs(6));
        assert_eq!(config.max_links_scanned, 15);
        assert_eq!(config.cache_ttl, Duration::from_secs(2 * 3600));
        assert_eq!(config.cache_capacity, 64);
        assert_eq!(config.max_concurrency, 8);
    }

    #[test]
    fn sub_second_overrides_keep_their_precision() {
        let config = ConfigBuilder::new()
            .fanout_timeout(Duration::from_millis(500))
            .probe_navigation_timeout(Duration::from_millis(1500))
            .selector_wait_timeout(Duration::from_millis(750))
            .build()
            .unwrap();
        assert_eq!(config.fanout_timeout, Duration::from_millis(500));
        assert_eq!(config.probe_navigation_timeout, Duration::from_millis(1500));
        assert_eq!(config.selector_wait_timeout, Duration::from_millis(750));
    }

    #[test]
    fn duration_overrides_beat_file_settings() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[search]\nfanout_timeout = 6\nrender_delay = 1.5").unwrap();

        let config = ConfigBuilder::new()
            .config_file(file.path().to_string_lossy())
            .fanout_timeout(Duration::from_millis(2500))
            .build()
            .unwrap();
        assert_eq!(config.fanout_timeout, Duration::from_millis(2500));
        assert_eq!(config.render_delay, Duration::from_millis(1500));
    }

    #[test]
    fn infinite_render_delay_in_file_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[search]\nrender_delay = inf").unwrap();

        let err = ConfigBuilder::new()
            .config_file(file.path().to_string_lossy())
            .build()
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn huge_cache_ttl_in_file_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[cache]\nttl_hours = 9223372036854775807").unwrap();

        let err = ConfigBuilder::new()
            .config_file(file.path().to_string_lossy())
            .build()
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn huge_cache_ttl_override_is_a_config_error() {
        let result = ConfigBuilder::new().cache_ttl_hours(u64::MAX).build();
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = ConfigBuilder::new()
            .config_file("/definitely/not/here/company-sleuth.toml")
            .build()
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
