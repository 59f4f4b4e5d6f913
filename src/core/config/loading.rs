//! Handles loading configuration from files and applying it to the Config struct.

use super::{Config, ConfigFile, Result};
use crate::core::error::AppError;
use anyhow::Context;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Loads configuration settings from a TOML file.
/// Internal to the builder logic.
pub(crate) fn load_config_file(file_path: &str) -> anyhow::Result<ConfigFile> {
    let path = Path::new(file_path);
    if !path.exists() || !path.is_file() {
        return Err(anyhow::anyhow!(
            "File not found or is not a file: {}",
            file_path
        ));
    }
    tracing::debug!("Attempting to read config file: {}", file_path);
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", file_path))?;

    let config_file_content: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML configuration from {}", file_path))?;

    tracing::debug!("Successfully parsed configuration file: {}", file_path);
    Ok(config_file_content)
}

const SECONDS_PER_HOUR: u64 = 60 * 60;

/// Merges the settings present in `file_config` onto `config`.
/// Used both for the file itself and for builder overrides.
///
/// # Errors
/// `AppError::Config` for durations that cannot be represented (a
/// non-finite render delay, a TTL that overflows). `config` may be partially
/// updated when this fails.
pub(crate) fn apply_file_config(config: &mut Config, file_config: &ConfigFile) -> Result<()> {
    // Browser
    if let Some(ref url) = file_config.browser.webdriver_url {
        if !url.trim().is_empty() {
            config.webdriver_url = url.trim().to_string();
        }
    }
    if let Some(ref path) = file_config.browser.chromedriver_path {
        if !path.trim().is_empty() {
            config.chromedriver_path = Some(path.trim().to_string());
        } else {
            config.chromedriver_path = None;
        }
    }
    if let Some(port) = file_config.browser.chromedriver_port {
        config.chromedriver_port = port;
    }
    if let Some(ref agents) = file_config.browser.user_agents {
        config.user_agents = agents
            .iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();
    }

    // Domain probe
    if let Some(timeout) = file_config.probe.navigation_timeout {
        config.probe_navigation_timeout = Duration::from_secs(timeout);
    }
    if let Some(max) = file_config.probe.max_candidates {
        config.max_domain_candidates = max;
    }

    // Search
    if let Some(ref url) = file_config.search.search_engine_url {
        config.search_engine_url = url.trim().to_string();
    }
    if let Some(timeout) = file_config.search.navigation_timeout {
        config.search_navigation_timeout = Duration::from_secs(timeout);
    }
    if let Some(ref selector) = file_config.search.result_selector {
        config.result_selector = selector.clone();
    }
    if let Some(ref selector) = file_config.search.result_link_selector {
        config.result_link_selector = selector.clone();
    }
    if let Some(timeout) = file_config.search.selector_wait_timeout {
        config.selector_wait_timeout = Duration::from_secs(timeout);
    }
    if let Some(delay) = file_config.search.render_delay {
        config.render_delay = render_delay_from_secs(delay)?;
    }
    if let Some(max) = file_config.search.max_links {
        config.max_links_scanned = max;
    }
    if let Some(timeout) = file_config.search.fanout_timeout {
        config.fanout_timeout = Duration::from_secs(timeout);
    }
    if let Some(enable) = file_config.search.enable_official_site_fallback {
        config.enable_official_site_fallback = enable;
    }

    // Cache
    if let Some(hours) = file_config.cache.ttl_hours {
        config.cache_ttl = hours
            .checked_mul(SECONDS_PER_HOUR)
            .map(Duration::from_secs)
            .ok_or_else(|| {
                AppError::Config(format!("Cache TTL of {} hours is out of range.", hours))
            })?;
    }
    if let Some(capacity) = file_config.cache.capacity {
        config.cache_capacity = capacity;
    }

    // Processing
    if let Some(concurrency) = file_config.processing.max_concurrency {
        config.max_concurrency = concurrency;
    }
    Ok(())
}

/// Negative delays clamp to zero; NaN, infinite, or overflowing ones are rejected.
fn render_delay_from_secs(delay: f32) -> Result<Duration> {
    if delay.is_nan() {
        return Err(AppError::Config("Render delay must be a number.".to_string()));
    }
    if delay < 0.0 {
        tracing::warn!("Negative render delay ({:.2}s) treated as zero.", delay);
        return Ok(Duration::ZERO);
    }
    Duration::try_from_secs_f32(delay)
        .map_err(|e| AppError::Config(format!("Render delay of {}s is out of range: {}", delay, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_delay_conversion() {
        assert_eq!(render_delay_from_secs(0.5).unwrap(), Duration::from_millis(500));
        assert_eq!(render_delay_from_secs(-3.0).unwrap(), Duration::ZERO);
        assert!(matches!(render_delay_from_secs(f32::INFINITY), Err(AppError::Config(_))));
        assert!(matches!(render_delay_from_secs(f32::NAN), Err(AppError::Config(_))));
    }

    #[test]
    fn overflowing_ttl_is_rejected() {
        let mut file = ConfigFile::default();
        file.cache.ttl_hours = Some(u64::MAX / 2);
        let mut config = Config::default();
        assert!(matches!(
            apply_file_config(&mut config, &file),
            Err(AppError::Config(_))
        ));
    }
}
