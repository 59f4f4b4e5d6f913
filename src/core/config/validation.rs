//! Contains validation logic for the final Config struct.

use super::{Config, Result, MAX_DOMAIN_CANDIDATES};
use crate::core::error::AppError;
use crate::utils::domain::normalize_url;
use std::time::Duration;

/// Validates the configuration settings after loading and potential overrides.
/// Mutates the config to clamp values where a sensible fallback exists.
/// Internal helper for the builder's `build` method.
pub(crate) fn validate_config(config: &mut Config) -> Result<()> {
    if config.user_agents.is_empty() {
        return Err(AppError::Config(
            "At least one user agent is required.".to_string(),
        ));
    }
    if let Err(e) = normalize_url(&config.webdriver_url) {
        return Err(AppError::Config(format!(
            "Invalid WebDriver URL '{}': {}",
            config.webdriver_url, e
        )));
    }
    match normalize_url(&config.search_engine_url) {
        Ok(url) => config.search_engine_url = url.to_string(),
        Err(e) => {
            return Err(AppError::Config(format!(
                "Invalid search engine URL '{}': {}",
                config.search_engine_url, e
            )))
        }
    }
    if config.result_selector.trim().is_empty() {
        return Err(AppError::Config(
            "Search result selector cannot be empty.".to_string(),
        ));
    }
    if config.result_link_selector.trim().is_empty() {
        return Err(AppError::Config(
            "Search result link selector cannot be empty.".to_string(),
        ));
    }
    if let Some(ref path) = config.chromedriver_path {
        if path.is_empty() {
            tracing::warn!("Provided ChromeDriver path is empty. It will be ignored.");
            config.chromedriver_path = None;
        }
    }

    clamp_timeout(&mut config.probe_navigation_timeout, "Probe navigation timeout");
    clamp_timeout(&mut config.search_navigation_timeout, "Search navigation timeout");
    clamp_timeout(&mut config.selector_wait_timeout, "Selector wait timeout");
    clamp_timeout(&mut config.fanout_timeout, "Fan-out timeout");

    if config.max_domain_candidates == 0 {
        tracing::warn!("Max domain candidates was set to 0. Setting to 1.");
        config.max_domain_candidates = 1;
    }
    if config.max_domain_candidates > MAX_DOMAIN_CANDIDATES {
        tracing::warn!(
            "Max domain candidates ({}) > {}. Clamping to {}.",
            config.max_domain_candidates,
            MAX_DOMAIN_CANDIDATES,
            MAX_DOMAIN_CANDIDATES
        );
        config.max_domain_candidates = MAX_DOMAIN_CANDIDATES;
    }
    if config.max_links_scanned == 0 {
        tracing::warn!("Max links scanned was set to 0. Setting to 1.");
        config.max_links_scanned = 1;
    }
    if config.cache_capacity == 0 {
        tracing::warn!("Cache capacity was set to 0. Setting to 1.");
        config.cache_capacity = 1;
    }
    if config.cache_ttl.is_zero() {
        tracing::warn!("Cache TTL is zero. Cached results will never be reused.");
    }
    if config.max_concurrency == 0 {
        tracing::warn!("Max concurrency was set to 0. Setting to 1.");
        config.max_concurrency = 1;
    }
    if config.fanout_timeout < config.search_navigation_timeout {
        tracing::warn!(
            "Fan-out timeout ({:?}) is shorter than the search navigation timeout ({:?}). Slow searches will be abandoned.",
            config.fanout_timeout,
            config.search_navigation_timeout
        );
    }
    Ok(())
}

fn clamp_timeout(value: &mut Duration, label: &str) {
    if value.is_zero() {
        tracing::warn!("{} was set to 0. Setting to 1s.", label);
        *value = Duration::from_secs(1);
    }
}
