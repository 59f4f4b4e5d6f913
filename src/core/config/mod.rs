//! Runtime configuration: defaults, TOML file sections, builder, and validation.

mod builder;
mod loading;
mod validation;

pub use builder::ConfigBuilder;

pub(crate) use crate::core::error::Result;

use serde::Deserialize;
use std::time::Duration;

pub(crate) const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:4444";
pub(crate) const DEFAULT_SEARCH_ENGINE_URL: &str = "https://duckduckgo.com/";
pub(crate) const DEFAULT_RESULT_SELECTOR: &str = "article[data-testid=\"result\"]";
pub(crate) const DEFAULT_RESULT_LINK_SELECTOR: &str = "a[data-testid=\"result-title-a\"]";
pub(crate) const MAX_DOMAIN_CANDIDATES: usize = 5;

const DEFAULT_USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

/// Effective configuration used by the validator and its strategies.
///
/// Build it through [`ConfigBuilder`] so file settings, overrides, and
/// validation are applied consistently.
#[derive(Debug, Clone)]
pub struct Config {
    // Browser
    pub webdriver_url: String,
    pub chromedriver_path: Option<String>,
    pub chromedriver_port: u16,
    pub user_agents: Vec<String>,

    // Domain probe
    pub probe_navigation_timeout: Duration,
    pub max_domain_candidates: usize,

    // Search lookups
    pub search_engine_url: String,
    pub search_navigation_timeout: Duration,
    pub result_selector: String,
    /// Title link inside a result block.
    pub result_link_selector: String,
    pub selector_wait_timeout: Duration,
    pub render_delay: Duration,
    pub max_links_scanned: usize,
    pub fanout_timeout: Duration,
    pub enable_official_site_fallback: bool,

    // Cache
    pub cache_ttl: Duration,
    pub cache_capacity: usize,

    // Batch processing
    pub max_concurrency: usize,

    pub loaded_config_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            chromedriver_path: None,
            chromedriver_port: 4444,
            user_agents: DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
            probe_navigation_timeout: Duration::from_secs(5),
            max_domain_candidates: MAX_DOMAIN_CANDIDATES,
            search_engine_url: DEFAULT_SEARCH_ENGINE_URL.to_string(),
            search_navigation_timeout: Duration::from_secs(8),
            result_selector: DEFAULT_RESULT_SELECTOR.to_string(),
            result_link_selector: DEFAULT_RESULT_LINK_SELECTOR.to_string(),
            selector_wait_timeout: Duration::from_secs(3),
            render_delay: Duration::from_secs(2),
            max_links_scanned: 10,
            fanout_timeout: Duration::from_secs(10),
            enable_official_site_fallback: false,
            cache_ttl: Duration::from_secs(24 * 60 * 60),
            cache_capacity: 1024,
            max_concurrency: 4,
            loaded_config_path: None,
        }
    }
}

impl Config {
    /// Picks a user agent from the rotation pool. Indices wrap around.
    pub fn user_agent(&self, index: usize) -> Option<&str> {
        if self.user_agents.is_empty() {
            return None;
        }
        Some(self.user_agents[index % self.user_agents.len()].as_str())
    }

    /// WebDriver endpoint to connect to. A locally spawned chromedriver always
    /// listens on localhost at the configured port.
    pub fn effective_webdriver_url(&self) -> String {
        if self.chromedriver_path.is_some() {
            format!("http://localhost:{}", self.chromedriver_port)
        } else {
            self.webdriver_url.clone()
        }
    }
}

/// Shape of the optional TOML configuration file. Every key is optional.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub browser: BrowserSection,
    pub probe: ProbeSection,
    pub search: SearchSection,
    pub cache: CacheSection,
    pub processing: ProcessingSection,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserSection {
    pub webdriver_url: Option<String>,
    pub chromedriver_path: Option<String>,
    pub chromedriver_port: Option<u16>,
    pub user_agents: Option<Vec<String>>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ProbeSection {
    /// Seconds.
    pub navigation_timeout: Option<u64>,
    pub max_candidates: Option<usize>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    pub search_engine_url: Option<String>,
    /// Seconds.
    pub navigation_timeout: Option<u64>,
    pub result_selector: Option<String>,
    pub result_link_selector: Option<String>,
    /// Seconds.
    pub selector_wait_timeout: Option<u64>,
    /// Seconds, fractional allowed.
    pub render_delay: Option<f32>,
    pub max_links: Option<usize>,
    /// Seconds.
    pub fanout_timeout: Option<u64>,
    pub enable_official_site_fallback: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    pub ttl_hours: Option<u64>,
    pub capacity: Option<usize>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ProcessingSection {
    pub max_concurrency: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_rotation_wraps() {
        let config = Config::default();
        assert_eq!(config.user_agent(0), config.user_agent(3));
        assert_ne!(config.user_agent(1), config.user_agent(2));
    }

    #[test]
    fn spawned_chromedriver_overrides_webdriver_url() {
        let mut config = Config::default();
        config.webdriver_url = "http://grid.internal:4444".to_string();
        assert_eq!(config.effective_webdriver_url(), "http://grid.internal:4444");

        config.chromedriver_path = Some("/usr/bin/chromedriver".to_string());
        config.chromedriver_port = 9515;
        assert_eq!(config.effective_webdriver_url(), "http://localhost:9515");
    }
}
