//! WebDriver-backed browser session and page handles.

use super::{Browser, Link, NavigationOutcome, Page};
use crate::core::config::Config;
use crate::core::error::{AppError, Result};

use async_trait::async_trait;
use fantoccini::error::CmdError;
use fantoccini::wd::TimeoutConfiguration;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::map::Map as JsonMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

/// Reads the main document's HTTP status from the Navigation Timing API.
/// Returns 0 when the engine does not expose it.
const RESPONSE_STATUS_SCRIPT: &str = r#"
const nav = performance.getEntriesByType('navigation')[0];
return nav && typeof nav.responseStatus === 'number' ? nav.responseStatus : 0;
"#;

const DRIVER_READY_ATTEMPTS: u32 = 40;
/// Upper bound on releasing a page session.
const PAGE_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);
/// Slack past the engine's own page-load timeout before the call is abandoned.
const NAVIGATION_GRACE: Duration = Duration::from_secs(2);
const DRIVER_READY_INTERVAL: Duration = Duration::from_millis(250);

/// Owns the headless browser for the lifetime of a validator.
///
/// `open` optionally spawns a local chromedriver and always establishes a
/// primary WebDriver session so an unusable engine fails loudly up front.
/// Each page is its own WebDriver session, which keeps concurrent pages
/// isolated and lets every page carry its own user agent.
pub struct BrowserSession {
    config: Arc<Config>,
    webdriver_url: String,
    primary: Mutex<Option<Client>>,
    driver: Mutex<Option<Child>>,
    closed: AtomicBool,
}

impl BrowserSession {
    /// Starts (or connects to) the browser engine.
    ///
    /// # Errors
    /// `AppError::BrowserUnavailable` if chromedriver cannot be spawned, never
    /// becomes ready, or refuses to create a session.
    pub async fn open(config: Arc<Config>) -> Result<Self> {
        let webdriver_url = config.effective_webdriver_url();

        let driver = match config.chromedriver_path {
            Some(ref path) => {
                Some(spawn_chromedriver(path, config.chromedriver_port, &webdriver_url).await?)
            }
            None => None,
        };

        let session = Self {
            config,
            webdriver_url,
            primary: Mutex::new(None),
            driver: Mutex::new(driver),
            closed: AtomicBool::new(false),
        };

        let client = session.create_client(None).await.map_err(|e| {
            AppError::BrowserUnavailable(format!(
                "could not start a browser session at {}: {}",
                session.webdriver_url, e
            ))
        })?;
        *session.primary.lock().await = Some(client);

        tracing::info!(target: "browser_session", "Browser session open at {}", session.webdriver_url);
        Ok(session)
    }

    /// Creates a WebDriver client connection with headless Chrome capabilities.
    async fn create_client(&self, user_agent: Option<&str>) -> Result<Client> {
        tracing::debug!(target: "browser_session", "Connecting to WebDriver at {}...", self.webdriver_url);

        let caps = chrome_capabilities(&self.config, user_agent);
        tracing::trace!(target: "browser_session", "WebDriver capabilities: {:?}", caps);

        let mut builder = ClientBuilder::native();
        builder.capabilities(caps);

        match builder.connect(&self.webdriver_url).await {
            Ok(client) => Ok(client),
            Err(e) => {
                tracing::error!(target: "browser_session", "Failed to connect to WebDriver at {}: {}", self.webdriver_url, e);
                Err(e.into())
            }
        }
    }
}

#[async_trait]
impl Browser for BrowserSession {
    async fn new_page(&self, user_agent: Option<&str>) -> Result<Box<dyn Page>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(AppError::BrowserUnavailable(
                "browser session has been shut down".to_string(),
            ));
        }
        let client = self.create_client(user_agent).await?;
        Ok(Box::new(WebDriverPage {
            client,
            closed: AtomicBool::new(false),
        }))
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        if let Some(client) = self.primary.lock().await.take() {
            tracing::debug!(target: "browser_session", "Closing primary WebDriver session...");
            if let Err(e) = client.close().await {
                tracing::warn!(target: "browser_session", "Failed to close primary session cleanly: {}", e);
            }
        }
        if let Some(mut child) = self.driver.lock().await.take() {
            tracing::debug!(target: "browser_session", "Stopping chromedriver...");
            child.kill().await?;
        }
        Ok(())
    }
}

/// One WebDriver session used as a single page.
struct WebDriverPage {
    client: Client,
    closed: AtomicBool,
}

#[async_trait]
impl Page for WebDriverPage {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<NavigationOutcome> {
        // The engine must abandon the load itself, otherwise later commands on
        // this session (including close) queue behind it.
        self.client
            .update_timeouts(TimeoutConfiguration::new(None, Some(timeout), None))
            .await?;
        match tokio::time::timeout(timeout + NAVIGATION_GRACE, self.client.goto(url)).await {
            Err(_) => Err(AppError::Timeout(timeout)),
            Ok(Err(e)) if e.is_timeout() => Err(AppError::Timeout(timeout)),
            Ok(Err(e)) => Err(AppError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Ok(Ok(())) => {
                let reported = self
                    .client
                    .execute(RESPONSE_STATUS_SCRIPT, Vec::new())
                    .await?
                    .as_u64()
                    .unwrap_or(0);
                // A completed navigation without a reported status is taken as a plain load.
                let status = match u16::try_from(reported) {
                    Ok(0) | Err(_) => 200,
                    Ok(code) => code,
                };
                Ok(NavigationOutcome { status })
            }
        }
    }

    async fn title(&self) -> Result<String> {
        Ok(self.client.title().await?)
    }

    async fn links(&self, limit: usize) -> Result<Vec<Link>> {
        let anchors = self.client.find_all(Locator::Css("a")).await?;
        let mut links = Vec::with_capacity(limit.min(anchors.len()));
        for anchor in anchors.into_iter().take(limit) {
            let href = match anchor.attr("href").await {
                Ok(Some(href)) => href,
                Ok(None) => continue,
                Err(e) => {
                    tracing::trace!(target: "browser_session", "Skipping unreadable anchor: {}", e);
                    continue;
                }
            };
            let text = anchor.text().await.unwrap_or_default();
            links.push(Link { href, text });
        }
        Ok(links)
    }

    async fn result_links(
        &self,
        container: &str,
        anchor: &str,
        limit: usize,
    ) -> Result<Vec<Link>> {
        let results = self.client.find_all(Locator::Css(container)).await?;
        let mut links = Vec::with_capacity(limit.min(results.len()));
        for result in results.into_iter().take(limit) {
            let element = match result.find(Locator::Css(anchor)).await {
                Ok(element) => element,
                Err(_) => match result.find(Locator::Css("a")).await {
                    Ok(element) => element,
                    Err(e) => {
                        tracing::trace!(target: "browser_session", "Result without a link: {}", e);
                        continue;
                    }
                },
            };
            let href = match element.attr("href").await {
                Ok(Some(href)) => href,
                _ => continue,
            };
            let text = element.text().await.unwrap_or_default();
            links.push(Link { href, text });
        }
        Ok(links)
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<bool> {
        match self
            .client
            .wait()
            .at_most(timeout)
            .for_element(Locator::Css(selector))
            .await
        {
            Ok(_) => Ok(true),
            Err(CmdError::WaitTimeout) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        match tokio::time::timeout(PAGE_CLOSE_TIMEOUT, self.client.clone().close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(target: "browser_session", "Failed to close page session cleanly: {}", e);
            }
            Err(_) => {
                tracing::warn!(target: "browser_session", "Page session did not close within {:?}", PAGE_CLOSE_TIMEOUT);
            }
        }
    }
}

/// Headless Chrome capabilities for one page session.
fn chrome_capabilities(
    config: &Config,
    user_agent: Option<&str>,
) -> JsonMap<String, serde_json::Value> {
    let mut caps = JsonMap::new();
    let mut chrome_opts = JsonMap::new();

    let mut args = vec![
        "--headless=new".to_string(),
        "--no-sandbox".to_string(),
        "--disable-gpu".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--window-size=1280,800".to_string(),
        "--disable-extensions".to_string(),
        "--disable-background-networking".to_string(),
        "--disable-sync".to_string(),
        "--disable-translate".to_string(),
        "--mute-audio".to_string(),
        "--ignore-certificate-errors".to_string(),
        "--log-level=1".to_string(),
    ];
    let agent = user_agent.or_else(|| config.user_agent(0));
    if let Some(agent) = agent {
        args.push(format!("--user-agent={}", agent));
    }
    chrome_opts.insert("args".to_string(), serde_json::json!(args));

    // `goto` narrows this per navigation.
    let page_load = config
        .probe_navigation_timeout
        .max(config.search_navigation_timeout);
    caps.insert(
        "timeouts".to_string(),
        serde_json::json!({ "pageLoad": page_load.as_millis() as u64 }),
    );

    caps.insert("browserName".to_string(), serde_json::json!("chrome"));
    caps.insert(
        "goog:chromeOptions".to_string(),
        serde_json::json!(chrome_opts),
    );

    caps
}

/// Launches chromedriver on `port` and waits until its status endpoint reports ready.
async fn spawn_chromedriver(path: &str, port: u16, webdriver_url: &str) -> Result<Child> {
    tracing::info!(target: "browser_session", "Starting chromedriver '{}' on port {}...", path, port);
    let child = Command::new(path)
        .arg(format!("--port={}", port))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            AppError::BrowserUnavailable(format!("failed to spawn chromedriver '{}': {}", path, e))
        })?;

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(1))
        .build()?;
    let status_url = format!("{}/status", webdriver_url.trim_end_matches('/'));

    for attempt in 1..=DRIVER_READY_ATTEMPTS {
        match http.get(&status_url).send().await {
            Ok(response) => {
                let ready = response
                    .json::<serde_json::Value>()
                    .await
                    .ok()
                    .and_then(|body| body.pointer("/value/ready").and_then(|v| v.as_bool()))
                    .unwrap_or(false);
                if ready {
                    tracing::debug!(target: "browser_session", "chromedriver ready after {} attempt(s)", attempt);
                    return Ok(child);
                }
            }
            Err(e) => {
                tracing::trace!(target: "browser_session", "chromedriver not reachable yet: {}", e);
            }
        }
        tokio::time::sleep(DRIVER_READY_INTERVAL).await;
    }

    Err(AppError::BrowserUnavailable(format!(
        "chromedriver at {} did not become ready",
        webdriver_url
    )))
}
