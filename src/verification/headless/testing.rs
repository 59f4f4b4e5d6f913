//! Scripted in-memory browser for exercising strategies without a network.

use super::{Browser, Link, NavigationOutcome, Page};
use crate::core::error::{AppError, Result};

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// What a page shows after navigating to a matching URL.
#[derive(Debug, Clone)]
pub(crate) struct Route {
    /// `None` makes navigation fail like a DNS error.
    pub status: Option<u16>,
    pub title: String,
    /// Every anchor on the page, in document order.
    pub links: Vec<Link>,
    /// Links inside organic result blocks.
    pub result_links: Vec<Link>,
    pub delay: Duration,
    pub results_marker: bool,
    pub panic: bool,
}

impl Route {
    pub fn page(status: u16, title: &str) -> Self {
        Self {
            status: Some(status),
            title: title.to_string(),
            links: Vec::new(),
            result_links: Vec::new(),
            delay: Duration::ZERO,
            results_marker: true,
            panic: false,
        }
    }

    pub fn results(links: Vec<Link>) -> Self {
        Self {
            result_links: links.clone(),
            links,
            ..Self::page(200, "Search results")
        }
    }

    pub fn unreachable() -> Self {
        Self {
            status: None,
            ..Self::page(0, "")
        }
    }

    /// Puts engine chrome (navigation, ads) ahead of the results.
    pub fn with_navigation(mut self, navigation: Vec<Link>) -> Self {
        self.links.splice(0..0, navigation);
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn without_results_marker(mut self) -> Self {
        self.results_marker = false;
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panic = true;
        self
    }
}

#[derive(Default)]
struct Counters {
    opened: AtomicUsize,
    closed: AtomicUsize,
    navigations: Mutex<Vec<String>>,
    user_agents: Mutex<Vec<Option<String>>>,
}

/// Routes are matched by substring against the navigated URL with its `q`
/// parameter decoded and appended, so search queries can be matched verbatim.
#[derive(Clone, Default)]
pub(crate) struct ScriptedBrowser {
    routes: Arc<Vec<(String, Route)>>,
    counters: Arc<Counters>,
}

impl ScriptedBrowser {
    pub fn new(routes: Vec<(&str, Route)>) -> Self {
        Self {
            routes: Arc::new(
                routes
                    .into_iter()
                    .map(|(pattern, route)| (pattern.to_string(), route))
                    .collect(),
            ),
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn opened(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }

    pub fn navigations(&self) -> Vec<String> {
        self.counters.navigations.lock().clone()
    }

    pub fn user_agents(&self) -> Vec<Option<String>> {
        self.counters.user_agents.lock().clone()
    }

    fn route_for(&self, target: &str) -> Option<Route> {
        self.routes
            .iter()
            .find(|(pattern, _)| target.contains(pattern.as_str()))
            .map(|(_, route)| route.clone())
    }
}

fn describe(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => match parsed.query_pairs().find(|(k, _)| k == "q") {
            Some((_, q)) => format!("{} {}", url, q),
            None => url.to_string(),
        },
        Err(_) => url.to_string(),
    }
}

#[async_trait]
impl Browser for ScriptedBrowser {
    async fn new_page(&self, user_agent: Option<&str>) -> Result<Box<dyn Page>> {
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        self.counters
            .user_agents
            .lock()
            .push(user_agent.map(str::to_string));
        Ok(Box::new(ScriptedPage {
            browser: self.clone(),
            current: Mutex::new(None),
        }))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

struct ScriptedPage {
    browser: ScriptedBrowser,
    current: Mutex<Option<Route>>,
}

#[async_trait]
impl Page for ScriptedPage {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<NavigationOutcome> {
        let target = describe(url);
        self.browser.counters.navigations.lock().push(target.clone());
        let route = self.browser.route_for(&target);

        if let Some(ref route) = route {
            if route.panic {
                panic!("scripted browser crashed on {}", url);
            }
            if route.delay > timeout {
                tokio::time::sleep(timeout).await;
                return Err(AppError::Timeout(timeout));
            }
            tokio::time::sleep(route.delay).await;
        }

        match route {
            Some(route) => match route.status {
                Some(status) => {
                    *self.current.lock() = Some(route);
                    Ok(NavigationOutcome { status })
                }
                None => Err(AppError::Navigation {
                    url: url.to_string(),
                    reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
                }),
            },
            None => Err(AppError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            }),
        }
    }

    async fn title(&self) -> Result<String> {
        Ok(self
            .current
            .lock()
            .as_ref()
            .map(|r| r.title.clone())
            .unwrap_or_default())
    }

    async fn links(&self, limit: usize) -> Result<Vec<Link>> {
        Ok(self
            .current
            .lock()
            .as_ref()
            .map(|r| r.links.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn result_links(
        &self,
        _container: &str,
        _anchor: &str,
        limit: usize,
    ) -> Result<Vec<Link>> {
        Ok(self
            .current
            .lock()
            .as_ref()
            .map(|r| r.result_links.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn wait_for(&self, _selector: &str, timeout: Duration) -> Result<bool> {
        let present = self
            .current
            .lock()
            .as_ref()
            .map(|r| r.results_marker)
            .unwrap_or(false);
        if !present {
            tokio::time::sleep(timeout).await;
        }
        Ok(present)
    }

    async fn close(&self) {
        self.browser.counters.closed.fetch_add(1, Ordering::SeqCst);
    }
}
