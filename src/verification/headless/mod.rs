//! Headless browser access: the page/browser abstraction the strategies are
//! written against, and its WebDriver implementation.

mod client;
#[cfg(test)]
pub(crate) mod testing;

pub use client::BrowserSession;

use crate::core::error::Result;
use async_trait::async_trait;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Response observed after navigating a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationOutcome {
    /// HTTP status of the main document.
    pub status: u16,
}

/// An anchor element read from a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    pub text: String,
}

impl Link {
    pub fn new(href: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            text: text.into(),
        }
    }
}

/// A shared browser that hands out isolated pages.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Opens an isolated browsing context. Callers hold it in a `PageGuard`
    /// so it is closed on every exit path.
    async fn new_page(&self, user_agent: Option<&str>) -> Result<Box<dyn Page>>;

    /// Tears the browser down. Calling it more than once is harmless.
    async fn close(&self) -> Result<()>;
}

/// A single short-lived browsing context.
#[async_trait]
pub trait Page: Send + Sync {
    /// Navigates to `url`, failing with `AppError::Timeout` after `timeout`.
    async fn goto(&self, url: &str, timeout: Duration) -> Result<NavigationOutcome>;

    async fn title(&self) -> Result<String>;

    /// The first `limit` anchors on the page, in document order.
    async fn links(&self, limit: usize) -> Result<Vec<Link>>;

    /// One link per element matching `container` (first `limit` of them):
    /// its first `anchor` descendant, else its first `a`. Containers without
    /// a usable link are skipped.
    async fn result_links(&self, container: &str, anchor: &str, limit: usize)
        -> Result<Vec<Link>>;

    /// Waits until `selector` matches an element. `Ok(false)` on timeout.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<bool>;

    /// Releases the context. Errors are logged, never returned.
    async fn close(&self);
}

/// Owns an open page and guarantees it is released.
///
/// `close` releases it inline. If the guard is dropped instead (early return,
/// panic, or the owning future being abandoned) the close is spawned onto the
/// current runtime.
pub(crate) struct PageGuard {
    page: Arc<dyn Page>,
    released: AtomicBool,
}

impl PageGuard {
    pub(crate) fn new(page: Box<dyn Page>) -> Self {
        Self {
            page: Arc::from(page),
            released: AtomicBool::new(false),
        }
    }

    pub(crate) async fn close(self) {
        self.released.store(true, Ordering::SeqCst);
        self.page.close().await;
    }
}

impl Deref for PageGuard {
    type Target = dyn Page;

    fn deref(&self) -> &Self::Target {
        self.page.as_ref()
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        let page = Arc::clone(&self.page);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { page.close().await });
            }
            Err(_) => {
                tracing::warn!(target: "browser_session", "Page dropped outside a runtime; it could not be closed");
            }
        }
    }
}
