use crate::core::cache::ResultCache;
use crate::core::config::Config;
use crate::core::error::{AppError, Result};
use crate::core::models::{SourceKind, StrategyFinding, ValidationResult};
use crate::core::scoring::aggregate;
use crate::verification::domain_probe::DomainProbe;
use crate::verification::headless::{Browser, BrowserSession};
use crate::verification::search::{SearchLookup, SearchTarget};

use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Search lookups run concurrently once the domain probe has found something.
/// Their order here is the order their sources are reported in.
const FANOUT_TARGETS: [SearchTarget; 2] =
    [SearchTarget::ProfessionalNetwork, SearchTarget::Encyclopedia];

/// The main struct orchestrating company validation.
///
/// Owns the browser and the result cache. Cloning is cheap and clones share
/// both, so one validator can serve many concurrent callers.
#[derive(Clone)]
pub struct CompanyValidator {
    config: Arc<Config>,
    browser: Arc<dyn Browser>,
    cache: Arc<ResultCache>,
    probe: DomainProbe,
    search: SearchLookup,
    shut_down: Arc<AtomicBool>,
}

impl CompanyValidator {
    /// Opens the browser session and builds a validator around it.
    pub(crate) async fn new(config: &Config) -> Result<Self> {
        tracing::debug!(target: "validator", "Initializing CompanyValidator components...");
        let config = Arc::new(config.clone());
        let session = BrowserSession::open(Arc::clone(&config)).await?;
        tracing::info!(target: "validator", "CompanyValidator initialized successfully.");
        Ok(Self::with_browser(config, Arc::new(session)))
    }

    /// Builds a validator around an already running browser.
    pub fn with_browser(config: Arc<Config>, browser: Arc<dyn Browser>) -> Self {
        let cache = Arc::new(ResultCache::new(config.cache_ttl, config.cache_capacity));
        let probe = DomainProbe::new(Arc::clone(&config), Arc::clone(&browser));
        let search = SearchLookup::new(Arc::clone(&config), Arc::clone(&browser));
        Self {
            config,
            browser,
            cache,
            probe,
            search,
            shut_down: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Validates one company name. Never fails: internal errors and panics
    /// come back as an invalid result with the error in `details.error`.
    ///
    /// Successful results are cached per normalized name for the configured TTL.
    pub async fn validate_company(&self, company_name: &str) -> ValidationResult {
        if self.shut_down.load(Ordering::SeqCst) {
            tracing::warn!(target: "validator", "[{}] Validator has been shut down", company_name);
            return ValidationResult::failure(
                company_name,
                AppError::BrowserUnavailable("validator has been shut down".to_string()),
            );
        }
        if let Some(cached) = self.cache.get(company_name) {
            tracing::info!(target: "validator", "[{}] Returning cached result", company_name);
            return cached;
        }

        let start_time = Instant::now();
        let outcome = AssertUnwindSafe(self.run_pipeline(company_name))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(result)) => {
                tracing::info!(target: "validator",
                    "[{}] Validation finished in {:.2?}: {} ({}/100)",
                    company_name, start_time.elapsed(), result.status, result.confidence
                );
                self.cache.put(company_name, result.clone());
                tracing::trace!(target: "validator", "Result cache holds {} entries", self.cache.len());
                result
            }
            Ok(Err(e)) => {
                tracing::error!(target: "validator", "[{}] Validation failed: {}", company_name, e);
                ValidationResult::failure(company_name, e)
            }
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                tracing::error!(target: "validator", "[{}] Validation panicked: {}", company_name, reason);
                ValidationResult::failure(company_name, AppError::Internal(reason))
            }
        }
    }

    /// Closes the browser. Validations started afterwards, on this validator
    /// or any clone of it, return a failure result without touching the
    /// browser or the cache.
    pub async fn shutdown(&self) -> Result<()> {
        self.shut_down.store(true, Ordering::SeqCst);
        tracing::info!(target: "validator", "Shutting down browser session...");
        self.browser.close().await
    }

    async fn run_pipeline(&self, company_name: &str) -> Result<ValidationResult> {
        let name = company_name.trim();
        if name.is_empty() {
            return Err(AppError::InsufficientInput(
                "company name is empty".to_string(),
            ));
        }
        tracing::info!(target: "validator", "[{}] Starting validation", name);

        let mut findings = Vec::with_capacity(1 + FANOUT_TARGETS.len());
        let domain = self.probe.probe(name).await;
        let domain_found = domain.found;
        findings.push((SourceKind::DirectDomain, domain));

        if domain_found {
            findings.extend(self.fan_out(name).await);
        } else if self.config.enable_official_site_fallback {
            tracing::debug!(target: "validator", "[{}] No domain signal, trying official-website search", name);
            let finding = self
                .search
                .lookup(SearchTarget::OfficialWebsite, name)
                .await;
            findings.push((SearchTarget::OfficialWebsite.source(), finding));
        } else {
            tracing::debug!(target: "validator", "[{}] No domain signal, skipping search lookups", name);
        }

        Ok(aggregate(company_name, &findings))
    }

    /// Runs the search lookups as spawned tasks and collects whatever finishes
    /// before the fan-out deadline. Late tasks are left to finish on their own
    /// and release their pages; their results are dropped. A lookup that
    /// panics only loses its own slot.
    async fn fan_out(&self, name: &str) -> Vec<(SourceKind, StrategyFinding)> {
        let deadline = tokio::time::Instant::now() + self.config.fanout_timeout;
        let mut tasks = FuturesUnordered::new();

        for (slot, target) in FANOUT_TARGETS.iter().copied().enumerate() {
            let search = self.search.clone();
            let company = name.to_string();
            let handle = tokio::spawn(async move { search.lookup(target, &company).await });
            tasks.push(async move { (slot, handle.await) });
        }

        let mut slots: [Option<StrategyFinding>; FANOUT_TARGETS.len()] = Default::default();
        loop {
            let next = tokio::time::timeout_at(deadline, tasks.next()).await;
            match next {
                Ok(Some((slot, Ok(finding)))) => slots[slot] = Some(finding),
                Ok(Some((slot, Err(join_error)))) => {
                    let target = FANOUT_TARGETS[slot];
                    let error = if join_error.is_panic() {
                        AppError::Internal(format!(
                            "{:?} lookup panicked: {}",
                            target,
                            panic_message(join_error.into_panic().as_ref())
                        ))
                    } else {
                        AppError::Internal(format!("{:?} lookup was cancelled: {}", target, join_error))
                    };
                    tracing::warn!(target: "validator", "[{}] {:?} lookup did not complete: {}", name, target, error);
                    slots[slot] = Some(StrategyFinding::failed(error));
                }
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(target: "validator",
                        "[{}] Fan-out deadline of {:?} reached with {} lookup(s) pending",
                        name, self.config.fanout_timeout, tasks.len()
                    );
                    break;
                }
            }
        }

        FANOUT_TARGETS
            .iter()
            .zip(slots)
            .map(|(target, finding)| {
                let finding = finding.unwrap_or_else(|| {
                    StrategyFinding::failed(AppError::Timeout(self.config.fanout_timeout))
                });
                (target.source(), finding)
            })
            .collect()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
