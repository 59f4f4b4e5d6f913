//! Cheap existence check: does the company plausibly own a reachable domain?

use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::models::StrategyFinding;
use crate::utils::matching::title_matches_company;
use crate::utils::patterns::generate_domain_candidates;
use crate::verification::headless::{Browser, Page, PageGuard};

use std::sync::Arc;

/// Statuses returned by live sites that refuse automated visitors.
const PROTECTED_STATUSES: [u16; 2] = [403, 429];

/// Navigates to speculative company domains and accepts the first one that
/// looks like it belongs to the company.
#[derive(Clone)]
pub(crate) struct DomainProbe {
    config: Arc<Config>,
    browser: Arc<dyn Browser>,
}

impl DomainProbe {
    pub(crate) fn new(config: Arc<Config>, browser: Arc<dyn Browser>) -> Self {
        Self { config, browser }
    }

    /// Tries each candidate domain in order and stops at the first hit.
    ///
    /// Per-candidate failures (page acquisition, DNS, timeouts) are logged and
    /// treated as "not this one"; this never fails as a whole.
    pub(crate) async fn probe(&self, company_name: &str) -> StrategyFinding {
        let candidates = generate_domain_candidates(&self.config, company_name);
        let total = candidates.len();

        for (index, domain) in candidates.into_iter().enumerate() {
            let label = format!("[{}:{}/{}] {}", company_name, index + 1, total, domain);

            let page = match self.browser.new_page(None).await {
                Ok(page) => PageGuard::new(page),
                Err(e) => {
                    tracing::debug!(target: "domain_probe", "{} Could not open page: {}", label, e);
                    continue;
                }
            };
            let outcome = self.check_candidate(&*page, company_name, &domain).await;
            page.close().await;

            match outcome {
                Ok(Some(finding)) => {
                    tracing::info!(target: "domain_probe", "{} Accepted (status {:?})", label, finding.status);
                    return finding;
                }
                Ok(None) => {
                    tracing::debug!(target: "domain_probe", "{} Rejected", label);
                }
                Err(e) => {
                    tracing::debug!(target: "domain_probe", "{} Not reachable: {}", label, e);
                }
            }
        }

        tracing::info!(target: "domain_probe", "No candidate domain matched '{}'", company_name);
        StrategyFinding::not_found()
    }

    async fn check_candidate(
        &self,
        page: &dyn Page,
        company_name: &str,
        domain: &str,
    ) -> Result<Option<StrategyFinding>> {
        let url = format!("https://{}", domain);
        let response = page
            .goto(&url, self.config.probe_navigation_timeout)
            .await?;

        if response.status < 400 {
            let title = page.title().await?;
            if title_matches_company(&title, company_name) {
                return Ok(Some(StrategyFinding {
                    found: true,
                    url: Some(url),
                    title: Some(title),
                    domain: Some(domain.to_string()),
                    status: Some(response.status),
                    error: None,
                }));
            }
            tracing::debug!(target: "domain_probe", "Title '{}' of {} does not mention '{}'", title, domain, company_name);
            return Ok(None);
        }

        if PROTECTED_STATUSES.contains(&response.status) {
            return Ok(Some(StrategyFinding {
                found: true,
                url: Some(url),
                title: Some(format!("{} (Protected Domain)", company_name)),
                domain: Some(domain.to_string()),
                status: Some(response.status),
                error: None,
            }));
        }

        Ok(None)
    }
}
