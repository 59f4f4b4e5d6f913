//! Search-engine lookups: site-scoped queries driven through the browser.

use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::models::{SourceKind, StrategyFinding};
use crate::utils::domain::{get_domain_from_url, is_likely_official_domain};
use crate::utils::matching::text_mentions_company;
use crate::verification::headless::{Browser, Link, Page, PageGuard};

use std::sync::Arc;
use url::Url;

const LINKEDIN_COMPANY_PATH: &str = "linkedin.com/company";
const WIKIPEDIA_ARTICLE_PATH: &str = "wikipedia.org/wiki/";
const SEARCH_REDIRECT_MARKER: &str = "/l/?uddg=";
/// Organic results inspected by the official-website lookup.
const OFFICIAL_SITE_RESULTS_SCANNED: usize = 5;

/// Which third-party index a lookup consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SearchTarget {
    ProfessionalNetwork,
    Encyclopedia,
    OfficialWebsite,
}

impl SearchTarget {
    pub(crate) fn source(&self) -> SourceKind {
        match self {
            SearchTarget::ProfessionalNetwork => SourceKind::LinkedIn,
            SearchTarget::Encyclopedia => SourceKind::Wikipedia,
            SearchTarget::OfficialWebsite => SourceKind::OfficialWebsite,
        }
    }

    pub(crate) fn query(&self, company_name: &str) -> String {
        match self {
            SearchTarget::ProfessionalNetwork => {
                format!("site:{} \"{}\"", LINKEDIN_COMPANY_PATH, company_name)
            }
            SearchTarget::Encyclopedia => format!("site:wikipedia.org \"{}\"", company_name),
            SearchTarget::OfficialWebsite => format!("\"{}\" official website", company_name),
        }
    }

    /// Each target browses with its own user agent.
    fn user_agent_index(&self) -> usize {
        match self {
            SearchTarget::OfficialWebsite => 0,
            SearchTarget::ProfessionalNetwork => 1,
            SearchTarget::Encyclopedia => 2,
        }
    }

    /// Picks the first qualifying link, if any.
    pub(crate) fn select(&self, links: &[Link], company_name: &str) -> Option<StrategyFinding> {
        match self {
            SearchTarget::ProfessionalNetwork => match_professional_network(links, company_name),
            SearchTarget::Encyclopedia => match_encyclopedia(links, company_name),
            SearchTarget::OfficialWebsite => match_official_website(links, company_name),
        }
    }
}

fn link_finding(link: &Link, domain: Option<String>) -> StrategyFinding {
    StrategyFinding {
        found: true,
        url: Some(link.href.clone()),
        title: Some(link.text.trim().to_string()),
        domain,
        status: None,
        error: None,
    }
}

/// Company-profile URL that also carries the squashed company name.
pub(crate) fn match_professional_network(
    links: &[Link],
    company_name: &str,
) -> Option<StrategyFinding> {
    let squashed = company_name.trim().to_lowercase().replace(' ', "");
    if squashed.is_empty() {
        return None;
    }
    links
        .iter()
        .find(|link| {
            link.href.contains(LINKEDIN_COMPANY_PATH)
                && link.href.to_lowercase().contains(&squashed)
        })
        .map(|link| link_finding(link, None))
}

/// Article URL whose link text mentions the company.
pub(crate) fn match_encyclopedia(links: &[Link], company_name: &str) -> Option<StrategyFinding> {
    links
        .iter()
        .find(|link| {
            link.href.contains(WIKIPEDIA_ARTICLE_PATH)
                && !link.text.trim().is_empty()
                && text_mentions_company(&link.text, company_name)
        })
        .map(|link| link_finding(link, None))
}

/// First non-redirect result on a domain that plausibly belongs to the company.
pub(crate) fn match_official_website(
    links: &[Link],
    company_name: &str,
) -> Option<StrategyFinding> {
    links
        .iter()
        .filter(|link| !link.href.contains(SEARCH_REDIRECT_MARKER))
        .find(|link| is_likely_official_domain(&link.href, company_name))
        .map(|link| link_finding(link, get_domain_from_url(&link.href).ok()))
}

/// Builds `<engine>?q=<query>` with proper encoding.
pub(crate) fn build_search_url(search_engine_url: &str, query: &str) -> Result<Url> {
    Ok(Url::parse_with_params(search_engine_url, &[("q", query)])?)
}

/// Runs one search-engine lookup per call; cheap to clone into spawned tasks.
#[derive(Clone)]
pub(crate) struct SearchLookup {
    config: Arc<Config>,
    browser: Arc<dyn Browser>,
}

impl SearchLookup {
    pub(crate) fn new(config: Arc<Config>, browser: Arc<dyn Browser>) -> Self {
        Self { config, browser }
    }

    /// Looks the company up on `target`. Failures become a not-found finding
    /// carrying the error text; nothing propagates.
    pub(crate) async fn lookup(&self, target: SearchTarget, company_name: &str) -> StrategyFinding {
        match self.run(target, company_name).await {
            Ok(finding) => {
                if finding.found {
                    tracing::info!(target: "search_lookup", "[{}] {:?} match: {:?}", company_name, target, finding.url);
                } else {
                    tracing::debug!(target: "search_lookup", "[{}] {:?} found nothing", company_name, target);
                }
                finding
            }
            Err(e) => {
                tracing::warn!(target: "search_lookup", "[{}] {:?} search failed: {}", company_name, target, e);
                StrategyFinding::failed(e)
            }
        }
    }

    async fn run(&self, target: SearchTarget, company_name: &str) -> Result<StrategyFinding> {
        let url = build_search_url(&self.config.search_engine_url, &target.query(company_name))?;
        let user_agent = self.config.user_agent(target.user_agent_index());

        let page = PageGuard::new(self.browser.new_page(user_agent).await?);
        let outcome = self.scan_results(&*page, target, url.as_str()).await;
        page.close().await;

        let links = outcome?;
        Ok(target
            .select(&links, company_name)
            .unwrap_or_else(StrategyFinding::not_found))
    }

    /// Profile and article lookups scan the first page anchors; the official
    /// website lookup reads only links inside organic result blocks, so
    /// engine navigation and ads never qualify.
    async fn scan_results(
        &self,
        page: &dyn Page,
        target: SearchTarget,
        url: &str,
    ) -> Result<Vec<Link>> {
        page.goto(url, self.config.search_navigation_timeout).await?;
        self.await_results(page).await?;
        match target {
            SearchTarget::OfficialWebsite => {
                page.result_links(
                    &self.config.result_selector,
                    &self.config.result_link_selector,
                    OFFICIAL_SITE_RESULTS_SCANNED,
                )
                .await
            }
            _ => page.links(self.config.max_links_scanned).await,
        }
    }

    /// Waits for result markup; falls back to a fixed render delay only when
    /// the structural wait times out.
    async fn await_results(&self, page: &dyn Page) -> Result<()> {
        let ready = page
            .wait_for(&self.config.result_selector, self.config.selector_wait_timeout)
            .await?;
        if !ready {
            tracing::debug!(target: "search_lookup", "Result markup not seen, sleeping {:?}", self.config.render_delay);
            tokio::time::sleep(self.config.render_delay).await;
        }
        Ok(())
    }
}
