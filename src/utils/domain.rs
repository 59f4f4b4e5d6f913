//! Utility functions for handling domain names and URLs.

use crate::core::error::{AppError, Result};
use crate::utils::matching::{acronym, alphanumeric_lower, company_words};
use url::Url;

/// Hosts that never count as a company's own website.
const NON_OFFICIAL_HOSTS: [&str; 5] = [
    "facebook.com",
    "twitter.com",
    "linkedin.com",
    "youtube.com",
    "wikipedia.org",
];

fn with_scheme(input: &str) -> String {
    if input.contains("://") {
        input.to_string()
    } else {
        format!("https://{}", input)
    }
}

/// Lower-cased host of a URL or bare domain, without a leading `www.`.
///
/// `Err(AppError::DomainExtraction)` for empty input or a host without a dot.
pub(crate) fn get_domain_from_url(website_url_or_domain: &str) -> Result<String> {
    let input = website_url_or_domain.trim();
    if input.is_empty() {
        return Err(AppError::DomainExtraction("input is empty".to_string()));
    }

    let url = Url::parse(&with_scheme(input))?;
    let host = url
        .host_str()
        .ok_or_else(|| AppError::DomainExtraction(format!("no host in {}", url)))?;
    let domain = host.strip_prefix("www.").unwrap_or(host).to_lowercase();

    let labels_ok = domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.');
    if !labels_ok {
        return Err(AppError::DomainExtraction(format!(
            "'{}' is not a usable domain",
            domain
        )));
    }
    Ok(domain)
}

/// Parses `website_url_str` as a URL with a host, defaulting the scheme to https.
pub(crate) fn normalize_url(website_url_str: &str) -> Result<Url> {
    let input = website_url_str.trim();
    if input.is_empty() {
        return Err(AppError::InsufficientInput("URL input is empty".to_string()));
    }

    let url = Url::parse(&with_scheme(input))?;
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(AppError::UrlParse(url::ParseError::EmptyHost)),
    }
}

/// Heuristic check that a search-result URL points at the company's own site.
///
/// Accepts when the domain contains the squashed company name, when a longer
/// company word appears in a short domain, or when the acronym of a
/// multi-word name appears in the domain. Social and encyclopedia hosts are
/// always rejected.
pub(crate) fn is_likely_official_domain(url: &str, company_name: &str) -> bool {
    let domain = match get_domain_from_url(url) {
        Ok(d) => d,
        Err(_) => return false,
    };

    if NON_OFFICIAL_HOSTS.iter().any(|site| domain.contains(site)) {
        return false;
    }

    let company_clean = alphanumeric_lower(company_name);
    let domain_clean = domain.replace(['-', '.'], "");
    if !company_clean.is_empty() && domain_clean.contains(&company_clean) {
        return true;
    }

    let words = company_words(company_name);
    let short_domain = domain.len() < 30 && domain.matches('.').count() <= 3;
    if short_domain
        && words
            .iter()
            .any(|word| word.chars().count() > 3 && domain.contains(word.as_str()))
    {
        return true;
    }

    if words.len() > 1 {
        let initials = acronym(&words);
        if initials.len() >= 2 && domain.contains(&initials) {
            return true;
        }
    }

    false
}
