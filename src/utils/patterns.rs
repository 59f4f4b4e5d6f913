//! Generates candidate web domains for a company name.

use crate::core::config::Config;
use crate::utils::matching::{acronym, alphanumeric_lower, company_words};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// A single DNS label under `.com`.
static DOMAIN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.com$")
        .expect("domain candidate pattern is a valid regex")
});

/// Generates likely `.com` domains for a company name, most likely first.
///
/// Transformations, in order:
/// 1. alphanumeric-only lowercase name
/// 2. lowercase name with spaces removed
/// 3. lowercase name with spaces replaced by hyphens
/// 4. the single word, for one-word names
/// 5. the acronym, for multi-word names
///
/// Duplicates and candidates that are not valid host names are dropped, and
/// the list is cut to `config.max_domain_candidates`.
pub(crate) fn generate_domain_candidates(config: &Config, company_name: &str) -> Vec<String> {
    let name = company_name.trim();
    if name.is_empty() {
        tracing::warn!("Cannot generate domain candidates: company name is empty");
        return Vec::new();
    }

    let lower = name.to_lowercase();
    let words = company_words(name);

    let mut raw = vec![
        alphanumeric_lower(name),
        lower.replace(' ', ""),
        lower.replace(' ', "-"),
    ];
    if words.len() == 1 {
        raw.push(words[0].clone());
    } else if words.len() > 1 {
        raw.push(acronym(&words));
    }

    let mut seen = HashSet::new();
    let candidates: Vec<String> = raw
        .into_iter()
        .map(|label| format!("{}.com", label))
        .filter(|domain| {
            let valid = DOMAIN_REGEX.is_match(domain);
            if !valid {
                tracing::trace!("Generated domain failed validation: {}", domain);
            }
            valid
        })
        .filter(|domain| seen.insert(domain.clone()))
        .take(config.max_domain_candidates)
        .collect();

    tracing::debug!(
        "Generated {} domain candidates for '{}': {:?}",
        candidates.len(),
        name,
        candidates
    );
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ConfigBuilder;

    fn test_config() -> Config {
        ConfigBuilder::new()
            .build()
            .expect("Failed to build default config for test")
    }

    #[test]
    fn single_word_collapses_to_one_candidate() {
        let config = test_config();
        assert_eq!(
            generate_domain_candidates(&config, "Tesla"),
            vec!["tesla.com".to_string()]
        );
    }

    #[test]
    fn multi_word_name_yields_ordered_variants() {
        let config = test_config();
        assert_eq!(
            generate_domain_candidates(&config, "Acme Robotics"),
            vec![
                "acmerobotics.com".to_string(),
                "acme-robotics.com".to_string(),
                "ar.com".to_string(),
            ]
        );
    }

    #[test]
    fn punctuation_variants_are_dropped() {
        let config = test_config();
        assert_eq!(
            generate_domain_candidates(&config, "AT&T"),
            vec!["att.com".to_string()]
        );
        assert_eq!(
            generate_domain_candidates(&config, "Procter & Gamble"),
            vec!["proctergamble.com".to_string(), "pg.com".to_string()]
        );
    }

    #[test]
    fn respects_candidate_limit() {
        let config = ConfigBuilder::new().max_domain_candidates(2).build().unwrap();
        let candidates = generate_domain_candidates(&config, "Acme Robotics");
        assert_eq!(
            candidates,
            vec!["acmerobotics.com".to_string(), "acme-robotics.com".to_string()]
        );
    }

    #[test]
    fn empty_or_symbol_only_names_yield_nothing() {
        let config = test_config();
        assert!(generate_domain_candidates(&config, "").is_empty());
        assert!(generate_domain_candidates(&config, "   ").is_empty());
        assert!(generate_domain_candidates(&config, "$%^").is_empty());
    }
}
