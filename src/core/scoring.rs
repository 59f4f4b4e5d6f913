//! Turns strategy findings into a confidence score and status.

use crate::core::models::{SourceKind, StrategyFinding, ValidationResult, ValidationStatus};
use std::collections::BTreeMap;

const MULTI_SOURCE_BONUS: u32 = 10;
const MAX_CONFIDENCE: u32 = 100;

const HIGH_CONFIDENCE: u8 = 80;
const MEDIUM_CONFIDENCE: u8 = 50;
const LOW_CONFIDENCE: u8 = 20;

fn weight(source: SourceKind) -> u32 {
    match source {
        SourceKind::DirectDomain => 50,
        SourceKind::LinkedIn => 20,
        SourceKind::Wikipedia => 15,
        SourceKind::OfficialWebsite => 30,
    }
}

/// Scores `findings` (given in execution order) and builds the final result.
///
/// Every finding is recorded under its detail key; only positive ones add
/// weight and appear in `sources`.
pub(crate) fn aggregate(
    company_name: &str,
    findings: &[(SourceKind, StrategyFinding)],
) -> ValidationResult {
    let mut score = 0u32;
    let mut sources: Vec<String> = Vec::new();
    let mut details = BTreeMap::new();

    for (source, finding) in findings {
        if finding.found && !sources.iter().any(|s| s == source.label()) {
            score += weight(*source);
            sources.push(source.label().to_string());
        }
        match serde_json::to_value(finding) {
            Ok(value) => {
                details.insert(source.detail_key().to_string(), value);
            }
            Err(e) => {
                tracing::warn!(target: "validator", "Could not record {} finding: {}", source.label(), e);
            }
        }
    }

    if sources.len() >= 2 {
        score += MULTI_SOURCE_BONUS;
    }
    let confidence = score.min(MAX_CONFIDENCE) as u8;
    let (status, message) = classify(company_name, confidence, &sources);

    ValidationResult {
        status,
        confidence,
        message,
        company_name: company_name.to_string(),
        suggestions: Vec::new(),
        sources,
        details,
    }
}

fn classify(company_name: &str, confidence: u8, sources: &[String]) -> (ValidationStatus, String) {
    let via = sources.join(", ");
    if confidence >= HIGH_CONFIDENCE {
        (
            ValidationStatus::Valid,
            format!("High confidence: {} verified via {}", company_name, via),
        )
    } else if confidence >= MEDIUM_CONFIDENCE {
        (
            ValidationStatus::Valid,
            format!("Medium confidence: {} found via {}", company_name, via),
        )
    } else if confidence >= LOW_CONFIDENCE {
        (
            ValidationStatus::Ambiguous,
            format!("Low confidence: Limited information found for {}", company_name),
        )
    } else {
        (
            ValidationStatus::Invalid,
            format!(
                "No reliable information found for '{}'. Please verify the company name.",
                company_name
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit() -> StrategyFinding {
        StrategyFinding {
            found: true,
            url: Some("https://example.com".to_string()),
            ..StrategyFinding::default()
        }
    }

    fn miss() -> StrategyFinding {
        StrategyFinding::not_found()
    }

    #[test]
    fn nothing_found_is_invalid() {
        let result = aggregate(
            "Acme Robotics",
            &[
                (SourceKind::DirectDomain, miss()),
                (SourceKind::LinkedIn, miss()),
                (SourceKind::Wikipedia, miss()),
            ],
        );
        assert_eq!(result.confidence, 0);
        assert_eq!(result.status, ValidationStatus::Invalid);
        assert!(result.sources.is_empty());
        assert_eq!(
            result.message,
            "No reliable information found for 'Acme Robotics'. Please verify the company name."
        );
        assert_eq!(result.details["direct_domain"], serde_json::json!({ "found": false }));
    }

    #[test]
    fn domain_alone_is_medium_confidence() {
        let result = aggregate("Initech", &[(SourceKind::DirectDomain, hit())]);
        assert_eq!(result.confidence, 50);
        assert_eq!(result.status, ValidationStatus::Valid);
        assert_eq!(result.message, "Medium confidence: Initech found via Direct Domain");
    }

    #[test]
    fn second_source_earns_bonus() {
        let with_wiki = aggregate(
            "Initech",
            &[
                (SourceKind::DirectDomain, hit()),
                (SourceKind::LinkedIn, miss()),
                (SourceKind::Wikipedia, hit()),
            ],
        );
        assert_eq!(with_wiki.confidence, 75);
        assert_eq!(with_wiki.status, ValidationStatus::Valid);
        assert!(with_wiki.message.starts_with("Medium confidence"));

        let with_linkedin = aggregate(
            "Initech",
            &[
                (SourceKind::DirectDomain, hit()),
                (SourceKind::LinkedIn, hit()),
            ],
        );
        assert_eq!(with_linkedin.confidence, 80);
        assert_eq!(
            with_linkedin.message,
            "High confidence: Initech verified via Direct Domain, LinkedIn"
        );
    }

    #[test]
    fn all_three_sources() {
        let result = aggregate(
            "Tesla",
            &[
                (SourceKind::DirectDomain, hit()),
                (SourceKind::LinkedIn, hit()),
                (SourceKind::Wikipedia, hit()),
            ],
        );
        assert_eq!(result.confidence, 95);
        assert_eq!(result.sources, vec!["Direct Domain", "LinkedIn", "Wikipedia"]);
    }

    #[test]
    fn score_is_capped() {
        let result = aggregate(
            "Tesla",
            &[
                (SourceKind::DirectDomain, hit()),
                (SourceKind::LinkedIn, hit()),
                (SourceKind::Wikipedia, hit()),
                (SourceKind::OfficialWebsite, hit()),
            ],
        );
        assert_eq!(result.confidence, 100);
    }

    #[test]
    fn official_website_alone_is_ambiguous() {
        let result = aggregate(
            "Initech",
            &[
                (SourceKind::DirectDomain, miss()),
                (SourceKind::OfficialWebsite, hit()),
            ],
        );
        assert_eq!(result.confidence, 30);
        assert_eq!(result.status, ValidationStatus::Ambiguous);
        assert_eq!(
            result.message,
            "Low confidence: Limited information found for Initech"
        );
        assert_eq!(result.sources, vec!["Official Website"]);
    }

    #[test]
    fn confidence_never_drops_when_sources_are_added() {
        let kinds = [
            SourceKind::DirectDomain,
            SourceKind::LinkedIn,
            SourceKind::Wikipedia,
            SourceKind::OfficialWebsite,
        ];
        let mut previous = 0;
        for n in 0..=kinds.len() {
            let findings: Vec<_> = kinds
                .iter()
                .enumerate()
                .map(|(i, kind)| (*kind, if i < n { hit() } else { miss() }))
                .collect();
            let confidence = aggregate("Initech", &findings).confidence;
            assert!(confidence >= previous);
            assert!(confidence <= 100);
            previous = confidence;
        }
    }
}
