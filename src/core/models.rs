//! Value types returned by the validator and produced by its strategies.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Final classification of a company name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Valid,
    Ambiguous,
    Invalid,
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationStatus::Valid => write!(f, "valid"),
            ValidationStatus::Ambiguous => write!(f, "ambiguous"),
            ValidationStatus::Invalid => write!(f, "invalid"),
        }
    }
}

/// The evidence sources a validation run can draw on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    DirectDomain,
    LinkedIn,
    Wikipedia,
    OfficialWebsite,
}

impl SourceKind {
    /// Human-readable name, as listed in `ValidationResult::sources`.
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::DirectDomain => "Direct Domain",
            SourceKind::LinkedIn => "LinkedIn",
            SourceKind::Wikipedia => "Wikipedia",
            SourceKind::OfficialWebsite => "Official Website",
        }
    }

    /// Key under which the raw finding is stored in `ValidationResult::details`.
    pub fn detail_key(&self) -> &'static str {
        match self {
            SourceKind::DirectDomain => "direct_domain",
            SourceKind::LinkedIn => "linkedin",
            SourceKind::Wikipedia => "wikipedia",
            SourceKind::OfficialWebsite => "official_website",
        }
    }
}

/// Raw outcome of a single strategy. Only `found == true` contributes evidence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyFinding {
    pub found: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StrategyFinding {
    pub fn not_found() -> Self {
        Self::default()
    }

    /// A not-found finding that remembers why the strategy gave up.
    pub fn failed(error: impl fmt::Display) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::default()
        }
    }
}

/// Result of validating one company name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub status: ValidationStatus,
    /// 0-100.
    pub confidence: u8,
    pub message: String,
    /// The caller's input, not normalized.
    pub company_name: String,
    /// Alternative names for ambiguous inputs. No current source produces these.
    pub suggestions: Vec<String>,
    /// Labels of the sources that reported a positive finding, in execution order.
    pub sources: Vec<String>,
    pub details: BTreeMap<String, serde_json::Value>,
}

impl ValidationResult {
    /// Terminal result for a run that failed internally.
    pub fn failure(company_name: &str, error: impl fmt::Display) -> Self {
        let mut details = BTreeMap::new();
        details.insert(
            "error".to_string(),
            serde_json::Value::String(error.to_string()),
        );
        Self {
            status: ValidationStatus::Invalid,
            confidence: 0,
            message: "Validation failed due to technical error".to_string(),
            company_name: company_name.to_string(),
            suggestions: Vec::new(),
            sources: Vec::new(),
            details,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status == ValidationStatus::Valid
    }

    /// Error text recorded by a failed run, if any.
    pub fn error(&self) -> Option<&str> {
        self.details.get("error").and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ValidationStatus::Ambiguous).unwrap(),
            "\"ambiguous\""
        );
    }

    #[test]
    fn failure_records_error_detail() {
        let result = ValidationResult::failure("Initech", "webdriver went away");
        assert_eq!(result.status, ValidationStatus::Invalid);
        assert_eq!(result.confidence, 0);
        assert!(result.sources.is_empty());
        assert_eq!(result.error(), Some("webdriver went away"));
    }

    #[test]
    fn finding_omits_empty_fields() {
        let json = serde_json::to_value(StrategyFinding::not_found()).unwrap();
        assert_eq!(json, serde_json::json!({ "found": false }));
    }
}
