//! Error types for the company validation library.

use std::time::Duration;
use thiserror::Error;

/// Errors produced by the library.
///
/// Strategy-level failures are normally absorbed into a not-found finding, so
/// most of these only surface from initialization, configuration, or the
/// orchestrator boundary (where they are recorded in `details.error`).
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Insufficient input: {0}")]
    InsufficientInput(String),

    #[error("Browser engine unavailable: {0}")]
    BrowserUnavailable(String),

    #[error("WebDriver command failed: {0}")]
    WebDriver(#[from] fantoccini::error::CmdError),

    #[error("WebDriver session could not be created: {0}")]
    NewSession(#[from] fantoccini::error::NewSessionError),

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Domain extraction failed: {0}")]
    DomainExtraction(String),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Library result alias.
pub type Result<T> = std::result::Result<T, AppError>;
