//! Error types for the extractor

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during extraction
///
/// Only document-level failures leave [`crate::SdsExtractor::process`];
/// per-field problems are recorded as
/// [`FieldFailure`](sds_domain::FieldFailure)s and collaborator errors are
/// treated as "no answer".
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Text exceeds maximum length
    #[error("Text too long: {0} chars (max: {1})")]
    TextTooLong(usize, usize),

    /// Collaborator call did not finish in time
    #[error("Collaborator timeout after {0:?}")]
    Timeout(Duration),

    /// Collaborator returned an error
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    /// Blocking task panicked or was cancelled
    #[error("Task join error: {0}")]
    Join(String),

    /// Extraction store error
    #[error("Store error: {0}")]
    Store(String),

    /// Manufacturer profile error
    #[error("Profile error: {0}")]
    Profile(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// Document file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::JsonParse(e.to_string())
    }
}
