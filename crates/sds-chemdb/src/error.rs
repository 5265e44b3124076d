//! Chemical database error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during chemical database lookups
#[derive(Error, Debug)]
pub enum ChemDbError {
    /// Network or HTTP error
    #[error("HTTP error: {0}")]
    Http(String),

    /// Response body could not be read
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Lookup did not finish in time
    #[error("Lookup timed out after {0:?}")]
    Timeout(Duration),

    /// Blocking task failed
    #[error("Task join error: {0}")]
    Join(String),

    /// Error reported by the wrapped database
    #[error("Backend error: {0}")]
    Backend(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration could not be parsed
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
