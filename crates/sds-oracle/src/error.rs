//! Oracle error types

use thiserror::Error;

/// Errors that can occur during oracle and completion calls
#[derive(Error, Debug)]
pub enum OracleError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Response could not be read
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Knowledge table could not be parsed
    #[error("Knowledge table parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Scripted failure from a test double
    #[error("Mock error: {0}")]
    Mock(String),
}
