//! Error types for background indexing

use thiserror::Error;

/// Errors that can occur while running the indexer pool
#[derive(Error, Debug)]
pub enum IndexerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parse error
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("Config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Worker error (panicked or cancelled task)
    #[error("Worker error: {0}")]
    Worker(String),
}
