//! Configuration for the indexer pool

use crate::IndexerError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for background indexing
///
/// # Examples
///
/// ```
/// use sds_indexer::IndexerConfig;
///
/// let config = IndexerConfig::default();
/// assert_eq!(config.workers, 2);
///
/// let config = IndexerConfig::aggressive();
/// assert_eq!(config.workers, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Number of worker tasks
    pub workers: usize,

    /// Bounded queue size; dispatches beyond it are dropped
    pub queue_capacity: usize,

    /// Timeout for one index call (in seconds)
    pub index_timeout_secs: u64,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            queue_capacity: 64,
            index_timeout_secs: 30,
        }
    }
}

impl IndexerConfig {
    /// More workers and a deeper queue for batch imports
    pub fn aggressive() -> Self {
        Self {
            workers: 4,
            queue_capacity: 256,
            index_timeout_secs: 10,
        }
    }

    /// Single worker with a short queue
    pub fn lenient() -> Self {
        Self {
            workers: 1,
            queue_capacity: 16,
            index_timeout_secs: 60,
        }
    }

    /// Index call timeout as Duration
    pub fn index_timeout(&self) -> Duration {
        Duration::from_secs(self.index_timeout_secs)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("workers must be at least 1".to_string());
        }
        if self.queue_capacity == 0 {
            return Err("queue_capacity must be at least 1".to_string());
        }
        if self.index_timeout_secs == 0 {
            return Err("index_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML
    pub fn from_toml(s: &str) -> Result<Self, IndexerError> {
        let config: IndexerConfig = toml::from_str(s)?;
        config.validate().map_err(IndexerError::Config)?;
        Ok(config)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, IndexerError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = IndexerConfig::default();
        assert_eq!(config.queue_capacity, 64);
        assert_eq!(config.index_timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        assert!(IndexerConfig::aggressive().workers > IndexerConfig::default().workers);
        assert!(IndexerConfig::lenient().queue_capacity < IndexerConfig::default().queue_capacity);
        assert!(IndexerConfig::aggressive().validate().is_ok());
        assert!(IndexerConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = IndexerConfig {
            workers: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(matches!(
            IndexerConfig::from_toml("workers = 0"),
            Err(IndexerError::Config(_))
        ));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = IndexerConfig::from_toml("queue_capacity = 8").unwrap();
        assert_eq!(config.queue_capacity, 8);
        assert_eq!(config.workers, 2);
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = IndexerConfig::aggressive();
        let text = config.to_toml().unwrap();
        assert_eq!(IndexerConfig::from_toml(&text).unwrap(), config);

        let json = serde_json::to_string(&config).unwrap();
        let back: IndexerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
