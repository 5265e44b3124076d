//! Chemical database configuration

use crate::ChemDbError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default PUG-REST base URL
pub const DEFAULT_BASE_URL: &str = "https://pubchem.ncbi.nlm.nih.gov/rest";

/// Configuration for the guarded chemical database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChemDbConfig {
    /// PUG-REST base URL
    pub base_url: String,

    /// Minimum milliseconds between requests
    pub min_interval_ms: u64,

    /// Maximum cached responses
    pub cache_capacity: usize,

    /// Cached response lifetime in seconds
    pub cache_ttl_secs: u64,

    /// Timeout for one guarded lookup in seconds
    pub lookup_timeout_secs: u64,

    /// HTTP timeout in seconds
    pub http_timeout_secs: u64,
}

impl Default for ChemDbConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            // PubChem asks for at most 5 requests per second
            min_interval_ms: 200,
            cache_capacity: 1000,
            cache_ttl_secs: 3600,
            lookup_timeout_secs: 10,
            http_timeout_secs: 8,
        }
    }
}

impl ChemDbConfig {
    /// Short timeouts and a small cache
    pub fn aggressive() -> Self {
        Self {
            lookup_timeout_secs: 3,
            http_timeout_secs: 2,
            cache_capacity: 200,
            ..Self::default()
        }
    }

    /// Slow, patient lookups with long-lived cache entries
    pub fn lenient() -> Self {
        Self {
            min_interval_ms: 500,
            cache_capacity: 5000,
            cache_ttl_secs: 24 * 3600,
            lookup_timeout_secs: 30,
            http_timeout_secs: 25,
            ..Self::default()
        }
    }

    /// Minimum interval between requests
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    /// Cache entry lifetime
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Guarded lookup timeout
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.trim().is_empty() {
            return Err("base_url must not be empty".to_string());
        }
        if self.lookup_timeout_secs == 0 {
            return Err("lookup_timeout_secs must be greater than 0".to_string());
        }
        if self.http_timeout_secs == 0 {
            return Err("http_timeout_secs must be greater than 0".to_string());
        }
        if self.http_timeout_secs > self.lookup_timeout_secs {
            return Err("http_timeout_secs must not exceed lookup_timeout_secs".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML
    pub fn from_toml(s: &str) -> Result<Self, ChemDbError> {
        let config: ChemDbConfig = toml::from_str(s)?;
        config.validate().map_err(ChemDbError::Config)?;
        Ok(config)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, ChemDbError> {
        toml::to_string_pretty(self).map_err(|e| ChemDbError::Config(e.to_string()))
    }
}
