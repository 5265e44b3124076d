//! Oracle endpoint configuration

use crate::OracleError;
use serde::{Deserialize, Serialize};

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default model
pub const DEFAULT_MODEL: &str = "llama3.2";

/// Configuration for a model-backed oracle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Base URL of the model server
    pub endpoint: String,

    /// Model name
    pub model: String,

    /// HTTP timeout per request in seconds
    pub timeout_secs: u64,

    /// Attempts per call (1 = no retry)
    pub max_retries: u32,

    /// First backoff delay in milliseconds; doubles per attempt
    pub backoff_base_ms: u64,

    /// Confidence reported when the model gives none
    pub default_confidence: f64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: 30,
            max_retries: 3,
            backoff_base_ms: 500,
            default_confidence: 0.70,
        }
    }
}

impl OracleConfig {
    /// Fail fast: short timeout and a single attempt
    pub fn aggressive() -> Self {
        Self {
            timeout_secs: 10,
            max_retries: 1,
            backoff_base_ms: 0,
            ..Self::default()
        }
    }

    /// Tolerate slow local models
    pub fn lenient() -> Self {
        Self {
            timeout_secs: 120,
            max_retries: 5,
            backoff_base_ms: 1000,
            ..Self::default()
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.endpoint.trim().is_empty() {
            return Err("endpoint must not be empty".to_string());
        }
        if self.model.trim().is_empty() {
            return Err("model must not be empty".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }
        if self.max_retries == 0 {
            return Err("max_retries must be at least 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.default_confidence) {
            return Err("default_confidence must be between 0.0 and 1.0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML
    pub fn from_toml(s: &str) -> Result<Self, OracleError> {
        let config: OracleConfig = toml::from_str(s)?;
        config.validate().map_err(OracleError::Config)?;
        Ok(config)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, OracleError> {
        toml::to_string_pretty(self).map_err(|e| OracleError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OracleConfig::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.max_retries, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(OracleConfig::aggressive().validate().is_ok());
        assert!(OracleConfig::lenient().validate().is_ok());
        assert!(OracleConfig::aggressive().timeout_secs < OracleConfig::lenient().timeout_secs);
    }

    #[test]
    fn test_from_toml() {
        let config = OracleConfig::from_toml("model = \"mistral\"\nmax_retries = 2").unwrap();
        assert_eq!(config.model, "mistral");
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_rejects_zero_retries() {
        assert!(matches!(
            OracleConfig::from_toml("max_retries = 0"),
            Err(OracleError::Config(_))
        ));
    }
}
