//! Configuration for the extractor

use crate::ExtractorError;
use sds_composition::ParserConfig;
use sds_domain::fields;
use sds_gatekeeper::ValidationConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the extraction orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Fields below this pattern confidence are sent to the oracle
    pub escalation_threshold: f64,

    /// Fields a complete record must carry
    pub required_fields: Vec<String>,

    /// Completeness below which the completion pass runs
    pub completion_trigger: f64,

    /// Timeout for one oracle call (seconds)
    pub oracle_timeout_secs: u64,

    /// Timeout for one domain-completion call (seconds)
    pub completion_timeout_secs: u64,

    /// Timeout for one chemical-database validation (seconds)
    pub lookup_timeout_secs: u64,

    /// Maximum input text length (characters)
    pub max_text_length: usize,

    /// Concurrent collaborator calls within one pass
    pub max_concurrent_lookups: usize,

    /// Factor applied to the weaker field of an inconsistent pair
    pub cross_field_penalty: f64,

    /// Confidence given to oracle answers that carry none
    pub default_oracle_confidence: f64,

    /// Validation boost for a chemical-database match
    pub external_match_boost: f64,

    /// Boost for a value corroborated by another field
    pub cross_validation_boost: f64,

    /// Characters of context kept on each side of a pattern match
    pub context_chars: usize,

    /// Field validation settings
    pub validation: ValidationConfig,

    /// Ingredient parser settings
    pub parser: ParserConfig,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            escalation_threshold: 0.82,
            required_fields: fields::DEFAULT_REQUIRED_FIELDS.iter().map(|f| f.to_string()).collect(),
            completion_trigger: 0.8,
            oracle_timeout_secs: 60,
            completion_timeout_secs: 20,
            lookup_timeout_secs: 15,
            max_text_length: 200_000,
            max_concurrent_lookups: 4,
            cross_field_penalty: 0.7,
            default_oracle_confidence: 0.70,
            external_match_boost: 0.15,
            cross_validation_boost: 0.20,
            context_chars: 60,
            validation: ValidationConfig::default(),
            parser: ParserConfig::default(),
        }
    }
}

impl ExtractorConfig {
    /// Aggressive preset: escalate more, shorter timeouts
    pub fn aggressive() -> Self {
        Self {
            escalation_threshold: 0.90,
            completion_trigger: 0.9,
            oracle_timeout_secs: 30,
            completion_timeout_secs: 10,
            lookup_timeout_secs: 8,
            max_concurrent_lookups: 8,
            ..Self::default()
        }
    }

    /// Lenient preset: trust patterns more, wait longer
    pub fn lenient() -> Self {
        Self {
            escalation_threshold: 0.70,
            completion_trigger: 0.6,
            oracle_timeout_secs: 180,
            completion_timeout_secs: 60,
            lookup_timeout_secs: 30,
            max_concurrent_lookups: 2,
            validation: ValidationConfig::lenient(),
            ..Self::default()
        }
    }

    /// Oracle timeout as Duration
    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs)
    }

    /// Completion timeout as Duration
    pub fn completion_timeout(&self) -> Duration {
        Duration::from_secs(self.completion_timeout_secs)
    }

    /// Chemical-database timeout as Duration
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        let unit = [
            ("escalation_threshold", self.escalation_threshold),
            ("completion_trigger", self.completion_trigger),
            ("cross_field_penalty", self.cross_field_penalty),
            ("default_oracle_confidence", self.default_oracle_confidence),
            ("external_match_boost", self.external_match_boost),
            ("cross_validation_boost", self.cross_validation_boost),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be in [0.0, 1.0], got {}", name, value));
            }
        }
        if self.max_text_length == 0 {
            return Err("max_text_length must be greater than 0".to_string());
        }
        if self.max_concurrent_lookups == 0 {
            return Err("max_concurrent_lookups must be at least 1".to_string());
        }
        if self.oracle_timeout_secs == 0 || self.completion_timeout_secs == 0 || self.lookup_timeout_secs == 0 {
            return Err("timeouts must be greater than 0".to_string());
        }
        if let Some(unknown) = self.required_fields.iter().find(|f| !fields::is_known(f)) {
            return Err(format!("unknown required field '{}'", unknown));
        }
        self.validation.validate()
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ExtractorError> {
        let config: ExtractorConfig = toml::from_str(toml_str)?;
        config.validate().map_err(ExtractorError::Config)?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ExtractorError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
