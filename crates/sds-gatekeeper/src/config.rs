//! Gatekeeper configuration

use crate::GatekeeperError;
use sds_domain::scoring::{DEFAULT_FIELD_THRESHOLD, IDENTIFIER_FIELD_THRESHOLD};
use serde::{Deserialize, Serialize};

/// Configuration for field validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Run field-specific structural checks
    pub check_structure: bool,

    /// Confidence threshold for ordinary fields
    pub default_threshold: f64,

    /// Confidence threshold for registry and transport numbers
    pub identifier_threshold: f64,

    /// Width of the warning band below the threshold
    pub warning_band: f64,

    /// Lowest plausible flash point in °C
    pub flash_point_min_c: f64,

    /// Highest plausible flash point in °C
    pub flash_point_max_c: f64,

    /// Minimum digits in an emergency phone number
    pub min_phone_digits: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            check_structure: true,
            default_threshold: DEFAULT_FIELD_THRESHOLD,
            identifier_threshold: IDENTIFIER_FIELD_THRESHOLD,
            warning_band: 0.20,
            flash_point_min_c: -100.0,
            flash_point_max_c: 400.0,
            min_phone_digits: 7,
        }
    }
}

impl ValidationConfig {
    /// Create a lenient configuration (confidence only)
    pub fn lenient() -> Self {
        Self {
            check_structure: false,
            warning_band: 0.30,
            ..Self::default()
        }
    }

    /// Create a strict configuration (higher thresholds, narrow band)
    pub fn strict() -> Self {
        Self {
            check_structure: true,
            default_threshold: 0.80,
            identifier_threshold: 0.90,
            warning_band: 0.10,
            min_phone_digits: 8,
            ..Self::default()
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("default_threshold", self.default_threshold),
            ("identifier_threshold", self.identifier_threshold),
            ("warning_band", self.warning_band),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be between 0.0 and 1.0", name));
            }
        }

        if self.flash_point_min_c >= self.flash_point_max_c {
            return Err("flash_point_min_c must be below flash_point_max_c".to_string());
        }

        if self.min_phone_digits == 0 {
            return Err("min_phone_digits must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Load configuration from TOML
    pub fn from_toml(s: &str) -> Result<Self, GatekeeperError> {
        let config: ValidationConfig = toml::from_str(s)?;
        config.validate().map_err(GatekeeperError::Config)?;
        Ok(config)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, GatekeeperError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
