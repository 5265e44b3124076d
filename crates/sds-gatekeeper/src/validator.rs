//! Field validation logic

use crate::structure::{self, StructuralCheck};
use crate::ValidationConfig;
use sds_domain::{fields, FieldExtraction, ValidationStatus};

/// Message used for empty values
pub const NOT_FOUND: &str = "not found";

/// Result of validating one field value
#[derive(Debug, Clone, PartialEq)]
pub struct FieldVerdict {
    /// Resulting status
    pub status: ValidationStatus,

    /// Why the status is not `Valid` (if it isn't)
    pub message: Option<String>,

    /// Canonical form of the value, when it could be read
    pub normalized: Option<String>,
}

/// The FieldValidator maps a value and its confidence to a status
#[derive(Debug, Clone, Default)]
pub struct FieldValidator {
    config: ValidationConfig,
}

impl FieldValidator {
    /// Create a new FieldValidator with the given configuration
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Confidence threshold for a field
    pub fn threshold_for(&self, field: &str) -> f64 {
        match field {
            fields::CAS_NUMBER | fields::UN_NUMBER => self.config.identifier_threshold,
            _ => self.config.default_threshold,
        }
    }

    /// Canonical form of a value
    pub fn normalize(&self, field: &str, value: &str) -> Option<String> {
        structure::normalize(field, value)
    }

    /// Whether a value passes the structural checks of its field
    pub fn is_structurally_valid(&self, field: &str, value: &str) -> bool {
        let normalized = structure::normalize(field, value);
        let candidate = normalized.as_deref().unwrap_or(value);
        !value.trim().is_empty()
            && !matches!(
                structure::check(field, candidate, &self.config),
                StructuralCheck::Fail(_)
            )
    }

    /// Validate a value at a given confidence
    ///
    /// Empty values are `Invalid` with message "not found". A structural
    /// failure is `Invalid`, a soft structural issue caps the status at
    /// `Warning`. Otherwise `confidence >= t` is `Valid`, `>= t - band`
    /// is `Warning` and anything lower is `Invalid`.
    pub fn validate(&self, field: &str, value: &str, confidence: f64) -> FieldVerdict {
        if value.trim().is_empty() {
            return FieldVerdict {
                status: ValidationStatus::Invalid,
                message: Some(NOT_FOUND.to_string()),
                normalized: None,
            };
        }

        let normalized = structure::normalize(field, value);
        let mut status = self.confidence_status(field, confidence);
        let mut message = match status {
            ValidationStatus::Valid => None,
            _ => Some(format!(
                "confidence {:.2} below threshold {:.2}",
                confidence,
                self.threshold_for(field)
            )),
        };

        if self.config.check_structure {
            let candidate = normalized.as_deref().unwrap_or(value);
            match structure::check(field, candidate, &self.config) {
                StructuralCheck::Ok => {}
                StructuralCheck::Soft(reason) => {
                    if status == ValidationStatus::Valid {
                        status = ValidationStatus::Warning;
                    }
                    message = Some(reason);
                }
                StructuralCheck::Fail(reason) => {
                    status = ValidationStatus::Invalid;
                    message = Some(reason);
                }
            }
        }

        FieldVerdict {
            status,
            message,
            normalized,
        }
    }

    /// Validate an extraction in place, appending any message
    pub fn apply(&self, extraction: &mut FieldExtraction) {
        let verdict = self.validate(&extraction.field_name, &extraction.value, extraction.confidence());
        extraction.validation_status = verdict.status;
        if let Some(message) = verdict.message {
            extraction.push_message(message);
        }
    }

    fn confidence_status(&self, field: &str, confidence: f64) -> ValidationStatus {
        let threshold = self.threshold_for(field);
        if confidence >= threshold {
            ValidationStatus::Valid
        } else if confidence >= threshold - self.config.warning_band {
            ValidationStatus::Warning
        } else {
            ValidationStatus::Invalid
        }
    }
}
