//! Field extraction records - one current value per (document, field)

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Where a field value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionSource {
    /// Rule-based pattern extraction
    Pattern,
    /// Model-based oracle extractor
    Oracle,
    /// Domain-knowledge completion service
    DomainCompletion,
    /// Value rewritten into canonical form after extraction
    Normalized,
    /// External chemical database
    ExternalApi,
    /// Value corroborated by an independent field
    CrossValidated,
}

impl ExtractionSource {
    /// Get the source name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionSource::Pattern => "pattern",
            ExtractionSource::Oracle => "oracle",
            ExtractionSource::DomainCompletion => "domain_completion",
            ExtractionSource::Normalized => "normalized",
            ExtractionSource::ExternalApi => "external_api",
            ExtractionSource::CrossValidated => "cross_validated",
        }
    }

    /// Parse a source from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pattern" => Some(ExtractionSource::Pattern),
            "oracle" | "llm" => Some(ExtractionSource::Oracle),
            "domain_completion" => Some(ExtractionSource::DomainCompletion),
            "normalized" => Some(ExtractionSource::Normalized),
            "external_api" => Some(ExtractionSource::ExternalApi),
            "cross_validated" => Some(ExtractionSource::CrossValidated),
            _ => None,
        }
    }
}

/// Validation status of a field value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// Trustworthy
    Valid,
    /// Usable but suspect
    Warning,
    /// Missing or structurally wrong
    Invalid,
    /// Not yet validated
    Pending,
}

impl ValidationStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStatus::Valid => "valid",
            ValidationStatus::Warning => "warning",
            ValidationStatus::Invalid => "invalid",
            ValidationStatus::Pending => "pending",
        }
    }
}

/// The current extraction of one field of one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldExtraction {
    /// Schema field name
    pub field_name: String,

    /// Extracted value (canonical form once normalized)
    pub value: String,

    /// Confidence in [0.0, 1.0]
    #[serde(deserialize_with = "deserialize_confidence")]
    confidence: f64,

    /// Source of the current value
    pub source: ExtractionSource,

    /// Text snippet the value was read from
    pub context: String,

    /// Current validation status
    pub validation_status: ValidationStatus,

    /// Corrective or explanatory message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Free-form match metadata (external database hits, consistency counts)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl FieldExtraction {
    /// Create a new pending extraction; confidence is clamped to [0, 1]
    pub fn new(
        field_name: impl Into<String>,
        value: impl Into<String>,
        confidence: f64,
        source: ExtractionSource,
        context: impl Into<String>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            value: value.into(),
            confidence: clamp_confidence(confidence),
            source,
            context: context.into(),
            validation_status: ValidationStatus::Pending,
            message: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Current confidence
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Replace the confidence, clamping to [0, 1]
    pub fn set_confidence(&mut self, confidence: f64) {
        self.confidence = clamp_confidence(confidence);
    }

    /// Multiply the confidence by a factor, clamping the result
    pub fn scale_confidence(&mut self, factor: f64) {
        self.set_confidence(self.confidence * factor);
    }

    /// Append a message, keeping earlier ones
    pub fn push_message(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.message = Some(match self.message.take() {
            Some(existing) if !existing.is_empty() => format!("{}; {}", existing, message),
            _ => message,
        });
    }

    /// Whether the value is empty after trimming
    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }
}

/// Clamp a confidence value to [0.0, 1.0], mapping NaN to 0.0
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Deserialize a confidence and clamp it to [0, 1]
pub(crate) fn deserialize_confidence<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    f64::deserialize(deserializer).map(clamp_confidence)
}

/// A single field whose processing step failed
///
/// The pipeline records the failure and continues with the other fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldFailure {
    /// Field that failed
    pub field: String,

    /// Pass in which it failed
    pub stage: String,

    /// Failure description
    pub reason: String,
}
