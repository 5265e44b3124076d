//! Composition records parsed from section 3

use crate::extraction::{clamp_confidence, deserialize_confidence, ExtractionSource};
use crate::registry::CasNumber;
use serde::{Deserialize, Serialize};

/// One component of a mixture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Checksum-validated CAS number, if one was found
    pub cas_number: Option<CasNumber>,

    /// Chemical name as printed
    pub chemical_name: Option<String>,

    /// Lower concentration bound
    pub concentration_min: Option<f64>,

    /// Upper concentration bound (used for worst-case hazard rules)
    pub concentration_max: Option<f64>,

    /// Concentration unit, usually "%"
    pub unit: String,

    /// Confidence in [0.0, 1.0]
    #[serde(deserialize_with = "deserialize_confidence")]
    confidence: f64,

    /// Line the record was parsed from
    pub evidence: String,

    /// Producer of the record
    pub source: ExtractionSource,
}

impl Ingredient {
    /// Create an ingredient with no concentration and percent units
    pub fn new(
        cas_number: Option<CasNumber>,
        chemical_name: Option<String>,
        confidence: f64,
        evidence: impl Into<String>,
    ) -> Self {
        Self {
            cas_number,
            chemical_name,
            concentration_min: None,
            concentration_max: None,
            unit: "%".to_string(),
            confidence: clamp_confidence(confidence),
            evidence: evidence.into(),
            source: ExtractionSource::Pattern,
        }
    }

    /// Set the concentration range
    pub fn with_concentration(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.concentration_min = min;
        self.concentration_max = max;
        self
    }

    /// Parse confidence
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Lower-cased name used for de-duplication of CAS-less rows
    pub fn name_key(&self) -> Option<String> {
        self.chemical_name
            .as_ref()
            .map(|n| n.trim().to_lowercase())
            .filter(|n| !n.is_empty())
    }
}
