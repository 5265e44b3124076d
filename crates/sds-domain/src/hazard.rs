//! Hazard consistency records
//!
//! Calculated hazards are derived from composition and are never treated as
//! authoritative; they only feed the consistency report.

use serde::{Deserialize, Serialize};

/// A hazard code implied by composition data
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalculatedHazard {
    /// Hazard statement code, e.g. "H314"
    pub hazard_code: String,

    /// Hazard category, e.g. "1A"
    pub category: String,

    /// Human-readable derivation ("Sulfuric Acid at max 15% >= 10%")
    pub basis: String,
}

/// Outcome of comparing calculated against declared hazard codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyStatus {
    /// Every calculated code was declared
    Valid,
    /// At least one calculated code is missing from the declaration
    Inconsistent,
}

/// Declared-vs-calculated hazard comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    /// Overall status
    pub status: ConsistencyStatus,

    /// Calculated hazards absent from the declared set
    pub missing_hazards: Vec<CalculatedHazard>,

    /// Number of calculated hazards
    pub calculated_count: usize,

    /// Number of declared codes
    pub declared_count: usize,
}

impl ConsistencyReport {
    /// Whether the report flags missing hazards
    pub fn is_inconsistent(&self) -> bool {
        self.status == ConsistencyStatus::Inconsistent
    }

    /// Missing codes joined with ", "
    pub fn missing_codes(&self) -> String {
        self.missing_hazards
            .iter()
            .map(|h| h.hazard_code.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
