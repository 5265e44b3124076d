//! SDS Domain Layer
//!
//! Core data model and pure logic for reconciling safety-data-sheet field
//! extractions. This crate performs no I/O; it defines the records every
//! other crate exchanges, the static field schema, the confidence scorer and
//! the trait interfaces of all external collaborators.
//!
//! ## Key Concepts
//!
//! - **FieldExtraction**: one current, confidence-scored value per field
//! - **Ingredient**: a mixture component with a checksum-valid CAS number
//! - **ConsistencyReport**: declared vs. composition-implied hazard codes
//! - **DocumentConfidence**: aggregate over all field extractions
//! - **Quality tiers**: excellent → good → acceptable → poor → unreliable

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod extraction;
pub mod fields;
pub mod hazard;
pub mod ingredient;
pub mod quality;
pub mod registry;
pub mod scoring;
pub mod traits;

// Re-exports for convenience
pub use document::{DocumentId, DocumentText};
pub use extraction::{clamp_confidence, ExtractionSource, FieldExtraction, FieldFailure, ValidationStatus};
pub use hazard::{CalculatedHazard, ConsistencyReport, ConsistencyStatus};
pub use ingredient::Ingredient;
pub use quality::QualityTier;
pub use registry::{cas_checksum_valid, CasNumber};
pub use scoring::{ConfidenceScorer, DocumentConfidence, ScoreOutcome, ScoreRequest, ScoringConfig};
