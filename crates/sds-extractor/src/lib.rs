//! SDS Extractor
//!
//! Turns the text of a safety data sheet into one scored, validated record
//! per field.
//!
//! # Overview
//!
//! Extraction is a fixed sequence of passes over the document:
//!
//! ```text
//! text → patterns → oracle escalation → normalization → cross-field checks
//!      → hazard consistency → chemical database → scoring → domain completion
//!      → store / indexer
//! ```
//!
//! Pattern rules come from the generic rule set or a manufacturer profile.
//! Fields the rules miss, or match with low confidence, are escalated to an
//! [`OracleExtractor`](sds_domain::traits::OracleExtractor). Dangerous goods
//! and incomplete records are sent to a
//! [`DomainCompletionService`](sds_domain::traits::DomainCompletionService)
//! keyed by the best identifier on the sheet.
//!
//! A failure of one field is recorded in
//! [`ProcessedDocument::failures`] and the document carries on. An over-long
//! text or a store failure fails the whole document.
//!
//! # Example Usage
//!
//! ```no_run
//! use sds_extractor::{split_sections, ExtractorConfig, SdsExtractor};
//! use sds_domain::{fields, DocumentId};
//! use sds_oracle::MockOracle;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let oracle = MockOracle::new();
//! let extractor = SdsExtractor::new(oracle.clone(), oracle, ExtractorConfig::default())?;
//!
//! let text = "SECTION 1: Identification\nProduct name: Acetone\n\
//!             SECTION 3: Composition\nAcetone CAS 67-64-1 >90%\n";
//! let document = extractor
//!     .process(DocumentId::new(), text, &split_sections(text))
//!     .await?;
//!
//! println!("CAS: {:?}", document.value(fields::CAS_NUMBER));
//! println!("Overall: {:.2}", document.document_confidence.overall_confidence);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod consistency;
mod error;
mod normalize;
mod orchestrator;
mod patterns;
mod profiles;
mod store;
mod text_provider;
mod types;

#[cfg(test)]
mod tests;

pub use config::ExtractorConfig;
pub use consistency::{
    apply_cross_field_rules, attach_consistency_report, is_dangerous, recompute_consistency, CrossFieldFinding,
};
pub use error::ExtractorError;
pub use normalize::{normalize_oracle_response, OracleFinding};
pub use orchestrator::SdsExtractor;
pub use patterns::{
    context_window, generic_rules, FieldRule, PatternExtractor, PatternMatch, LABELLED_CONFIDENCE, LOOSE_CONFIDENCE,
};
pub use profiles::{ManufacturerProfile, ProfileRegistry, GENERIC_PROFILE, HEADER_CHARS, PROFILE_FORMAT_VERSION};
pub use store::InMemoryExtractionStore;
pub use text_provider::{split_sections, PlainTextProvider};
pub use types::{meta, ProcessedDocument};
