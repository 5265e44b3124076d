//! Result types for document processing

use sds_domain::traits::IndexDocument;
use sds_domain::{
    fields, ConsistencyReport, DocumentConfidence, DocumentId, FieldExtraction, FieldFailure, Ingredient,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata keys written on field extractions
pub mod meta {
    pub use crate::patterns::{PATTERN_QUALITY_KEY as PATTERN_QUALITY, RAW_VALUE_KEY as RAW_VALUE};

    /// Confidence before scoring
    pub const BASE_CONFIDENCE: &str = "base_confidence";

    /// Corrective notes from the consistency and validation passes
    pub const NOTES: &str = "notes";

    /// Set when another field corroborates the value
    pub const CROSS_VALIDATED: &str = "cross_validated";

    /// Validation boost earned from the chemical database
    pub const EXTERNAL_BOOST: &str = "external_boost";

    /// Set when the chemical database knows the value
    pub const DB_MATCH: &str = "db_match";

    /// Compound id of the matching record
    pub const DB_CID: &str = "db_cid";

    /// Preferred name of the matching record
    pub const DB_NAME: &str = "db_name";

    /// Set when the database record contradicts the document
    pub const DB_CONFLICT: &str = "db_conflict";

    /// Manufacturer profile that produced a pattern value
    pub const PROFILE: &str = "profile";
}

/// Attach a corrective note that survives re-scoring
pub(crate) fn add_note(extraction: &mut FieldExtraction, note: &str) {
    let notes = extraction.metadata.entry(meta::NOTES.to_string()).or_default();
    if !notes.is_empty() {
        notes.push_str("; ");
    }
    notes.push_str(note);
    extraction.push_message(note);
}

/// Everything `process` produced for one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedDocument {
    /// Processed document
    pub document_id: DocumentId,

    /// Field name -> current extraction, including pseudo-fields
    pub extractions: BTreeMap<String, FieldExtraction>,

    /// Parsed composition
    pub ingredients: Vec<Ingredient>,

    /// Aggregate over the real fields
    pub document_confidence: DocumentConfidence,

    /// Declared-vs-calculated hazard comparison, when composition was parsed
    pub consistency_report: Option<ConsistencyReport>,

    /// Fields whose processing step failed
    pub failures: Vec<FieldFailure>,

    /// Whether the document was classified as dangerous goods
    pub dangerous: bool,

    /// Whether the domain-completion pass ran
    pub completion_applied: bool,
}

impl ProcessedDocument {
    /// Result for a document with no text
    pub fn empty(document_id: DocumentId) -> Self {
        Self {
            document_id,
            extractions: BTreeMap::new(),
            ingredients: Vec::new(),
            document_confidence: DocumentConfidence::empty(),
            consistency_report: None,
            failures: Vec::new(),
            dangerous: false,
            completion_applied: false,
        }
    }

    /// Current extraction of a field
    pub fn field(&self, name: &str) -> Option<&FieldExtraction> {
        self.extractions.get(name)
    }

    /// Current value of a field, if non-empty
    pub fn value(&self, name: &str) -> Option<&str> {
        self.field(name).filter(|e| !e.is_empty()).map(|e| e.value.as_str())
    }

    /// Summary handed to the retrieval index
    pub fn to_index_document(&self, text: &str) -> IndexDocument {
        IndexDocument {
            document_id: self.document_id,
            fields: self
                .extractions
                .iter()
                .filter(|(name, e)| !fields::is_pseudo_field(name) && !e.is_empty())
                .map(|(name, e)| (name.clone(), e.value.clone()))
                .collect(),
            cas_numbers: self
                .ingredients
                .iter()
                .filter_map(|i| i.cas_number.as_ref().map(|c| c.to_string()))
                .collect(),
            text: text.to_string(),
        }
    }
}
