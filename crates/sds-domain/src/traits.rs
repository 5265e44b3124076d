//! Trait definitions for external collaborators
//!
//! These traits define the boundaries between the reconciliation core and
//! infrastructure. Implementations live in other crates. All methods are
//! blocking; the orchestrator runs them off the async executor under a
//! per-call timeout.

use crate::{CasNumber, DocumentId, DocumentText, FieldExtraction, Ingredient};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Provider of raw document text (OCR, PDF parsing)
pub trait DocumentTextProvider {
    /// Error type for extraction
    type Error;

    /// Extract text and the section map from a file
    fn extract(&self, path: &Path) -> Result<DocumentText, Self::Error>;
}

/// Raw answer of an oracle extractor
///
/// This is the only place an untyped payload enters the pipeline. It is
/// decoded into a typed finding once, at the normalization boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum OracleResponse {
    /// The oracle looked and found nothing
    NotFound,

    /// A bare string answer
    Text(String),

    /// A JSON payload of any shape
    Structured(serde_json::Value),
}

/// Model-based text-to-field extractor treated as a black box
pub trait OracleExtractor {
    /// Error type for oracle calls
    type Error;

    /// Extract one field from text
    fn extract(&self, field: &str, text: &str) -> Result<OracleResponse, Self::Error>;

    /// Extract several fields in one call
    ///
    /// The default implementation calls [`OracleExtractor::extract`] per
    /// field and stops at the first error.
    fn extract_many(
        &self,
        fields: &[String],
        text: &str,
    ) -> Result<BTreeMap<String, OracleResponse>, Self::Error> {
        let mut answers = BTreeMap::new();
        for field in fields {
            answers.insert(field.clone(), self.extract(field, text)?);
        }
        Ok(answers)
    }
}

/// Best available identifier for a domain-completion query
///
/// Preference order is registry number, then name, then transport number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum IdentifierHint {
    /// CAS registry number
    Registry(CasNumber),

    /// Product or chemical name
    Name(String),

    /// UN transport number
    TransportNumber(String),
}

impl IdentifierHint {
    /// The identifier text
    pub fn as_str(&self) -> &str {
        match self {
            IdentifierHint::Registry(cas) => cas.as_str(),
            IdentifierHint::Name(name) => name,
            IdentifierHint::TransportNumber(un) => un,
        }
    }

    /// Name of the hint kind
    pub fn kind(&self) -> &'static str {
        match self {
            IdentifierHint::Registry(_) => "registry",
            IdentifierHint::Name(_) => "name",
            IdentifierHint::TransportNumber(_) => "transport_number",
        }
    }
}

/// Domain-knowledge completion service
pub trait DomainCompletionService {
    /// Error type for completion calls
    type Error;

    /// Look up a field value for an identifier; `Ok(None)` means not found
    fn complete(&self, hint: &IdentifierHint, field: &str) -> Result<Option<String>, Self::Error>;
}

/// A substance record from an external chemical database
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChemicalRecord {
    /// Database compound id
    pub cid: Option<u64>,

    /// Preferred name
    pub name: String,

    /// Synonyms, lower-cased
    #[serde(default)]
    pub synonyms: Vec<String>,

    /// CAS numbers associated with the record
    #[serde(default)]
    pub cas_numbers: Vec<String>,

    /// Molecular formula
    pub molecular_formula: Option<String>,
}

impl ChemicalRecord {
    /// Whether the record lists the CAS number
    pub fn has_cas(&self, cas: &str) -> bool {
        self.cas_numbers.iter().any(|c| c.trim() == cas.trim())
    }

    /// Whether the name equals the preferred name or a synonym
    pub fn matches_name(&self, name: &str) -> bool {
        let needle = name.trim().to_lowercase();
        !needle.is_empty()
            && (self.name.to_lowercase() == needle || self.synonyms.iter().any(|s| *s == needle))
    }
}

/// External chemical database
pub trait ChemicalDatabase {
    /// Error type for lookups
    type Error;

    /// Look up a substance by name
    fn by_name(&self, name: &str) -> Result<Option<ChemicalRecord>, Self::Error>;

    /// Look up a substance by CAS number
    fn by_registry_number(&self, cas: &CasNumber) -> Result<Option<ChemicalRecord>, Self::Error>;

    /// Harmonized hazard codes for a record
    fn hazard_codes(&self, record: &ChemicalRecord) -> Result<Vec<String>, Self::Error>;
}

/// Persistence collaborator; every operation is an idempotent upsert
pub trait ExtractionStore {
    /// Error type for store operations
    type Error;

    /// Replace the current extraction for (document, field)
    fn replace_field(
        &mut self,
        document_id: DocumentId,
        extraction: &FieldExtraction,
    ) -> Result<(), Self::Error>;

    /// Drop every field of a document whose name is not in `current`
    fn retain_fields(
        &mut self,
        document_id: DocumentId,
        current: &BTreeSet<String>,
    ) -> Result<(), Self::Error>;

    /// Replace the full ingredient list of a document
    fn replace_ingredients(
        &mut self,
        document_id: DocumentId,
        ingredients: &[Ingredient],
    ) -> Result<(), Self::Error>;

    /// Record that a document failed outside any field boundary
    fn mark_failed(&mut self, document_id: DocumentId, message: &str) -> Result<(), Self::Error>;
}

/// Summary handed to a retrieval index after processing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDocument {
    /// Processed document
    pub document_id: DocumentId,

    /// Field name -> value
    pub fields: BTreeMap<String, String>,

    /// CAS numbers of parsed ingredients
    pub cas_numbers: Vec<String>,

    /// Full text
    pub text: String,
}

/// Retrieval store fed by fire-and-forget background work
pub trait RetrievalIndex {
    /// Error type for indexing
    type Error;

    /// Index one document
    fn index(&self, document: &IndexDocument) -> Result<(), Self::Error>;
}
