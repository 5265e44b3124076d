//! In-memory extraction store

use sds_domain::traits::ExtractionStore;
use sds_domain::{DocumentId, FieldExtraction, Ingredient};
use std::collections::{BTreeMap, BTreeSet};

/// Reference [`ExtractionStore`] keeping everything in maps
///
/// Every write is an upsert, so re-processing a document converges to the
/// same state. `set_failing` makes all writes fail.
#[derive(Debug, Default)]
pub struct InMemoryExtractionStore {
    fields: BTreeMap<(DocumentId, String), FieldExtraction>,
    ingredients: BTreeMap<DocumentId, Vec<Ingredient>>,
    failures: BTreeMap<DocumentId, String>,
    failing: bool,
    writes: usize,
}

impl InMemoryExtractionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write return an error
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    /// Current extraction of one field
    pub fn field(&self, document_id: DocumentId, field: &str) -> Option<&FieldExtraction> {
        self.fields.get(&(document_id, field.to_string()))
    }

    /// All current extractions of a document
    pub fn fields_for(&self, document_id: DocumentId) -> Vec<&FieldExtraction> {
        self.fields
            .range((document_id, String::new())..)
            .take_while(|((id, _), _)| *id == document_id)
            .map(|(_, e)| e)
            .collect()
    }

    /// Ingredient list of a document
    pub fn ingredients(&self, document_id: DocumentId) -> Option<&[Ingredient]> {
        self.ingredients.get(&document_id).map(Vec::as_slice)
    }

    /// Failure message recorded for a document
    pub fn failure(&self, document_id: DocumentId) -> Option<&str> {
        self.failures.get(&document_id).map(String::as_str)
    }

    /// Number of successful upserts
    pub fn write_count(&self) -> usize {
        self.writes
    }

    fn check(&self) -> Result<(), String> {
        if self.failing {
            Err("store unavailable".to_string())
        } else {
            Ok(())
        }
    }
}

impl ExtractionStore for InMemoryExtractionStore {
    type Error = String;

    fn replace_field(&mut self, document_id: DocumentId, extraction: &FieldExtraction) -> Result<(), Self::Error> {
        self.check()?;
        self.fields
            .insert((document_id, extraction.field_name.clone()), extraction.clone());
        self.writes += 1;
        Ok(())
    }

    fn retain_fields(&mut self, document_id: DocumentId, current: &BTreeSet<String>) -> Result<(), Self::Error> {
        self.check()?;
        self.fields
            .retain(|(id, field), _| *id != document_id || current.contains(field));
        Ok(())
    }

    fn replace_ingredients(&mut self, document_id: DocumentId, ingredients: &[Ingredient]) -> Result<(), Self::Error> {
        self.check()?;
        self.ingredients.insert(document_id, ingredients.to_vec());
        self.writes += 1;
        Ok(())
    }

    fn mark_failed(&mut self, document_id: DocumentId, message: &str) -> Result<(), Self::Error> {
        // Failure records are kept even while writes are failing
        self.failures.insert(document_id, message.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sds_domain::ExtractionSource;

    fn extraction(field: &str, value: &str) -> FieldExtraction {
        FieldExtraction::new(field, value, 0.9, ExtractionSource::Pattern, "")
    }

    #[test]
    fn test_replace_is_upsert() {
        let mut store = InMemoryExtractionStore::new();
        let id = DocumentId::new();

        store.replace_field(id, &extraction("signal_word", "Warning")).unwrap();
        store.replace_field(id, &extraction("signal_word", "Danger")).unwrap();

        assert_eq!(store.fields_for(id).len(), 1);
        assert_eq!(store.field(id, "signal_word").unwrap().value, "Danger");
    }

    #[test]
    fn test_documents_are_separate() {
        let mut store = InMemoryExtractionStore::new();
        let a = DocumentId::from_value(1);
        let b = DocumentId::from_value(2);

        store.replace_field(a, &extraction("product_name", "A")).unwrap();
        store.replace_field(b, &extraction("product_name", "B")).unwrap();
        store.replace_field(b, &extraction("signal_word", "Danger")).unwrap();

        assert_eq!(store.fields_for(a).len(), 1);
        assert_eq!(store.fields_for(b).len(), 2);
    }

    #[test]
    fn test_retain_drops_vanished_fields() {
        let mut store = InMemoryExtractionStore::new();
        let a = DocumentId::from_value(1);
        let b = DocumentId::from_value(2);

        store.replace_field(a, &extraction("product_name", "A")).unwrap();
        store.replace_field(a, &extraction("_hazard_consistency", "H314")).unwrap();
        store.replace_field(b, &extraction("_hazard_consistency", "H318")).unwrap();

        let current = BTreeSet::from(["product_name".to_string()]);
        store.retain_fields(a, &current).unwrap();

        assert_eq!(store.fields_for(a).len(), 1);
        assert!(store.field(a, "_hazard_consistency").is_none());
        assert!(store.field(b, "_hazard_consistency").is_some());
    }

    #[test]
    fn test_failing_store() {
        let mut store = InMemoryExtractionStore::new();
        store.set_failing(true);
        let id = DocumentId::new();

        assert!(store.replace_ingredients(id, &[]).is_err());
        store.mark_failed(id, "boom").unwrap();
        assert_eq!(store.failure(id), Some("boom"));
        assert_eq!(store.write_count(), 0);
    }
}
