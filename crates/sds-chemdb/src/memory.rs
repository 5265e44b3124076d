//! In-memory chemical database for tests and offline use

use crate::ChemDbError;
use sds_domain::traits::{ChemicalDatabase, ChemicalRecord};
use sds_domain::CasNumber;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Fixed set of records with call counting
#[derive(Debug, Default)]
pub struct InMemoryChemicalDb {
    records: Vec<ChemicalRecord>,
    hazards: HashMap<String, Vec<String>>,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl InMemoryChemicalDb {
    /// Empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record and its hazard codes
    pub fn with_record(mut self, record: ChemicalRecord, hazard_codes: &[&str]) -> Self {
        self.hazards.insert(
            record.name.to_lowercase(),
            hazard_codes.iter().map(|c| c.to_string()).collect(),
        );
        self.records.push(record);
        self
    }

    /// Make every lookup fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of lookups served
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> Result<(), ChemDbError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(ChemDbError::Backend("database unavailable".to_string()));
        }
        Ok(())
    }
}

impl ChemicalDatabase for InMemoryChemicalDb {
    type Error = ChemDbError;

    fn by_name(&self, name: &str) -> Result<Option<ChemicalRecord>, Self::Error> {
        self.enter()?;
        Ok(self.records.iter().find(|r| r.matches_name(name)).cloned())
    }

    fn by_registry_number(&self, cas: &CasNumber) -> Result<Option<ChemicalRecord>, Self::Error> {
        self.enter()?;
        Ok(self.records.iter().find(|r| r.has_cas(cas.as_str())).cloned())
    }

    fn hazard_codes(&self, record: &ChemicalRecord) -> Result<Vec<String>, Self::Error> {
        self.enter()?;
        Ok(self
            .hazards
            .get(&record.name.to_lowercase())
            .cloned()
            .unwrap_or_default())
    }
}
