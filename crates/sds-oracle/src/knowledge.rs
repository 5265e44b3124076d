//! Static substance knowledge table
//!
//! A fixed domain-completion source keyed by CAS number, name or UN
//! number. Tables are loaded from TOML:
//!
//! ```toml
//! [[substances]]
//! cas = "67-64-1"
//! names = ["acetone", "propan-2-one"]
//! un_number = "UN1090"
//!
//! [substances.fields]
//! flash_point = "-20 °C"
//! signal_word = "Danger"
//! ```

use crate::OracleError;
use sds_domain::traits::{DomainCompletionService, IdentifierHint};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// One substance and its known field values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    /// CAS registry number
    #[serde(default)]
    pub cas: Option<String>,

    /// Names and synonyms, matched case-insensitively
    #[serde(default)]
    pub names: Vec<String>,

    /// UN transport number
    #[serde(default)]
    pub un_number: Option<String>,

    /// Field name -> value
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl KnowledgeEntry {
    fn matches(&self, hint: &IdentifierHint) -> bool {
        match hint {
            IdentifierHint::Registry(cas) => self.cas.as_deref().map(str::trim) == Some(cas.as_str()),
            IdentifierHint::Name(name) => {
                let needle = name.trim().to_lowercase();
                self.names.iter().any(|n| n.trim().to_lowercase() == needle)
            }
            IdentifierHint::TransportNumber(un) => {
                let needle = un.replace(' ', "").to_uppercase();
                self.un_number
                    .as_deref()
                    .is_some_and(|u| u.replace(' ', "").to_uppercase() == needle)
            }
        }
    }
}

/// Domain-completion service over a fixed table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticKnowledgeBase {
    /// Known substances
    #[serde(default)]
    pub substances: Vec<KnowledgeEntry>,
}

impl StaticKnowledgeBase {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a table from TOML
    pub fn from_toml(s: &str) -> Result<Self, OracleError> {
        Ok(toml::from_str(s)?)
    }

    /// Add an entry
    pub fn insert(&mut self, entry: KnowledgeEntry) {
        self.substances.push(entry);
    }

    /// Number of substances
    pub fn len(&self) -> usize {
        self.substances.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.substances.is_empty()
    }
}

impl DomainCompletionService for StaticKnowledgeBase {
    type Error = OracleError;

    fn complete(&self, hint: &IdentifierHint, field: &str) -> Result<Option<String>, Self::Error> {
        let value = self
            .substances
            .iter()
            .filter(|entry| entry.matches(hint))
            .find_map(|entry| entry.fields.get(field).cloned());

        debug!(hint = hint.as_str(), field, found = value.is_some(), "Knowledge lookup");
        Ok(value)
    }
}
