//! Document module - identity of a processed safety data sheet

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Unique identifier for a processed document based on UUIDv7
///
/// UUIDv7 keeps identifiers chronologically sortable, which lets the
/// persistence layer order processing runs without a separate timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentId(u128);

impl DocumentId {
    /// Generate a new UUIDv7-based DocumentId
    ///
    /// # Examples
    ///
    /// ```
    /// use sds_domain::DocumentId;
    ///
    /// let id = DocumentId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a DocumentId from a raw u128 value
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a DocumentId from its hyphenated string form
    ///
    /// # Examples
    ///
    /// ```
    /// use sds_domain::DocumentId;
    ///
    /// let id = DocumentId::new();
    /// let parsed = DocumentId::from_string(&id.to_string()).unwrap();
    /// assert_eq!(id, parsed);
    /// ```
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid document id: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }

    /// Milliseconds since Unix epoch encoded in the UUIDv7 prefix
    pub fn timestamp(&self) -> u64 {
        (self.0 >> 80) as u64
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// Raw text of a document as delivered by a text provider
///
/// `sections` maps SDS section numbers (1-16) to their text. Either part may
/// be empty; consumers must tolerate partial extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentText {
    /// Full document text
    pub text: String,

    /// Section number -> section text
    pub sections: BTreeMap<u32, String>,
}

impl DocumentText {
    /// Create a document text without a section map
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sections: BTreeMap::new(),
        }
    }

    /// Text of one section, if the provider found it
    pub fn section(&self, number: u32) -> Option<&str> {
        self.sections.get(&number).map(String::as_str)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: Round-trip through string representation preserves ID
        #[test]
        fn test_document_id_string_roundtrip(value: u128) {
            let id = DocumentId::from_value(value);
            match DocumentId::from_string(&id.to_string()) {
                Ok(parsed) => prop_assert_eq!(id, parsed),
                Err(e) => return Err(TestCaseError::fail(e)),
            }
        }
    }
}
