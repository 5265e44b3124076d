//! Retrieval index that records what it receives

use sds_domain::traits::{IndexDocument, RetrievalIndex};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

#[derive(Debug, Default)]
struct Recorded {
    documents: Vec<IndexDocument>,
    failing: bool,
    delay: Option<Duration>,
}

/// In-memory [`RetrievalIndex`] for tests and dry runs
///
/// Clones share the same record, so a clone handed to the pool can be
/// inspected afterwards.
#[derive(Debug, Clone, Default)]
pub struct RecordingIndex {
    state: Arc<Mutex<Recorded>>,
}

impl RecordingIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every index call fail
    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    /// Sleep this long inside every index call
    pub fn set_delay(&self, delay: Option<Duration>) {
        self.lock().delay = delay;
    }

    /// Documents indexed so far
    pub fn documents(&self) -> Vec<IndexDocument> {
        self.lock().documents.clone()
    }

    /// Number of documents indexed
    pub fn len(&self) -> usize {
        self.lock().documents.len()
    }

    /// Whether nothing has been indexed
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Recorded> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RetrievalIndex for RecordingIndex {
    type Error = String;

    fn index(&self, document: &IndexDocument) -> Result<(), Self::Error> {
        let delay = self.lock().delay;
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        let mut state = self.lock();
        if state.failing {
            return Err(format!("index unavailable for {}", document.document_id));
        }
        state.documents.push(document.clone());
        Ok(())
    }
}
