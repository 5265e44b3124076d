//! Counters for background indexing

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared by the pool and its workers
#[derive(Debug, Default)]
pub struct IndexerMetrics {
    dispatched: AtomicU64,
    indexed: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

impl IndexerMetrics {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_dispatch(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_indexed(&self) {
        self.indexed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_drop(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self) -> IndexerStats {
        IndexerStats {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            indexed: self.indexed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters
    pub fn reset(&self) {
        self.dispatched.store(0, Ordering::Relaxed);
        self.indexed.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
        self.dropped.store(0, Ordering::Relaxed);
    }
}

/// Snapshot of [`IndexerMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexerStats {
    /// Documents accepted into the queue
    pub dispatched: u64,

    /// Documents indexed successfully
    pub indexed: u64,

    /// Index calls that failed, panicked or timed out
    pub failed: u64,

    /// Documents rejected because the queue was full or closed
    pub dropped: u64,
}

impl IndexerStats {
    /// Accepted documents not yet finished
    pub fn pending(&self) -> u64 {
        self.dispatched.saturating_sub(self.indexed + self.failed)
    }

    /// Generate a summary report
    pub fn summary(&self) -> String {
        [
            "Indexer Metrics Summary".to_string(),
            "=======================".to_string(),
            format!("Dispatched: {}", self.dispatched),
            format!("Indexed: {}", self.indexed),
            format!("Failed: {}", self.failed),
            format!("Dropped: {}", self.dropped),
            format!("Pending: {}", self.pending()),
        ]
        .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let stats = IndexerMetrics::new().snapshot();
        assert_eq!(stats, IndexerStats::default());
    }

    #[test]
    fn test_counters() {
        let metrics = IndexerMetrics::new();
        metrics.record_dispatch();
        metrics.record_dispatch();
        metrics.record_dispatch();
        metrics.record_indexed();
        metrics.record_failure();
        metrics.record_drop();

        let stats = metrics.snapshot();
        assert_eq!(stats.dispatched, 3);
        assert_eq!(stats.indexed, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.pending(), 1);
    }

    #[test]
    fn test_reset() {
        let metrics = IndexerMetrics::new();
        metrics.record_dispatch();
        metrics.record_drop();
        metrics.reset();
        assert_eq!(metrics.snapshot(), IndexerStats::default());
    }

    #[test]
    fn test_summary() {
        let metrics = IndexerMetrics::new();
        metrics.record_dispatch();
        metrics.record_indexed();
        metrics.record_drop();

        let summary = metrics.snapshot().summary();
        assert!(summary.contains("Dispatched: 1"));
        assert!(summary.contains("Indexed: 1"));
        assert!(summary.contains("Dropped: 1"));
        assert!(summary.contains("Pending: 0"));
    }
}
