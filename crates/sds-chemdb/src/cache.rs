//! Capacity-bounded, TTL-expiring response cache

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    inserted: Instant,
}

/// Thread-safe response cache
///
/// Expired entries are ignored on read and purged on write. When full,
/// the oldest-inserted entry is evicted.
#[derive(Debug)]
pub struct ResponseCache<V> {
    entries: RwLock<HashMap<String, Entry<V>>>,
    capacity: usize,
    ttl: Duration,
}

impl<V: Clone> ResponseCache<V> {
    /// Create a cache holding at most `capacity` entries for `ttl` each
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity,
            ttl,
        }
    }

    /// Cached value for a key, if present and fresh
    pub fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(key)
            .filter(|e| e.inserted.elapsed() < self.ttl)
            .map(|e| e.value.clone())
    }

    /// Store a value
    pub fn insert(&self, key: impl Into<String>, value: V) {
        if self.capacity == 0 {
            return;
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let ttl = self.ttl;
        entries.retain(|_, e| e.inserted.elapsed() < ttl);

        let key = key.into();
        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.inserted)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }

        entries.insert(
            key,
            Entry {
                value,
                inserted: Instant::now(),
            },
        );
    }

    /// Number of stored entries, fresh or not
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}
