//! Cache, rate limit and timeout around a blocking chemical database

use crate::{ChemDbConfig, ChemDbError, RateLimiter, ResponseCache};
use sds_domain::traits::{ChemicalDatabase, ChemicalRecord};
use sds_domain::CasNumber;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Async front for a blocking [`ChemicalDatabase`]
///
/// Lookups go cache → rate limiter → blocking call under a timeout.
/// Negative answers are cached; errors are not. Clones share the cache
/// and the limiter.
pub struct GuardedChemicalDb<D> {
    db: Arc<D>,
    limiter: Arc<RateLimiter>,
    records: Arc<ResponseCache<Option<ChemicalRecord>>>,
    hazards: Arc<ResponseCache<Vec<String>>>,
    timeout: Duration,
}

impl<D> Clone for GuardedChemicalDb<D> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            limiter: Arc::clone(&self.limiter),
            records: Arc::clone(&self.records),
            hazards: Arc::clone(&self.hazards),
            timeout: self.timeout,
        }
    }
}

impl<D> GuardedChemicalDb<D>
where
    D: ChemicalDatabase + Send + Sync + 'static,
    D::Error: Display,
{
    /// Wrap a database with its own limiter and caches
    pub fn new(db: D, config: &ChemDbConfig) -> Self {
        let limiter = Arc::new(RateLimiter::new(config.min_interval()));
        Self::with_limiter(db, limiter, config)
    }

    /// Wrap a database with a limiter shared with other callers
    pub fn with_limiter(db: D, limiter: Arc<RateLimiter>, config: &ChemDbConfig) -> Self {
        Self {
            db: Arc::new(db),
            limiter,
            records: Arc::new(ResponseCache::new(config.cache_capacity, config.cache_ttl())),
            hazards: Arc::new(ResponseCache::new(config.cache_capacity, config.cache_ttl())),
            timeout: config.lookup_timeout(),
        }
    }

    /// Shared rate limiter
    pub fn limiter(&self) -> Arc<RateLimiter> {
        Arc::clone(&self.limiter)
    }

    /// Wrapped database
    pub fn inner(&self) -> &D {
        &self.db
    }

    /// Look up a substance by name
    pub async fn by_name(&self, name: &str) -> Result<Option<ChemicalRecord>, ChemDbError> {
        let key = format!("name:{}", name.trim().to_lowercase());
        if let Some(hit) = self.records.get(&key) {
            debug!(key = %key, "Chemical database cache hit");
            return Ok(hit);
        }

        let name = name.to_string();
        let record = self.call(move |db| db.by_name(&name)).await?;
        self.records.insert(key, record.clone());
        Ok(record)
    }

    /// Look up a substance by CAS number
    pub async fn by_registry_number(&self, cas: &CasNumber) -> Result<Option<ChemicalRecord>, ChemDbError> {
        let key = format!("cas:{}", cas);
        if let Some(hit) = self.records.get(&key) {
            debug!(key = %key, "Chemical database cache hit");
            return Ok(hit);
        }

        let cas = cas.clone();
        let record = self.call(move |db| db.by_registry_number(&cas)).await?;
        self.records.insert(key, record.clone());
        Ok(record)
    }

    /// Hazard codes for a record
    pub async fn hazard_codes(&self, record: &ChemicalRecord) -> Result<Vec<String>, ChemDbError> {
        let key = match record.cid {
            Some(cid) => format!("hazards:cid:{}", cid),
            None => format!("hazards:name:{}", record.name.to_lowercase()),
        };
        if let Some(hit) = self.hazards.get(&key) {
            return Ok(hit);
        }

        let record = record.clone();
        let codes = self.call(move |db| db.hazard_codes(&record)).await?;
        self.hazards.insert(key, codes.clone());
        Ok(codes)
    }

    async fn call<T, F>(&self, f: F) -> Result<T, ChemDbError>
    where
        T: Send + 'static,
        F: FnOnce(&D) -> Result<T, D::Error> + Send + 'static,
    {
        self.limiter.wait().await;

        let db = Arc::clone(&self.db);
        let task = tokio::task::spawn_blocking(move || {
            f(db.as_ref()).map_err(|e| ChemDbError::Backend(e.to_string()))
        });

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(ChemDbError::Join(e.to_string())),
            Err(_) => {
                warn!(timeout = ?self.timeout, "Chemical database lookup timed out");
                Err(ChemDbError::Timeout(self.timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryChemicalDb;
    use std::time::Instant;

    fn acetone() -> ChemicalRecord {
        ChemicalRecord {
            cid: Some(180),
            name: "Acetone".to_string(),
            synonyms: vec!["propan-2-one".to_string()],
            cas_numbers: vec!["67-64-1".to_string()],
            molecular_formula: Some("C3H6O".to_string()),
        }
    }

    fn fast_config() -> ChemDbConfig {
        ChemDbConfig {
            min_interval_ms: 0,
            ..ChemDbConfig::default()
        }
    }

    #[tokio::test]
    async fn test_cache_hit_skips_backend() {
        let db = InMemoryChemicalDb::new().with_record(acetone(), &["H225"]);
        let guarded = GuardedChemicalDb::new(db, &fast_config());

        assert!(guarded.by_name("Acetone").await.unwrap().is_some());
        assert!(guarded.by_name("acetone ").await.unwrap().is_some());
        assert_eq!(guarded.inner().call_count(), 1);
    }

    #[tokio::test]
    async fn test_negative_results_cached() {
        let guarded = GuardedChemicalDb::new(InMemoryChemicalDb::new(), &fast_config());
        let cas = CasNumber::parse("64-17-5").unwrap();

        assert!(guarded.by_registry_number(&cas).await.unwrap().is_none());
        assert!(guarded.by_registry_number(&cas).await.unwrap().is_none());
        assert_eq!(guarded.inner().call_count(), 1);
    }

    #[tokio::test]
    async fn test_errors_not_cached() {
        let db = InMemoryChemicalDb::new().with_record(acetone(), &[]);
        let guarded = GuardedChemicalDb::new(db, &fast_config());

        guarded.inner().set_failing(true);
        assert!(matches!(guarded.by_name("acetone").await, Err(ChemDbError::Backend(_))));

        guarded.inner().set_failing(false);
        assert!(guarded.by_name("acetone").await.unwrap().is_some());
        assert_eq!(guarded.inner().call_count(), 2);
    }

    #[tokio::test]
    async fn test_hazard_codes_cached_by_cid() {
        let db = InMemoryChemicalDb::new().with_record(acetone(), &["H225", "H319", "H336"]);
        let guarded = GuardedChemicalDb::new(db, &fast_config());

        let record = acetone();
        assert_eq!(guarded.hazard_codes(&record).await.unwrap().len(), 3);
        assert_eq!(guarded.hazard_codes(&record).await.unwrap().len(), 3);
        assert_eq!(guarded.inner().call_count(), 1);
    }

    struct SlowDb;

    impl ChemicalDatabase for SlowDb {
        type Error = ChemDbError;

        fn by_name(&self, _name: &str) -> Result<Option<ChemicalRecord>, Self::Error> {
            std::thread::sleep(Duration::from_millis(1500));
            Ok(None)
        }

        fn by_registry_number(&self, _cas: &CasNumber) -> Result<Option<ChemicalRecord>, Self::Error> {
            Ok(None)
        }

        fn hazard_codes(&self, _record: &ChemicalRecord) -> Result<Vec<String>, Self::Error> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_timeout() {
        let config = ChemDbConfig {
            min_interval_ms: 0,
            lookup_timeout_secs: 1,
            http_timeout_secs: 1,
            ..ChemDbConfig::default()
        };
        let guarded = GuardedChemicalDb::new(SlowDb, &config);
        assert!(matches!(guarded.by_name("x").await, Err(ChemDbError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_shared_limiter_spaces_calls() {
        let config = ChemDbConfig {
            min_interval_ms: 50,
            ..ChemDbConfig::default()
        };
        let first = GuardedChemicalDb::new(InMemoryChemicalDb::new(), &config);
        let second = GuardedChemicalDb::with_limiter(InMemoryChemicalDb::new(), first.limiter(), &config);

        let start = Instant::now();
        first.by_name("a").await.unwrap();
        second.by_name("b").await.unwrap();
        first.by_name("c").await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(100));
    }
}
