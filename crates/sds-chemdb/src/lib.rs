//! SDS Chemical Database
//!
//! External chemical-database access for identifier validation.
//!
//! - `PubChemClient`: blocking PUG-REST client
//! - `InMemoryChemicalDb`: fixed records for tests and offline runs
//! - `GuardedChemicalDb`: async front adding a TTL cache, a shared rate
//!   limiter and per-call timeouts
//!
//! # Examples
//!
//! ```
//! use sds_chemdb::{ChemDbConfig, GuardedChemicalDb, InMemoryChemicalDb};
//! use sds_domain::traits::ChemicalRecord;
//!
//! # tokio_test_block(async {
//! let record = ChemicalRecord { name: "Ethanol".into(), cas_numbers: vec!["64-17-5".into()], ..Default::default() };
//! let db = GuardedChemicalDb::new(InMemoryChemicalDb::new().with_record(record, &["H225"]), &ChemDbConfig::default());
//!
//! let found = db.by_name("ethanol").await.unwrap();
//! assert!(found.is_some());
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(f)
//! # }
//! ```

#![warn(missing_docs)]

mod cache;
mod config;
mod error;
mod guarded;
mod limiter;
mod memory;
mod pubchem;

pub use cache::ResponseCache;
pub use config::{ChemDbConfig, DEFAULT_BASE_URL};
pub use error::ChemDbError;
pub use guarded::GuardedChemicalDb;
pub use limiter::RateLimiter;
pub use memory::InMemoryChemicalDb;
pub use pubchem::PubChemClient;
