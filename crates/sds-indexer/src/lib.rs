//! SDS Indexer
//!
//! Fire-and-forget background indexing of processed documents.
//!
//! # Overview
//!
//! After a document is processed the orchestrator hands an
//! [`IndexDocument`](sds_domain::traits::IndexDocument) to an
//! [`IndexerPool`]. The pool:
//! - **Never blocks the caller**: dispatch is a `try_send` on a bounded queue
//! - **Drops on overload**: a full or closed queue discards the document
//! - **Swallows failures**: workers log index errors and count them
//!
//! A single pool is shared (behind an `Arc`) by every pipeline instance.
//!
//! # Configuration
//!
//! ```toml
//! workers = 2
//! queue_capacity = 64
//! index_timeout_secs = 30
//! ```
//!
//! # Metrics
//!
//! ```
//! use sds_indexer::{IndexerConfig, IndexerPool, RecordingIndex};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = IndexerPool::start(RecordingIndex::new(), IndexerConfig::lenient())?;
//! pool.shutdown().await?;
//!
//! let stats = pool.metrics().snapshot();
//! println!("{}", stats.summary());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod metrics;
mod recording;
mod worker;

pub use config::IndexerConfig;
pub use error::IndexerError;
pub use metrics::{IndexerMetrics, IndexerStats};
pub use recording::RecordingIndex;
pub use worker::IndexerPool;
