//! Bounded worker pool for fire-and-forget indexing

use crate::{IndexerConfig, IndexerError, IndexerMetrics};
use sds_domain::traits::{IndexDocument, RetrievalIndex};
use std::fmt::Display;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

type SharedReceiver = Arc<tokio::sync::Mutex<mpsc::Receiver<IndexDocument>>>;

/// Pool of tokio tasks draining a bounded queue into a [`RetrievalIndex`]
///
/// `dispatch` never waits: when the queue is full or closed the document is
/// dropped and counted. Index failures are logged by the workers and never
/// reach the caller.
///
/// # Examples
///
/// ```
/// use sds_indexer::{IndexerConfig, IndexerPool, RecordingIndex};
/// use sds_domain::traits::IndexDocument;
/// use sds_domain::DocumentId;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let index = RecordingIndex::new();
///     let pool = IndexerPool::start(index.clone(), IndexerConfig::default())?;
///
///     pool.dispatch(IndexDocument {
///         document_id: DocumentId::new(),
///         fields: Default::default(),
///         cas_numbers: vec![],
///         text: "Acetone".into(),
///     });
///
///     pool.shutdown().await?;
///     assert_eq!(index.len(), 1);
///     Ok(())
/// }
/// ```
pub struct IndexerPool {
    sender: Mutex<Option<mpsc::Sender<IndexDocument>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    metrics: Arc<IndexerMetrics>,
}

impl IndexerPool {
    /// Spawn the workers; must be called inside a tokio runtime
    pub fn start<I>(index: I, config: IndexerConfig) -> Result<Self, IndexerError>
    where
        I: RetrievalIndex + Send + Sync + 'static,
        I::Error: Display,
    {
        config.validate().map_err(IndexerError::Config)?;

        let (sender, receiver) = mpsc::channel(config.queue_capacity);
        let receiver: SharedReceiver = Arc::new(tokio::sync::Mutex::new(receiver));
        let index = Arc::new(index);
        let metrics = Arc::new(IndexerMetrics::new());

        let workers = (0..config.workers)
            .map(|id| {
                tokio::spawn(run_worker(
                    id,
                    Arc::clone(&index),
                    Arc::clone(&receiver),
                    Arc::clone(&metrics),
                    config.index_timeout(),
                ))
            })
            .collect();

        tracing::info!(
            "Indexer pool started ({} workers, queue {})",
            config.workers,
            config.queue_capacity
        );

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
            metrics,
        })
    }

    /// Queue a document without waiting; returns whether it was accepted
    pub fn dispatch(&self, document: IndexDocument) -> bool {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = sender.as_ref() else {
            tracing::warn!("Indexer pool is shut down, dropping {}", document.document_id);
            self.metrics.record_drop();
            return false;
        };

        match sender.try_send(document) {
            Ok(()) => {
                self.metrics.record_dispatch();
                true
            }
            Err(TrySendError::Full(document)) => {
                tracing::warn!("Index queue full, dropping {}", document.document_id);
                self.metrics.record_drop();
                false
            }
            Err(TrySendError::Closed(document)) => {
                tracing::warn!("Index queue closed, dropping {}", document.document_id);
                self.metrics.record_drop();
                false
            }
        }
    }

    /// Live counters
    pub fn metrics(&self) -> &IndexerMetrics {
        &self.metrics
    }

    /// Close the queue and wait for the workers to drain it
    pub async fn shutdown(&self) -> Result<(), IndexerError> {
        drop(self.sender.lock().unwrap_or_else(PoisonError::into_inner).take());
        let workers: Vec<_> = std::mem::take(&mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner));

        let mut failure = None;
        for worker in workers {
            if let Err(e) = worker.await {
                tracing::error!("Indexer worker ended abnormally: {}", e);
                failure = Some(IndexerError::Worker(e.to_string()));
            }
        }

        tracing::info!("Indexer pool stopped. Final metrics:\n{}", self.metrics.snapshot().summary());

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

async fn run_worker<I>(
    id: usize,
    index: Arc<I>,
    receiver: SharedReceiver,
    metrics: Arc<IndexerMetrics>,
    timeout: Duration,
) where
    I: RetrievalIndex + Send + Sync + 'static,
    I::Error: Display,
{
    loop {
        // The lock is released before the index call so other workers can receive
        let next = receiver.lock().await.recv().await;
        let Some(document) = next else {
            break;
        };

        let document_id = document.document_id;
        let index = Arc::clone(&index);
        let task = tokio::task::spawn_blocking(move || index.index(&document).map_err(|e| e.to_string()));

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(Ok(()))) => {
                tracing::debug!("Worker {} indexed {}", id, document_id);
                metrics.record_indexed();
            }
            Ok(Ok(Err(e))) => {
                tracing::error!("Indexing {} failed: {}", document_id, e);
                metrics.record_failure();
            }
            Ok(Err(e)) => {
                tracing::error!("Indexing {} panicked: {}", document_id, e);
                metrics.record_failure();
            }
            Err(_) => {
                tracing::error!("Indexing {} timed out after {:?}", document_id, timeout);
                metrics.record_failure();
            }
        }
    }

    tracing::debug!("Indexer worker {} stopped", id);
}
