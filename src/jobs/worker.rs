//! Worker pool.
//!
//! N symmetric workers consume the shared queue. A worker claims a job,
//! feeds the source document to the converter for the job's mode, and
//! finalizes the record. A converter failure is terminal for that job
//! only; the worker logs it, stores the message, and moves on. Workers
//! hold no lock while a conversion is in flight, so submissions and
//! queries proceed unimpeded.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::convert::{Converter, ConverterRegistry, SourceDocument};
use crate::error::{MarkifyError, Result};
use crate::jobs::{Job, JobQueue, JobStore};
use crate::storage::DocumentStorage;

pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `count` workers consuming from `queue`.
    pub fn spawn(
        count: usize,
        store: Arc<JobStore>,
        queue: Arc<JobQueue>,
        registry: Arc<ConverterRegistry>,
        storage: Arc<DocumentStorage>,
    ) -> Self {
        let handles = (0..count)
            .map(|worker_id| {
                let worker = Worker {
                    worker_id,
                    store: store.clone(),
                    queue: queue.clone(),
                    registry: registry.clone(),
                    storage: storage.clone(),
                };
                tokio::spawn(worker.run())
            })
            .collect();

        tracing::info!("Started {} conversion workers", count);
        Self { handles }
    }

    /// Wait for every worker to exit. Close the queue first or this will
    /// wait forever.
    pub async fn join(self) {
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

struct Worker {
    worker_id: usize,
    store: Arc<JobStore>,
    queue: Arc<JobQueue>,
    registry: Arc<ConverterRegistry>,
    storage: Arc<DocumentStorage>,
}

impl Worker {
    async fn run(self) {
        tracing::debug!("Worker {} started", self.worker_id);
        while let Some(job_id) = self.queue.dequeue().await {
            self.process(job_id).await;
        }
        tracing::debug!("Worker {} shutting down", self.worker_id);
    }

    async fn process(&self, job_id: Uuid) {
        // Claiming is the atomic Queued -> Processing step; losing the
        // race (or finding the record deleted while queued) means another
        // path already owns the job, so just skip it.
        let job = match self.store.claim(job_id) {
            Ok(job) => job,
            Err(MarkifyError::JobNotFound(_)) => {
                tracing::warn!("Job {} dequeued but no longer in store, skipping", job_id);
                return;
            }
            Err(e) => {
                tracing::error!("Job {} could not be claimed: {}", job_id, e);
                return;
            }
        };

        tracing::info!(
            "Worker {} processing job {} ({}, mode {})",
            self.worker_id,
            job_id,
            job.filename,
            job.params.mode
        );

        match self.convert(&job).await {
            Ok(artifact) => match self.store.complete(job_id, artifact) {
                Ok(_) => tracing::info!("Job {} completed", job_id),
                Err(e) => {
                    tracing::error!("Job {} finished but could not be finalized: {}", job_id, e)
                }
            },
            Err(e) => {
                tracing::error!("Job {} failed: {}", job_id, e);
                if let Err(update) = self.store.fail(job_id, &e.to_string()) {
                    tracing::error!("Job {} could not be marked failed: {}", job_id, update);
                }
            }
        }

        // Release the source bytes regardless of outcome.
        if let Err(e) = self.storage.remove_source(job_id) {
            tracing::warn!("Failed to remove source for job {}: {}", job_id, e);
        }
    }

    async fn convert(&self, job: &Job) -> Result<PathBuf> {
        let content = self.storage.read_source(job.id)?;
        let converter = self
            .registry
            .get(job.params.mode)
            .ok_or_else(|| MarkifyError::UnsupportedMode(job.params.mode.to_string()))?;

        let doc = SourceDocument {
            filename: job.filename.clone(),
            content,
        };
        let markdown = converter.convert(doc).await?;

        Ok(self.storage.write_artifact(job.id, &markdown)?)
    }
}
