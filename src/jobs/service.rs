//! Job service facade.
//!
//! The single entry point the transport layer calls. Submission validates
//! the mode, persists the source bytes, creates the record, and enqueues
//! the id; queries return read-only snapshots; result fetch maps job
//! state onto the error taxonomy.

use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use crate::convert::ConverterRegistry;
use crate::error::{MarkifyError, Result};
use crate::jobs::{Job, JobParams, JobQueue, JobStatus, JobStore};
use crate::storage::DocumentStorage;

pub struct JobService {
    store: Arc<JobStore>,
    queue: Arc<JobQueue>,
    registry: Arc<ConverterRegistry>,
    storage: Arc<DocumentStorage>,
}

impl JobService {
    pub fn new(
        store: Arc<JobStore>,
        queue: Arc<JobQueue>,
        registry: Arc<ConverterRegistry>,
        storage: Arc<DocumentStorage>,
    ) -> Self {
        Self {
            store,
            queue,
            registry,
            storage,
        }
    }

    /// Submit a document for conversion.
    ///
    /// Returns the job snapshot immediately; processing happens on the
    /// worker pool. An unknown or unregistered mode is rejected before
    /// any record exists, and a full queue/store rolls the submission
    /// back completely so no orphaned record or file remains.
    pub fn submit(&self, filename: &str, params: JobParams, content: Vec<u8>) -> Result<Job> {
        if !self.registry.supports(params.mode) {
            return Err(MarkifyError::UnsupportedMode(params.mode.to_string()));
        }

        let job = self.store.create(filename, params)?;

        if let Err(e) = self.storage.write_source(job.id, &content) {
            self.store.delete(job.id);
            return Err(e);
        }

        if let Err(e) = self.queue.enqueue(job.id) {
            self.store.delete(job.id);
            if let Err(cleanup) = self.storage.remove_source(job.id) {
                tracing::warn!("Failed to clean up rejected submission {}: {}", job.id, cleanup);
            }
            return Err(e);
        }

        tracing::info!(
            "Job {} submitted: {} (mode {})",
            job.id,
            job.filename,
            job.params.mode
        );
        Ok(job)
    }

    /// Status snapshot for a job.
    pub fn get_status(&self, id: Uuid) -> Result<Job> {
        self.store.get(id).ok_or(MarkifyError::JobNotFound(id))
    }

    /// Paginated job listing, newest first.
    pub fn list_jobs(&self, page: usize, limit: usize) -> Vec<Job> {
        self.store
            .list()
            .into_iter()
            .skip(page.saturating_mul(limit))
            .take(limit)
            .collect()
    }

    /// Artifact path of a completed job, together with its snapshot.
    pub fn get_result(&self, id: Uuid) -> Result<(Job, PathBuf)> {
        let job = self.store.get(id).ok_or(MarkifyError::JobNotFound(id))?;
        match job.status {
            JobStatus::Completed => {
                let path = job.result.clone().ok_or_else(|| {
                    // Store invariant: completed implies result is set.
                    MarkifyError::Conversion("completed job has no artifact".into())
                })?;
                Ok((job, path))
            }
            JobStatus::Failed => Err(MarkifyError::JobFailed(
                job.error.clone().unwrap_or_default(),
            )),
            JobStatus::Queued | JobStatus::Processing => Err(MarkifyError::JobNotReady(id)),
        }
    }

    /// Artifact bytes of a completed job.
    pub fn read_result(&self, id: Uuid) -> Result<(Job, Vec<u8>)> {
        let (job, _path) = self.get_result(id)?;
        let bytes = self.storage.read_artifact(id)?;
        Ok((job, bytes))
    }

    /// Remove a job record and everything it owns on disk; idempotent.
    ///
    /// A deleted-while-queued id may still sit in the queue; the worker
    /// that eventually dequeues it finds no record and skips it.
    pub fn delete(&self, id: Uuid) -> Result<()> {
        self.store.delete(id);
        self.storage.remove(id)
    }
}
