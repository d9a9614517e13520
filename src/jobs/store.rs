//! Job record store.
//!
//! In-memory arena mapping job id to [`Job`]. Every mutation goes through
//! a single write-locked path that validates the state machine; readers
//! get cloned snapshots and never observe a partially-updated record.
//! The store is bounded: once `max_jobs` live records exist, creation is
//! rejected until records are deleted.

use chrono::{Duration, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use uuid::Uuid;

use crate::error::{MarkifyError, Result};
use crate::jobs::{Job, JobParams, JobStatus};

pub struct JobStore {
    jobs: RwLock<HashMap<Uuid, Job>>,
    max_jobs: usize,
}

impl JobStore {
    pub fn new(max_jobs: usize) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            max_jobs,
        }
    }

    /// Allocate a fresh id and store a new job in `Queued`.
    ///
    /// The job is visible to [`get`](Self::get) as soon as this returns.
    pub fn create(&self, filename: &str, params: JobParams) -> Result<Job> {
        let mut jobs = self.jobs.write();
        if jobs.len() >= self.max_jobs {
            return Err(MarkifyError::StorageFull(self.max_jobs));
        }
        let job = Job::new(filename, params);
        jobs.insert(job.id, job.clone());
        Ok(job)
    }

    /// Read-only snapshot of a job.
    pub fn get(&self, id: Uuid) -> Option<Job> {
        let jobs = self.jobs.read();
        jobs.get(&id).cloned()
    }

    /// Snapshot of all jobs, newest first.
    pub fn list(&self) -> Vec<Job> {
        let jobs = self.jobs.read();
        let mut all: Vec<Job> = jobs.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }

    /// Claim a queued job for processing (`Queued -> Processing`).
    ///
    /// The check-and-set runs under the write lock, so two workers racing
    /// on the same id cannot both claim it.
    pub fn claim(&self, id: Uuid) -> Result<Job> {
        self.transition(id, JobStatus::Processing, |job| job.start())
    }

    /// Finalize a processing job with its artifact
    /// (`Processing -> Completed`).
    pub fn complete(&self, id: Uuid, artifact: PathBuf) -> Result<Job> {
        self.transition(id, JobStatus::Completed, |job| job.complete(artifact))
    }

    /// Finalize a processing job with the converter's error message
    /// (`Processing -> Failed`).
    pub fn fail(&self, id: Uuid, error: &str) -> Result<Job> {
        self.transition(id, JobStatus::Failed, |job| job.fail(error))
    }

    /// Remove a record; idempotent. Returns whether a record was removed.
    pub fn delete(&self, id: Uuid) -> bool {
        let mut jobs = self.jobs.write();
        jobs.remove(&id).is_some()
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }

    /// Re-queue jobs stuck in `Processing` longer than `older_than`.
    ///
    /// Maintenance hook for recovering from a worker that died mid-job;
    /// the engine does not schedule this automatically. Returned ids must
    /// be re-enqueued by the caller.
    pub fn requeue_stale(&self, older_than: Duration) -> Vec<Uuid> {
        let cutoff = Utc::now() - older_than;
        let mut jobs = self.jobs.write();
        let mut stale = Vec::new();
        for job in jobs.values_mut() {
            let started = match job.started_at {
                Some(t) => t,
                None => continue,
            };
            if job.status == JobStatus::Processing && started < cutoff {
                job.requeue();
                stale.push(job.id);
            }
        }
        stale
    }

    fn transition(
        &self,
        id: Uuid,
        to: JobStatus,
        apply: impl FnOnce(&mut Job),
    ) -> Result<Job> {
        let mut jobs = self.jobs.write();
        let job = jobs.get_mut(&id).ok_or(MarkifyError::JobNotFound(id))?;

        let valid = matches!(
            (job.status, to),
            (JobStatus::Queued, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Failed)
        );
        if !valid {
            return Err(MarkifyError::InvalidTransition {
                from: job.status,
                to,
            });
        }

        apply(job);
        Ok(job.clone())
    }
}
