//! Job orchestration engine.
//!
//! This module is the core of the service: it owns the lifecycle of every
//! conversion task from submission to result download. It includes:
//!
//! - The [`Job`] record and its state machine
//! - [`JobStore`]: the synchronized id -> record arena
//! - [`JobQueue`]: FIFO hand-off between submission and execution
//! - [`WorkerPool`]: concurrent consumers driving the converters
//! - [`JobService`]: the facade the transport layer calls
//!
//! # State machine
//!
//! `Queued -> Processing -> {Completed | Failed}`. Terminal states admit
//! no further transitions. A job stuck in `Processing` past a staleness
//! threshold can be re-queued through [`JobStore::requeue_stale`].

mod queue;
mod service;
mod store;
mod worker;

pub use queue::JobQueue;
pub use service::JobService;
pub use store::JobStore;
pub use worker::WorkerPool;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::convert::ConversionMode;

/// One document-conversion task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    /// Original uploaded file name; immutable after submission.
    pub filename: String,
    pub status: JobStatus,
    pub params: JobParams,
    /// Path to the Markdown artifact; set only when `Completed`.
    pub result: Option<PathBuf>,
    /// Failure message; set only when `Failed`.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Recognized conversion configuration for a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobParams {
    pub mode: ConversionMode,
}

impl Job {
    pub fn new(filename: &str, params: JobParams) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            filename: filename.to_string(),
            status: JobStatus::Queued,
            params,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
        }
    }

    pub(crate) fn start(&mut self) {
        self.status = JobStatus::Processing;
        self.started_at = Some(Utc::now());
        self.touch();
    }

    pub(crate) fn complete(&mut self, artifact: PathBuf) {
        self.status = JobStatus::Completed;
        self.result = Some(artifact);
        self.error = None;
        self.completed_at = Some(Utc::now());
        self.touch();
    }

    pub(crate) fn fail(&mut self, error: &str) {
        self.status = JobStatus::Failed;
        self.error = Some(error.to_string());
        self.result = None;
        self.completed_at = Some(Utc::now());
        self.touch();
    }

    pub(crate) fn requeue(&mut self) {
        self.status = JobStatus::Queued;
        self.started_at = None;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
