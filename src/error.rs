//! Error types for the markify core.
//!
//! One taxonomy covers both halves of the system:
//!
//! * Submission/query errors (`UnsupportedMode`, `JobNotFound`,
//!   `JobNotReady`, `JobFailed`, `QueueFull`, `StorageFull`) are surfaced
//!   to the caller and map onto HTTP status codes at the transport layer.
//!
//! * `Conversion` is caught at the worker boundary and stored verbatim as
//!   the job's error; it never propagates past the worker loop.
//!
//! * `InvalidTransition` is an internal invariant violation (a state
//!   machine bug, never user-triggerable) and is logged as fatal for the
//!   affected job only.

use thiserror::Error;
use uuid::Uuid;

use crate::jobs::JobStatus;

/// All errors produced by the job engine and its collaborators.
#[derive(Debug, Error)]
pub enum MarkifyError {
    /// The requested conversion mode has no registered converter.
    #[error("unsupported conversion mode: '{0}'")]
    UnsupportedMode(String),

    /// No job exists for the given id.
    #[error("job not found: {0}")]
    JobNotFound(Uuid),

    /// The job exists but has not reached a terminal state yet.
    #[error("job {0} is not finished yet")]
    JobNotReady(Uuid),

    /// The job reached `Failed`; carries the stored error message.
    #[error("job failed: {0}")]
    JobFailed(String),

    /// A state-machine transition that the lifecycle does not permit.
    #[error("invalid job transition: {from:?} -> {to:?}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    /// The queue is at capacity; the submission was rejected.
    #[error("job queue is full (capacity {0})")]
    QueueFull(usize),

    /// The store holds its maximum number of live records.
    #[error("job store is full (capacity {0})")]
    StorageFull(usize),

    /// The queue has been closed; no new submissions are accepted.
    #[error("server is shutting down")]
    ShuttingDown,

    /// A converter failed to produce Markdown.
    #[error("conversion failed: {0}")]
    Conversion(String),

    /// Reading or writing source/artifact files failed.
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MarkifyError>;
