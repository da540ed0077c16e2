//! Shared error taxonomy
//!
//! Per-item failures (one download, one extraction call, one catalog query)
//! are absorbed inside the stages and never surface here; this enum covers
//! the caller-visible and stage-fatal conditions only.

use uuid::Uuid;

use crate::infrastructure::job_store::JobStoreError;
use crate::infrastructure::results::ResultsError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Job id unknown to the status store. Never conflated with "still pending".
    #[error("Job not found: {0}")]
    NotFound(Uuid),

    /// A stage was triggered before its prerequisite completed, or with a
    /// required selection missing. Caller-correctable; never retried here.
    #[error("Precondition violated: {0}")]
    Precondition(String),

    /// A collaborator (discovery, extraction, catalog) is unreachable or
    /// returned a fatal error. Terminal for the running stage.
    #[error("Collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<JobStoreError> for AppError {
    fn from(err: JobStoreError) -> Self {
        match err {
            JobStoreError::NotFound(id) => Self::NotFound(id),
            JobStoreError::InvalidTransition { .. } => Self::Precondition(err.to_string()),
        }
    }
}

impl From<ResultsError> for AppError {
    fn from(err: ResultsError) -> Self {
        match err {
            ResultsError::NotFound(id) => Self::NotFound(id),
            ResultsError::Io(e) => Self::Io(e),
            ResultsError::Corrupt(e) => Self::Serialization(e),
        }
    }
}
