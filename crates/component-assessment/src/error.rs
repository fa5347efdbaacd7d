use serde_json::Value;
use thiserror::Error;

/// Failures surfaced by a [`crate::Backend`] implementation.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: Value },
    #[error("backend transport failed: {0}")]
    Transport(String),
    #[error("failed to decode backend payload: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("activity '{0}' is locked")]
    ActivityLocked(String),
    #[error("{0}")]
    Validation(String),
    #[error("a submission for '{0}' is already in progress")]
    SubmissionInProgress(String),
    #[error("question group '{0}' is not the current question")]
    NotCurrent(String),
    #[error("assessment has not been loaded")]
    NotLoaded,
    #[error("failed to parse config: {0}")]
    ConfigParse(#[source] serde_json::Error),
}
