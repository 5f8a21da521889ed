use std::fmt;

use super::ports::StoreError;

/// Failure kinds surfaced by the leave workflow.
#[derive(Debug)]
pub enum WorkflowError {
    /// Input failed a shape or range check; the caller can correct it.
    Validation(String),
    NotFound(String),
    Authorization(String),
    /// The transition is not legal from the request's current status.
    InvalidState(String),
    /// The request changed since the caller last read it.
    Conflict(String),
    Infrastructure(StoreError),
}

impl fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowError::Validation(msg) => write!(f, "Validation failed: {msg}"),
            WorkflowError::NotFound(msg) => write!(f, "Not found: {msg}"),
            WorkflowError::Authorization(msg) => write!(f, "Not authorized: {msg}"),
            WorkflowError::InvalidState(msg) => write!(f, "Invalid state: {msg}"),
            WorkflowError::Conflict(msg) => write!(f, "Conflict: {msg}"),
            WorkflowError::Infrastructure(err) => write!(f, "Infrastructure failure: {err}"),
        }
    }
}

impl std::error::Error for WorkflowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WorkflowError::Infrastructure(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        WorkflowError::Infrastructure(err)
    }
}

impl WorkflowError {
    pub(crate) fn leave_not_found(id: i64) -> Self {
        WorkflowError::NotFound(format!("Leave request {id} not found"))
    }
}
