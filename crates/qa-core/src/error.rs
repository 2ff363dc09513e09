use crate::status::WorkflowStatus;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReviewError {
    #[error("review not found")]
    ReviewNotFound,
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        from: WorkflowStatus,
        to: WorkflowStatus,
    },
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },
    #[error("conflict: expected version {expected}, found {actual}")]
    Conflict { expected: u64, actual: u64 },
    #[error("storage error: {message}")]
    Storage { message: String },
}

impl ReviewError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage {
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum QaError {
    #[error(transparent)]
    Review(#[from] ReviewError),
    #[error("internal error: {message}")]
    Internal { message: String },
}
