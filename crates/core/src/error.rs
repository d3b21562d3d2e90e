// Central Error Type for the Application

use crate::domain::ProcessorState;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Queue error: {0}")]
    Queue(#[from] crate::domain::QueueError),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Processor did not stop within {timeout_ms}ms ({pending} worker(s) still running)")]
    StopTimeout { timeout_ms: u128, pending: usize },
}

impl AppError {
    pub(crate) fn transition(from: ProcessorState, to: ProcessorState) -> Self {
        AppError::Domain(crate::domain::DomainError::InvalidStateTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
