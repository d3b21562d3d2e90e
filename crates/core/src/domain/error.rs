// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid processor state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },
}

/// Errors returned by queue operations to the immediate caller
///
/// Neither variant is fatal for the processor: producers handle `Closed`,
/// worker loops treat both as a reason to exit.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// Queue was permanently closed
    #[error("work queue is closed")]
    Closed,

    /// Blocking dequeue was interrupted by the shutdown signal
    #[error("dequeue cancelled by shutdown")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, DomainError>;
