//! Domain error types

use crate::job::entities::{JobId, JobStatus};
use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },

    #[error("Job not found: {0}")]
    NotFound(JobId),

    #[error("Operation not valid for job {job} in status {status}")]
    InvalidState { job: JobId, status: JobStatus },

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Timed out after {ms}ms")]
    Timeout { ms: u64 },

    #[error("Agent failure: {0}")]
    AgentFailure(String),

    #[error("Expected exactly {expected} agent results, got {actual}")]
    InvalidInputCount { expected: usize, actual: usize },

    #[error("Insufficient valid agent results: {valid}")]
    InsufficientValidResults { valid: usize },

    #[error("Decision invariant violation: {0}")]
    DecisionInvariantViolation(String),

    #[error("Policy limit exceeded: {0}")]
    PolicyLimitExceeded(String),

    #[error("Detection error: {0}")]
    Detection(String),
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled(_))
    }

    /// Check if this error represents a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, DomainError::Timeout { .. })
    }
}
