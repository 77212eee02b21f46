//! Job lifecycle: entities, retry policy, and pool metrics

pub mod entities;
pub mod metrics;
pub mod retry;

pub use entities::{
    Job, JobId, JobKind, JobOutcome, JobSnapshot, JobStatus, JobTarget, MAX_PRIORITY, MIN_PRIORITY,
};
pub use metrics::WorkerPoolMetrics;
pub use retry::RetryPolicy;
