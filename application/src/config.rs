//! Execution parameters for the scheduler and the solving pipeline
//!
//! Split into two param structs so each component receives only the slice
//! it needs. Clamping is enforced at construction; values straight from a
//! config file can be fed in without pre-validation.

use serde::{Deserialize, Serialize};
use trisolve_domain::RetryPolicy;

/// Per-job timeout clamp range, in milliseconds
pub const MIN_JOB_TIMEOUT_MS: u64 = 30_000;
pub const MAX_JOB_TIMEOUT_MS: u64 = 300_000;

/// Worker pool and queue knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerParams {
    /// Upper bound on concurrently executing jobs
    pub max_workers: usize,
    /// Submission is rejected once this many jobs are queued
    pub max_queue_size: usize,
    /// Applied when a submission carries no timeout
    pub default_timeout_ms: u64,
    /// Default attempt budget per job
    pub max_attempts: u32,
    /// Dispatch loop idle poll interval
    pub idle_poll_ms: u64,
    /// Completed/terminal jobs retained for status queries (oldest evicted)
    pub completed_retention: usize,
    /// Alert after this many consecutive job failures
    pub consecutive_failure_alert: u32,
    /// Success rate below this raises a warning alert
    pub accuracy_warning: f64,
    /// Success rate below this raises an emergency alert
    pub accuracy_emergency: f64,
    /// Accuracy alerts stay silent until this many jobs have settled
    pub min_samples_for_accuracy: u64,
}

impl Default for SchedulerParams {
    fn default() -> Self {
        Self {
            max_workers: 3,
            max_queue_size: 100,
            default_timeout_ms: 120_000,
            max_attempts: 3,
            idle_poll_ms: 50,
            completed_retention: 256,
            consecutive_failure_alert: 5,
            accuracy_warning: 0.85,
            accuracy_emergency: 0.70,
            min_samples_for_accuracy: 10,
        }
    }
}

impl SchedulerParams {
    /// Clamp a requested per-job timeout into the allowed range
    pub fn clamp_timeout(&self, requested_ms: Option<u64>) -> u64 {
        requested_ms
            .unwrap_or(self.default_timeout_ms)
            .clamp(MIN_JOB_TIMEOUT_MS, MAX_JOB_TIMEOUT_MS)
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn with_max_queue_size(mut self, max_queue_size: usize) -> Self {
        self.max_queue_size = max_queue_size.max(1);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }
}

/// Solving pipeline knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverParams {
    /// Per-agent call timeout, independent of (and shorter than) the
    /// job-level timeout
    pub agent_timeout_ms: u64,
    /// Backoff policy for retryable job failures
    pub retry: RetryPolicy,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            agent_timeout_ms: 45_000,
            retry: RetryPolicy::default(),
        }
    }
}

impl SolverParams {
    pub fn with_agent_timeout_ms(mut self, ms: u64) -> Self {
        self.agent_timeout_ms = ms;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = SchedulerParams::default();
        assert_eq!(params.max_workers, 3);
        assert_eq!(params.max_queue_size, 100);
        assert_eq!(params.default_timeout_ms, 120_000);
    }

    #[test]
    fn test_timeout_clamping() {
        let params = SchedulerParams::default();
        assert_eq!(params.clamp_timeout(None), 120_000);
        assert_eq!(params.clamp_timeout(Some(1_000)), MIN_JOB_TIMEOUT_MS);
        assert_eq!(params.clamp_timeout(Some(999_999)), MAX_JOB_TIMEOUT_MS);
        assert_eq!(params.clamp_timeout(Some(60_000)), 60_000);
    }

    #[test]
    fn test_builder_floors() {
        let params = SchedulerParams::default()
            .with_max_workers(0)
            .with_max_queue_size(0)
            .with_max_attempts(0);
        assert_eq!(params.max_workers, 1);
        assert_eq!(params.max_queue_size, 1);
        assert_eq!(params.max_attempts, 1);
    }
}
