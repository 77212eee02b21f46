//! Worker pool counters

use serde::{Deserialize, Serialize};

/// Running counters for the worker pool, updated on every terminal job
/// transition. Snapshots are cheap clones; external readers never mutate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkerPoolMetrics {
    pub total_jobs: u64,
    pub completed: u64,
    pub failed: u64,
    pub retried: u64,
    pub cancelled: u64,
    /// Jobs currently executing
    pub active_count: usize,
    /// Jobs waiting in the queue
    pub queued_count: usize,
    /// Sum of processing time over completed jobs, in milliseconds
    pub total_processing_ms: u64,
}

impl WorkerPoolMetrics {
    pub fn record_submission(&mut self) {
        self.total_jobs += 1;
    }

    pub fn record_completion(&mut self, elapsed_ms: u64) {
        self.completed += 1;
        self.total_processing_ms += elapsed_ms;
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    pub fn record_retry(&mut self) {
        self.retried += 1;
    }

    /// Cancellation counts as a failure for success-rate purposes
    pub fn record_cancellation(&mut self) {
        self.cancelled += 1;
        self.failed += 1;
    }

    /// Mean processing time over completed jobs, in milliseconds
    pub fn average_processing_ms(&self) -> f64 {
        if self.completed == 0 {
            0.0
        } else {
            self.total_processing_ms as f64 / self.completed as f64
        }
    }

    /// Completed over all terminally settled jobs, in [0, 1]
    pub fn success_rate(&self) -> f64 {
        let settled = self.completed + self.failed;
        if settled == 0 {
            0.0
        } else {
            self.completed as f64 / settled as f64
        }
    }
}
