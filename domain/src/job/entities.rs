//! Job lifecycle state machine
//!
//! One queued unit of work: detection, solving, or both. The status enum
//! follows `Pending -> Running -> Completed/Failed`, with `Cancelled`
//! reachable from any non-terminal state. `mark_*` transition methods are
//! no-ops when called from an invalid state, so a terminal job can never
//! be mutated again. The single sanctioned re-entry is
//! [`Job::mark_retrying`]: a `Failed` job with attempts remaining moves
//! back to `Pending` for re-dispatch.
//!
//! # State Transitions
//!
//! ```text
//! Pending ──> Running ──> Completed
//!    ^               └──> Failed ──(retryable, attempts left)──> Pending
//!    └── Cancelled reachable from Pending or Running
//! ```

use crate::consensus::ConsensusReason;
use crate::core::current_timestamp;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Priority bounds. Lower values are dispatched first.
pub const MIN_PRIORITY: i32 = 0;
pub const MAX_PRIORITY: i32 = 100;

/// Unique identifier for a job
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<T: Into<String>> From<T> for JobId {
    fn from(s: T) -> Self {
        Self::new(s)
    }
}

/// What kind of work a job requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Look for a challenge on the target
    Detect,
    /// Solve a known challenge
    Solve,
    /// Detect, then solve what was found
    DetectAndSolve,
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobKind::Detect => write!(f, "detect"),
            JobKind::Solve => write!(f, "solve"),
            JobKind::DetectAndSolve => write!(f, "detect_and_solve"),
        }
    }
}

/// Job lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Whether no further transition is possible (modulo retry re-entry
    /// from `Failed`)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// Opaque request payload a job operates on
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobTarget {
    /// Page or resource the challenge lives on
    pub url: String,
    /// Challenge kind hint, when the submitter knows it
    pub captcha_kind: Option<String>,
    /// Free-form submitter metadata, passed through to agents
    pub metadata: HashMap<String, serde_json::Value>,
}

impl JobTarget {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            captcha_kind: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_captcha_kind(mut self, kind: impl Into<String>) -> Self {
        self.captcha_kind = Some(kind.into());
        self
    }
}

/// What a completed job produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum JobOutcome {
    /// Detection verdict
    Detection {
        found: bool,
        captcha_kind: Option<String>,
    },
    /// A consensus-approved solution
    Solution {
        answer: String,
        confidence: f64,
        reason: ConsensusReason,
    },
}

/// A unit of requested work tracked by the scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub kind: JobKind,
    pub target: JobTarget,
    /// Lower is dispatched first; clamped to [0, 100] at creation
    pub priority: i32,
    pub status: JobStatus,
    pub attempts: u32,
    pub max_attempts: u32,
    pub timeout_ms: u64,
    pub created_at: u64,
    pub started_at: Option<u64>,
    pub completed_at: Option<u64>,
    /// Earliest dispatch time after a retry re-queue (ms since epoch)
    pub retry_at: Option<u64>,
    pub last_error: Option<String>,
    pub result: Option<JobOutcome>,
}

impl Job {
    pub fn new(
        id: impl Into<JobId>,
        kind: JobKind,
        target: JobTarget,
        priority: i32,
        max_attempts: u32,
        timeout_ms: u64,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            target,
            priority: priority.clamp(MIN_PRIORITY, MAX_PRIORITY),
            status: JobStatus::Pending,
            attempts: 0,
            max_attempts: max_attempts.max(1),
            timeout_ms,
            created_at: current_timestamp(),
            started_at: None,
            completed_at: None,
            retry_at: None,
            last_error: None,
            result: None,
        }
    }

    /// Transition from Pending to Running: counts the attempt and stamps
    /// the start time. No-op from any other state.
    pub fn mark_running(&mut self) {
        if self.status == JobStatus::Pending {
            self.status = JobStatus::Running;
            self.attempts = (self.attempts + 1).min(self.max_attempts);
            self.started_at = Some(current_timestamp());
            self.retry_at = None;
        }
    }

    /// Transition from Running to Completed. No-op otherwise.
    pub fn mark_completed(&mut self, outcome: JobOutcome) {
        if self.status == JobStatus::Running {
            self.status = JobStatus::Completed;
            self.completed_at = Some(current_timestamp());
            self.last_error = None;
            self.result = Some(outcome);
        }
    }

    /// Transition from Running to Failed. No-op otherwise.
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        if self.status == JobStatus::Running {
            self.status = JobStatus::Failed;
            self.completed_at = Some(current_timestamp());
            self.last_error = Some(error.into());
        }
    }

    /// Re-enter Pending from Failed for another attempt. Only permitted
    /// while attempts remain; no-op otherwise.
    pub fn mark_retrying(&mut self, retry_at: u64) {
        if self.status == JobStatus::Failed && self.attempts < self.max_attempts {
            self.status = JobStatus::Pending;
            self.completed_at = None;
            self.retry_at = Some(retry_at);
        }
    }

    /// Transition from Pending or Running to Cancelled. No-op on
    /// terminal states.
    pub fn mark_cancelled(&mut self, reason: impl Into<String>) {
        if matches!(self.status, JobStatus::Pending | JobStatus::Running) {
            self.status = JobStatus::Cancelled;
            self.completed_at = Some(current_timestamp());
            self.last_error = Some(reason.into());
        }
    }

    /// Whether the job may be re-queued after a retryable failure
    pub fn can_retry(&self) -> bool {
        self.status == JobStatus::Failed && self.attempts < self.max_attempts
    }

    /// Whether the job is due for dispatch at `now` (retry delay elapsed)
    pub fn is_due(&self, now: u64) -> bool {
        self.retry_at.is_none_or(|at| at <= now)
    }

    /// Processing time of the last attempt, available once terminal
    pub fn duration_ms(&self) -> Option<u64> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some(end.saturating_sub(start)),
            _ => None,
        }
    }
}

/// Read-only point-in-time view of a job, returned by status queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub id: JobId,
    pub kind: JobKind,
    pub status: JobStatus,
    pub priority: i32,
    pub attempts: u32,
    pub max_attempts: u32,
    pub created_at: u64,
    pub started_at: Option<u64>,
    pub completed_at: Option<u64>,
    pub retry_at: Option<u64>,
    pub result: Option<JobOutcome>,
    pub error: Option<String>,
}

impl From<&Job> for JobSnapshot {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id.clone(),
            kind: job.kind,
            status: job.status,
            priority: job.priority,
            attempts: job.attempts,
            max_attempts: job.max_attempts,
            created_at: job.created_at,
            started_at: job.started_at,
            completed_at: job.completed_at,
            retry_at: job.retry_at,
            result: job.result.clone(),
            error: job.last_error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_job() -> Job {
        Job::new(
            "job-1",
            JobKind::Solve,
            JobTarget::new("https://example.com/login"),
            50,
            3,
            120_000,
        )
    }

    #[test]
    fn test_new_is_pending() {
        let job = make_job();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.attempts, 0);
        assert!(job.started_at.is_none());
        assert!(!job.status.is_terminal());
    }

    #[test]
    fn test_priority_clamped() {
        let job = Job::new("j", JobKind::Detect, JobTarget::default(), 250, 1, 60_000);
        assert_eq!(job.priority, MAX_PRIORITY);

        let job = Job::new("j", JobKind::Detect, JobTarget::default(), -5, 1, 60_000);
        assert_eq!(job.priority, MIN_PRIORITY);
    }

    #[test]
    fn test_running_counts_attempt() {
        let mut job = make_job();
        job.mark_running();
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(job.attempts, 1);
        assert!(job.started_at.is_some());
    }

    #[test]
    fn test_complete_clears_error() {
        let mut job = make_job();
        job.mark_running();
        job.mark_failed("transient");
        job.mark_retrying(0);
        job.mark_running();
        job.mark_completed(JobOutcome::Solution {
            answer: "X".into(),
            confidence: 0.97,
            reason: ConsensusReason::Unanimous,
        });

        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.last_error.is_none());
        assert!(job.result.is_some());
        assert!(job.duration_ms().is_some());
    }

    #[test]
    fn test_retry_reenters_pending() {
        let mut job = make_job();
        job.mark_running();
        job.mark_failed("agent timeout");

        assert!(job.can_retry());
        job.mark_retrying(12345);
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.retry_at, Some(12345));
        assert_eq!(job.attempts, 1);
    }

    #[test]
    fn test_no_retry_after_attempts_exhausted() {
        let mut job = make_job();
        for _ in 0..3 {
            job.mark_running();
            job.mark_failed("still broken");
            job.mark_retrying(0);
        }

        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.attempts, 3);
        assert!(!job.can_retry());

        // Re-entry attempt is a no-op
        job.mark_retrying(0);
        assert_eq!(job.status, JobStatus::Failed);
    }

    #[test]
    fn test_cancel_from_pending_and_running() {
        let mut job = make_job();
        job.mark_cancelled("operator request");
        assert_eq!(job.status, JobStatus::Cancelled);
        assert_eq!(job.last_error.as_deref(), Some("operator request"));

        let mut job = make_job();
        job.mark_running();
        job.mark_cancelled("timeout");
        assert_eq!(job.status, JobStatus::Cancelled);
    }

    #[test]
    fn test_terminal_states_are_immutable() {
        let mut job = make_job();
        job.mark_running();
        job.mark_completed(JobOutcome::Detection {
            found: false,
            captcha_kind: None,
        });

        job.mark_cancelled("too late");
        assert_eq!(job.status, JobStatus::Completed);

        job.mark_failed("too late");
        assert_eq!(job.status, JobStatus::Completed);

        job.mark_running();
        assert_eq!(job.status, JobStatus::Completed);
    }

    #[test]
    fn test_is_due_respects_retry_at() {
        let mut job = make_job();
        assert!(job.is_due(0));

        job.mark_running();
        job.mark_failed("x");
        job.mark_retrying(1_000);
        assert!(!job.is_due(999));
        assert!(job.is_due(1_000));
    }

    #[test]
    fn test_snapshot_reflects_job() {
        let mut job = make_job();
        job.mark_running();
        job.mark_failed("boom");

        let snapshot = JobSnapshot::from(&job);
        assert_eq!(snapshot.status, JobStatus::Failed);
        assert_eq!(snapshot.attempts, 1);
        assert_eq!(snapshot.error.as_deref(), Some("boom"));
    }
}
