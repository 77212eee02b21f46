//! Execute job use case
//!
//! Runs one job through a single attempt: arms the per-job timeout, wires
//! the cancellation signal, dispatches on the job kind, and classifies the
//! outcome into a disposition the scheduler applies (complete, retry with
//! backoff, terminal failure, or cancellation).

use crate::ports::agent_provider::SolveTask;
use crate::ports::detector::ChallengeDetector;
use crate::ports::lifecycle::{JobEvent, JobEventSender};
use crate::use_cases::solve_parallel::ParallelSolveUseCase;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use trisolve_domain::{DomainError, Job, JobKind, JobOutcome, RetryPolicy};

/// What the scheduler should do with the job after one attempt
#[derive(Debug, Clone)]
pub enum JobRunDisposition {
    /// Attempt succeeded; job is terminal
    Completed(JobOutcome),
    /// Retryable failure with attempts remaining; re-enqueue after the delay
    Retry { error: String, delay_ms: u64 },
    /// Non-retryable failure or attempt budget exhausted; job is terminal
    Failed(String),
    /// Cancellation signal observed; job is terminal
    Cancelled(String),
}

/// Use case for executing a single job attempt
pub struct ExecuteJobUseCase {
    orchestrator: Arc<ParallelSolveUseCase>,
    detector: Arc<dyn ChallengeDetector>,
    retry: RetryPolicy,
    events: JobEventSender,
}

impl ExecuteJobUseCase {
    pub fn new(
        orchestrator: Arc<ParallelSolveUseCase>,
        detector: Arc<dyn ChallengeDetector>,
        retry: RetryPolicy,
        events: JobEventSender,
    ) -> Self {
        Self {
            orchestrator,
            detector,
            retry,
            events,
        }
    }

    /// Run one attempt. The job is mutated through its `mark_*` transitions;
    /// re-enqueueing on `Retry` is the scheduler's responsibility.
    pub async fn execute(&self, job: &mut Job, token: CancellationToken) -> JobRunDisposition {
        if token.is_cancelled() {
            job.mark_cancelled("cancelled before start");
            return JobRunDisposition::Cancelled("cancelled before start".into());
        }

        job.mark_running();
        self.events.publish(JobEvent::Started {
            job_id: job.id.clone(),
            attempt: job.attempts,
        });
        info!(job = %job.id, kind = %job.kind, attempt = job.attempts, "Job attempt started");

        let attempt = tokio::time::timeout(
            Duration::from_millis(job.timeout_ms),
            self.run_kind(job, &token),
        )
        .await;

        let result = match attempt {
            Ok(result) => result,
            Err(_) => {
                // The job deadline fires the cancellation signal so any
                // in-flight agent calls unwind promptly
                token.cancel();
                Err(DomainError::Timeout { ms: job.timeout_ms })
            }
        };

        match result {
            Ok(outcome) => {
                job.mark_completed(outcome.clone());
                debug!(job = %job.id, "Job attempt completed");
                JobRunDisposition::Completed(outcome)
            }
            Err(error) if error.is_cancelled() => {
                let reason = error.to_string();
                job.mark_cancelled(&reason);
                JobRunDisposition::Cancelled(reason)
            }
            Err(error) => self.classify_failure(job, error),
        }
    }

    async fn run_kind(&self, job: &Job, token: &CancellationToken) -> Result<JobOutcome, DomainError> {
        let task = Self::to_solve_task(job);

        match job.kind {
            JobKind::Detect => {
                let report = self.detector.detect(&task).await?;
                Ok(JobOutcome::Detection {
                    found: report.found,
                    captcha_kind: report.captcha_kind,
                })
            }
            JobKind::Solve => self.solve(task, token).await,
            JobKind::DetectAndSolve => {
                let report = self.detector.detect(&task).await?;
                if !report.found {
                    return Err(DomainError::Detection("no challenge detected".into()));
                }
                let mut task = task;
                if task.captcha_kind.is_none() {
                    task.captcha_kind = report.captcha_kind;
                }
                self.solve(task, token).await
            }
        }
    }

    async fn solve(
        &self,
        task: SolveTask,
        token: &CancellationToken,
    ) -> Result<JobOutcome, DomainError> {
        let outcome = self.orchestrator.solve(&task, token).await?;
        if outcome.success {
            Ok(JobOutcome::Solution {
                // Submit outcomes always carry an answer; the fallback is unreachable
                answer: outcome.answer.unwrap_or_default(),
                confidence: outcome.confidence,
                reason: outcome.reason,
            })
        } else {
            Err(DomainError::AgentFailure(
                outcome.failure.unwrap_or_else(|| "no consensus".into()),
            ))
        }
    }

    fn classify_failure(&self, job: &mut Job, error: DomainError) -> JobRunDisposition {
        let message = error.to_string();
        job.mark_failed(&message);

        if self.retry.is_retryable(&error) && job.can_retry() {
            let delay_ms = self.retry.backoff_delay(job.attempts);
            info!(job = %job.id, attempt = job.attempts, delay_ms, error = %message, "Job attempt failed, will retry");
            JobRunDisposition::Retry { error: message, delay_ms }
        } else {
            warn!(job = %job.id, attempts = job.attempts, error = %message, "Job failed terminally");
            JobRunDisposition::Failed(message)
        }
    }

    fn to_solve_task(job: &Job) -> SolveTask {
        SolveTask {
            url: job.target.url.clone(),
            captcha_kind: job.target.captcha_kind.clone(),
            image_base64: None,
            metadata: job.target.metadata.clone(),
        }
    }
}
