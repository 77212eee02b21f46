//! Job scheduler
//!
//! Owns the priority queue, the job map, and the dispatch loop that feeds
//! the worker pool. All shared state sits behind one mutex; the dispatch
//! loop and per-job completion handlers are the only writers.

pub mod queue;

pub use queue::JobQueue;

use crate::config::SchedulerParams;
use crate::ports::alerts::{AlertEvent, AlertSeverity, AlertSink};
use crate::ports::lifecycle::{JobEvent, JobEventSender};
use crate::use_cases::execute_job::{ExecuteJobUseCase, JobRunDisposition};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use trisolve_domain::{
    current_timestamp, DomainError, Job, JobId, JobKind, JobSnapshot, JobStatus, JobTarget,
    WorkerPoolMetrics,
};

/// A job submission. Priority and timeout are clamped by the scheduler.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub kind: JobKind,
    pub target: JobTarget,
    pub priority: i32,
    pub max_attempts: Option<u32>,
    pub timeout_ms: Option<u64>,
}

impl SubmitRequest {
    pub fn new(kind: JobKind, target: JobTarget) -> Self {
        Self {
            kind,
            target,
            priority: 50,
            max_attempts: None,
            timeout_ms: None,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }
}

/// Point-in-time queue and status counts
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueueStats {
    pub queued: usize,
    pub active: usize,
    pub pending: u64,
    pub running: u64,
    pub completed: u64,
    pub failed: u64,
    pub cancelled: u64,
}

// 0 = healthy, 1 = below warning floor, 2 = below emergency floor
type AccuracyLevel = u8;

struct SchedulerState {
    queue: JobQueue,
    jobs: HashMap<JobId, Job>,
    active: HashMap<JobId, CancellationToken>,
    metrics: WorkerPoolMetrics,
    consecutive_failures: u32,
    completed_order: VecDeque<JobId>,
    accuracy_level: AccuracyLevel,
    next_id: u64,
}

impl SchedulerState {
    fn new(max_queue_size: usize) -> Self {
        Self {
            queue: JobQueue::new(max_queue_size),
            jobs: HashMap::new(),
            active: HashMap::new(),
            metrics: WorkerPoolMetrics::default(),
            consecutive_failures: 0,
            completed_order: VecDeque::new(),
            accuracy_level: 0,
            next_id: 0,
        }
    }

    fn next_job_id(&mut self) -> JobId {
        self.next_id += 1;
        JobId::new(format!("job-{:06}", self.next_id))
    }

    /// Record a terminal job and evict the oldest beyond the retention cap
    fn retain_terminal(&mut self, job_id: JobId, retention: usize) {
        self.completed_order.push_back(job_id);
        while self.completed_order.len() > retention {
            if let Some(evicted) = self.completed_order.pop_front() {
                self.jobs.remove(&evicted);
            }
        }
    }
}

/// Priority scheduler with a bounded worker pool
pub struct JobScheduler {
    state: Mutex<SchedulerState>,
    params: SchedulerParams,
    executor: Arc<ExecuteJobUseCase>,
    alerts: Arc<dyn AlertSink>,
    events: JobEventSender,
    shutdown: CancellationToken,
    loop_handle: Mutex<Option<JoinHandle<()>>>,
}

impl JobScheduler {
    pub fn new(
        params: SchedulerParams,
        executor: Arc<ExecuteJobUseCase>,
        alerts: Arc<dyn AlertSink>,
        events: JobEventSender,
    ) -> Self {
        Self {
            state: Mutex::new(SchedulerState::new(params.max_queue_size)),
            params,
            executor,
            alerts,
            events,
            shutdown: CancellationToken::new(),
            loop_handle: Mutex::new(None),
        }
    }

    /// Enqueue a job. Returns immediately; execution happens on the
    /// dispatch loop.
    pub async fn submit(&self, request: SubmitRequest) -> Result<JobId, DomainError> {
        let mut state = self.state.lock().await;
        if state.queue.len() >= self.params.max_queue_size {
            return Err(DomainError::QueueFull {
                capacity: self.params.max_queue_size,
            });
        }

        let id = state.next_job_id();
        let job = Job::new(
            id.clone(),
            request.kind,
            request.target,
            request.priority,
            request.max_attempts.unwrap_or(self.params.max_attempts),
            self.params.clamp_timeout(request.timeout_ms),
        );
        let (kind, priority) = (job.kind, job.priority);
        state.queue.push(&job)?;
        state.jobs.insert(id.clone(), job);
        state.metrics.record_submission();
        drop(state);

        self.events.publish(JobEvent::Created {
            job_id: id.clone(),
            kind,
            priority,
        });
        info!(job = %id, %kind, priority, "Job submitted");
        Ok(id)
    }

    /// Snapshot of a job's current state
    pub async fn status(&self, job_id: &JobId) -> Result<JobSnapshot, DomainError> {
        let state = self.state.lock().await;
        state
            .jobs
            .get(job_id)
            .map(JobSnapshot::from)
            .ok_or_else(|| DomainError::NotFound(job_id.clone()))
    }

    /// Cancel a job. Pending jobs settle immediately; running jobs settle
    /// once the executor observes the signal.
    pub async fn cancel(&self, job_id: &JobId, reason: &str) -> Result<(), DomainError> {
        let mut state = self.state.lock().await;

        if let Some(token) = state.active.get(job_id) {
            token.cancel();
            info!(job = %job_id, reason, "Cancellation signalled to running job");
            return Ok(());
        }

        let status = state
            .jobs
            .get(job_id)
            .map(|job| job.status)
            .ok_or_else(|| DomainError::NotFound(job_id.clone()))?;
        if status != JobStatus::Pending {
            return Err(DomainError::InvalidState {
                job: job_id.clone(),
                status,
            });
        }

        state.queue.remove(job_id);
        if let Some(job) = state.jobs.get_mut(job_id) {
            job.mark_cancelled(reason);
        }
        state.metrics.record_cancellation();
        state.retain_terminal(job_id.clone(), self.params.completed_retention);
        drop(state);

        self.events.publish(JobEvent::Cancelled {
            job_id: job_id.clone(),
            reason: reason.to_string(),
        });
        info!(job = %job_id, reason, "Pending job cancelled");
        Ok(())
    }

    /// Spawn the dispatch loop
    pub async fn start(self: Arc<Self>) {
        let mut handle = self.loop_handle.lock().await;
        if handle.is_some() {
            return;
        }
        let this = Arc::clone(&self);
        *handle = Some(tokio::spawn(async move { this.dispatch_loop().await }));
        info!(max_workers = self.params.max_workers, "Scheduler started");
    }

    /// Stop the dispatch loop, cancel active jobs, and wait (bounded) for
    /// the worker pool to drain.
    pub async fn stop(&self) {
        self.shutdown.cancel();
        {
            let state = self.state.lock().await;
            for token in state.active.values() {
                token.cancel();
            }
        }

        if let Some(handle) = self.loop_handle.lock().await.take() {
            let _ = handle.await;
        }

        for _ in 0..100 {
            if self.state.lock().await.active.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        info!("Scheduler stopped");
    }

    pub async fn metrics(&self) -> WorkerPoolMetrics {
        let state = self.state.lock().await;
        let mut metrics = state.metrics.clone();
        metrics.queued_count = state.queue.len();
        metrics.active_count = state.active.len();
        metrics
    }

    pub async fn queue_stats(&self) -> QueueStats {
        let state = self.state.lock().await;
        let mut stats = QueueStats {
            queued: state.queue.len(),
            active: state.active.len(),
            ..QueueStats::default()
        };
        for job in state.jobs.values() {
            match job.status {
                JobStatus::Pending => stats.pending += 1,
                JobStatus::Running => stats.running += 1,
                JobStatus::Completed => stats.completed += 1,
                JobStatus::Failed => stats.failed += 1,
                JobStatus::Cancelled => stats.cancelled += 1,
            }
        }
        stats
    }

    async fn dispatch_loop(self: Arc<Self>) {
        loop {
            if self.shutdown.is_cancelled() {
                break;
            }
            if !Self::try_dispatch(&self).await {
                tokio::select! {
                    _ = self.shutdown.cancelled() => break,
                    _ = tokio::time::sleep(Duration::from_millis(self.params.idle_poll_ms)) => {}
                }
            }
        }
        debug!("Dispatch loop exited");
    }

    /// Pop one due job and hand it to a worker. Returns false when idle
    /// (pool saturated or nothing due).
    async fn try_dispatch(this: &Arc<Self>) -> bool {
        let job_id = {
            let mut state = this.state.lock().await;
            if state.active.len() >= this.params.max_workers {
                return false;
            }
            let Some(job_id) = state.queue.pop_due(current_timestamp()) else {
                return false;
            };
            let token = CancellationToken::new();
            state.active.insert(job_id.clone(), token.clone());
            job_id
        };

        let worker = Arc::clone(this);
        tokio::spawn(async move { worker.run_job(job_id).await });
        true
    }

    async fn run_job(self: Arc<Self>, job_id: JobId) {
        let (mut job, token) = {
            let mut state = self.state.lock().await;
            let Some(token) = state.active.get(&job_id).cloned() else {
                return;
            };
            let Some(stored) = state.jobs.get_mut(&job_id) else {
                state.active.remove(&job_id);
                return;
            };
            // The executor works on its own copy; the stored one mirrors
            // the Running transition so status queries stay truthful, and
            // the executed copy is written back when the attempt settles
            let job = stored.clone();
            stored.mark_running();
            (job, token)
        };

        let disposition = self.executor.execute(&mut job, token).await;

        let mut state = self.state.lock().await;
        state.active.remove(&job_id);

        let event = match disposition {
            JobRunDisposition::Completed(_) => {
                state.metrics.record_completion(job.duration_ms().unwrap_or(0));
                state.consecutive_failures = 0;
                state.retain_terminal(job_id.clone(), self.params.completed_retention);
                JobEvent::Completed {
                    job_id: job_id.clone(),
                    elapsed_ms: job.duration_ms().unwrap_or(0),
                }
            }
            JobRunDisposition::Retry { error, delay_ms } => {
                state.metrics.record_retry();
                state.consecutive_failures += 1;
                if state.queue.len() < state.queue.capacity() {
                    job.mark_retrying(current_timestamp() + delay_ms);
                    if let Err(err) = state.queue.push(&job) {
                        warn!(job = %job_id, %err, "Retry enqueue failed");
                    }
                    JobEvent::Retried {
                        job_id: job_id.clone(),
                        attempt: job.attempts,
                        delay_ms,
                    }
                } else {
                    // The queue refilled while the job was running; it
                    // stays Failed rather than displacing fresh work
                    warn!(job = %job_id, "Retry dropped, queue full");
                    state.metrics.record_failure();
                    state.retain_terminal(job_id.clone(), self.params.completed_retention);
                    JobEvent::Failed {
                        job_id: job_id.clone(),
                        error: format!("{error}; retry dropped, queue full"),
                        attempts: job.attempts,
                    }
                }
            }
            JobRunDisposition::Failed(error) => {
                state.metrics.record_failure();
                state.consecutive_failures += 1;
                state.retain_terminal(job_id.clone(), self.params.completed_retention);
                JobEvent::Failed {
                    job_id: job_id.clone(),
                    error,
                    attempts: job.attempts,
                }
            }
            JobRunDisposition::Cancelled(reason) => {
                state.metrics.record_cancellation();
                state.retain_terminal(job_id.clone(), self.params.completed_retention);
                JobEvent::Cancelled {
                    job_id: job_id.clone(),
                    reason,
                }
            }
        };

        state.jobs.insert(job_id, job);
        self.raise_health_alerts(&mut state);
        drop(state);

        self.events.publish(event);
    }

    /// Consecutive-failure and rolling-accuracy alerts, fired on threshold
    /// crossings only
    fn raise_health_alerts(&self, state: &mut SchedulerState) {
        if state.consecutive_failures == self.params.consecutive_failure_alert {
            self.alerts.send(
                AlertEvent::new(
                    AlertSeverity::Warning,
                    "reliability",
                    format!("{} consecutive job failures", state.consecutive_failures),
                )
                .with_context(
                    "consecutive_failures",
                    serde_json::json!(state.consecutive_failures),
                ),
            );
        }

        let samples = state.metrics.completed + state.metrics.failed;
        if samples < self.params.min_samples_for_accuracy {
            return;
        }
        let rate = state.metrics.success_rate();
        let level: AccuracyLevel = if rate < self.params.accuracy_emergency {
            2
        } else if rate < self.params.accuracy_warning {
            1
        } else {
            0
        };
        if level > state.accuracy_level {
            let severity = if level == 2 {
                AlertSeverity::Emergency
            } else {
                AlertSeverity::Warning
            };
            self.alerts.send(
                AlertEvent::new(
                    severity,
                    "accuracy",
                    format!("Success rate dropped to {:.1}%", rate * 100.0),
                )
                .with_context("success_rate", serde_json::json!(rate))
                .with_context("samples", serde_json::json!(samples)),
            );
        }
        state.accuracy_level = level;
    }
}
