//! Priority job queue
//!
//! Ordering is priority-then-FIFO: lower priority values dispatch first,
//! ties break by submission order. Retried jobs carry a `retry_at` stamp
//! and are skipped until due, without losing their place in the order.

use trisolve_domain::{DomainError, Job, JobId};

#[derive(Debug, Clone)]
struct QueueEntry {
    job_id: JobId,
    priority: i32,
    seq: u64,
    retry_at: Option<u64>,
}

/// Bounded priority queue over job ids; job bodies live in the scheduler map
#[derive(Debug)]
pub struct JobQueue {
    entries: Vec<QueueEntry>,
    capacity: usize,
    next_seq: u64,
}

impl JobQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity: capacity.max(1),
            next_seq: 0,
        }
    }

    /// Enqueue a pending job. Re-queued retries pass their `retry_at`
    /// through the job itself.
    pub fn push(&mut self, job: &Job) -> Result<(), DomainError> {
        if self.entries.len() >= self.capacity {
            return Err(DomainError::QueueFull {
                capacity: self.capacity,
            });
        }
        let entry = QueueEntry {
            job_id: job.id.clone(),
            priority: job.priority,
            seq: self.next_seq,
            retry_at: job.retry_at,
        };
        self.next_seq += 1;
        // Equal priorities keep submission order, so the new entry goes
        // after every entry at or below its priority value
        let at = self
            .entries
            .partition_point(|e| e.priority <= entry.priority);
        self.entries.insert(at, entry);
        Ok(())
    }

    /// Pop the first due entry in dispatch order. Entries with a future
    /// `retry_at` are passed over.
    pub fn pop_due(&mut self, now: u64) -> Option<JobId> {
        let at = self
            .entries
            .iter()
            .position(|e| e.retry_at.is_none_or(|t| t <= now))?;
        Some(self.entries.remove(at).job_id)
    }

    /// Remove a queued entry, e.g. on cancellation. Returns whether it
    /// was present.
    pub fn remove(&mut self, job_id: &JobId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| &e.job_id != job_id);
        self.entries.len() < before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trisolve_domain::{JobKind, JobTarget};

    fn job(id: &str, priority: i32) -> Job {
        Job::new(id, JobKind::Solve, JobTarget::new("u"), priority, 3, 60_000)
    }

    #[test]
    fn test_priority_then_fifo_order() {
        let mut queue = JobQueue::new(10);
        queue.push(&job("fifty-first", 50)).unwrap();
        queue.push(&job("ten", 10)).unwrap();
        queue.push(&job("fifty-second", 50)).unwrap();
        queue.push(&job("five", 5)).unwrap();

        let order: Vec<String> = std::iter::from_fn(|| queue.pop_due(0))
            .map(|id| id.as_str().to_string())
            .collect();
        assert_eq!(order, vec!["five", "ten", "fifty-first", "fifty-second"]);
    }

    #[test]
    fn test_capacity_limit() {
        let mut queue = JobQueue::new(2);
        queue.push(&job("a", 1)).unwrap();
        queue.push(&job("b", 1)).unwrap();

        let err = queue.push(&job("c", 1)).unwrap_err();
        assert_eq!(err, DomainError::QueueFull { capacity: 2 });
    }

    #[test]
    fn test_retry_at_defers_dispatch() {
        let mut queue = JobQueue::new(10);
        let mut urgent = job("urgent", 1);
        urgent.retry_at = Some(1_000);
        queue.push(&urgent).unwrap();
        queue.push(&job("later", 90)).unwrap();

        // The urgent job is not due yet, so the lower-priority one runs
        assert_eq!(queue.pop_due(500).unwrap().as_str(), "later");
        assert!(queue.pop_due(500).is_none());
        assert_eq!(queue.pop_due(1_000).unwrap().as_str(), "urgent");
    }

    #[test]
    fn test_remove() {
        let mut queue = JobQueue::new(10);
        queue.push(&job("a", 1)).unwrap();

        assert!(queue.remove(&JobId::new("a")));
        assert!(!queue.remove(&JobId::new("a")));
        assert!(queue.is_empty());
    }
}
