//! Job lifecycle events
//!
//! Lifecycle notifications are modeled as an explicit event channel rather
//! than ambient callbacks, keeping ordering and backpressure visible to the
//! consumer. Subscribers receive a plain `mpsc` receiver; a scheduler with
//! no subscriber pays nothing.

use tokio::sync::mpsc;
use trisolve_domain::{JobId, JobKind};

/// Events emitted as jobs move through their lifecycle
#[derive(Debug, Clone)]
pub enum JobEvent {
    Created {
        job_id: JobId,
        kind: JobKind,
        priority: i32,
    },
    Started {
        job_id: JobId,
        attempt: u32,
    },
    Completed {
        job_id: JobId,
        elapsed_ms: u64,
    },
    Failed {
        job_id: JobId,
        error: String,
        attempts: u32,
    },
    Retried {
        job_id: JobId,
        attempt: u32,
        delay_ms: u64,
    },
    Cancelled {
        job_id: JobId,
        reason: String,
    },
}

impl JobEvent {
    pub fn job_id(&self) -> &JobId {
        match self {
            JobEvent::Created { job_id, .. }
            | JobEvent::Started { job_id, .. }
            | JobEvent::Completed { job_id, .. }
            | JobEvent::Failed { job_id, .. }
            | JobEvent::Retried { job_id, .. }
            | JobEvent::Cancelled { job_id, .. } => job_id,
        }
    }
}

/// Publishing half of the lifecycle channel
///
/// Cloneable; a sender without a live receiver silently drops events.
#[derive(Debug, Clone, Default)]
pub struct JobEventSender {
    tx: Option<mpsc::UnboundedSender<JobEvent>>,
}

impl JobEventSender {
    /// A sender with no subscriber; all events are dropped
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Create a connected sender/receiver pair
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<JobEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn publish(&self, event: JobEvent) {
        if let Some(tx) = &self.tx {
            // Receiver may have been dropped; that's fine
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let (sender, mut rx) = JobEventSender::channel();
        let id = JobId::new("job-1");

        sender.publish(JobEvent::Created {
            job_id: id.clone(),
            kind: JobKind::Solve,
            priority: 10,
        });
        sender.publish(JobEvent::Started {
            job_id: id.clone(),
            attempt: 1,
        });

        assert!(matches!(rx.recv().await, Some(JobEvent::Created { .. })));
        assert!(matches!(rx.recv().await, Some(JobEvent::Started { .. })));
    }

    #[test]
    fn test_disabled_sender_drops_events() {
        let sender = JobEventSender::disabled();
        sender.publish(JobEvent::Cancelled {
            job_id: JobId::new("x"),
            reason: "test".into(),
        });
    }

    #[test]
    fn test_job_id_accessor() {
        let event = JobEvent::Failed {
            job_id: JobId::new("j-9"),
            error: "boom".into(),
            attempts: 2,
        };
        assert_eq!(event.job_id().as_str(), "j-9");
    }
}
