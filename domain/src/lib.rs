//! Domain layer for trisolve
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Quorum Consensus
//!
//! Three independent answer-producing agents attempt each challenge; the
//! [`consensus::ConsensusEngine`] turns their three results into a single
//! submit-or-refuse verdict, gated by a strict confidence floor. This is a
//! single-process vote, not a distributed consensus protocol.
//!
//! ## Job Lifecycle
//!
//! Every unit of work is a [`job::Job`] moving through
//! `Pending -> Running -> Completed/Failed/Cancelled`, with bounded
//! retries and exponential backoff driven by the consensus verdict.

pub mod agent;
pub mod consensus;
pub mod core;
pub mod job;

// Re-export commonly used types
pub use agent::AgentResult;
pub use consensus::{
    ConsensusAction, ConsensusDecision, ConsensusEngine, ConsensusReason, ConsensusStatistics,
    QuorumSettings, validate_decision,
};
pub use core::{current_timestamp, error::DomainError};
pub use job::{
    Job, JobId, JobKind, JobOutcome, JobSnapshot, JobStatus, JobTarget, RetryPolicy,
    WorkerPoolMetrics,
};
