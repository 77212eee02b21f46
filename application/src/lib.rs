//! Application layer for trisolve
//!
//! Use cases, ports, and the job scheduler. Depends on the domain layer
//! and defines the interfaces (ports) that infrastructure implements.

pub mod config;
pub mod ports;
pub mod scheduler;
pub mod use_cases;

pub use config::{SchedulerParams, SolverParams, MAX_JOB_TIMEOUT_MS, MIN_JOB_TIMEOUT_MS};
pub use ports::agent_provider::{AgentProvider, ProviderAnswer, ProviderError, SolveTask};
pub use ports::alerts::{AlertEvent, AlertSeverity, AlertSink, NoAlerts};
pub use ports::detector::{ChallengeDetector, DetectionReport};
pub use ports::lifecycle::{JobEvent, JobEventSender};
pub use scheduler::{JobScheduler, QueueStats, SubmitRequest};
pub use use_cases::execute_job::{ExecuteJobUseCase, JobRunDisposition};
pub use use_cases::solve_parallel::{ParallelSolveUseCase, SolveOutcome};
