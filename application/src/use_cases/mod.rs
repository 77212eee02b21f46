//! Use case implementations

pub mod execute_job;
pub mod solve_parallel;

pub use execute_job::{ExecuteJobUseCase, JobRunDisposition};
pub use solve_parallel::{ParallelSolveUseCase, SolveOutcome};
