//! Infrastructure layer for trisolve
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod alerts;
pub mod config;
pub mod detector;
pub mod providers;

// Re-export commonly used types
pub use alerts::LogAlertSink;
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileProviderConfig, FileSchedulerConfig,
    FileSolverConfig,
};
pub use detector::MarkerDetector;
pub use providers::{
    HttpAgentProvider, ProviderTaskKind, QuotaLedger, QuotaStatus, agent_slots_from_config,
    ledger_from_config,
};
