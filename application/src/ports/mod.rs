//! Ports: interfaces between the application core and the outside world
//!
//! Implementations (adapters) live in the infrastructure layer and are
//! injected at construction time.

pub mod agent_provider;
pub mod alerts;
pub mod detector;
pub mod lifecycle;

pub use agent_provider::{AgentProvider, ProviderAnswer, ProviderError, SolveTask};
pub use alerts::{AlertEvent, AlertSeverity, AlertSink, NoAlerts};
pub use detector::{ChallengeDetector, DetectionReport};
pub use lifecycle::{JobEvent, JobEventSender};
