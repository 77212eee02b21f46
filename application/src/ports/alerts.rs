//! Alerting port
//!
//! The scheduler raises operational alerts (accuracy degradation,
//! consecutive failures) through this sink. Delivery (chat, webhook) is an
//! infrastructure concern; the sink is an injected capability passed in at
//! construction, never a process-wide singleton, so the core stays
//! testable without network side effects.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How urgent an alert is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Emergency,
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertSeverity::Info => write!(f, "info"),
            AlertSeverity::Warning => write!(f, "warning"),
            AlertSeverity::Emergency => write!(f, "emergency"),
        }
    }
}

/// One alert event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    pub severity: AlertSeverity,
    /// Grouping key, e.g. "accuracy", "consecutive_failures"
    pub category: String,
    pub message: String,
    pub context: HashMap<String, serde_json::Value>,
}

impl AlertEvent {
    pub fn new(
        severity: AlertSeverity,
        category: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category: category.into(),
            message: message.into(),
            context: HashMap::new(),
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }
}

/// Sink accepting alert events
///
/// Implementations live in the presentation/infrastructure layers.
pub trait AlertSink: Send + Sync {
    fn send(&self, event: AlertEvent);
}

/// No-op alert sink for when alerting is not wired up
pub struct NoAlerts;

impl AlertSink for NoAlerts {
    fn send(&self, _event: AlertEvent) {}
}
