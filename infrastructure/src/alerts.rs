//! Alert sink backed by the tracing subscriber

use tracing::{error, info, warn};
use trisolve_application::{AlertEvent, AlertSeverity, AlertSink};

/// Emits alerts as structured log records
pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    fn send(&self, event: AlertEvent) {
        let context = serde_json::to_string(&event.context).unwrap_or_default();
        match event.severity {
            AlertSeverity::Info => {
                info!(category = %event.category, %context, "{}", event.message)
            }
            AlertSeverity::Warning => {
                warn!(category = %event.category, %context, "{}", event.message)
            }
            AlertSeverity::Emergency => {
                error!(category = %event.category, %context, "{}", event.message)
            }
        }
    }
}
