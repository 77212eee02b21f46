//! Challenge detector port
//!
//! Browser/DOM automation and element-detection heuristics are external
//! collaborators behind this interface.

use super::agent_provider::SolveTask;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use trisolve_domain::DomainError;

/// What the detector found on the target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionReport {
    pub found: bool,
    /// Detected challenge kind, when identifiable
    pub captcha_kind: Option<String>,
    /// Free-form detail (selector, bounding box, screenshot ref)
    pub details: Option<String>,
}

impl DetectionReport {
    pub fn found(captcha_kind: impl Into<String>) -> Self {
        Self {
            found: true,
            captcha_kind: Some(captcha_kind.into()),
            details: None,
        }
    }

    pub fn not_found() -> Self {
        Self {
            found: false,
            captcha_kind: None,
            details: None,
        }
    }
}

/// Detects whether a challenge is present on a target
#[async_trait]
pub trait ChallengeDetector: Send + Sync {
    async fn detect(&self, task: &SolveTask) -> Result<DetectionReport, DomainError>;
}
