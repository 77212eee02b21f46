//! AgentResult value type
//!
//! One agent's opinion for one solve attempt. Created by the orchestrator
//! invocation that ran the agent and never mutated afterwards. A failed
//! agent call is still represented as an `AgentResult` (empty answer,
//! confidence zero, `error` set) so that audit trails always carry one
//! entry per agent slot.

use crate::core::current_timestamp;
use serde::{Deserialize, Serialize};

/// One agent's answer (or failure) for a single solve attempt
///
/// # Example
///
/// ```
/// use trisolve_domain::agent::AgentResult;
///
/// let ok = AgentResult::solved("vision-a", "7X3K9", 0.98, 1200, "vision");
/// assert!(ok.is_valid());
///
/// let bad = AgentResult::failed("vision-b", "connection reset", 300);
/// assert!(!bad.is_valid());
/// assert_eq!(bad.confidence, 0.0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentResult {
    /// Stable agent identifier, used for deterministic ordering
    pub agent_id: String,
    /// Proposed answer (empty on failure)
    pub answer: String,
    /// Confidence in [0.0, 1.0]
    pub confidence: f64,
    /// Wall-clock time the agent spent, in milliseconds
    pub elapsed_ms: u64,
    /// Free-form label for how the answer was produced
    pub method: String,
    /// Creation timestamp (milliseconds since epoch)
    pub timestamp: u64,
    /// Failure description, if the agent call failed
    pub error: Option<String>,
}

impl AgentResult {
    /// Create a successful result. Confidence is clamped to [0.0, 1.0].
    pub fn solved(
        agent_id: impl Into<String>,
        answer: impl Into<String>,
        confidence: f64,
        elapsed_ms: u64,
        method: impl Into<String>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            answer: answer.into(),
            confidence: confidence.clamp(0.0, 1.0),
            elapsed_ms,
            method: method.into(),
            timestamp: current_timestamp(),
            error: None,
        }
    }

    /// Create a failed result with zero confidence and an empty answer
    pub fn failed(
        agent_id: impl Into<String>,
        error: impl Into<String>,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            answer: String::new(),
            confidence: 0.0,
            elapsed_ms,
            method: String::new(),
            timestamp: current_timestamp(),
            error: Some(error.into()),
        }
    }

    /// Whether this result may participate in a consensus vote
    pub fn is_valid(&self) -> bool {
        self.confidence > 0.0 && self.error.is_none()
    }

    /// Get a short display name for the agent
    ///
    /// E.g., "vision-gemini-flash" -> "vision"
    pub fn short_agent_name(&self) -> &str {
        self.agent_id
            .split(['-', '_'])
            .next()
            .unwrap_or(&self.agent_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solved_result() {
        let result = AgentResult::solved("agent-a", "ABC12", 0.97, 850, "vision");
        assert_eq!(result.agent_id, "agent-a");
        assert_eq!(result.answer, "ABC12");
        assert_eq!(result.confidence, 0.97);
        assert!(result.error.is_none());
        assert!(result.is_valid());
    }

    #[test]
    fn test_failed_result() {
        let result = AgentResult::failed("agent-b", "timeout", 5000);
        assert!(result.answer.is_empty());
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.error.as_deref(), Some("timeout"));
        assert!(!result.is_valid());
    }

    #[test]
    fn test_confidence_clamped() {
        let result = AgentResult::solved("a", "x", 1.7, 10, "ocr");
        assert_eq!(result.confidence, 1.0);

        let result = AgentResult::solved("a", "x", -0.2, 10, "ocr");
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_zero_confidence_is_not_valid() {
        let result = AgentResult::solved("a", "x", 0.0, 10, "ocr");
        assert!(!result.is_valid());
    }

    #[test]
    fn test_short_agent_name() {
        let result = AgentResult::solved("vision-gemini-flash", "x", 0.9, 10, "vision");
        assert_eq!(result.short_agent_name(), "vision");

        let result = AgentResult::solved("ocr_tesseract", "x", 0.9, 10, "ocr");
        assert_eq!(result.short_agent_name(), "ocr");
    }
}
