//! Consensus decision types
//!
//! The verdict produced for one set of exactly three agent results. A
//! decision is an audit record: it keeps the full (sorted) input triple and
//! a human-readable voting pattern alongside the action itself.

use crate::agent::AgentResult;
use crate::core::current_timestamp;
use serde::{Deserialize, Serialize};

/// What to do with the agents' answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsensusAction {
    /// Quorum reached with sufficient confidence: submit the answer
    Submit,
    /// No trustworthy answer: refuse to act
    CannotSolve,
}

impl ConsensusAction {
    pub fn is_submit(&self) -> bool {
        matches!(self, ConsensusAction::Submit)
    }
}

impl std::fmt::Display for ConsensusAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsensusAction::Submit => write!(f, "Submit"),
            ConsensusAction::CannotSolve => write!(f, "CannotSolve"),
        }
    }
}

/// Which voting branch produced the decision
///
/// Pair reasons name positions in the agent-id-sorted ordering (A is the
/// lexicographically first agent), not arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsensusReason {
    /// All three agents agreed above the floor
    Unanimous,
    /// First and second agents agreed above the floor
    MajorityAB,
    /// First and third agents agreed above the floor
    MajorityAC,
    /// Second and third agents agreed above the floor
    MajorityBC,
    /// No pair met the agreement and confidence requirements
    NoConsensus,
}

impl ConsensusReason {
    /// Whether this reason represents a 2-of-3 majority (not unanimity)
    pub fn is_majority(&self) -> bool {
        matches!(
            self,
            ConsensusReason::MajorityAB | ConsensusReason::MajorityAC | ConsensusReason::MajorityBC
        )
    }

    /// Reason for the majority pair at sorted positions (i, j)
    ///
    /// Only the 3-agent pair combinations are representable.
    pub fn for_pair(i: usize, j: usize) -> Option<Self> {
        match (i, j) {
            (0, 1) => Some(ConsensusReason::MajorityAB),
            (0, 2) => Some(ConsensusReason::MajorityAC),
            (1, 2) => Some(ConsensusReason::MajorityBC),
            _ => None,
        }
    }
}

impl std::fmt::Display for ConsensusReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConsensusReason::Unanimous => "unanimous",
            ConsensusReason::MajorityAB => "majority (A+B)",
            ConsensusReason::MajorityAC => "majority (A+C)",
            ConsensusReason::MajorityBC => "majority (B+C)",
            ConsensusReason::NoConsensus => "no consensus",
        };
        write!(f, "{}", s)
    }
}

/// The verdict for one consensus evaluation
///
/// Invariants (checked by [`validate_decision`](crate::consensus::validate_decision)):
/// - `action == Submit` implies `answer.is_some()` and `confidence >= floor`
/// - `action == CannotSolve` implies `answer.is_none()` and `confidence == 0`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusDecision {
    /// Submit or refuse
    pub action: ConsensusAction,
    /// The agreed answer (present iff Submit)
    pub answer: Option<String>,
    /// Minimum confidence among agreeing agents, or 0.0
    pub confidence: f64,
    /// Which voting branch fired
    pub reason: ConsensusReason,
    /// The three inputs, sorted by agent id, kept for audit
    pub agent_results: Vec<AgentResult>,
    /// Human-readable vote summary
    pub voting_pattern: String,
    /// Confidence margin above the floor, in percentage points
    pub safety_margin: f64,
    /// Evaluation timestamp (milliseconds since epoch). The only field not
    /// determined by the inputs: identical result sets yield decisions that
    /// are identical in every other field.
    pub timestamp: u64,
}

impl ConsensusDecision {
    /// Create a Submit decision
    pub fn submit(
        answer: impl Into<String>,
        confidence: f64,
        reason: ConsensusReason,
        agent_results: Vec<AgentResult>,
        voting_pattern: impl Into<String>,
        safety_margin: f64,
    ) -> Self {
        Self {
            action: ConsensusAction::Submit,
            answer: Some(answer.into()),
            confidence,
            reason,
            agent_results,
            voting_pattern: voting_pattern.into(),
            safety_margin,
            timestamp: current_timestamp(),
        }
    }

    /// Create a CannotSolve decision
    pub fn cannot_solve(
        agent_results: Vec<AgentResult>,
        voting_pattern: impl Into<String>,
    ) -> Self {
        Self {
            action: ConsensusAction::CannotSolve,
            answer: None,
            confidence: 0.0,
            reason: ConsensusReason::NoConsensus,
            agent_results,
            voting_pattern: voting_pattern.into(),
            safety_margin: 0.0,
            timestamp: current_timestamp(),
        }
    }

    /// Whether this decision submits an answer
    pub fn is_submit(&self) -> bool {
        self.action.is_submit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_decision() {
        let decision = ConsensusDecision::submit(
            "ABC",
            0.96,
            ConsensusReason::Unanimous,
            vec![],
            "a=ABC(0.96)",
            1.0,
        );
        assert!(decision.is_submit());
        assert_eq!(decision.answer.as_deref(), Some("ABC"));
        assert_eq!(decision.confidence, 0.96);
    }

    #[test]
    fn test_cannot_solve_decision() {
        let decision = ConsensusDecision::cannot_solve(vec![], "disagreement");
        assert!(!decision.is_submit());
        assert!(decision.answer.is_none());
        assert_eq!(decision.confidence, 0.0);
        assert_eq!(decision.reason, ConsensusReason::NoConsensus);
        assert_eq!(decision.safety_margin, 0.0);
    }

    #[test]
    fn test_reason_for_pair() {
        assert_eq!(
            ConsensusReason::for_pair(0, 1),
            Some(ConsensusReason::MajorityAB)
        );
        assert_eq!(
            ConsensusReason::for_pair(0, 2),
            Some(ConsensusReason::MajorityAC)
        );
        assert_eq!(
            ConsensusReason::for_pair(1, 2),
            Some(ConsensusReason::MajorityBC)
        );
        assert_eq!(ConsensusReason::for_pair(1, 0), None);
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(ConsensusReason::Unanimous.to_string(), "unanimous");
        assert_eq!(ConsensusReason::MajorityAC.to_string(), "majority (A+C)");
        assert_eq!(ConsensusReason::NoConsensus.to_string(), "no consensus");
    }

    #[test]
    fn test_is_majority() {
        assert!(ConsensusReason::MajorityAB.is_majority());
        assert!(!ConsensusReason::Unanimous.is_majority());
        assert!(!ConsensusReason::NoConsensus.is_majority());
    }
}
