//! Decision invariant validator
//!
//! Defense-in-depth re-check of the Submit/CannotSolve invariants. Callers
//! run this before acting on a decision; a violation means the engine has a
//! bug and the answer must not be submitted.

use super::decision::{ConsensusAction, ConsensusDecision, ConsensusReason};
use super::settings::QuorumSettings;

/// Re-check the invariants a well-formed decision must satisfy
///
/// Returns the full list of violations rather than stopping at the first,
/// so logs carry everything a bug report needs.
pub fn validate_decision(
    decision: &ConsensusDecision,
    settings: &QuorumSettings,
) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    match decision.action {
        ConsensusAction::Submit => {
            match &decision.answer {
                None => errors.push("submit decision carries no answer".to_string()),
                Some(a) if a.is_empty() => {
                    errors.push("submit decision carries an empty answer".to_string())
                }
                Some(_) => {}
            }
            if !settings.meets_floor(decision.confidence) {
                errors.push(format!(
                    "submit confidence {:.4} is below the floor {:.4}",
                    decision.confidence, settings.confidence_floor
                ));
            }
            if decision.reason == ConsensusReason::NoConsensus {
                errors.push("submit decision tagged NoConsensus".to_string());
            }
        }
        ConsensusAction::CannotSolve => {
            if decision.answer.is_some() {
                errors.push("cannot-solve decision carries an answer".to_string());
            }
            if decision.confidence != 0.0 {
                errors.push(format!(
                    "cannot-solve decision carries confidence {:.4}",
                    decision.confidence
                ));
            }
            if decision.reason != ConsensusReason::NoConsensus {
                errors.push(format!(
                    "cannot-solve decision tagged {}",
                    decision.reason
                ));
            }
        }
    }

    if decision.agent_results.len() != settings.quorum_size {
        errors.push(format!(
            "decision carries {} agent results, expected {}",
            decision.agent_results.len(),
            settings.quorum_size
        ));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentResult;

    fn audit_triple() -> Vec<AgentResult> {
        vec![
            AgentResult::solved("a", "X", 0.99, 10, "vision"),
            AgentResult::solved("b", "X", 0.98, 10, "vision"),
            AgentResult::solved("c", "X", 0.97, 10, "ocr"),
        ]
    }

    #[test]
    fn test_valid_submit_passes() {
        let decision = ConsensusDecision::submit(
            "X",
            0.97,
            ConsensusReason::Unanimous,
            audit_triple(),
            "a=X(0.99) b=X(0.98) c=X(0.97)",
            2.0,
        );
        assert!(validate_decision(&decision, &QuorumSettings::default()).is_ok());
    }

    #[test]
    fn test_valid_cannot_solve_passes() {
        let decision = ConsensusDecision::cannot_solve(audit_triple(), "disagreement");
        assert!(validate_decision(&decision, &QuorumSettings::default()).is_ok());
    }

    #[test]
    fn test_submit_without_answer_rejected() {
        let mut decision = ConsensusDecision::submit(
            "X",
            0.97,
            ConsensusReason::Unanimous,
            audit_triple(),
            "",
            2.0,
        );
        decision.answer = None;

        let errors = validate_decision(&decision, &QuorumSettings::default()).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("no answer")));
    }

    #[test]
    fn test_submit_below_floor_rejected() {
        let decision = ConsensusDecision::submit(
            "X",
            0.90,
            ConsensusReason::MajorityAB,
            audit_triple(),
            "",
            -5.0,
        );

        let errors = validate_decision(&decision, &QuorumSettings::default()).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("below the floor")));
    }

    #[test]
    fn test_cannot_solve_with_answer_rejected() {
        let mut decision = ConsensusDecision::cannot_solve(audit_triple(), "");
        decision.answer = Some("X".to_string());

        let errors = validate_decision(&decision, &QuorumSettings::default()).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("carries an answer")));
    }

    #[test]
    fn test_cannot_solve_with_confidence_rejected() {
        let mut decision = ConsensusDecision::cannot_solve(audit_triple(), "");
        decision.confidence = 0.5;

        let errors = validate_decision(&decision, &QuorumSettings::default()).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("confidence 0.5")));
    }

    #[test]
    fn test_wrong_audit_arity_rejected() {
        let decision = ConsensusDecision::cannot_solve(vec![], "");
        let errors = validate_decision(&decision, &QuorumSettings::default()).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("0 agent results")));
    }
}
