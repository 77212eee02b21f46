//! Quorum consensus engine
//!
//! `decide` is a pure function over a fixed-size set of agent results: the
//! inputs are normalized by sorting on agent id, so the verdict is identical
//! no matter which agent answered fastest. Every decision is appended to an
//! append-only history used for the running statistics.

use crate::agent::AgentResult;
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

use super::decision::{ConsensusDecision, ConsensusReason};
use super::settings::QuorumSettings;

/// Running statistics over all decisions made by an engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsensusStatistics {
    /// Total decisions evaluated
    pub total: usize,
    /// Decisions that submitted an answer
    pub submitted: usize,
    /// Decisions that refused
    pub rejected: usize,
    /// Fraction of decisions that were unanimous submits
    pub unanimous_rate: f64,
    /// Fraction of decisions that were majority submits
    pub majority_rate: f64,
    /// Fraction of decisions that refused
    pub rejection_rate: f64,
    /// Mean confidence across submitted decisions
    pub average_submitted_confidence: f64,
}

/// Safety-gated quorum vote over exactly three agent results
///
/// # Example
///
/// ```
/// use trisolve_domain::agent::AgentResult;
/// use trisolve_domain::consensus::{ConsensusEngine, ConsensusReason};
///
/// let mut engine = ConsensusEngine::default();
/// let results = vec![
///     AgentResult::solved("a", "7X3K9", 0.98, 10, "vision"),
///     AgentResult::solved("b", "7X3K9", 0.97, 12, "vision"),
///     AgentResult::solved("c", "7X3K9", 0.96, 15, "ocr"),
/// ];
///
/// let decision = engine.decide(&results).unwrap();
/// assert!(decision.is_submit());
/// assert_eq!(decision.reason, ConsensusReason::Unanimous);
/// assert_eq!(decision.confidence, 0.96);
/// ```
#[derive(Debug, Default)]
pub struct ConsensusEngine {
    settings: QuorumSettings,
    history: Vec<ConsensusDecision>,
}

impl ConsensusEngine {
    pub fn new(settings: QuorumSettings) -> Self {
        Self {
            settings,
            history: Vec::new(),
        }
    }

    pub fn settings(&self) -> &QuorumSettings {
        &self.settings
    }

    /// Evaluate one set of agent results into a submit-or-refuse verdict
    ///
    /// Fails with `InvalidInputCount` unless exactly `quorum_size` results
    /// are supplied. The decision is appended to history before returning.
    pub fn decide(&mut self, results: &[AgentResult]) -> Result<ConsensusDecision, DomainError> {
        if results.len() != self.settings.quorum_size {
            return Err(DomainError::InvalidInputCount {
                expected: self.settings.quorum_size,
                actual: results.len(),
            });
        }

        // Deterministic ordering regardless of completion order
        let mut sorted: Vec<AgentResult> = results.to_vec();
        sorted.sort_by(|a, b| a.agent_id.cmp(&b.agent_id));

        let pattern = Self::voting_pattern(&sorted);
        let decision = self
            .check_unanimous(&sorted, &pattern)
            .or_else(|| self.check_majority(&sorted, &pattern))
            .unwrap_or_else(|| ConsensusDecision::cannot_solve(sorted.clone(), pattern.clone()));

        self.history.push(decision.clone());
        Ok(decision)
    }

    /// All agents give the same non-empty answer and every confidence
    /// meets the floor.
    fn check_unanimous(&self, sorted: &[AgentResult], pattern: &str) -> Option<ConsensusDecision> {
        let first = &sorted[0];
        if first.answer.is_empty() {
            return None;
        }

        let all_agree = sorted.iter().all(|r| r.answer == first.answer);
        let all_confident = sorted.iter().all(|r| self.settings.meets_floor(r.confidence));
        if !(all_agree && all_confident) {
            return None;
        }

        let confidence = sorted
            .iter()
            .map(|r| r.confidence)
            .fold(f64::INFINITY, f64::min);

        Some(ConsensusDecision::submit(
            first.answer.clone(),
            confidence,
            ConsensusReason::Unanimous,
            sorted.to_vec(),
            pattern,
            self.settings.safety_margin(confidence),
        ))
    }

    /// Scan pairs in sorted order (AB, AC, BC); first pair whose answers
    /// match with both confidences at the floor wins.
    ///
    /// Inherited guard: a pair is skipped when the remaining agent gives
    /// the same answer and itself meets the floor. That configuration is
    /// unanimous and was already handled above, so the guard only blocks a
    /// degenerate re-entry, never a genuine majority-with-dissent (third
    /// agent agreeing below the floor still submits via the pair).
    fn check_majority(&self, sorted: &[AgentResult], pattern: &str) -> Option<ConsensusDecision> {
        let n = self.settings.quorum_size;
        for i in 0..n {
            for j in (i + 1)..n {
                let (a, b) = (&sorted[i], &sorted[j]);
                if a.answer.is_empty() || a.answer != b.answer {
                    continue;
                }
                if !self.settings.meets_floor(a.confidence)
                    || !self.settings.meets_floor(b.confidence)
                {
                    continue;
                }

                let third_blocks = sorted
                    .iter()
                    .enumerate()
                    .filter(|(k, _)| *k != i && *k != j)
                    .any(|(_, r)| {
                        r.answer == a.answer && self.settings.meets_floor(r.confidence)
                    });
                if third_blocks {
                    continue;
                }

                let confidence = a.confidence.min(b.confidence);
                let reason = ConsensusReason::for_pair(i, j)?;

                return Some(ConsensusDecision::submit(
                    a.answer.clone(),
                    confidence,
                    reason,
                    sorted.to_vec(),
                    pattern,
                    self.settings.safety_margin(confidence),
                ));
            }
        }
        None
    }

    /// Human-readable vote summary, e.g. `a=CAT(0.97) b=CAT(0.80) c=DOG(0.96)`
    fn voting_pattern(sorted: &[AgentResult]) -> String {
        sorted
            .iter()
            .map(|r| {
                if r.error.is_some() {
                    format!("{}=<failed>", r.agent_id)
                } else {
                    format!("{}={}({:.2})", r.agent_id, r.answer, r.confidence)
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Most recent decisions, newest last, at most `limit`
    pub fn history(&self, limit: usize) -> &[ConsensusDecision] {
        let start = self.history.len().saturating_sub(limit);
        &self.history[start..]
    }

    /// Aggregate statistics over the full decision history
    pub fn statistics(&self) -> ConsensusStatistics {
        let total = self.history.len();
        if total == 0 {
            return ConsensusStatistics::default();
        }

        let submitted: Vec<_> = self.history.iter().filter(|d| d.is_submit()).collect();
        let unanimous = submitted
            .iter()
            .filter(|d| d.reason == ConsensusReason::Unanimous)
            .count();
        let majority = submitted.iter().filter(|d| d.reason.is_majority()).count();
        let rejected = total - submitted.len();

        let average_submitted_confidence = if submitted.is_empty() {
            0.0
        } else {
            submitted.iter().map(|d| d.confidence).sum::<f64>() / submitted.len() as f64
        };

        ConsensusStatistics {
            total,
            submitted: submitted.len(),
            rejected,
            unanimous_rate: unanimous as f64 / total as f64,
            majority_rate: majority as f64 / total as f64,
            rejection_rate: rejected as f64 / total as f64,
            average_submitted_confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::decision::ConsensusAction;

    fn triple(specs: [(&str, &str, f64); 3]) -> Vec<AgentResult> {
        specs
            .iter()
            .map(|(id, answer, conf)| AgentResult::solved(*id, *answer, *conf, 100, "vision"))
            .collect()
    }

    #[test]
    fn test_unanimous_submit_uses_min_confidence() {
        let mut engine = ConsensusEngine::default();
        let results = triple([("a", "7X3K9", 0.98), ("b", "7X3K9", 0.97), ("c", "7X3K9", 0.96)]);

        let decision = engine.decide(&results).unwrap();
        assert_eq!(decision.action, ConsensusAction::Submit);
        assert_eq!(decision.answer.as_deref(), Some("7X3K9"));
        assert_eq!(decision.confidence, 0.96);
        assert_eq!(decision.reason, ConsensusReason::Unanimous);
    }

    #[test]
    fn test_majority_with_dissenting_answer() {
        let mut engine = ConsensusEngine::default();
        // b disagrees outright; a and c agree -> A-C pair
        let results = triple([("a", "CAT", 0.97), ("b", "DOG", 0.96), ("c", "CAT", 0.96)]);

        let decision = engine.decide(&results).unwrap();
        assert!(decision.is_submit());
        assert_eq!(decision.answer.as_deref(), Some("CAT"));
        assert_eq!(decision.confidence, 0.96);
        assert_eq!(decision.reason, ConsensusReason::MajorityAC);
    }

    #[test]
    fn test_scenario_b_third_agrees_below_floor() {
        let mut engine = ConsensusEngine::default();
        // b agrees with the pair answer but sits below the floor; the
        // guard must not block this genuine majority
        let results = triple([("a", "CAT", 0.97), ("b", "CAT", 0.80), ("c", "CAT", 0.96)]);

        let decision = engine.decide(&results).unwrap();
        assert!(decision.is_submit());
        assert_eq!(decision.answer.as_deref(), Some("CAT"));
        assert_eq!(decision.confidence, 0.96);
        assert_eq!(decision.reason, ConsensusReason::MajorityAC);
    }

    #[test]
    fn test_majority_ab_pair() {
        let mut engine = ConsensusEngine::default();
        let results = triple([("a", "X1", 0.98), ("b", "X1", 0.95), ("c", "Y2", 0.99)]);

        let decision = engine.decide(&results).unwrap();
        assert_eq!(decision.reason, ConsensusReason::MajorityAB);
        assert_eq!(decision.confidence, 0.95);
    }

    #[test]
    fn test_majority_bc_pair() {
        let mut engine = ConsensusEngine::default();
        let results = triple([("a", "Y2", 0.99), ("b", "X1", 0.98), ("c", "X1", 0.95)]);

        let decision = engine.decide(&results).unwrap();
        assert_eq!(decision.reason, ConsensusReason::MajorityBC);
        assert_eq!(decision.answer.as_deref(), Some("X1"));
    }

    #[test]
    fn test_three_distinct_answers_cannot_solve() {
        let mut engine = ConsensusEngine::default();
        let results = triple([("a", "ONE", 0.99), ("b", "TWO", 0.98), ("c", "THREE", 0.97)]);

        let decision = engine.decide(&results).unwrap();
        assert_eq!(decision.action, ConsensusAction::CannotSolve);
        assert!(decision.answer.is_none());
        assert_eq!(decision.confidence, 0.0);
        assert_eq!(decision.reason, ConsensusReason::NoConsensus);
    }

    #[test]
    fn test_agreement_below_floor_cannot_solve() {
        let mut engine = ConsensusEngine::default();
        let results = triple([("a", "CAT", 0.94), ("b", "CAT", 0.93), ("c", "CAT", 0.92)]);

        let decision = engine.decide(&results).unwrap();
        assert_eq!(decision.action, ConsensusAction::CannotSolve);
    }

    #[test]
    fn test_floor_boundary_inclusive() {
        let mut engine = ConsensusEngine::default();
        let results = triple([("a", "OK", 0.95), ("b", "OK", 0.95), ("c", "OK", 0.95)]);

        let decision = engine.decide(&results).unwrap();
        assert!(decision.is_submit());
        assert_eq!(decision.confidence, 0.95);
        assert!(decision.safety_margin.abs() < 1e-9);
    }

    #[test]
    fn test_decide_is_deterministic_across_orderings() {
        let mut engine = ConsensusEngine::default();
        let results = triple([("a", "CAT", 0.97), ("b", "DOG", 0.96), ("c", "CAT", 0.96)]);
        let shuffled = vec![results[2].clone(), results[0].clone(), results[1].clone()];

        let d1 = engine.decide(&results).unwrap();
        let d2 = engine.decide(&shuffled).unwrap();

        assert_eq!(d1.action, d2.action);
        assert_eq!(d1.answer, d2.answer);
        assert_eq!(d1.confidence, d2.confidence);
        assert_eq!(d1.reason, d2.reason);
        assert_eq!(d1.voting_pattern, d2.voting_pattern);
    }

    #[test]
    fn test_wrong_input_count_rejected() {
        let mut engine = ConsensusEngine::default();
        let two = triple([("a", "X", 0.99), ("b", "X", 0.99), ("c", "X", 0.99)])[..2].to_vec();

        let err = engine.decide(&two).unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidInputCount {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn test_empty_answers_never_agree() {
        let mut engine = ConsensusEngine::default();
        let results = vec![
            AgentResult::failed("a", "boom", 10),
            AgentResult::failed("b", "boom", 10),
            AgentResult::solved("c", "X", 0.99, 10, "vision"),
        ];

        let decision = engine.decide(&results).unwrap();
        assert_eq!(decision.action, ConsensusAction::CannotSolve);
    }

    #[test]
    fn test_history_and_statistics() {
        let mut engine = ConsensusEngine::default();

        engine
            .decide(&triple([("a", "X", 0.99), ("b", "X", 0.98), ("c", "X", 0.97)]))
            .unwrap();
        engine
            .decide(&triple([("a", "X", 0.99), ("b", "X", 0.98), ("c", "Y", 0.97)]))
            .unwrap();
        engine
            .decide(&triple([("a", "1", 0.99), ("b", "2", 0.98), ("c", "3", 0.97)]))
            .unwrap();

        let stats = engine.statistics();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.submitted, 2);
        assert_eq!(stats.rejected, 1);
        assert!((stats.unanimous_rate - 1.0 / 3.0).abs() < 1e-9);
        assert!((stats.majority_rate - 1.0 / 3.0).abs() < 1e-9);
        assert!((stats.rejection_rate - 1.0 / 3.0).abs() < 1e-9);
        assert!((stats.average_submitted_confidence - (0.97 + 0.98) / 2.0).abs() < 1e-9);

        assert_eq!(engine.history(2).len(), 2);
        assert_eq!(engine.history(10).len(), 3);
    }

    #[test]
    fn test_empty_statistics() {
        let engine = ConsensusEngine::default();
        let stats = engine.statistics();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.average_submitted_confidence, 0.0);
    }

    #[test]
    fn test_voting_pattern_marks_failures() {
        let mut engine = ConsensusEngine::default();
        let results = vec![
            AgentResult::solved("a", "X", 0.99, 10, "vision"),
            AgentResult::failed("b", "timeout", 10),
            AgentResult::solved("c", "X", 0.98, 10, "vision"),
        ];

        let decision = engine.decide(&results).unwrap();
        assert!(decision.voting_pattern.contains("b=<failed>"));
        assert!(decision.voting_pattern.contains("a=X(0.99)"));
    }
}
