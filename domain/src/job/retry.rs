//! Retry policy: backoff computation and error classification

use crate::core::error::DomainError;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Exponential backoff with jitter for re-queued jobs
///
/// Delay for attempt `n` (1-indexed) is `base * 2^(n-1)`, capped at
/// `max_delay_ms`, then spread by up to `jitter_ratio` in either direction
/// so retries from concurrent jobs do not land in lockstep.
///
/// # Example
///
/// ```
/// use trisolve_domain::job::RetryPolicy;
///
/// let policy = RetryPolicy::default();
/// assert!(policy.backoff_delay(1) >= 800);   // 1000ms +/- 20%
/// assert!(policy.backoff_delay(10) <= 72_000); // capped at 60s + jitter
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Fraction of the delay used as the jitter band, in [0.0, 1.0]
    pub jitter_ratio: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay_ms: 1_000,
            max_delay_ms: 60_000,
            jitter_ratio: 0.2,
        }
    }
}

impl RetryPolicy {
    pub fn new(base_delay_ms: u64, max_delay_ms: u64, jitter_ratio: f64) -> Self {
        Self {
            base_delay_ms,
            max_delay_ms: max_delay_ms.max(base_delay_ms),
            jitter_ratio: jitter_ratio.clamp(0.0, 1.0),
        }
    }

    /// Delay in milliseconds before the next attempt, given how many
    /// attempts have already run (1-indexed)
    pub fn backoff_delay(&self, attempts: u32) -> u64 {
        let exponent = attempts.saturating_sub(1).min(16);
        let raw = self
            .base_delay_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_delay_ms);

        if self.jitter_ratio == 0.0 {
            return raw;
        }

        let band = (raw as f64 * self.jitter_ratio) as i64;
        if band == 0 {
            return raw;
        }
        let offset = rand::rng().random_range(-band..=band);
        raw.saturating_add_signed(offset)
    }

    /// Whether a failure category may be retried at all
    ///
    /// Policy/limit violations from external collaborators are terminal no
    /// matter how many attempts remain; cancellation is an instruction to
    /// stop, not a fault to retry. Everything else is worth another try.
    pub fn is_retryable(&self, error: &DomainError) -> bool {
        !matches!(
            error,
            DomainError::PolicyLimitExceeded(_)
                | DomainError::Cancelled(_)
                | DomainError::QueueFull { .. }
                | DomainError::NotFound(_)
                | DomainError::InvalidState { .. }
                | DomainError::DecisionInvariantViolation(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::entities::JobId;

    fn no_jitter() -> RetryPolicy {
        RetryPolicy::new(1_000, 60_000, 0.0)
    }

    #[test]
    fn test_backoff_doubles_per_attempt() {
        let policy = no_jitter();
        assert_eq!(policy.backoff_delay(1), 1_000);
        assert_eq!(policy.backoff_delay(2), 2_000);
        assert_eq!(policy.backoff_delay(3), 4_000);
        assert_eq!(policy.backoff_delay(4), 8_000);
    }

    #[test]
    fn test_backoff_capped_at_max() {
        let policy = no_jitter();
        assert_eq!(policy.backoff_delay(7), 60_000);
        assert_eq!(policy.backoff_delay(64), 60_000);
    }

    #[test]
    fn test_jitter_stays_within_band() {
        let policy = RetryPolicy::default();
        for _ in 0..100 {
            let delay = policy.backoff_delay(2);
            assert!((1_600..=2_400).contains(&delay), "delay {delay} out of band");
        }
    }

    #[test]
    fn test_policy_violations_are_terminal() {
        let policy = RetryPolicy::default();
        assert!(!policy.is_retryable(&DomainError::PolicyLimitExceeded(
            "outside operating hours".into()
        )));
        assert!(!policy.is_retryable(&DomainError::Cancelled("stop".into())));
    }

    #[test]
    fn test_transient_faults_are_retryable() {
        let policy = RetryPolicy::default();
        assert!(policy.is_retryable(&DomainError::Timeout { ms: 120_000 }));
        assert!(policy.is_retryable(&DomainError::AgentFailure("reset".into())));
        assert!(policy.is_retryable(&DomainError::InsufficientValidResults { valid: 2 }));
        assert!(policy.is_retryable(&DomainError::Detection("page not loaded".into())));
    }

    #[test]
    fn test_caller_facing_errors_are_not_retryable() {
        let policy = RetryPolicy::default();
        assert!(!policy.is_retryable(&DomainError::QueueFull { capacity: 10 }));
        assert!(!policy.is_retryable(&DomainError::NotFound(JobId::new("x"))));
    }

    #[test]
    fn test_jitter_ratio_clamped() {
        let policy = RetryPolicy::new(100, 1_000, 7.0);
        assert_eq!(policy.jitter_ratio, 1.0);
    }
}
