//! Quorum sizing and confidence floor
//!
//! The voting scheme is fixed at three agents with 2-of-3 agreement. The
//! sizes live here as explicit settings rather than positional variables so
//! the majority-scan logic in the engine stays honest about what it assumes.

use serde::{Deserialize, Serialize};

/// Sizing and gating parameters for a consensus vote
///
/// # Example
///
/// ```
/// use trisolve_domain::consensus::QuorumSettings;
///
/// let settings = QuorumSettings::default();
/// assert_eq!(settings.quorum_size, 3);
/// assert_eq!(settings.agreement_size, 2);
/// assert!(settings.meets_floor(0.95)); // floor is inclusive
/// assert!(!settings.meets_floor(0.9499));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuorumSettings {
    /// Number of agent results a vote requires (exactly)
    pub quorum_size: usize,
    /// Number of agreeing agents required for a majority
    pub agreement_size: usize,
    /// Minimum confidence an agreeing agent must carry (inclusive)
    pub confidence_floor: f64,
}

impl Default for QuorumSettings {
    fn default() -> Self {
        Self {
            quorum_size: 3,
            agreement_size: 2,
            confidence_floor: 0.95,
        }
    }
}

impl QuorumSettings {
    /// Whether a confidence value meets the floor (inclusive)
    pub fn meets_floor(&self, confidence: f64) -> bool {
        confidence >= self.confidence_floor
    }

    /// Margin above the floor, in percentage points (negative when below)
    pub fn safety_margin(&self, confidence: f64) -> f64 {
        (confidence - self.confidence_floor) * 100.0
    }

    /// Human-readable description of the scheme
    pub fn description(&self) -> String {
        format!(
            "{}-of-{} agreement at confidence >= {:.2}",
            self.agreement_size, self.quorum_size, self.confidence_floor
        )
    }
}

impl std::fmt::Display for QuorumSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = QuorumSettings::default();
        assert_eq!(settings.quorum_size, 3);
        assert_eq!(settings.agreement_size, 2);
        assert_eq!(settings.confidence_floor, 0.95);
    }

    #[test]
    fn test_floor_is_inclusive() {
        let settings = QuorumSettings::default();
        assert!(settings.meets_floor(0.95));
        assert!(settings.meets_floor(1.0));
        assert!(!settings.meets_floor(0.949));
    }

    #[test]
    fn test_safety_margin_percentage_points() {
        let settings = QuorumSettings::default();
        assert!((settings.safety_margin(0.96) - 1.0).abs() < 1e-9);
        assert!((settings.safety_margin(0.95)).abs() < 1e-9);
        assert!(settings.safety_margin(0.90) < 0.0);
    }

    #[test]
    fn test_description() {
        let settings = QuorumSettings::default();
        assert_eq!(
            settings.to_string(),
            "2-of-3 agreement at confidence >= 0.95"
        );
    }
}
