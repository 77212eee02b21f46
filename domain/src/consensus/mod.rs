//! Quorum consensus over agent results
//!
//! Aggregates the opinions of a fixed, small set of independent answer
//! producers into a single submit-or-refuse verdict under a strict
//! confidence floor. This is a single-process quorum vote, not a
//! distributed consensus protocol.

pub mod decision;
pub mod engine;
pub mod settings;
pub mod validate;

pub use decision::{ConsensusAction, ConsensusDecision, ConsensusReason};
pub use engine::{ConsensusEngine, ConsensusStatistics};
pub use settings::QuorumSettings;
pub use validate::validate_decision;
