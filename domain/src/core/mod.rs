//! Core domain primitives shared across modules

pub mod error;

pub use error::DomainError;

/// Get current timestamp in milliseconds since epoch
pub fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
