//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into application params.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use trisolve_application::{SchedulerParams, SolverParams};
use trisolve_domain::RetryPolicy;

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("provider '{0}' has an empty endpoint")]
    EmptyEndpoint(String),

    #[error("provider name cannot be empty")]
    EmptyProviderName,

    #[error("retry jitter_ratio must be between 0.0 and 1.0, got {0}")]
    InvalidJitter(f64),
}

/// Raw scheduler configuration from TOML (`[scheduler]` section)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSchedulerConfig {
    pub max_workers: usize,
    pub max_queue_size: usize,
    /// Default per-job timeout; individual submissions may override it,
    /// clamped to the supported range
    pub default_timeout_ms: u64,
    pub max_attempts: u32,
    pub idle_poll_ms: u64,
    pub completed_retention: usize,
    pub consecutive_failure_alert: u32,
    pub accuracy_warning: f64,
    pub accuracy_emergency: f64,
    pub min_samples_for_accuracy: u64,
}

impl Default for FileSchedulerConfig {
    fn default() -> Self {
        let params = SchedulerParams::default();
        Self {
            max_workers: params.max_workers,
            max_queue_size: params.max_queue_size,
            default_timeout_ms: params.default_timeout_ms,
            max_attempts: params.max_attempts,
            idle_poll_ms: params.idle_poll_ms,
            completed_retention: params.completed_retention,
            consecutive_failure_alert: params.consecutive_failure_alert,
            accuracy_warning: params.accuracy_warning,
            accuracy_emergency: params.accuracy_emergency,
            min_samples_for_accuracy: params.min_samples_for_accuracy,
        }
    }
}

impl FileSchedulerConfig {
    pub fn to_params(&self) -> SchedulerParams {
        let mut params = SchedulerParams::default()
            .with_max_workers(self.max_workers)
            .with_max_queue_size(self.max_queue_size)
            .with_max_attempts(self.max_attempts);
        params.default_timeout_ms = self.default_timeout_ms;
        params.idle_poll_ms = self.idle_poll_ms.max(1);
        params.completed_retention = self.completed_retention.max(1);
        params.consecutive_failure_alert = self.consecutive_failure_alert.max(1);
        params.accuracy_warning = self.accuracy_warning;
        params.accuracy_emergency = self.accuracy_emergency;
        params.min_samples_for_accuracy = self.min_samples_for_accuracy;
        params
    }
}

/// Raw solver configuration from TOML (`[solver]` section)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSolverConfig {
    /// Per-agent timeout within one solve attempt
    pub agent_timeout_ms: u64,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub retry_jitter_ratio: f64,
}

impl Default for FileSolverConfig {
    fn default() -> Self {
        let params = SolverParams::default();
        Self {
            agent_timeout_ms: params.agent_timeout_ms,
            retry_base_delay_ms: params.retry.base_delay_ms,
            retry_max_delay_ms: params.retry.max_delay_ms,
            retry_jitter_ratio: params.retry.jitter_ratio,
        }
    }
}

impl FileSolverConfig {
    pub fn to_params(&self) -> SolverParams {
        SolverParams::default()
            .with_agent_timeout_ms(self.agent_timeout_ms)
            .with_retry(RetryPolicy::new(
                self.retry_base_delay_ms,
                self.retry_max_delay_ms,
                self.retry_jitter_ratio,
            ))
    }
}

/// Raw provider configuration from TOML (`[providers.<name>]` tables)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProviderConfig {
    /// Chat-completions endpoint URL
    pub endpoint: String,
    /// Model name sent in the request body
    pub model: Option<String>,
    /// Environment variable name holding the API key
    pub api_key_env: String,
    /// Task kind: "text", "vision", or "both"
    pub kind: String,
    /// Lower tries first when picking a recommended provider
    pub priority: u8,
    /// Daily request cap; None means uncapped
    pub rate_limit: Option<u32>,
}

impl Default for FileProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            model: None,
            api_key_env: String::new(),
            kind: "text".to_string(),
            priority: 1,
            rate_limit: None,
        }
    }
}

/// Complete raw configuration file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub scheduler: FileSchedulerConfig,
    pub solver: FileSolverConfig,
    pub providers: HashMap<String, FileProviderConfig>,
}

impl FileConfig {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(0.0..=1.0).contains(&self.solver.retry_jitter_ratio) {
            return Err(ConfigValidationError::InvalidJitter(
                self.solver.retry_jitter_ratio,
            ));
        }
        for (name, provider) in &self.providers {
            if name.trim().is_empty() {
                return Err(ConfigValidationError::EmptyProviderName);
            }
            if provider.endpoint.trim().is_empty() {
                return Err(ConfigValidationError::EmptyEndpoint(name.clone()));
            }
        }
        Ok(())
    }
}
