//! Agent provider port
//!
//! Defines the interface to an independent answer-producing agent. The real
//! backends (vision models, OCR pipelines) live in the infrastructure layer;
//! the orchestrator treats them as opaque capabilities.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors an agent provider can raise
///
/// All of these are isolated by the orchestrator: a failing provider is
/// folded into a zero-confidence `AgentResult`, never a pipeline fault.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Timeout")]
    Timeout,

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Other error: {0}")]
    Other(String),
}

/// The task handed to each agent slot for one solve attempt
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolveTask {
    /// Page or resource the challenge lives on
    pub url: String,
    /// Challenge kind, when known (e.g. "text", "image_grid")
    pub captcha_kind: Option<String>,
    /// Base64 challenge image, when already captured
    pub image_base64: Option<String>,
    /// Free-form submitter metadata
    pub metadata: HashMap<String, serde_json::Value>,
}

impl SolveTask {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_captcha_kind(mut self, kind: impl Into<String>) -> Self {
        self.captcha_kind = Some(kind.into());
        self
    }

    pub fn with_image(mut self, image_base64: impl Into<String>) -> Self {
        self.image_base64 = Some(image_base64.into());
        self
    }
}

/// An agent's raw answer before it is folded into an `AgentResult`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderAnswer {
    pub answer: String,
    /// Self-reported confidence in [0.0, 1.0]
    pub confidence: f64,
    /// How the answer was produced (e.g. "vision", "ocr")
    pub method: String,
    /// Raw backend payload, kept for debugging
    pub raw: Option<serde_json::Value>,
}

/// One independent answer-producing agent slot
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait AgentProvider: Send + Sync {
    /// Stable identifier, used for deterministic result ordering
    fn id(&self) -> &str;

    /// Attempt to solve the task. May take as long as it likes; the
    /// orchestrator enforces its own per-agent timeout around this call.
    async fn attempt_solve(&self, task: &SolveTask) -> Result<ProviderAnswer, ProviderError>;
}
