//! HTTP agent provider
//!
//! OpenAI-compatible chat-completions adapter. Each instance serves one
//! agent slot; the shared quota ledger is consulted before dispatch and
//! charged after a successful call.

use super::quota::QuotaLedger;
use crate::config::FileProviderConfig;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use trisolve_application::{AgentProvider, ProviderAnswer, ProviderError, SolveTask};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);
const MAX_TOKENS: u32 = 2_000;

const SYSTEM_PROMPT: &str = "You are a challenge-solving assistant. Examine the \
challenge and reply with a JSON object of the form \
{\"answer\": \"<solution text>\", \"confidence\": <0.0 to 1.0>} and nothing else.";

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ParsedAnswer {
    answer: String,
    confidence: f64,
}

/// One agent slot backed by a chat-completions endpoint
pub struct HttpAgentProvider {
    id: String,
    endpoint: String,
    model: Option<String>,
    api_key: Option<String>,
    client: reqwest::Client,
    ledger: Arc<Mutex<QuotaLedger>>,
}

impl HttpAgentProvider {
    pub fn from_config(
        id: impl Into<String>,
        config: &FileProviderConfig,
        ledger: Arc<Mutex<QuotaLedger>>,
    ) -> Self {
        let api_key = std::env::var(&config.api_key_env).ok().filter(|k| !k.is_empty());
        Self {
            id: id.into(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            ledger,
        }
    }

    fn build_body(&self, task: &SolveTask) -> serde_json::Value {
        let mut prompt = format!("Solve the challenge at {}.", task.url);
        if let Some(kind) = &task.captcha_kind {
            prompt.push_str(&format!(" Challenge kind: {kind}."));
        }

        let user_content = match &task.image_base64 {
            Some(image) => json!([
                {"type": "text", "text": prompt},
                {"type": "image_url", "image_url": {
                    "url": format!("data:image/png;base64,{image}")
                }}
            ]),
            None => json!(prompt),
        };

        json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": user_content}
            ],
            "temperature": 0.3,
            "max_tokens": MAX_TOKENS
        })
    }
}

#[async_trait]
impl AgentProvider for HttpAgentProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn attempt_solve(&self, task: &SolveTask) -> Result<ProviderAnswer, ProviderError> {
        {
            let mut ledger = self.ledger.lock().await;
            if !ledger.can_use(&self.id) {
                return Err(ProviderError::RateLimited(format!(
                    "daily quota exhausted for {}",
                    self.id
                )));
            }
        }
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| ProviderError::Unavailable(format!("no API key for {}", self.id)))?;

        debug!(provider = %self.id, url = %task.url, "Dispatching solve request");
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&self.build_body(task))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            warn!(provider = %self.id, %status, "Provider returned error status");
            return Err(map_status_error(status));
        }

        let data: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;
        let content = data
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| ProviderError::MalformedResponse("empty choices".to_string()))?;
        let parsed = parse_answer(content)?;

        self.ledger.lock().await.record_use(&self.id);
        Ok(ProviderAnswer {
            answer: parsed.answer,
            confidence: parsed.confidence,
            method: self
                .model
                .clone()
                .unwrap_or_else(|| "chat-completions".to_string()),
            raw: Some(json!({"content": content})),
        })
    }
}

fn map_transport_error(error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Timeout
    } else if error.is_connect() {
        ProviderError::Unavailable(error.to_string())
    } else {
        ProviderError::Transport(error.to_string())
    }
}

fn map_status_error(status: reqwest::StatusCode) -> ProviderError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        ProviderError::RateLimited(format!("HTTP {status}"))
    } else if status.is_server_error() {
        ProviderError::Unavailable(format!("HTTP {status}"))
    } else {
        ProviderError::Transport(format!("HTTP {status}"))
    }
}

/// Extract `{answer, confidence}` from the model reply, tolerating
/// markdown code fences around the JSON
fn parse_answer(content: &str) -> Result<ParsedAnswer, ProviderError> {
    let trimmed = content.trim();
    let stripped = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    let parsed: ParsedAnswer = serde_json::from_str(stripped)
        .map_err(|e| ProviderError::MalformedResponse(format!("{e}: {stripped}")))?;
    if parsed.answer.trim().is_empty() {
        return Err(ProviderError::MalformedResponse("empty answer".to_string()));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer_plain_json() {
        let parsed = parse_answer(r#"{"answer": "7X3K9", "confidence": 0.97}"#).unwrap();
        assert_eq!(parsed.answer, "7X3K9");
        assert_eq!(parsed.confidence, 0.97);
    }

    #[test]
    fn test_parse_answer_fenced_json() {
        let content = "```json\n{\"answer\": \"CAT\", \"confidence\": 0.9}\n```";
        let parsed = parse_answer(content).unwrap();
        assert_eq!(parsed.answer, "CAT");
    }

    #[test]
    fn test_parse_answer_rejects_prose() {
        assert!(matches!(
            parse_answer("The answer is probably 7X3K9"),
            Err(ProviderError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_answer_rejects_empty_answer() {
        assert!(matches!(
            parse_answer(r#"{"answer": "  ", "confidence": 0.9}"#),
            Err(ProviderError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_status_error_mapping() {
        assert!(matches!(
            map_status_error(reqwest::StatusCode::TOO_MANY_REQUESTS),
            ProviderError::RateLimited(_)
        ));
        assert!(matches!(
            map_status_error(reqwest::StatusCode::INTERNAL_SERVER_ERROR),
            ProviderError::Unavailable(_)
        ));
        assert!(matches!(
            map_status_error(reqwest::StatusCode::UNAUTHORIZED),
            ProviderError::Transport(_)
        ));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_unavailable() {
        let config = FileProviderConfig {
            endpoint: "https://example.com/v1/chat/completions".into(),
            api_key_env: "TRISOLVE_TEST_KEY_THAT_IS_NOT_SET".into(),
            ..FileProviderConfig::default()
        };
        let ledger = Arc::new(Mutex::new(QuotaLedger::new()));
        ledger.lock().await.register(
            "p1",
            super::super::quota::ProviderTaskKind::Text,
            1,
            true,
            None,
        );
        let provider = HttpAgentProvider::from_config("p1", &config, ledger);

        let err = provider
            .attempt_solve(&SolveTask::new("https://example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_exhausted_quota_is_rate_limited() {
        let config = FileProviderConfig {
            endpoint: "https://example.com/v1/chat/completions".into(),
            api_key_env: "TRISOLVE_TEST_KEY_THAT_IS_NOT_SET".into(),
            ..FileProviderConfig::default()
        };
        let ledger = Arc::new(Mutex::new(QuotaLedger::new()));
        {
            let mut guard = ledger.lock().await;
            guard.register(
                "p1",
                super::super::quota::ProviderTaskKind::Text,
                1,
                true,
                Some(1),
            );
            guard.record_use("p1");
        }
        let provider = HttpAgentProvider::from_config("p1", &config, ledger);

        let err = provider
            .attempt_solve(&SolveTask::new("https://example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited(_)));
    }
}
