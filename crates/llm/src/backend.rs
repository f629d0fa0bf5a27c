//! JSON-completion LLM backend with retry/backoff, backing Tier 3/4
//! hints and the confidence-gate validator (spec §4.6, §4.9, §6).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use souq_config::LlmConfig;
use souq_core::{IntentHintClient, Language, LlmCompletion, LlmHints, LlmMetadata};

use crate::error::{LlmError, Result};
use crate::prompt::{hint_messages, validator_messages, Message, Role, TIER3_SYSTEM_PROMPT, TIER4_SYSTEM_PROMPT};

/// A JSON-returning chat-completion backend. Named generically (not
/// `OllamaBackend`) because the wire format here targets any
/// Ollama-compatible `/api/chat` endpoint, which the reference
/// deployment happens to be.
#[derive(Clone)]
pub struct JsonCompletionBackend {
    client: Client,
    config: LlmConfig,
    max_retries: u32,
    initial_backoff: Duration,
}

impl JsonCompletionBackend {
    pub fn new(config: LlmConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Configuration(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            max_retries: 2,
            initial_backoff: Duration::from_millis(100),
        })
    }

    fn api_url(&self) -> String {
        format!("{}/api/chat", self.config.endpoint)
    }

    async fn execute(&self, messages: &[Message]) -> Result<ChatResponse> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: messages.iter().map(ChatMessage::from).collect(),
            stream: false,
            format: Some("json".to_string()),
        };

        let response = self.client.post(self.api_url()).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            if status.is_server_error() {
                return Err(LlmError::Network(format!("server error {status}: {body}")));
            }
            return Err(LlmError::Api(body));
        }

        response.json().await.map_err(|e| LlmError::InvalidResponse(e.to_string()))
    }

    fn is_retryable(error: &LlmError) -> bool {
        matches!(error, LlmError::Network(_) | LlmError::Timeout)
    }

    /// Exponential-backoff retry loop over a single chat completion,
    /// grounded in the teacher's `OllamaBackend::generate`.
    async fn complete(&self, messages: &[Message]) -> Result<(String, LlmMetadata)> {
        let mut last_error = None;
        let mut backoff = self.initial_backoff;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                tracing::warn!(attempt, ?backoff, "llm request failed, retrying");
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }

            match self.execute(messages).await {
                Ok(response) => {
                    let metadata = LlmMetadata {
                        model: self.config.model.clone(),
                        prompt_tokens: response.prompt_eval_count.unwrap_or(0),
                        completion_tokens: response.eval_count.unwrap_or(0),
                    };
                    return Ok((response.message.content, metadata));
                }
                Err(e) if Self::is_retryable(&e) => last_error = Some(e),
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(LlmError::Network("max retries exceeded".to_string())))
    }
}

fn parse_hints(raw: &str) -> LlmHints {
    serde_json::from_str(raw).unwrap_or_default()
}

#[async_trait]
impl IntentHintClient for JsonCompletionBackend {
    async fn short_hints(&self, utterance: &str, _language: Language) -> souq_core::Result<LlmCompletion<LlmHints>> {
        let messages = hint_messages(TIER3_SYSTEM_PROMPT, utterance);
        let (raw, metadata) = self.complete(&messages).await.map_err(souq_core::Error::from)?;
        Ok(LlmCompletion { value: parse_hints(&raw), metadata })
    }

    async fn rich_hints(&self, utterance: &str, _language: Language) -> souq_core::Result<LlmCompletion<LlmHints>> {
        let messages = hint_messages(TIER4_SYSTEM_PROMPT, utterance);
        let (raw, metadata) = self.complete(&messages).await.map_err(souq_core::Error::from)?;
        Ok(LlmCompletion { value: parse_hints(&raw), metadata })
    }

    async fn validate_category(&self, utterance: &str, category_name: &str) -> souq_core::Result<bool> {
        let messages = validator_messages(utterance, category_name);
        let (raw, _metadata) = self.complete(&messages).await.map_err(souq_core::Error::from)?;
        Ok(raw.trim().to_lowercase().starts_with("yes"))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl From<&Message> for ChatMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role.to_string(),
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
    #[serde(default)]
    eval_count: Option<u32>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_hint_json() {
        let hints = parse_hints(r#"{"category":"cars","location":null,"transaction":"for-sale"}"#);
        assert_eq!(hints.category.as_deref(), Some("cars"));
        assert_eq!(hints.transaction.as_deref(), Some("for-sale"));
    }

    #[test]
    fn malformed_json_yields_default_hints() {
        let hints = parse_hints("not json");
        assert!(hints.category.is_none());
    }

    #[test]
    fn message_role_serializes_lowercase() {
        let msg = Message { role: Role::System, content: "x".into() };
        let chat_msg = ChatMessage::from(&msg);
        assert_eq!(chat_msg.role, "system");
    }
}
