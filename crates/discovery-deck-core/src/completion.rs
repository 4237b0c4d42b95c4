//! Completion Gateway: outbound calls to an OpenAI-compatible chat completions API.
//!
//! Two operations, both single-turn and stateless between calls:
//! - [`CompletionGateway::converse`] for the live chat demo.
//! - [`CompletionGateway::summarize`] for the workshop summary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::DeckConfig;
use crate::error::{DeckError, Result};
use crate::prompts::{
    chat_prompt_or_default, summary_prompt, CHAT_SYSTEM_PROMPT, NO_ANSWER, NO_SUMMARY,
    SUMMARY_FAILED, SUMMARY_SYSTEM_PROMPT,
};

pub const MISSING_API_KEY: &str = "Missing OPENAI_API_KEY";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self { role: "system".to_string(), content: content.to_string() }
    }

    pub fn user(content: &str) -> Self {
        Self { role: "user".to_string(), content: content.to_string() }
    }
}

/// Request body for `/chat/completions`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// One completion call. `Ok(None)` means the model returned no content.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, api_key: &str, request: &CompletionRequest) -> Result<Option<String>>;
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Option<Vec<CompletionChoice>>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: Option<CompletionMessage>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorBody {
    error: Option<UpstreamErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorDetail {
    message: Option<String>,
}

/// reqwest-backed client for `{api_base}/chat/completions`.
pub struct OpenAiBackend {
    api_base: String,
    client: reqwest::Client,
}

impl OpenAiBackend {
    pub fn new(api_base: &str) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    async fn complete(&self, api_key: &str, request: &CompletionRequest) -> Result<Option<String>> {
        let url = format!("{}/chat/completions", self.api_base);
        let res = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| DeckError::Upstream(format!("Connection error: {}", e)))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| DeckError::Upstream(format!("Connection error: {}", e)))?;

        if !status.is_success() {
            return Err(DeckError::Upstream(upstream_error_message(status.as_u16(), &text)));
        }

        let parsed: CompletionResponse = serde_json::from_str(&text)
            .map_err(|e| DeckError::Upstream(format!("Invalid completion response: {}", e)))?;

        Ok(parsed
            .choices
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.message)
            .and_then(|m| m.content))
    }
}

/// Upstream `error.message` when the body carries one, else `"<status> <body>"`.
fn upstream_error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<UpstreamErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| e.message)
        .filter(|m| !m.trim().is_empty())
        .map(|m| format!("{} {}", status, m))
        .unwrap_or_else(|| format!("{} {}", status, body.trim()))
}

/// Gateway over a [`CompletionBackend`] with the deck's prompts and fallbacks.
#[derive(Clone)]
pub struct CompletionGateway {
    backend: Arc<dyn CompletionBackend>,
    api_key: Option<String>,
    chat_model: String,
    summary_model: String,
    summary_temperature: f32,
}

impl CompletionGateway {
    pub fn new(backend: Arc<dyn CompletionBackend>, api_key: Option<String>) -> Self {
        let d = DeckConfig::default();
        Self {
            backend,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            chat_model: d.chat_model,
            summary_model: d.summary_model,
            summary_temperature: d.summary_temperature,
        }
    }

    /// Gateway using the OpenAI backend and models from `config`.
    pub fn from_config(config: &DeckConfig) -> Self {
        let backend = Arc::new(OpenAiBackend::new(&config.api_base));
        Self {
            backend,
            api_key: config.api_key.clone(),
            chat_model: config.chat_model.clone(),
            summary_model: config.summary_model.clone(),
            summary_temperature: config.summary_temperature,
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Single-turn Q&A. Empty prompts use the canned HR prompt; an empty model reply becomes `(No answer)`.
    pub async fn converse(&self, prompt: Option<&str>) -> Result<String> {
        tracing::info!(api_key_present = self.has_api_key(), "chat: completion requested");
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(DeckError::Configuration(MISSING_API_KEY.to_string()));
        };

        let request = CompletionRequest {
            model: self.chat_model.clone(),
            messages: vec![
                ChatMessage::system(CHAT_SYSTEM_PROMPT),
                ChatMessage::user(chat_prompt_or_default(prompt)),
            ],
            temperature: None,
        };

        let content = self.backend.complete(api_key, &request).await.map_err(|e| {
            tracing::error!("chat: completion request failed: {}", e);
            e
        })?;

        Ok(content
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| NO_ANSWER.to_string()))
    }

    /// Workshop summary from icebreaker notes and chosen use cases.
    /// Failures surface only as `Failed to generate summary`; detail goes to the log.
    pub async fn summarize(&self, icebreaker_notes: &str, selected_use_cases: &[String]) -> Result<String> {
        tracing::info!(
            api_key_present = self.has_api_key(),
            use_cases = selected_use_cases.len(),
            "summarize: completion requested"
        );
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::error!("summarize: {}", MISSING_API_KEY);
            return Err(DeckError::Upstream(SUMMARY_FAILED.to_string()));
        };

        let request = CompletionRequest {
            model: self.summary_model.clone(),
            messages: vec![
                ChatMessage::system(SUMMARY_SYSTEM_PROMPT),
                ChatMessage::user(&summary_prompt(icebreaker_notes, selected_use_cases)),
            ],
            temperature: Some(self.summary_temperature),
        };

        match self.backend.complete(api_key, &request).await {
            Ok(content) => Ok(content
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| NO_SUMMARY.to_string())),
            Err(e) => {
                tracing::error!("summarize: completion request failed: {}", e);
                Err(DeckError::Upstream(SUMMARY_FAILED.to_string()))
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Backend that records requests and replays a canned reply.
    pub(crate) struct StubBackend {
        pub reply: std::result::Result<Option<String>, String>,
        pub seen: Mutex<Vec<CompletionRequest>>,
    }

    impl StubBackend {
        pub fn replying(reply: Option<&str>) -> Arc<Self> {
            Arc::new(Self { reply: Ok(reply.map(str::to_string)), seen: Mutex::new(Vec::new()) })
        }

        pub fn failing(msg: &str) -> Arc<Self> {
            Arc::new(Self { reply: Err(msg.to_string()), seen: Mutex::new(Vec::new()) })
        }
    }

    #[async_trait]
    impl CompletionBackend for StubBackend {
        async fn complete(&self, _api_key: &str, request: &CompletionRequest) -> Result<Option<String>> {
            self.seen.lock().unwrap().push(request.clone());
            self.reply.clone().map_err(DeckError::Upstream)
        }
    }

    fn gateway(backend: Arc<StubBackend>) -> CompletionGateway {
        CompletionGateway::new(backend, Some("sk-test".to_string()))
    }

    #[tokio::test]
    async fn converse_missing_key() {
        let gw = CompletionGateway::new(StubBackend::replying(Some("x")), None);
        let err = gw.converse(Some("hi")).await.unwrap_err();
        assert_eq!(err.to_string(), MISSING_API_KEY);
    }

    #[tokio::test]
    async fn converse_empty_reply_is_placeholder() {
        let backend = StubBackend::replying(None);
        let answer = gateway(backend.clone()).converse(Some("hi")).await.unwrap();
        assert_eq!(answer, NO_ANSWER);
        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen[0].messages[0], ChatMessage::system(CHAT_SYSTEM_PROMPT));
        assert_eq!(seen[0].model, "gpt-3.5-turbo-0125");
    }

    #[tokio::test]
    async fn converse_defaults_prompt_and_echoes_upstream_error() {
        let backend = StubBackend::replying(Some("Dear candidate"));
        let answer = gateway(backend.clone()).converse(Some("")).await.unwrap();
        assert_eq!(answer, "Dear candidate");
        assert_eq!(
            backend.seen.lock().unwrap()[0].messages[1].content,
            crate::prompts::DEFAULT_CHAT_PROMPT
        );

        let err = gateway(StubBackend::failing("429 Rate limit reached"))
            .converse(Some("hi"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "429 Rate limit reached");
    }

    #[tokio::test]
    async fn summarize_trims_and_hides_upstream_detail() {
        let backend = StubBackend::replying(Some("  ## Summary\n\n- HR  \n"));
        let summary = gateway(backend.clone()).summarize("", &["HR".to_string()]).await.unwrap();
        assert_eq!(summary, "## Summary\n\n- HR");
        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen[0].temperature, Some(0.4));
        assert!(seen[0].messages[1].content.contains("- HR"));

        let err = gateway(StubBackend::failing("500 boom")).summarize("", &[]).await.unwrap_err();
        assert_eq!(err.to_string(), SUMMARY_FAILED);
    }

    #[tokio::test]
    async fn summarize_whitespace_reply_falls_back() {
        let summary = gateway(StubBackend::replying(Some("   "))).summarize("n", &[]).await.unwrap();
        assert_eq!(summary, NO_SUMMARY);
    }

    #[test]
    fn upstream_error_prefers_message_field() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        assert_eq!(upstream_error_message(401, body), "401 Incorrect API key provided");
        assert_eq!(upstream_error_message(502, "bad gateway"), "502 bad gateway");
    }
}
