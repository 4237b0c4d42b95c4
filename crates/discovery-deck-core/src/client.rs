//! Client side of the gateway: wire bodies for `/chat` and `/summarize`, the [`DeckApi`]
//! seam used by the chat widget, session controller and export pipeline, and its two
//! implementations (HTTP to a running gateway, or in-process over [`CompletionGateway`]).

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::completion::CompletionGateway;
use crate::error::{DeckError, Result};
use crate::slides::Slide;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequestBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponseBody {
    pub answer: String,
}

/// Body of `POST /summarize`. Slides and transcript ride along for context; the
/// summary prompt itself is built from notes and selections only. Every field may be
/// absent or `null`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeRequest {
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub slides: Vec<serde_json::Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub icebreaker_notes: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub selected_use_cases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    /// Older clients send the transcript under this name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_transcript: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl SummarizeRequest {
    pub fn new(icebreaker_notes: &str, selected_use_cases: Vec<String>) -> Self {
        Self {
            icebreaker_notes: icebreaker_notes.to_string(),
            selected_use_cases,
            ..Default::default()
        }
    }

    /// Transcript text under either wire name; `transcript` wins when both are sent.
    pub fn transcript_text(&self) -> Option<&str> {
        self.transcript.as_deref().or(self.chat_transcript.as_deref())
    }

    pub fn with_slides(mut self, slides: &[Slide]) -> Self {
        self.slides = slides
            .iter()
            .filter_map(|s| serde_json::to_value(s).ok())
            .collect();
        self
    }

    pub fn with_transcript(mut self, transcript: Option<String>) -> Self {
        self.transcript = transcript;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResponseBody {
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Calls the UI makes against the gateway.
#[async_trait]
pub trait DeckApi: Send + Sync {
    async fn chat(&self, prompt: &str) -> Result<String>;
    async fn summarize(&self, request: &SummarizeRequest) -> Result<String>;
}

/// HTTP client for a running gateway.
#[derive(Clone)]
pub struct HttpDeckClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpDeckClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn post<B: Serialize + ?Sized, R: for<'de> Deserialize<'de>>(&self, path: &str, body: &B) -> Result<R> {
        let res = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .map_err(|e| DeckError::Network(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let detail = res.json::<ErrorBody>().await.map(|b| b.error).unwrap_or_default();
            tracing::warn!(path, status = status.as_u16(), %detail, "gateway returned an error");
            return Err(DeckError::Network(format!("API error: {}", status.as_u16())));
        }

        res.json::<R>()
            .await
            .map_err(|e| DeckError::Network(format!("Invalid response from {}: {}", path, e)))
    }
}

#[async_trait]
impl DeckApi for HttpDeckClient {
    async fn chat(&self, prompt: &str) -> Result<String> {
        let body = ChatRequestBody { prompt: Some(prompt.to_string()) };
        let res: ChatResponseBody = self.post("/chat", &body).await?;
        Ok(res.answer)
    }

    async fn summarize(&self, request: &SummarizeRequest) -> Result<String> {
        let res: SummaryResponseBody = self.post("/summarize", request).await?;
        Ok(res.summary)
    }
}

/// In-process: skip HTTP and call the completion gateway directly.
#[async_trait]
impl DeckApi for CompletionGateway {
    async fn chat(&self, prompt: &str) -> Result<String> {
        self.converse(Some(prompt)).await
    }

    async fn summarize(&self, request: &SummarizeRequest) -> Result<String> {
        CompletionGateway::summarize(self, &request.icebreaker_notes, &request.selected_use_cases).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarize_body_accepts_chat_transcript_alias() {
        let body: SummarizeRequest = serde_json::from_str(
            r#"{"icebreakerNotes":"n","selectedUseCases":["HR"],"chatTranscript":"[]"}"#,
        )
        .unwrap();
        assert_eq!(body.icebreaker_notes, "n");
        assert_eq!(body.selected_use_cases, vec!["HR".to_string()]);
        assert_eq!(body.transcript_text(), Some("[]"));
    }

    #[test]
    fn summarize_body_tolerates_nulls_and_both_transcript_names() {
        let body: SummarizeRequest = serde_json::from_str(
            r#"{"slides":null,"icebreakerNotes":"we love AI","selectedUseCases":null,
                "transcript":"[1]","chatTranscript":"[2]"}"#,
        )
        .unwrap();
        assert_eq!(body.icebreaker_notes, "we love AI");
        assert!(body.selected_use_cases.is_empty());
        assert!(body.slides.is_empty());
        assert_eq!(body.transcript_text(), Some("[1]"));
    }

    #[test]
    fn summarize_body_rejects_wrong_types() {
        assert!(serde_json::from_str::<SummarizeRequest>(r#"{"selectedUseCases":"HR"}"#).is_err());
    }

    #[test]
    fn summarize_body_defaults_when_empty() {
        let body: SummarizeRequest = serde_json::from_str("{}").unwrap();
        assert!(body.icebreaker_notes.is_empty());
        assert!(body.selected_use_cases.is_empty());
        assert!(body.slides.is_empty());
    }

    #[test]
    fn summarize_body_wire_names() {
        let req = SummarizeRequest::new("notes", vec!["HR".into()]).with_transcript(Some("[]".into()));
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["icebreakerNotes"], "notes");
        assert_eq!(v["selectedUseCases"][0], "HR");
        assert_eq!(v["transcript"], "[]");
    }
}
