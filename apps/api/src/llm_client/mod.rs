/// LLM Client — the single point of entry for chat-completion calls.
///
/// No other module may call the completion API directly; everything goes
/// through the [`Completion`] trait so handlers and tests can swap the backend.
///
/// Model: gpt-3.5-turbo at temperature 0.7 (hardcoded so drafts stay consistent)
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
/// The model used for every draft.
pub const MODEL: &str = "gpt-3.5-turbo";
pub const TEMPERATURE: f32 = 0.7;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// External chat-completion capability. `system` is the whole instruction payload.
#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(&self, system: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// Text of the first choice.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    error: OpenAiErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    message: String,
}

/// Wraps the OpenAI chat-completions API. No retries: a failed call is
/// reported once and rendered inline by the caller.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl LlmClient {
    /// `timeout` of `None` leaves requests unbounded.
    pub fn new(api_key: String, timeout: Option<Duration>) -> Result<Self, LlmError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            api_key,
            endpoint: OPENAI_API_URL.to_string(),
        })
    }

    /// Points the client at an OpenAI-compatible endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Makes a raw call, returning the full response object.
    pub async fn call(&self, system: &str) -> Result<ChatResponse, LlmError> {
        let request_body = ChatRequest {
            model: MODEL,
            temperature: TEMPERATURE,
            messages: vec![ChatMessage {
                role: "system",
                content: system,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OpenAiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chat_response: ChatResponse = response.json().await?;

        if let Some(usage) = &chat_response.usage {
            debug!(
                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        Ok(chat_response)
    }
}

#[async_trait]
impl Completion for LlmClient {
    async fn complete(&self, system: &str) -> Result<String, LlmError> {
        let response = self.call(system).await?;
        response
            .text()
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        http::{header, HeaderMap, StatusCode},
        response::{IntoResponse, Response},
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};

    use super::*;
    use crate::generation::gateway::generate;

    /// Chat-completions stand-in: `sk-good` is answered, `sk-empty` gets no
    /// choices, any other key is rejected the way OpenAI rejects it.
    async fn chat_completions(headers: HeaderMap, Json(body): Json<Value>) -> Response {
        let auth = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        match auth {
            "Bearer sk-good" => {
                let content = format!("echo {}", body["model"].as_str().unwrap_or_default());
                Json(json!({
                    "choices": [{"message": {"role": "assistant", "content": content}}],
                    "usage": {"prompt_tokens": 12, "completion_tokens": 3}
                }))
                .into_response()
            }
            "Bearer sk-empty" => Json(json!({ "choices": [] })).into_response(),
            _ => (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": {
                        "message": "Incorrect API key provided: sk-bad",
                        "type": "invalid_request_error",
                        "code": "invalid_api_key"
                    }
                })),
            )
                .into_response(),
        }
    }

    async fn stub_client(api_key: &str) -> LlmClient {
        let router = Router::new().route("/v1/chat/completions", post(chat_completions));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

        LlmClient::new(api_key.to_string(), Some(Duration::from_secs(5)))
            .unwrap()
            .with_endpoint(format!("http://{addr}/v1/chat/completions"))
    }

    #[tokio::test]
    async fn test_completion_returns_first_choice() {
        let client = stub_client("sk-good").await;
        let text = client.complete("prompt").await.unwrap();
        assert_eq!(text, "echo gpt-3.5-turbo");
    }

    #[tokio::test]
    async fn test_rejected_key_is_api_error_with_message() {
        let client = stub_client("sk-bad").await;
        let err = client.complete("prompt").await.unwrap_err();
        assert!(matches!(
            err,
            LlmError::Api { status: 401, ref message } if message == "Incorrect API key provided: sk-bad"
        ));
    }

    #[tokio::test]
    async fn test_rejected_key_becomes_draft_text() {
        let client = stub_client("sk-bad").await;
        let text = generate(&client, &[], "Nice place").await;
        assert!(text.starts_with("An error occurred:"));
        assert!(text.contains("401"));
        assert!(text.contains("Incorrect API key provided"));
    }

    #[tokio::test]
    async fn test_no_choices_is_empty_content() {
        let client = stub_client("sk-empty").await;
        let err = client.complete("prompt").await.unwrap_err();
        assert!(matches!(err, LlmError::EmptyContent));
    }

    #[test]
    fn test_request_carries_single_system_message() {
        let body = ChatRequest {
            model: MODEL,
            temperature: TEMPERATURE,
            messages: vec![ChatMessage {
                role: "system",
                content: "prompt",
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-3.5-turbo");
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert_eq!(json["messages"][0]["role"], "system");
        assert!((json["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_response_text_reads_first_choice() {
        let json = r#"{
            "choices": [{"message": {"role": "assistant", "content": "Thank you!"}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 3, "total_tokens": 13}
        }"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), Some("Thank you!"));
    }

    #[test]
    fn test_response_without_choices_has_no_text() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(response.text().is_none());
    }

    #[test]
    fn test_error_body_parses() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
        let parsed: OpenAiError = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.message, "Incorrect API key provided");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_http_error() {
        let client = LlmClient::new("sk-test".to_string(), Some(Duration::from_secs(2)))
            .unwrap()
            .with_endpoint("http://127.0.0.1:1/v1/chat/completions");
        let err = client.complete("prompt").await.unwrap_err();
        assert!(matches!(err, LlmError::Http(_)));
    }
}
