//! Client for the OpenRouter chat completions API.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{GenerateFuture, Generator, check_status, http_client};
use crate::error::GenerateError;

pub const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Default OpenRouter model for batch generation.
pub const DEFAULT_OPENROUTER_MODEL: &str = "google/gemini-2.0-flash-lite-001";

/// Environment variable holding the API key.
pub const OPENROUTER_KEY_VAR: &str = "OPENROUTER_KEY";

/// Maximum tokens for one batch of ten problems.
pub const BATCH_MAX_TOKENS: u32 = 2048;

// ── Request types ──────────────────────────────────────────────────

/// Chat completion request body. Only the fields the quiz uses.
#[derive(Serialize, Debug)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

fn is_zero_u32(v: &u32) -> bool {
    *v == 0
}

#[derive(Serialize, Debug)]
pub struct Message<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

impl<'a> Message<'a> {
    pub fn user(content: &'a str) -> Self {
        Self {
            role: "user",
            content,
        }
    }
}

// ── Response types ─────────────────────────────────────────────────

#[derive(Deserialize, Debug)]
struct RawChatResponse {
    choices: Option<Vec<RawChoice>>,
    error: Option<ApiErrorResponse>,
    #[serde(default)]
    usage: Option<UsageInfo>,
}

#[derive(Deserialize, Debug)]
struct RawChoice {
    message: RawResponseMessage,
}

#[derive(Deserialize, Debug)]
struct RawResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorResponse {
    message: String,
}

#[derive(Deserialize, Debug)]
struct UsageInfo {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
}

// ── Client ─────────────────────────────────────────────────────────

/// Async HTTP client for OpenRouter.
pub struct OpenRouterClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    url: String,
    referer: String,
    title: String,
}

impl OpenRouterClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, GenerateError> {
        Ok(Self {
            client: http_client("trolley/0.1")?,
            api_key: api_key.into(),
            model: model.into(),
            url: OPENROUTER_URL.to_string(),
            referer: "https://github.com/absurd-trolley/trolley".to_string(),
            title: "Absurd Trolley Problems".to_string(),
        })
    }

    /// Create a client reading the key from `OPENROUTER_KEY`.
    pub fn from_env(model: impl Into<String>) -> Result<Self, GenerateError> {
        let key = std::env::var(OPENROUTER_KEY_VAR)
            .map_err(|_| GenerateError::MissingKey(OPENROUTER_KEY_VAR))?;
        Self::new(key, model)
    }

    /// Override the completions URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub async fn complete(&self, prompt: &str) -> Result<String, GenerateError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![Message::user(prompt)],
            max_tokens: BATCH_MAX_TOKENS,
            temperature: Some(1.0),
        };
        debug!(
            "LLM request: model={}, prompt_len={}, max_tokens={}",
            self.model,
            prompt.len(),
            body.max_tokens,
        );

        let start = Instant::now();
        let resp = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        debug!(
            "LLM response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );
        trace!("OpenRouter raw response: {text}");

        decode_response(status, &text)
    }
}

impl Generator for OpenRouterClient {
    fn generate<'a>(&'a self, prompt: &'a str) -> GenerateFuture<'a> {
        Box::pin(self.complete(prompt))
    }

    fn name(&self) -> &str {
        "openrouter"
    }
}

fn decode_response(status: reqwest::StatusCode, body: &str) -> Result<String, GenerateError> {
    check_status(status, body)?;
    let parsed: RawChatResponse = serde_json::from_str(body)?;

    if let Some(err) = parsed.error {
        return Err(GenerateError::Api(err.message));
    }

    if let Some(ref usage) = parsed.usage {
        debug!(
            "Token usage: prompt={}, completion={}",
            usage.prompt_tokens.unwrap_or(0),
            usage.completion_tokens.unwrap_or(0),
        );
    }

    parsed
        .choices
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.message.content)
        .filter(|s| !s.is_empty())
        .ok_or(GenerateError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn chat_request_skips_unset_fields() {
        let req = ChatRequest {
            model: "test-model",
            messages: vec![Message::user("hi")],
            max_tokens: 0,
            temperature: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("max_tokens").is_none());
        assert!(json.get("temperature").is_none());
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn decode_first_choice() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": "hello"}}], "usage": {"prompt_tokens": 3}}"#;
        assert_eq!(decode_response(StatusCode::OK, body).unwrap(), "hello");
    }

    #[test]
    fn decode_errors() {
        assert!(matches!(
            decode_response(StatusCode::OK, r#"{"error": {"message": "no credits"}}"#),
            Err(GenerateError::Api(_))
        ));
        assert!(matches!(
            decode_response(StatusCode::OK, r#"{"choices": []}"#),
            Err(GenerateError::EmptyResponse)
        ));
        assert!(matches!(
            decode_response(StatusCode::TOO_MANY_REQUESTS, "slow down"),
            Err(GenerateError::Status { .. })
        ));
        assert!(matches!(
            decode_response(StatusCode::OK, "not json"),
            Err(GenerateError::Decode(_))
        ));
    }
}
