//! Client for the Google Generative Language `generateContent` endpoint.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{GenerateFuture, Generator, check_status, http_client};
use crate::error::GenerateError;

pub const GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model for batch generation.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-lite";

/// Environment variable holding the API key.
pub const GEMINI_KEY_VAR: &str = "GEMINI_API_KEY";

// ── Wire types ─────────────────────────────────────────────────────

#[derive(Serialize, Debug)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize, Debug)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize, Debug)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct RawGenerateResponse {
    candidates: Option<Vec<RawCandidate>>,
    error: Option<ApiErrorResponse>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct RawCandidate {
    content: Option<RawContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct RawContent {
    #[serde(default)]
    parts: Vec<RawPart>,
}

#[derive(Deserialize, Debug)]
struct RawPart {
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorResponse {
    message: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
}

// ── Client ─────────────────────────────────────────────────────────

/// Async HTTP client for Gemini models.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a client for `model`. A leading `models/` is accepted and stripped.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, GenerateError> {
        let model: String = model.into();
        let model = model
            .strip_prefix("models/")
            .map(str::to_string)
            .unwrap_or(model);
        Ok(Self {
            client: http_client("trolley/0.1")?,
            api_key: api_key.into(),
            model,
            base_url: GEMINI_URL.to_string(),
        })
    }

    /// Create a client reading the key from `GEMINI_API_KEY`.
    pub fn from_env(model: impl Into<String>) -> Result<Self, GenerateError> {
        let key = std::env::var(GEMINI_KEY_VAR)
            .map_err(|_| GenerateError::MissingKey(GEMINI_KEY_VAR))?;
        Self::new(key, model)
    }

    /// Point the client at a different API root (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Send a single-turn prompt and return the concatenated text parts.
    pub async fn generate_content(&self, prompt: &str) -> Result<String, GenerateError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };
        debug!(model = %self.model, prompt_len = prompt.len(), "Gemini request");

        let start = Instant::now();
        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        debug!(
            "Gemini response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );
        trace!("Gemini raw response: {text}");

        decode_response(status, &text)
    }
}

impl Generator for GeminiClient {
    fn generate<'a>(&'a self, prompt: &'a str) -> GenerateFuture<'a> {
        Box::pin(self.generate_content(prompt))
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Turn an HTTP status and body into the response text.
fn decode_response(status: reqwest::StatusCode, body: &str) -> Result<String, GenerateError> {
    check_status(status, body)?;
    let parsed: RawGenerateResponse = serde_json::from_str(body)?;

    if let Some(err) = parsed.error {
        return Err(GenerateError::Api(err.message));
    }

    if let Some(ref usage) = parsed.usage_metadata {
        debug!(
            "Token usage: prompt={}, candidates={}",
            usage.prompt_token_count.unwrap_or(0),
            usage.candidates_token_count.unwrap_or(0),
        );
    }

    let Some(candidate) = parsed.candidates.and_then(|c| c.into_iter().next()) else {
        return match parsed.prompt_feedback.and_then(|f| f.block_reason) {
            Some(reason) => Err(GenerateError::Api(format!("prompt blocked: {reason}"))),
            None => Err(GenerateError::EmptyResponse),
        };
    };

    if let Some(ref reason) = candidate.finish_reason {
        debug!(finish_reason = %reason, "Gemini candidate finished");
    }

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        Err(GenerateError::EmptyResponse)
    } else {
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn strips_models_prefix() {
        let client = GeminiClient::new("k", "models/gemini-2.0-flash-lite").unwrap();
        assert_eq!(client.model(), "gemini-2.0-flash-lite");
        assert!(
            client
                .endpoint()
                .ends_with("/models/gemini-2.0-flash-lite:generateContent")
        );
    }

    #[test]
    fn base_url_override_drops_trailing_slash() {
        let client = GeminiClient::new("k", "m")
            .unwrap()
            .with_base_url("http://127.0.0.1:9/v1/");
        assert_eq!(client.endpoint(), "http://127.0.0.1:9/v1/models/m:generateContent");
    }

    #[test]
    fn request_body_shape() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: "hi" }],
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(json["contents"][0]["role"], "user");
    }

    #[test]
    fn decode_concatenates_parts() {
        let body = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "[{\"question\""}, {"text": ": \"q\"}]"}], "role": "model"},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 5}
        }"#;
        let text = decode_response(StatusCode::OK, body).unwrap();
        assert_eq!(text, r#"[{"question": "q"}]"#);
    }

    #[test]
    fn decode_reports_http_status() {
        let err = decode_response(StatusCode::FORBIDDEN, "denied").unwrap_err();
        assert!(
            matches!(err, GenerateError::Status { status, .. } if status == StatusCode::FORBIDDEN)
        );
    }

    #[test]
    fn decode_reports_api_error_and_block_reason() {
        let err = decode_response(
            StatusCode::OK,
            r#"{"error": {"code": 400, "message": "bad key"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, GenerateError::Api(ref m) if m == "bad key"));

        let err = decode_response(
            StatusCode::OK,
            r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, GenerateError::Api(ref m) if m.contains("SAFETY")));
    }

    #[test]
    fn decode_without_text_is_empty_response() {
        let err = decode_response(
            StatusCode::OK,
            r#"{"candidates": [{"finishReason": "MAX_TOKENS"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, GenerateError::EmptyResponse));
    }
}
