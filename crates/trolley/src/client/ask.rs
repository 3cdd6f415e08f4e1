//! Client for the `POST /api/ask` pass-through served by `trolley-web`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{GenerateFuture, Generator, check_status, http_client};
use crate::error::GenerateError;

/// Request body of `POST /api/ask`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AskRequest {
    /// The full prompt.
    pub question: String,
}

/// Successful response body of `POST /api/ask`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AskResponse {
    pub answer: String,
}

/// Error body returned with a 500 status.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AskError {
    pub error: String,
}

/// Sends prompts through a running `trolley-web` server.
pub struct AskClient {
    client: reqwest::Client,
    url: String,
}

impl AskClient {
    /// `base` is the server root, e.g. `http://127.0.0.1:3001`.
    pub fn new(base: &str) -> Result<Self, GenerateError> {
        Ok(Self {
            client: http_client("trolley/0.1")?,
            url: format!("{}/api/ask", base.trim_end_matches('/')),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn ask(&self, prompt: &str) -> Result<String, GenerateError> {
        let body = AskRequest {
            question: prompt.to_string(),
        };
        let resp = self.client.post(&self.url).json(&body).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        debug!("ask response: HTTP {} ({} bytes)", status, text.len());
        decode_response(status, &text)
    }
}

impl Generator for AskClient {
    fn generate<'a>(&'a self, prompt: &'a str) -> GenerateFuture<'a> {
        Box::pin(self.ask(prompt))
    }

    fn name(&self) -> &str {
        "ask"
    }
}

fn decode_response(status: reqwest::StatusCode, body: &str) -> Result<String, GenerateError> {
    check_status(status, body)?;
    let value: serde_json::Value = serde_json::from_str(body)?;
    match value.get("answer") {
        Some(serde_json::Value::String(answer)) => Ok(answer.clone()),
        _ => Err(GenerateError::EmptyResponse),
    }
}
