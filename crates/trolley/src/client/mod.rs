//! Generative-language backends.
//!
//! Every backend implements [`Generator`]: send one prompt, get raw text
//! back. The quiz never talks to a provider directly, so the same session
//! code runs against Gemini, OpenRouter, or a `trolley-web` server.
//!
//! - [`gemini`]: Google Generative Language `generateContent`.
//! - [`openrouter`]: OpenRouter chat completions.
//! - [`ask`]: the `POST /api/ask` pass-through exposed by `trolley-web`.

pub mod ask;
pub mod gemini;
pub mod openrouter;

pub use ask::AskClient;
pub use gemini::GeminiClient;
pub use openrouter::OpenRouterClient;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::error::GenerateError;

/// Timeout applied to every backend request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Boxed future returned by [`Generator::generate`].
pub type GenerateFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, GenerateError>> + Send + 'a>>;

/// A backend that turns a prompt into raw model text.
///
/// Uses a boxed future so that the trait is dyn-compatible and can be shared
/// as `Arc<dyn Generator>` between the web server and the quiz driver.
pub trait Generator: Send + Sync {
    fn generate<'a>(&'a self, prompt: &'a str) -> GenerateFuture<'a>;

    /// Short backend name for logs.
    fn name(&self) -> &str;
}

/// Build the shared HTTP client used by all backends.
pub(crate) fn http_client(user_agent: &str) -> Result<reqwest::Client, GenerateError> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(GenerateError::Client)
}

/// Fail with [`GenerateError::Status`] unless `status` is a success.
pub(crate) fn check_status(status: reqwest::StatusCode, body: &str) -> Result<(), GenerateError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(GenerateError::Status {
            status,
            body: body.to_string(),
        })
    }
}
