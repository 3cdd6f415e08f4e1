//! Quiz configuration with sensible defaults.
//!
//! [`QuizConfig`] captures what a quiz frontend needs to know and turns the
//! backend selection into a ready [`Generator`] via
//! [`build_generator`](QuizConfig::build_generator).

use std::sync::Arc;
use std::time::Duration;

use crate::client::gemini::DEFAULT_GEMINI_MODEL;
use crate::client::openrouter::DEFAULT_OPENROUTER_MODEL;
use crate::client::{AskClient, GeminiClient, Generator, OpenRouterClient};
use crate::error::GenerateError;
use crate::prompt::{ADJECTIVES_PER_BATCH, BATCH_SIZE, BatchPrompt};
use crate::reveal::DEFAULT_SPEED;
use crate::session::PrefetchPolicy;

/// Which service turns prompts into text.
#[derive(Clone, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Backend {
    /// Google Gemini, keyed by `GEMINI_API_KEY`.
    #[default]
    Gemini,
    /// OpenRouter, keyed by `OPENROUTER_KEY`.
    Openrouter,
}

impl Backend {
    pub fn default_model(&self) -> &'static str {
        match self {
            Backend::Gemini => DEFAULT_GEMINI_MODEL,
            Backend::Openrouter => DEFAULT_OPENROUTER_MODEL,
        }
    }
}

/// Configuration for a quiz session.
#[derive(Debug, Clone)]
pub struct QuizConfig {
    /// Backend service. Default: Gemini.
    pub backend: Backend,
    /// Model identifier. `None` uses the backend's default.
    pub model: Option<String>,
    /// Route prompts through a `trolley-web` server at this URL instead of
    /// calling the backend directly.
    pub server: Option<String>,
    /// Problems requested per batch. Default: `10`.
    pub batch_size: usize,
    /// Adjectives mixed into each prompt. Default: `3`.
    pub adjective_count: usize,
    /// Delay between revealed characters. Default: 18ms.
    pub typewriter_speed: Duration,
    /// When to fetch the next batch. Default: eager.
    pub prefetch: PrefetchPolicy,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            model: None,
            server: None,
            batch_size: BATCH_SIZE,
            adjective_count: ADJECTIVES_PER_BATCH,
            typewriter_speed: DEFAULT_SPEED,
            prefetch: PrefetchPolicy::default(),
        }
    }
}

impl QuizConfig {
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.backend.default_model())
    }

    /// A fresh prompt for the next batch.
    pub fn batch_prompt(&self) -> BatchPrompt {
        BatchPrompt::random(self.batch_size, self.adjective_count)
    }

    /// Build the generator this configuration describes.
    ///
    /// Reads the backend key from the environment unless a server URL is set.
    pub fn build_generator(&self) -> Result<Arc<dyn Generator>, GenerateError> {
        if let Some(ref server) = self.server {
            return Ok(Arc::new(AskClient::new(server)?));
        }
        let generator: Arc<dyn Generator> = match self.backend {
            Backend::Gemini => Arc::new(GeminiClient::from_env(self.model())?),
            Backend::Openrouter => Arc::new(OpenRouterClient::from_env(self.model())?),
        };
        Ok(generator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_quiz() {
        let config = QuizConfig::default();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.adjective_count, 3);
        assert_eq!(config.typewriter_speed, Duration::from_millis(18));
        assert_eq!(config.prefetch, PrefetchPolicy::Eager);
        assert_eq!(config.model(), "gemini-2.0-flash-lite");
    }

    #[test]
    fn explicit_model_wins() {
        let config = QuizConfig {
            backend: Backend::Openrouter,
            model: Some("meta/llama".into()),
            ..Default::default()
        };
        assert_eq!(config.model(), "meta/llama");
        let config = QuizConfig {
            backend: Backend::Openrouter,
            ..Default::default()
        };
        assert_eq!(config.model(), DEFAULT_OPENROUTER_MODEL);
    }

    #[test]
    fn server_url_skips_key_lookup() {
        let config = QuizConfig {
            server: Some("http://127.0.0.1:3001".into()),
            ..Default::default()
        };
        let generator = config.build_generator().unwrap();
        assert_eq!(generator.name(), "ask");
    }

    #[test]
    fn batch_prompt_uses_configured_sizes() {
        let config = QuizConfig {
            batch_size: 4,
            adjective_count: 2,
            ..Default::default()
        };
        let prompt = config.batch_prompt();
        assert_eq!(prompt.size, 4);
        assert_eq!(prompt.adjectives.len(), 2);
    }
}
