//! Error types shared across the crate.

use thiserror::Error;

/// Errors from a [`Generator`](crate::client::Generator) backend.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerateError {
    #[error("{0} is not set")]
    MissingKey(&'static str),
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("API error: {0}")]
    Api(String),
    #[error("response contained no text")]
    EmptyResponse,
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Why a batch fetch failed, as seen by the quiz session.
///
/// Every variant is recoverable by fetching again; the UI only ever shows
/// [`user_message`](FetchError::user_message) and a retry action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum FetchError {
    /// The request never completed.
    #[error("network failure: {0}")]
    Network(String),
    /// The backend answered with a non-success status or an error object.
    #[error("request rejected: {0}")]
    Rejected(String),
    /// The response had no usable text field.
    #[error("response had no answer text")]
    MissingAnswer,
    /// The text could not be parsed into any trolley problem.
    #[error("no trolley problems could be parsed")]
    Unparseable,
}

impl FetchError {
    pub fn user_message(&self) -> &'static str {
        match self {
            FetchError::Network(_) => "Error fetching trolley problems.",
            FetchError::Rejected(_) => "Failed to fetch trolley problems.",
            FetchError::MissingAnswer | FetchError::Unparseable => {
                "Could not parse trolley problems. Please try again."
            }
        }
    }
}

impl From<GenerateError> for FetchError {
    fn from(err: GenerateError) -> Self {
        match err {
            GenerateError::MissingKey(_) | GenerateError::Client(_) | GenerateError::Http(_) => {
                FetchError::Network(err.to_string())
            }
            GenerateError::Status { .. } | GenerateError::Api(_) => {
                FetchError::Rejected(err.to_string())
            }
            GenerateError::EmptyResponse | GenerateError::Decode(_) => FetchError::MissingAnswer,
        }
    }
}
