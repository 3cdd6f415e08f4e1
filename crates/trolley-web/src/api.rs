//! REST API endpoint handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use trolley::client::ask::{AskError, AskRequest, AskResponse};
use trolley::{BatchItem, BatchPrompt, FetchError, Generator, fetch_batch};

use crate::MAX_BATCH_SIZE;

/// Message returned when `/api/ask` fails, whatever the cause.
pub const ASK_FAILED: &str = "Failed to get a response from the model.";

/// Message returned when `/api/batch` cannot read its request body.
pub const BAD_BATCH_REQUEST: &str = "Expected a JSON body like {\"size\": 10}.";

/// Shared application state passed to all handlers via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<dyn Generator>,
    pub batch_size: usize,
    pub adjective_count: usize,
}

type ApiError = (StatusCode, Json<AskError>);

fn api_error(status: StatusCode, message: &str) -> ApiError {
    (
        status,
        Json(AskError {
            error: message.to_string(),
        }),
    )
}

/// POST /api/ask: pass a prompt through to the model.
///
/// Returns `{ "answer" }`, or 500 with a fixed error message. The
/// underlying cause is logged, not returned. An unreadable body is one
/// more such cause.
pub async fn post_ask(
    State(app): State<AppState>,
    body: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, ApiError> {
    let Json(body) = body.map_err(|e| {
        warn!("ask body rejected: {e}");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, ASK_FAILED)
    })?;
    match app.generator.generate(&body.question).await {
        Ok(answer) => {
            info!(
                backend = app.generator.name(),
                prompt_len = body.question.len(),
                answer_len = answer.len(),
                "ask answered"
            );
            Ok(Json(AskResponse { answer }))
        }
        Err(e) => {
            warn!(backend = app.generator.name(), "ask failed: {e}");
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, ASK_FAILED))
        }
    }
}

/// Request body for POST /api/batch.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct BatchRequest {
    /// Problems to generate. Defaults to the server's batch size.
    #[serde(default)]
    pub size: Option<usize>,
}

/// Response body for POST /api/batch.
#[derive(Serialize, Deserialize, Debug)]
pub struct BatchResponse {
    pub items: Vec<BatchItem>,
    /// Adjectives the prompt was flavoured with.
    pub adjectives: Vec<String>,
}

/// POST /api/batch: generate and parse one batch.
///
/// 500 when the model call fails, 502 when it answered with nothing
/// parseable, 400 when the request body is not a valid `BatchRequest`.
pub async fn post_batch(
    State(app): State<AppState>,
    body: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Json<BatchResponse>, ApiError> {
    let Json(body) = body.map_err(|e| {
        warn!("batch body rejected: {e}");
        api_error(StatusCode::BAD_REQUEST, BAD_BATCH_REQUEST)
    })?;
    let size = body
        .size
        .unwrap_or(app.batch_size)
        .clamp(1, MAX_BATCH_SIZE);
    let prompt = BatchPrompt::random(size, app.adjective_count);

    match fetch_batch(app.generator.as_ref(), &prompt).await {
        Ok(items) => Ok(Json(BatchResponse {
            items,
            adjectives: prompt.adjectives,
        })),
        Err(e) => Err(api_error(batch_status(&e), e.user_message())),
    }
}

fn batch_status(err: &FetchError) -> StatusCode {
    match err {
        FetchError::Unparseable => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ask_request_deserializes() {
        let json = r#"{"question":"Invent a trolley problem"}"#;
        let req: AskRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.question, "Invent a trolley problem");
    }

    #[test]
    fn batch_request_size_is_optional() {
        let req: BatchRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.size, None);
        let req: BatchRequest = serde_json::from_str(r#"{"size":4}"#).unwrap();
        assert_eq!(req.size, Some(4));
    }

    #[test]
    fn unparseable_batches_are_bad_gateway() {
        assert_eq!(batch_status(&FetchError::Unparseable), StatusCode::BAD_GATEWAY);
        assert_eq!(
            batch_status(&FetchError::Network("refused".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            batch_status(&FetchError::MissingAnswer),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
