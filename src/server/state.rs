//! Queue inspection endpoint.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use super::AppState;
use crate::worker::{HandleError, PipelineStatus};

/// Errors that can occur when inspecting a queue.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("pipeline not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Unavailable(#[from] HandleError),
}

impl IntoResponse for QueueError {
    fn into_response(self) -> Response {
        let status = match &self {
            QueueError::NotFound(_) => StatusCode::NOT_FOUND,
            QueueError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        (status, self.to_string()).into_response()
    }
}

/// Returns a pipeline's queue as JSON.
///
/// The view reflects every message enqueued before the request.
///
/// # Example
///
/// ```ignore
/// GET /api/v1/pipelines/check/queue HTTP/1.1
///
/// HTTP/1.1 200 OK
/// Content-Type: application/json
///
/// {"name": "check", "queue": [{"change": {"project": "org/project1", "number": 1}, "head": null, "sequence": 0}]}
/// ```
pub async fn queue_handler(
    State(app_state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<PipelineStatus>, QueueError> {
    let status = app_state.handle().status().await?;
    status
        .pipelines
        .into_iter()
        .find(|p| p.name.as_str() == name)
        .map(Json)
        .ok_or(QueueError::NotFound(name))
}
