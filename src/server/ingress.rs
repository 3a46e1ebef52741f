//! Event and layout ingress.
//!
//! Both endpoints only enqueue: the dispatch loop does the work, so a `202`
//! means "accepted for processing", not "processed".

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{debug, warn};

use super::AppState;
use crate::events::EventEnvelope;
use crate::layout::{ConfigError, Layout, LayoutConfig};
use crate::worker::HandleError;

/// Errors that can occur when accepting an event or layout.
#[derive(Debug, Error)]
pub enum IngressError {
    /// The body is not a well-formed event envelope.
    #[error("invalid event envelope: {0}")]
    InvalidEnvelope(#[source] serde_json::Error),

    /// The layout failed validation.
    #[error("invalid layout: {0}")]
    InvalidLayout(#[from] ConfigError),

    /// The dispatch loop has stopped.
    #[error("{0}")]
    Unavailable(#[from] HandleError),
}

impl IntoResponse for IngressError {
    fn into_response(self) -> Response {
        let status = match &self {
            IngressError::InvalidEnvelope(_) => StatusCode::BAD_REQUEST,
            IngressError::InvalidLayout(_) => StatusCode::BAD_REQUEST,
            IngressError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        (status, self.to_string()).into_response()
    }
}

/// Event ingress handler.
///
/// # Request
///
/// Body: `{"kind": "...", "change": {"project": "owner/name", "number": N}, "payload": {...}}`
///
/// The payload is decoded on the dispatch loop; an unknown kind or malformed
/// payload is logged and dropped there, after this handler has returned.
///
/// # Response
///
/// - 202 Accepted: envelope enqueued
/// - 400 Bad Request: body is not an envelope
/// - 503 Service Unavailable: dispatch loop has stopped
pub async fn event_handler(
    State(app_state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, &'static str), IngressError> {
    let envelope: EventEnvelope =
        serde_json::from_slice(&body).map_err(IngressError::InvalidEnvelope)?;

    debug!(kind = %envelope.kind, change = %envelope.change, "Received event");

    app_state.handle().send_envelope(envelope).map_err(|e| {
        warn!(error = %e, "Dropping event, dispatch loop is gone");
        e
    })?;
    Ok((StatusCode::ACCEPTED, "Accepted"))
}

/// Layout ingress handler.
///
/// Validates the layout before enqueueing, so configuration errors are
/// reported to the caller. The new layout applies at the loop's next idle
/// point.
///
/// # Response
///
/// - 202 Accepted: layout valid and enqueued
/// - 400 Bad Request: the `ConfigError` text
/// - 503 Service Unavailable: dispatch loop has stopped
pub async fn layout_handler(
    State(app_state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, &'static str), IngressError> {
    let config: LayoutConfig = serde_json::from_slice(&body).map_err(ConfigError::from)?;
    let layout = Layout::from_config(config)?;

    debug!(pipelines = layout.pipelines().len(), "Received layout");

    app_state.handle().reconfigure(layout)?;
    Ok((StatusCode::ACCEPTED, "Accepted"))
}
