//! HTTP server for the gate.
//!
//! This module implements the HTTP surface that:
//! - Accepts event envelopes and hands them to the dispatch loop
//! - Accepts layout replacements
//! - Exposes pipeline queues for observability
//! - Provides health checks for liveness probes
//!
//! # Endpoints
//!
//! - `POST /api/v1/events` - Enqueues an event envelope (returns 202 Accepted)
//! - `POST /api/v1/layout` - Validates and enqueues a layout (202, or 400)
//! - `GET /api/v1/pipelines/{name}/queue` - Returns a pipeline queue as JSON
//! - `GET /health` - Returns 200 if the server is running

use std::sync::Arc;

pub mod health;
pub mod ingress;
pub mod state;

pub use health::health_handler;
pub use ingress::{IngressError, event_handler, layout_handler};
pub use state::{QueueError, queue_handler};

use crate::worker::GateHandle;

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Producer handle of the running dispatch loop.
    handle: GateHandle,
}

impl AppState {
    pub fn new(handle: GateHandle) -> Self {
        AppState {
            inner: Arc::new(AppStateInner { handle }),
        }
    }

    pub fn handle(&self) -> &GateHandle {
        &self.inner.handle
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/api/v1/events", post(event_handler))
        .route("/api/v1/layout", post(layout_handler))
        .route("/api/v1/pipelines/{name}/queue", get(queue_handler))
        .route("/health", get(health_handler))
        .with_state(app_state)
}
