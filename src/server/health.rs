//! Liveness endpoint.
//!
//! Answers as long as the HTTP server is up, independent of the dispatch
//! loop's state.

use axum::http::StatusCode;

/// Returns `200 OK` with the body `OK`.
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
