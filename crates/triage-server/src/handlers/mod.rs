//! HTTP route handlers for the triage server.

pub mod completion;
pub mod history;
pub mod metrics;

use axum::Json;

use crate::dto::HealthResponse;

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}
