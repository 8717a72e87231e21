use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;

use crate::error::AppError;
use crate::state::ServerState;

/// GET /metrics - Prometheus scrape endpoint.
pub async fn scrape(State(state): State<Arc<ServerState>>) -> Result<impl IntoResponse, AppError> {
    let body = state.metrics.gather().map_err(|e| {
        tracing::error!("Failed to gather metrics: {}", e);
        AppError::internal(e)
    })?;

    Ok(([(header::CONTENT_TYPE, state.metrics.content_type())], body))
}
