use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::dto::HistoryResponse;
use crate::state::ServerState;

/// GET /history - Everything recorded since startup.
pub async fn list(State(state): State<Arc<ServerState>>) -> Json<HistoryResponse> {
    let history = state.history().await;
    Json(HistoryResponse {
        count: history.len(),
        history,
    })
}
