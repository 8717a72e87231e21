use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::Json;
use tracing::warn;

use crate::dto::{CompletionRequest, CompletionResponse, PromptError};
use crate::error::AppError;
use crate::services::completion as completion_service;
use crate::state::ServerState;

pub const PROMPT_REQUIRED: &str = "Prompt is required";
pub const PROMPT_NOT_STRING: &str = "Prompt must be a string";

/// POST /completion - Forward a prompt to the agent.
pub async fn create(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CompletionResponse>, AppError> {
    let req = parse_body(&headers, &body)?;

    let prompt = req.into_prompt().map_err(|e| match e {
        PromptError::Missing => AppError::BadRequest(PROMPT_REQUIRED.into()),
        PromptError::NotAString => AppError::BadRequest(PROMPT_NOT_STRING.into()),
    })?;

    let completion = completion_service::complete(&state, prompt).await?;
    Ok(Json(CompletionResponse { completion }))
}

/// A non-JSON content type or a blank body reads as an empty object.
fn parse_body(headers: &HeaderMap, body: &[u8]) -> Result<CompletionRequest, AppError> {
    if !is_json(headers) || body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CompletionRequest::default());
    }

    serde_json::from_slice(body).map_err(|e| {
        warn!("Rejected completion body: {}", e);
        AppError::BadRequest(format!("Failed to parse the request body as JSON: {}", e))
    })
}

fn is_json(headers: &HeaderMap) -> bool {
    let Some(value) = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let essence = value.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    essence == "application/json" || (essence.starts_with("application/") && essence.ends_with("+json"))
}
