//! Prompt completion through the configured agent.

use tracing::{error, info};
use triage_core::{Content, HistoryEntry, Message};

use crate::error::AppError;
use crate::state::ServerState;

/// Sends `prompt` to the agent and records it in history on success.
///
/// Only the user's prompt is recorded; the agent's reply is returned but not stored.
pub async fn complete(state: &ServerState, prompt: String) -> Result<Content, AppError> {
    info!(model = state.agent.model(), prompt_len = prompt.len(), "Invoking agent");

    let response = state
        .agent
        .invoke(vec![Message::user(prompt.as_str())])
        .await
        .map_err(|e| {
            error!("Agent invocation failed: {}", e);
            AppError::from(e)
        })?;

    let completion = response.into_last_content().map_err(|e| {
        error!("Agent returned no messages");
        AppError::from(e)
    })?;

    state.add_history(HistoryEntry::from(Message::user(prompt))).await;

    Ok(completion)
}
