use serde::{Deserialize, Serialize};
use serde_json::Value;
use triage_core::{Content, HistoryEntry};

// === HTTP DTOs ===

/// Body of `POST /completion`. `prompt` stays untyped so that falsy values
/// (`false`, `0`, `null`, `""`) read as a missing prompt rather than a type error.
#[derive(Debug, Default, Deserialize)]
pub struct CompletionRequest {
    #[serde(default)]
    pub prompt: Option<Value>,
}

/// Why a request carries no usable prompt.
#[derive(Debug, PartialEq, Eq)]
pub enum PromptError {
    Missing,
    NotAString,
}

impl CompletionRequest {
    pub fn into_prompt(self) -> Result<String, PromptError> {
        match self.prompt {
            Some(Value::String(s)) if !s.is_empty() => Ok(s),
            None | Some(Value::Null) | Some(Value::Bool(false)) => Err(PromptError::Missing),
            Some(Value::String(_)) => Err(PromptError::Missing),
            Some(Value::Number(n)) if n.as_f64() == Some(0.0) => Err(PromptError::Missing),
            Some(_) => Err(PromptError::NotAString),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    pub completion: Content,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub count: usize,
    pub history: Vec<HistoryEntry>,
}
