//! Completion agent abstraction for triage.
//!
//! An agent accepts an ordered list of [`Message`]s and returns an
//! [`AgentResponse`] holding the conversation it produced. The server only
//! ever looks at the final message.

mod ollama;

pub use ollama::OllamaAgent;

use async_trait::async_trait;
use triage_core::{AgentError, Content, Message};

/// Token accounting reported by the backend, when available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub elapsed_ms: u64,
}

/// Result of a single agent invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentResponse {
    /// Input messages followed by everything the agent generated.
    pub messages: Vec<Message>,
    pub usage: Option<Usage>,
}

impl AgentResponse {
    /// Takes ownership of the final message's content.
    pub fn into_last_content(mut self) -> Result<Content, AgentError> {
        self.messages
            .pop()
            .map(|m| m.content)
            .ok_or(AgentError::EmptyResponse)
    }
}

/// A handle to a language-model agent.
#[async_trait]
pub trait CompletionAgent: Send + Sync {
    /// Model identifier used for logging.
    fn model(&self) -> &str;

    async fn invoke(&self, messages: Vec<Message>) -> Result<AgentResponse, AgentError>;
}
