//! Core domain types and error definitions for triage.
//!
//! This crate provides the types shared across the triage workspace:
//!
//! - [`AgentError`] — Error type for completion agent operations
//! - [`Message`] and [`MessageRole`] — Conversation message types
//! - [`Content`] and [`ContentBlock`] — Generated output, either plain text or typed blocks
//! - [`HistoryEntry`] — A recorded conversation turn
//!
//! # Example
//!
//! ```rust
//! use triage_core::{Content, Message, MessageRole};
//!
//! let msg = Message::user("why did the checkout service crash?");
//! assert_eq!(msg.role, MessageRole::User);
//! assert_eq!(msg.content, Content::Text("why did the checkout service crash?".into()));
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while invoking a completion agent.
#[derive(Error, Debug)]
pub enum AgentError {
    /// The backend could not be reached or the transport failed.
    #[error("backend request failed: {0}")]
    Http(String),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {body}")]
    Backend { status: u16, body: String },

    /// The backend response could not be decoded.
    #[error("failed to parse backend response: {0}")]
    Parse(String),

    /// The agent produced no messages.
    #[error("agent returned no messages")]
    EmptyResponse,
}

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Instructions prepended by the agent.
    System,
    /// Message from the user.
    User,
    /// Message from the assistant/LLM.
    Assistant,
    /// Output of a tool invocation.
    Tool,
}

/// A discrete unit of generated output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// A text segment.
    Text { text: String },
    /// An image reference.
    ImageUrl { image_url: String },
    /// A request by the model to call a tool.
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    /// Any block kind this service does not model.
    #[serde(other)]
    Unsupported,
}

/// Message content: either a plain string or an ordered list of blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl Content {
    /// Concatenates every text segment, ignoring non-text blocks.
    pub fn text(&self) -> String {
        match self {
            Content::Text(s) => s.clone(),
            Content::Blocks(blocks) => blocks
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect(),
        }
    }
}

impl From<String> for Content {
    fn from(s: String) -> Self {
        Content::Text(s)
    }
}

impl From<&str> for Content {
    fn from(s: &str) -> Self {
        Content::Text(s.to_string())
    }
}

/// A single message exchanged with the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender.
    pub role: MessageRole,
    /// The content of the message.
    pub content: Content,
}

impl Message {
    /// Creates a new system message.
    pub fn system(content: impl Into<Content>) -> Self {
        Self { role: MessageRole::System, content: content.into() }
    }

    /// Creates a new user message.
    pub fn user(content: impl Into<Content>) -> Self {
        Self { role: MessageRole::User, content: content.into() }
    }

    /// Creates a new assistant message.
    pub fn assistant(content: impl Into<Content>) -> Self {
        Self { role: MessageRole::Assistant, content: content.into() }
    }
}

/// A recorded turn in the conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: MessageRole,
    pub content: Content,
}

impl From<Message> for HistoryEntry {
    fn from(msg: Message) -> Self {
        Self { role: msg.role, content: msg.content }
    }
}
