//! Ollama chat API client.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use triage_config::OllamaConfig;
use triage_core::{AgentError, Message, MessageRole};

use crate::{AgentResponse, CompletionAgent, Usage};

#[derive(Serialize)]
struct OllamaMessage {
    role: MessageRole,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage>,
    stream: bool,
}

#[derive(Deserialize)]
struct ResponseMessage {
    role: MessageRole,
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
    prompt_eval_count: Option<u32>,
    eval_count: Option<u32>,
}

/// Agent backed by an Ollama server's `/api/chat` endpoint.
pub struct OllamaAgent {
    client: Client,
    model: String,
    base_url: String,
    system_prompt: String,
}

impl OllamaAgent {
    /// Creates a new agent. The underlying HTTP client is reused across calls.
    pub fn new(config: &OllamaConfig) -> Result<Self, AgentError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| AgentError::Http(e.to_string()))?;

        info!(
            "OllamaAgent: model={}, base_url={}",
            config.model, config.base_url
        );

        Ok(Self {
            client,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            system_prompt: config.system_prompt.clone(),
        })
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }
}

#[async_trait]
impl CompletionAgent for OllamaAgent {
    fn model(&self) -> &str {
        &self.model
    }

    async fn invoke(&self, messages: Vec<Message>) -> Result<AgentResponse, AgentError> {
        let start = Instant::now();

        let system = (!self.system_prompt.is_empty())
            .then(|| Message::system(self.system_prompt.as_str()));
        let wire = system
            .iter()
            .chain(messages.iter())
            .map(|m| OllamaMessage {
                role: m.role,
                content: m.content.text(),
            })
            .collect();

        let request = ChatRequest {
            model: &self.model,
            messages: wire,
            stream: false,
        };

        let response = self
            .client
            .post(self.chat_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Backend { status, body });
        }

        let resp: ChatResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Parse(e.to_string()))?;

        let usage = Usage {
            input_tokens: resp.prompt_eval_count.unwrap_or(0),
            output_tokens: resp.eval_count.unwrap_or(0),
            elapsed_ms: start.elapsed().as_millis() as u64,
        };
        debug!(
            model = %self.model,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            elapsed_ms = usage.elapsed_ms,
            "ollama chat completed"
        );

        let mut conversation = messages;
        conversation.push(Message {
            role: resp.message.role,
            content: resp.message.content.into(),
        });

        Ok(AgentResponse {
            messages: conversation,
            usage: Some(usage),
        })
    }
}
