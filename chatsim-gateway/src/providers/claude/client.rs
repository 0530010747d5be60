//! Claude client.
//!
//! The request is chat-completions shaped with a bearer token. The reply is
//! read from either the chat-completions envelope or the native Messages
//! API envelope.

use chatsim_core::{ProviderConfig, ProviderKind};
use serde::{Deserialize, Serialize};

use crate::providers::http::{
    ChatCompletionsResponse, CompletionEndpoint, decode_envelope, require_text,
};
use crate::providers::provider::{ChatMessage, Provider, ProviderError};

/// Claude API client
#[derive(Clone)]
pub struct ClaudeClient {
    endpoint: CompletionEndpoint,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

/// Either envelope a Claude endpoint may answer with
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClaudeEnvelope {
    Chat(ChatCompletionsResponse),
    Messages(MessagesResponse),
}

/// Native Messages API response
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

impl ClaudeEnvelope {
    fn into_first_text(self) -> Option<String> {
        match self {
            ClaudeEnvelope::Chat(response) => response.into_first_text(),
            ClaudeEnvelope::Messages(response) => {
                response.content.into_iter().find_map(|block| match block {
                    ContentBlock::Text { text } => Some(text),
                    ContentBlock::Other => None,
                })
            }
        }
    }
}

impl ClaudeClient {
    pub fn new(
        config: &ProviderConfig,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            endpoint: CompletionEndpoint::new(ProviderKind::Secondary, config)?,
            model: config.model.clone(),
            temperature,
            max_tokens,
        })
    }

    /// Enable or disable debug query logging
    pub fn with_dump_queries(mut self, enabled: bool) -> Self {
        self.endpoint = self.endpoint.with_dump_queries(enabled);
        self
    }
}

#[async_trait::async_trait]
impl Provider for ClaudeClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Secondary
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<String, ProviderError> {
        let body = ClaudeRequest {
            model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        let response_text = self.endpoint.post(model, &body).await?;

        let envelope: ClaudeEnvelope = decode_envelope(self.kind(), &response_text)?;
        require_text(self.kind(), envelope.into_first_text())
    }
}
