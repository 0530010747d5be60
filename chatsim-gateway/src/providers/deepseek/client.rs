//! DeepSeek chat completions client.

use chatsim_core::{Character, CharacterInfo, Language, ProviderConfig, ProviderKind};
use serde::Serialize;
use tracing::info;

use crate::providers::http::{
    ChatCompletionsResponse, CompletionEndpoint, decode_envelope, require_text,
};
use crate::providers::provider::{
    CharacterResolver, ChatMessage, Provider, ProviderError, resolve_with,
};

/// DeepSeek API client.
///
/// Generates conversations with its conversation model and resolves
/// characters with its resolver model.
#[derive(Clone)]
pub struct DeepSeekClient {
    endpoint: CompletionEndpoint,
    model: String,
    resolver_model: String,
    temperature: f32,
}

/// Request body for the Chat Completions API
#[derive(Debug, Serialize)]
struct ChatCompletionsRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

impl DeepSeekClient {
    pub fn new(config: &ProviderConfig, temperature: f32) -> Result<Self, ProviderError> {
        Ok(Self {
            endpoint: CompletionEndpoint::new(ProviderKind::Primary, config)?,
            model: config.model.clone(),
            resolver_model: config.resolver_model().to_string(),
            temperature,
        })
    }

    /// Enable or disable debug query logging
    pub fn with_dump_queries(mut self, enabled: bool) -> Self {
        self.endpoint = self.endpoint.with_dump_queries(enabled);
        self
    }

    pub fn resolver_model(&self) -> &str {
        &self.resolver_model
    }

    fn request_body<'a>(
        &self,
        model: &'a str,
        messages: &'a [ChatMessage],
    ) -> ChatCompletionsRequest<'a> {
        ChatCompletionsRequest {
            model,
            messages,
            temperature: self.temperature,
        }
    }
}

#[async_trait::async_trait]
impl Provider for DeepSeekClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Primary
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<String, ProviderError> {
        let body = self.request_body(model, messages);
        let response_text = self.endpoint.post(model, &body).await?;

        let response: ChatCompletionsResponse = decode_envelope(self.kind(), &response_text)?;
        require_text(self.kind(), response.into_first_text())
    }
}

#[async_trait::async_trait]
impl CharacterResolver for DeepSeekClient {
    async fn resolve_characters(
        &self,
        characters: &[Character],
        language: Language,
    ) -> Result<Vec<CharacterInfo>, ProviderError> {
        info!(
            count = characters.len(),
            model = %self.resolver_model,
            "Resolving character info"
        );

        resolve_with(self, &self.resolver_model, characters, language).await
    }
}
