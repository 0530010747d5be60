//! Google Gemini client.

use chatsim_core::{ProviderConfig, ProviderKind};
use serde::{Deserialize, Serialize};

use crate::providers::http::{
    ChatCompletionsResponse, CompletionEndpoint, decode_envelope, require_text,
};
use crate::providers::provider::{ChatMessage, Provider, ProviderError};

/// Gemini API client
#[derive(Clone)]
pub struct GeminiClient {
    endpoint: CompletionEndpoint,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GeminiEnvelope {
    Chat(ChatCompletionsResponse),
    GenerateContent(GenerateContentResponse),
}

/// Response from the generateContent API
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    /// Absent when generation stopped early, e.g. `finishReason: "SAFETY"`
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiEnvelope {
    fn into_first_text(self) -> Option<String> {
        match self {
            GeminiEnvelope::Chat(response) => response.into_first_text(),
            GeminiEnvelope::GenerateContent(response) => response
                .candidates
                .into_iter()
                .next()
                .and_then(|c| c.content.parts.into_iter().find_map(|p| p.text)),
        }
    }
}

impl GeminiClient {
    pub fn new(
        config: &ProviderConfig,
        temperature: f32,
        max_output_tokens: u32,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            endpoint: CompletionEndpoint::new(ProviderKind::Tertiary, config)?,
            model: config.model.clone(),
            temperature,
            max_output_tokens,
        })
    }

    /// Enable or disable debug query logging
    pub fn with_dump_queries(mut self, enabled: bool) -> Self {
        self.endpoint = self.endpoint.with_dump_queries(enabled);
        self
    }
}

#[async_trait::async_trait]
impl Provider for GeminiClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Tertiary
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<String, ProviderError> {
        let body = GeminiRequest {
            model,
            messages,
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
        };
        let response_text = self.endpoint.post(model, &body).await?;

        let envelope: GeminiEnvelope = decode_envelope(self.kind(), &response_text)?;
        require_text(self.kind(), envelope.into_first_text())
    }
}
