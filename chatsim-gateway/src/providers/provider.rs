//! Provider traits shared by every LLM backend.

use chatsim_core::{
    Character, CharacterInfo, ConversationTurn, Language, ProviderKind, UNKNOWN_SENTINEL,
};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::extract::{ExtractError, extract};
use crate::prompt::{self, SYSTEM_PERSONA};

/// Role of one message in the exchange sent upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
}

/// Message in the request body of every provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    /// The two-message exchange: fixed system persona, then the prompt.
    pub fn exchange(prompt: impl Into<String>) -> Vec<ChatMessage> {
        vec![
            ChatMessage {
                role: ChatRole::System,
                content: SYSTEM_PERSONA.to_string(),
            },
            ChatMessage {
                role: ChatRole::User,
                content: prompt.into(),
            },
        ]
    }
}

/// Provider error types
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("API request failed with status {status}")]
    UpstreamRequestFailed { status: u16, body: String },
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("No information found for character '{name}'")]
    CharacterNotFound { name: String },
}

impl From<ExtractError> for ProviderError {
    fn from(err: ExtractError) -> Self {
        ProviderError::MalformedResponse(err.to_string())
    }
}

/// Conversation generation, implemented by every backend.
#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Model used for conversation generation
    fn model(&self) -> &str;

    /// Send a chat exchange to `model` and return the first completion's text.
    async fn complete(&self, model: &str, messages: &[ChatMessage])
    -> Result<String, ProviderError>;

    /// Generate turns for the resolved characters.
    async fn generate_conversation(
        &self,
        infos: &[CharacterInfo],
        rounds: u32,
        language: Language,
    ) -> Result<Vec<ConversationTurn>, ProviderError> {
        let instruction = prompt::conversation_prompt(infos, rounds, language);
        let messages = ChatMessage::exchange(instruction);
        let text = self.complete(self.model(), &messages).await?;
        debug!(provider = %self.kind(), chars = text.len(), "conversation completion received");
        parse_turns(&text)
    }
}

/// Character-info resolution. Only the resolver provider implements this.
#[async_trait::async_trait]
pub trait CharacterResolver: Send + Sync {
    /// Resolve every character, preserving input order.
    async fn resolve_characters(
        &self,
        characters: &[Character],
        language: Language,
    ) -> Result<Vec<CharacterInfo>, ProviderError>;
}

/// Resolve `characters` through `provider`'s completion with `model`.
pub async fn resolve_with<P: Provider + ?Sized>(
    provider: &P,
    model: &str,
    characters: &[Character],
    language: Language,
) -> Result<Vec<CharacterInfo>, ProviderError> {
    let messages = ChatMessage::exchange(prompt::character_info_prompt(characters, language));
    let text = provider.complete(model, &messages).await?;
    debug!(provider = %provider.kind(), chars = text.len(), "resolver completion received");

    parse_character_infos(&text, characters)
}

/// Parse a conversation completion into turns.
pub fn parse_turns(text: &str) -> Result<Vec<ConversationTurn>, ProviderError> {
    let value = extract(text)?;
    serde_json::from_value(value).map_err(|e| {
        ProviderError::MalformedResponse(format!("expected an array of turns: {e}"))
    })
}

/// Parse a resolver completion, aligning entries with `characters` by
/// position.
///
/// An `"UNKNOWN"` entry fails with [`ProviderError::CharacterNotFound`]
/// naming the character at that position.
pub fn parse_character_infos(
    text: &str,
    characters: &[Character],
) -> Result<Vec<CharacterInfo>, ProviderError> {
    let Value::Array(entries) = extract(text)? else {
        return Err(ProviderError::MalformedResponse(
            "expected an array of character info".to_string(),
        ));
    };

    if let Some(position) = entries
        .iter()
        .position(|entry| entry.as_str() == Some(UNKNOWN_SENTINEL))
    {
        return match characters.get(position) {
            Some(character) => Err(ProviderError::CharacterNotFound {
                name: character.name.clone(),
            }),
            None => Err(ProviderError::MalformedResponse(format!(
                "unknown marker at position {position} but only {} characters were requested",
                characters.len()
            ))),
        };
    }

    if entries.len() != characters.len() {
        return Err(ProviderError::MalformedResponse(format!(
            "expected {} character entries, got {}",
            characters.len(),
            entries.len()
        )));
    }

    entries
        .into_iter()
        .map(|entry| {
            serde_json::from_value(entry).map_err(|e| {
                ProviderError::MalformedResponse(format!("invalid character info: {e}"))
            })
        })
        .collect()
}
