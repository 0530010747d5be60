use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Conversation-generation backends that can be selected per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// DeepSeek-style OpenAI-compatible endpoint. Also the resolver.
    #[default]
    Primary,
    /// Claude endpoint.
    Secondary,
    /// Gemini endpoint.
    Tertiary,
}

/// The single backend that resolves character info, whichever provider
/// generates the conversation afterwards.
pub const RESOLVER_PROVIDER: ProviderKind = ProviderKind::Primary;

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::Primary,
        ProviderKind::Secondary,
        ProviderKind::Tertiary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Primary => "primary",
            ProviderKind::Secondary => "secondary",
            ProviderKind::Tertiary => "tertiary",
        }
    }

    /// Lenient selector used on the request path.
    ///
    /// Anything that is not a known provider name or alias selects
    /// [`ProviderKind::Primary`].
    pub fn select(name: &str) -> Self {
        name.parse().unwrap_or_default()
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "primary" | "deepseek" | "deepseek-r1" => Ok(ProviderKind::Primary),
            "secondary" | "claude" => Ok(ProviderKind::Secondary),
            "tertiary" | "gemini" => Ok(ProviderKind::Tertiary),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// A named entity to include in the simulated chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
}

impl Character {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Biographical summary resolved for one [`Character`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterInfo {
    pub name: String,
    pub description: String,
    /// Well-known episodes and running jokes.
    #[serde(default)]
    pub story: Vec<String>,
}

/// Literal the resolver returns in place of an info object when it has no
/// record of a character.
pub const UNKNOWN_SENTINEL: &str = "UNKNOWN";

/// One turn as emitted by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub name: String,
    pub content: String,
}

/// A turn annotated with its position and generation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub name: String,
    pub content: String,
    /// ISO-8601, millisecond precision, UTC.
    pub timestamp: String,
}

impl Message {
    pub fn from_turn(position: usize, turn: ConversationTurn, at: DateTime<Utc>) -> Self {
        Self {
            id: position.to_string(),
            name: turn.name,
            content: turn.content,
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// A generated conversation, owned by the request that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub messages: Vec<Message>,
}

impl Conversation {
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Inbound request body for conversation generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub characters: Vec<Character>,
    /// Minimum number of turns to ask for. Falls back to the configured
    /// default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rounds: Option<u32>,
    /// Provider selector; unknown values select the primary provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl GenerateRequest {
    pub fn provider(&self) -> ProviderKind {
        self.model
            .as_deref()
            .map(ProviderKind::select)
            .unwrap_or_default()
    }
}

/// Error body returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
