pub mod config;
pub mod locale;
pub mod message;

pub use config::{
    Config, ConfigError, GatewaySettings, GenerationSettings, Language, LoggingSettings,
    ProviderConfig, ProvidersConfig, Settings, SettingsError, load_dotenv,
};
pub use message::{
    Character, CharacterInfo, Conversation, ConversationTurn, ErrorResponse, GenerateRequest,
    Message, ProviderKind, RESOLVER_PROVIDER, UNKNOWN_SENTINEL,
};
