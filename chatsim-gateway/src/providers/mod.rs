pub mod claude;
pub mod deepseek;
pub mod gemini;
pub mod http;
pub mod provider;
pub mod query_dump;

pub use provider::{
    CharacterResolver, ChatMessage, ChatRole, Provider, ProviderError, parse_character_infos,
    parse_turns, resolve_with,
};
