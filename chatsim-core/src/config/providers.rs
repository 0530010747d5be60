//! Per-provider endpoint configuration loaded from environment variables.
//!
//! Values are read once at startup and never mutated. Missing values are
//! not an error here: an absent key means no `Authorization` header, an
//! absent URL fails at call time.

use std::env;

use crate::message::ProviderKind;

const DEFAULT_CLAUDE_URL: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_GEMINI_URL: &str =
    "https://generativelanguage.googleapis.com/v1/models/gemini-pro:generateContent";

/// Endpoint, credentials and model for one backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Full URL the request is POSTed to
    pub endpoint: String,

    /// Bearer token (env: *_API_KEY)
    pub api_key: Option<String>,

    /// Model used for conversation generation
    pub model: String,

    /// Model used for character resolution, when it differs from `model`
    pub resolver_model: Option<String>,
}

impl ProviderConfig {
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Model to use for character resolution.
    pub fn resolver_model(&self) -> &str {
        self.resolver_model.as_deref().unwrap_or(&self.model)
    }
}

/// Configuration for all three providers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvidersConfig {
    /// DEEPSEEK_URL, DEEPSEEK_API_KEY, DEEPSEEK_R1_MODEL, DEEPSEEK_V3_MODEL
    pub primary: ProviderConfig,
    /// CLAUDE_URL, CLAUDE_API_KEY, CLAUDE_MODEL
    pub secondary: ProviderConfig,
    /// GEMINI_URL, GEMINI_API_KEY, GEMINI_MODEL
    pub tertiary: ProviderConfig,
}

impl ProvidersConfig {
    /// Load provider configuration from environment variables.
    ///
    /// Also loads a .env file if present (development convenience).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            primary: ProviderConfig {
                endpoint: var("DEEPSEEK_URL").unwrap_or_default(),
                api_key: var("DEEPSEEK_API_KEY"),
                model: var("DEEPSEEK_R1_MODEL").unwrap_or_default(),
                resolver_model: var("DEEPSEEK_V3_MODEL"),
            },
            secondary: ProviderConfig {
                endpoint: var("CLAUDE_URL").unwrap_or_else(|| DEFAULT_CLAUDE_URL.to_string()),
                api_key: var("CLAUDE_API_KEY"),
                model: var("CLAUDE_MODEL").unwrap_or_default(),
                resolver_model: None,
            },
            tertiary: ProviderConfig {
                endpoint: var("GEMINI_URL").unwrap_or_else(|| DEFAULT_GEMINI_URL.to_string()),
                api_key: var("GEMINI_API_KEY"),
                model: var("GEMINI_MODEL").unwrap_or_default(),
                resolver_model: None,
            },
        }
    }

    pub fn get(&self, kind: ProviderKind) -> &ProviderConfig {
        match kind {
            ProviderKind::Primary => &self.primary,
            ProviderKind::Secondary => &self.secondary,
            ProviderKind::Tertiary => &self.tertiary,
        }
    }

    /// Providers that have no API key configured.
    pub fn missing_api_keys(&self) -> Vec<ProviderKind> {
        ProviderKind::ALL
            .into_iter()
            .filter(|kind| !self.get(*kind).has_api_key())
            .collect()
    }
}
