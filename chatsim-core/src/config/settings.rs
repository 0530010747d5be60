//! Settings configuration loaded from TOML files.
//!
//! This module handles non-sensitive configuration stored in TOML format
//! in the XDG config directory (~/.config/chatsim/config.toml).

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default TOML configuration file content
const DEFAULT_CONFIG_TOML: &str = r#"# chatsim configuration file
# Located at: ~/.config/chatsim/config.toml
#
# This file contains non-sensitive configuration.
# Provider endpoints, models and keys are loaded from environment variables:
#   - DEEPSEEK_URL, DEEPSEEK_API_KEY, DEEPSEEK_V3_MODEL, DEEPSEEK_R1_MODEL
#   - CLAUDE_URL, CLAUDE_API_KEY, CLAUDE_MODEL
#   - GEMINI_URL, GEMINI_API_KEY, GEMINI_MODEL

# Language of user-facing error messages ("zh" or "en")
language = "zh"

[gateway]
host = "127.0.0.1"
port = 3000

[logging]
level = "info"
# dump_queries = true

[generation]
default_rounds = 10
temperature = 0.7
max_tokens = 4096
min_characters = 2
max_characters = 4
"#;

/// Language of the prompts sent upstream and of messages shown to end users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Zh,
    En,
}

/// Settings loaded from TOML configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    /// Language of user-facing error messages
    #[serde(default)]
    pub language: Language,

    /// Gateway server configuration
    #[serde(default)]
    pub gateway: GatewaySettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Generation request parameters
    #[serde(default)]
    pub generation: GenerationSettings,
}

/// Gateway server settings
#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySettings {
    /// Host to bind to
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_gateway_port")]
    pub port: u16,
}

/// Logging settings
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Dump raw LLM request/response JSON to ./logs/queries/
    #[serde(default)]
    pub dump_queries: bool,
}

/// Parameters applied to every generation request
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationSettings {
    /// Rounds requested when the caller does not specify any
    #[serde(default = "default_rounds")]
    pub default_rounds: u32,

    /// Sampling temperature sent to every provider
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Output token cap for providers that accept one
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Fewest characters accepted in one request
    #[serde(default = "default_min_characters")]
    pub min_characters: usize,

    /// Most characters accepted in one request
    #[serde(default = "default_max_characters")]
    pub max_characters: usize,
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_rounds() -> u32 {
    10
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_min_characters() -> usize {
    2
}

fn default_max_characters() -> usize {
    4
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dump_queries: false,
        }
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            default_rounds: default_rounds(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            min_characters: default_min_characters(),
            max_characters: default_max_characters(),
        }
    }
}

/// Errors that can occur when loading settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config directory not found")]
    ConfigDirNotFound,
}

impl Settings {
    /// Load settings from the TOML configuration file.
    ///
    /// If the config file doesn't exist, creates it with default values.
    pub fn load() -> Result<Self, SettingsError> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load settings from a specific path, creating the default file first
    /// when it is missing.
    pub fn load_from_path(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            tracing::info!("Creating default configuration at {:?}", path);
            Self::create_default_config(path)?;
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse settings from TOML content.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(content)?;
        Ok(settings)
    }

    /// Get the configuration file path.
    ///
    /// Uses `$CHATSIM_CONFIG_DIR/config.toml` when set, otherwise the XDG
    /// config directory: `~/.config/chatsim/config.toml`
    pub fn config_path() -> Result<PathBuf, SettingsError> {
        if let Ok(override_dir) = std::env::var("CHATSIM_CONFIG_DIR") {
            let dir = PathBuf::from(override_dir);
            return Ok(dir.join("config.toml"));
        }

        let config_dir = dirs::config_dir()
            .ok_or(SettingsError::ConfigDirNotFound)?
            .join("chatsim");

        Ok(config_dir.join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, DEFAULT_CONFIG_TOML)?;

        Ok(())
    }

    /// Get the HTTP bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.gateway.host, self.gateway.port)
    }
}
