//! Configuration management for chatsim.
//!
//! Provider endpoints and credentials come from environment variables;
//! everything else comes from a TOML settings file.
//!
//! # Configuration Sources
//!
//! ## Providers (Environment Variables)
//! - `DEEPSEEK_URL`, `DEEPSEEK_API_KEY`, `DEEPSEEK_V3_MODEL`, `DEEPSEEK_R1_MODEL`
//! - `CLAUDE_URL`, `CLAUDE_API_KEY`, `CLAUDE_MODEL`
//! - `GEMINI_URL`, `GEMINI_API_KEY`, `GEMINI_MODEL`
//!
//! ## Settings (TOML File)
//! Located at `~/.config/chatsim/config.toml`:
//! ```toml
//! language = "zh"
//!
//! [gateway]
//! host = "127.0.0.1"
//! port = 3000
//!
//! [logging]
//! level = "info"
//!
//! [generation]
//! default_rounds = 10
//! ```

mod providers;
mod settings;

pub use providers::{ProviderConfig, ProvidersConfig};
pub use settings::{
    GatewaySettings, GenerationSettings, Language, LoggingSettings, Settings, SettingsError,
};

/// Combined configuration, built once at startup and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Provider endpoints loaded from environment variables
    pub providers: ProvidersConfig,
    /// Settings loaded from TOML configuration file
    pub settings: Settings,
}

/// Errors that can occur when loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Provider values are not validated: a missing key or URL surfaces as
    /// an upstream failure when that provider is called.
    pub fn load() -> Result<Self, ConfigError> {
        let providers = ProvidersConfig::from_env();
        let settings = Settings::load()?;

        Ok(Self {
            providers,
            settings,
        })
    }

    /// Get the HTTP bind address.
    pub fn bind_addr(&self) -> String {
        self.settings.bind_addr()
    }

    pub fn language(&self) -> Language {
        self.settings.language
    }

    pub fn dump_queries(&self) -> bool {
        self.settings.logging.dump_queries
    }
}

/// Load .env file if it exists (for development convenience).
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}
