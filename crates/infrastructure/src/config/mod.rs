//! Application configuration
//!
//! Split into focused sub-modules:
//! - `server`: HTTP server settings
//! - `database`: connection URL resolution and pool size
//! - `directory`: staff email domain and role overrides
//! - `session`: idle timeout and purge interval
//! - `bootstrap`: the first-start developer account
//! - `scenarios`: scenario directory and base prompt

mod bootstrap;
mod database;
mod directory;
mod scenarios;
mod server;
mod session;

use ai_core::InferenceConfig;
use ai_speech::{SpeechConfig, TranscriptionConfig};
use application::HealthConfig;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

pub use bootstrap::BootstrapConfig;
pub use database::{DEFAULT_DATABASE_URL, DEFAULT_POSTGRES_DB, DatabaseConfig};
pub use directory::{DirectoryConfig, EMAIL_DOMAIN_VAR, ROLE_OVERRIDES_VAR};
pub use scenarios::ScenarioConfig;
pub use server::ServerConfig;
pub use session::SessionConfig;

/// Prefix of configuration environment variables
pub const ENV_PREFIX: &str = "APHASIA";

/// Shared default for boolean `true` fields across config structs
pub(crate) const fn default_true() -> bool {
    true
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    /// Directory (SSO) sign-in policy
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// Language model configuration
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Realtime transcription service
    #[serde(default)]
    pub transcription: TranscriptionConfig,

    /// Read-aloud placeholder
    #[serde(default)]
    pub speech: SpeechConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub bootstrap: BootstrapConfig,

    #[serde(default)]
    pub scenarios: ScenarioConfig,

    /// Health check timeouts
    #[serde(default)]
    pub health: HealthConfig,
}

impl AppConfig {
    /// Load configuration from defaults, an optional `config.toml` and the environment
    ///
    /// Nested keys use a double underscore, e.g. `APHASIA__SERVER__PORT=8080`.
    /// The staff directory variables are applied last.
    ///
    /// # Errors
    ///
    /// Returns an error when a source cannot be parsed into `AppConfig`.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;
        config.directory = config.directory.from_env();
        Ok(config)
    }

    /// Connection URL after applying the environment aliases
    pub fn database_url(&self) -> String {
        self.database.resolve_url_from_env()
    }

    /// Settings that are insecure outside local development
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.bootstrap.enabled
            && self.bootstrap.password.expose_secret()
                == application::DEFAULT_BOOTSTRAP_PASSWORD
        {
            warnings.push(format!(
                "bootstrap account '{}' uses the default password; change it after first login",
                self.bootstrap.username
            ));
        }
        if self
            .directory
            .email_domain
            .as_deref()
            .is_none_or(|d| d.trim().is_empty())
        {
            warnings.push("no staff email domain configured; every directory domain is accepted".to_string());
        }
        if self.server.auth_rate_limit_rpm == 0 {
            warnings.push("sign-in rate limiting is disabled".to_string());
        }
        if self.server.cors_enabled && self.server.allowed_origins.is_empty() {
            warnings.push("CORS allows every origin".to_string());
        }

        warnings
    }
}
