//! Infrastructure layer - Adapters for external systems
//!
//! Implements ports defined in the application layer: sqlx persistence,
//! argon2 hashing, the in-memory session map, the Ollama and transcription
//! HTTP clients, and the scenario files. Also owns configuration loading.

pub mod adapters;
pub mod config;
pub mod persistence;

pub use adapters::*;
pub use config::{
    AppConfig, BootstrapConfig, DatabaseConfig, DirectoryConfig, ScenarioConfig, ServerConfig,
    SessionConfig,
};
pub use persistence::{
    AsyncDatabase, AsyncDatabaseConfig, AsyncDatabaseError, DatabaseBackend, SqlxActivityLog,
    SqlxDatabaseHealth, SqlxUserStore,
};
