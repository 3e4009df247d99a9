//! Async database connection using sqlx
//!
//! The pool goes through sqlx's `Any` driver so the same stores run on
//! SQLite (the default) and PostgreSQL. Migrations live in the workspace
//! `migrations/` directory and only use SQL both backends accept.

use std::{fmt, path::Path, sync::Once};

use sqlx::{
    AnyPool,
    any::{AnyPoolOptions, install_default_drivers},
};
use tracing::{debug, info, instrument};

static DRIVERS: Once = Once::new();

/// Error type for async database operations
#[derive(Debug, thiserror::Error)]
pub enum AsyncDatabaseError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Database engine behind a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackend {
    Sqlite,
    Postgres,
}

impl DatabaseBackend {
    /// Detect the backend from the URL scheme
    ///
    /// # Errors
    ///
    /// Fails for schemes neither driver understands.
    pub fn from_url(url: &str) -> Result<Self, AsyncDatabaseError> {
        let scheme = url.split(':').next().unwrap_or_default().to_lowercase();
        match scheme.as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(AsyncDatabaseError::Config(format!(
                "unsupported database scheme: {other}"
            ))),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
        }
    }
}

impl fmt::Display for DatabaseBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for async database connection
#[derive(Debug, Clone)]
pub struct AsyncDatabaseConfig {
    /// Database URL (e.g. "sqlite:data/app.db?mode=rwc" or "postgres://...")
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to keep open
    pub min_connections: u32,
    /// Enable WAL mode for file-backed SQLite
    pub wal_mode: bool,
}

impl Default for AsyncDatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:data/app.db?mode=rwc".to_string(),
            max_connections: 5,
            min_connections: 1,
            wal_mode: true,
        }
    }
}

impl AsyncDatabaseConfig {
    /// Create an in-memory database configuration for testing
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            // every in-memory connection is its own database
            max_connections: 1,
            min_connections: 1,
            wal_mode: false,
        }
    }

    /// Create a configuration for an already resolved URL
    #[must_use]
    pub fn with_url(url: impl Into<String>, max_connections: u32) -> Self {
        Self {
            url: url.into(),
            max_connections,
            ..Default::default()
        }
    }

    fn is_memory(&self) -> bool {
        self.url.contains(":memory:")
    }

    /// File path of a SQLite URL, without query parameters
    fn sqlite_file(&self) -> Option<&Path> {
        if self.is_memory() {
            return None;
        }
        let rest = self
            .url
            .strip_prefix("sqlite://")
            .or_else(|| self.url.strip_prefix("sqlite:"))?;
        let path = rest.split('?').next().unwrap_or_default();
        (!path.is_empty()).then(|| Path::new(path))
    }
}

/// Async database connection pool
#[derive(Debug, Clone)]
pub struct AsyncDatabase {
    pool: AnyPool,
    backend: DatabaseBackend,
}

impl AsyncDatabase {
    /// Create a new async database connection pool
    #[instrument(skip_all, fields(backend = tracing::field::Empty))]
    pub async fn new(config: &AsyncDatabaseConfig) -> Result<Self, AsyncDatabaseError> {
        DRIVERS.call_once(install_default_drivers);

        let backend = DatabaseBackend::from_url(&config.url)?;
        tracing::Span::current().record("backend", backend.as_str());

        let parent = config
            .sqlite_file()
            .and_then(Path::parent)
            .filter(|p| !p.as_os_str().is_empty());
        if let Some(parent) = parent {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AsyncDatabaseError::Config(format!(
                    "cannot create database directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let mut options = AnyPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections);
        if config.is_memory() {
            // dropping the last connection would drop the database
            options = options.idle_timeout(None).max_lifetime(None);
        }

        let pool = options.connect(&config.url).await?;

        if backend == DatabaseBackend::Sqlite && config.wal_mode && !config.is_memory() {
            sqlx::query("PRAGMA journal_mode=WAL")
                .execute(&pool)
                .await?;
            debug!("WAL mode enabled");
        }

        info!(
            max_connections = config.max_connections,
            "Async database pool created"
        );

        Ok(Self { pool, backend })
    }

    /// Create an in-memory database for testing
    pub async fn in_memory() -> Result<Self, AsyncDatabaseError> {
        Self::new(&AsyncDatabaseConfig::in_memory()).await
    }

    /// Get the underlying pool for raw queries
    #[must_use]
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    #[must_use]
    pub const fn backend(&self) -> DatabaseBackend {
        self.backend
    }

    /// Run database migrations using the workspace migration SQL files
    #[instrument(skip(self))]
    pub async fn migrate(&self) -> Result<(), AsyncDatabaseError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Close all connections in the pool
    pub async fn close(&self) {
        self.pool.close().await;
        debug!("Database pool closed");
    }
}
