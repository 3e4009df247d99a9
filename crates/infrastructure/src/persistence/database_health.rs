//! Database health adapter
//!
//! Implements the `DatabaseHealthPort` on top of the sqlx pool.

use application::error::ApplicationError;
use application::ports::{DatabaseHealth, DatabaseHealthPort};
use async_trait::async_trait;
use sqlx::AnyPool;
use tracing::{debug, instrument};

use super::async_connection::{AsyncDatabase, DatabaseBackend};

/// Database health adapter
#[derive(Debug, Clone)]
pub struct SqlxDatabaseHealth {
    pool: AnyPool,
    backend: DatabaseBackend,
}

impl SqlxDatabaseHealth {
    #[must_use]
    pub fn new(database: &AsyncDatabase) -> Self {
        Self {
            pool: database.pool().clone(),
            backend: database.backend(),
        }
    }

    const fn version_query(&self) -> &'static str {
        match self.backend {
            DatabaseBackend::Sqlite => "SELECT sqlite_version()",
            DatabaseBackend::Postgres => "SHOW server_version",
        }
    }
}

#[async_trait]
impl DatabaseHealthPort for SqlxDatabaseHealth {
    #[instrument(skip(self))]
    async fn check_health(&self) -> Result<DatabaseHealth, ApplicationError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| ApplicationError::Internal(format!("Health check query failed: {e}")))?;

        // Version is informational only
        let version: Option<String> = sqlx::query_scalar(self.version_query())
            .fetch_one(&self.pool)
            .await
            .ok();

        debug!(backend = self.backend.as_str(), version = ?version, "Database health check passed");
        Ok(DatabaseHealth::reachable(self.backend.as_str(), version.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn check_health_reports_backend_and_version() {
        let db = AsyncDatabase::in_memory().await.unwrap();
        let result = SqlxDatabaseHealth::new(&db).check_health().await.unwrap();

        assert!(result.reachable);
        assert!(result.description.is_some_and(|d| d.starts_with("sqlite 3")));
    }

    #[tokio::test]
    async fn closed_pool_is_an_error() {
        let db = AsyncDatabase::in_memory().await.unwrap();
        let health = SqlxDatabaseHealth::new(&db);
        db.close().await;

        assert!(health.check_health().await.is_err());
    }
}
