//! Database readiness port

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// What the database answered to a readiness probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseHealth {
    pub reachable: bool,
    /// Backend and server version, e.g. `sqlite 3.45.1`
    pub description: Option<String>,
}

impl DatabaseHealth {
    /// The probe query succeeded on `backend`
    #[must_use]
    pub fn reachable(backend: &str, version: Option<&str>) -> Self {
        let description = match version.map(str::trim).filter(|v| !v.is_empty()) {
            Some(version) => format!("{backend} {version}"),
            None => backend.to_string(),
        };
        Self {
            reachable: true,
            description: Some(description),
        }
    }

    #[must_use]
    pub const fn unreachable() -> Self {
        Self {
            reachable: false,
            description: None,
        }
    }
}

/// Readiness probe against the user database
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DatabaseHealthPort: Send + Sync {
    /// Run `SELECT 1` and report backend and version
    async fn check_health(&self) -> Result<DatabaseHealth, ApplicationError>;
}
