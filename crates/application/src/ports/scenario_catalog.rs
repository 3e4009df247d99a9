//! Scenario catalog port

use async_trait::async_trait;
use domain::Scenario;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for the available roleplay scenarios
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ScenarioCatalog: Send + Sync {
    /// All scenarios ordered by title
    async fn list(&self) -> Result<Vec<Scenario>, ApplicationError>;

    /// Look up a scenario by id
    async fn get(&self, id: &str) -> Result<Option<Scenario>, ApplicationError>;
}
