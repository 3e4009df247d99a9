//! Scenario catalog backed by a directory of JSON files
//!
//! Each `<id>.json` holds one scenario; the file stem is its id. Files
//! are read on every call so edits show up without a restart.

use std::path::{Path, PathBuf};

use application::{error::ApplicationError, ports::ScenarioCatalog};
use async_trait::async_trait;
use domain::Scenario;
use tracing::{debug, instrument, warn};

/// Reads scenarios from `*.json` files in one directory
#[derive(Debug, Clone)]
pub struct FileScenarioCatalog {
    dir: PathBuf,
}

impl FileScenarioCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Ids are plain file stems; anything that could leave the directory is refused
    fn is_valid_id(id: &str) -> bool {
        !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
    }

    async fn load(path: &Path, id: &str) -> Result<Scenario, ApplicationError> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            ApplicationError::Internal(format!("cannot read {}: {e}", path.display()))
        })?;
        let mut scenario: Scenario = serde_json::from_str(&raw).map_err(|e| {
            ApplicationError::Internal(format!("invalid scenario {}: {e}", path.display()))
        })?;
        scenario.id = id.to_string();
        Ok(scenario)
    }
}

#[async_trait]
impl ScenarioCatalog for FileScenarioCatalog {
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    async fn list(&self) -> Result<Vec<Scenario>, ApplicationError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Scenario directory does not exist");
                return Ok(Vec::new());
            },
            Err(e) => {
                return Err(ApplicationError::Internal(format!(
                    "cannot read scenario directory: {e}"
                )));
            },
        };

        let mut scenarios = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ApplicationError::Internal(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            match Self::load(&path, id).await {
                Ok(scenario) => scenarios.push(scenario),
                Err(e) => warn!(error = %e, "Skipping scenario file"),
            }
        }

        scenarios.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
        debug!(count = scenarios.len(), "Scenarios loaded");
        Ok(scenarios)
    }

    #[instrument(skip(self))]
    async fn get(&self, id: &str) -> Result<Option<Scenario>, ApplicationError> {
        if !Self::is_valid_id(id) {
            return Ok(None);
        }

        let path = self.dir.join(format!("{id}.json"));
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(None);
        }

        Self::load(&path, id).await.map(Some)
    }
}
