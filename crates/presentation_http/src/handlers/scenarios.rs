//! Scenario list handler

use axum::{Json, extract::State};
use domain::Scenario;
use serde::Serialize;

use crate::{error::ApiError, middleware::CurrentSession, state::AppState};

#[derive(Debug, Serialize)]
pub struct ScenarioSummary {
    pub id: String,
    pub title: String,
    pub description: String,
}

impl From<Scenario> for ScenarioSummary {
    fn from(scenario: Scenario) -> Self {
        Self {
            id: scenario.id,
            title: scenario.title,
            description: scenario.description,
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    _current: CurrentSession,
) -> Result<Json<Vec<ScenarioSummary>>, ApiError> {
    let scenarios = state.scenarios.list().await?;
    Ok(Json(scenarios.into_iter().map(Into::into).collect()))
}
