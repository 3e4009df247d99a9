//! Roster handlers for staff

use application::{NewPatient, ProgressReport};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use domain::{AuthMethod, Role, User};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{error::ApiError, middleware::CurrentSession, state::AppState};

/// A user record as shown to staff; never includes the password hash
#[derive(Debug, Serialize)]
pub struct UserView {
    pub username: String,
    pub display_name: String,
    pub role: Role,
    pub auth_method: AuthMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub therapist: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            username: user.username().to_string(),
            display_name: user.display_name().to_string(),
            role: user.role(),
            auth_method: user.auth_method(),
            therapist: user.therapist().map(ToString::to_string),
            created_at: user.created_at(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePatientRequest {
    pub username: String,
    pub password: SecretString,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Ignored for therapists, whose patients are linked to themselves
    #[serde(default)]
    pub therapist: Option<String>,
}

fn views(users: Vec<User>) -> Json<Vec<UserView>> {
    Json(users.into_iter().map(UserView::from).collect())
}

pub async fn users(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Vec<UserView>>, ApiError> {
    Ok(views(state.roster.list_users(&session).await?))
}

pub async fn therapists(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Vec<UserView>>, ApiError> {
    Ok(views(state.roster.therapists(&session).await?))
}

pub async fn patients(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(therapist): Path<String>,
) -> Result<Json<Vec<UserView>>, ApiError> {
    Ok(views(state.roster.patients_for(&session, &therapist).await?))
}

/// Open a patient account; the patient signs in with the given password
#[instrument(skip_all, fields(caller = %session.username(), username = %request.username))]
pub async fn create_patient(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(request): Json<CreatePatientRequest>,
) -> Result<(StatusCode, Json<UserView>), ApiError> {
    let user = state
        .roster
        .create_patient(
            &session,
            NewPatient {
                username: request.username,
                password: request.password,
                display_name: request.display_name,
                therapist: request.therapist,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn activity(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(username): Path<String>,
) -> Result<Json<ProgressReport>, ApiError> {
    Ok(Json(state.roster.progress(&session, &username).await?))
}
