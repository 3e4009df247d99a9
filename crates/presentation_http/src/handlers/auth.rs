//! Sign-in, signup and session handlers

use application::{Credentials, PatientSignup};
use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use domain::{AuthMethod, Permission, Role, Session};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::{error::ApiError, middleware::CurrentSession, state::AppState};

/// What the client learns about its session
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub username: String,
    pub display_name: String,
    pub role: Role,
    pub auth_method: AuthMethod,
    pub permissions: Vec<Permission>,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            username: session.username().to_string(),
            display_name: session.display_name().to_string(),
            role: session.role(),
            auth_method: session.auth_method(),
            permissions: Permission::ALL
                .into_iter()
                .filter(|p| session.has_permission(*p))
                .collect(),
            created_at: session.created_at(),
            last_seen_at: session.last_seen_at(),
        }
    }
}

/// Bearer token plus session
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub session: SessionView,
}

impl From<Session> for LoginResponse {
    fn from(session: Session) -> Self {
        Self {
            token: session.id().to_string(),
            session: SessionView::from(&session),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: SecretString,
}

#[derive(Debug, Deserialize)]
pub struct DirectoryLoginRequest {
    pub email: String,
    #[serde(default)]
    pub requested_role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: SecretString,
    #[serde(default)]
    pub display_name: Option<String>,
    pub therapist: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: SecretString,
    pub new_password: SecretString,
}

/// Local username and password login
#[instrument(skip(state, request), fields(username = %request.username))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let session = state
        .sessions
        .authenticate(Credentials::Local {
            username: request.username,
            password: request.password,
        })
        .await?;

    Ok(Json(session.into()))
}

/// Staff login with an email asserted by the single-sign-on proxy
#[instrument(skip(state, request))]
pub async fn directory_login(
    State(state): State<AppState>,
    Json(request): Json<DirectoryLoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let session = state
        .sessions
        .authenticate(Credentials::Directory {
            email: request.email,
            requested_role: request.requested_role,
        })
        .await?;

    Ok(Json(session.into()))
}

/// Patient self-signup; the new account is signed in right away
#[instrument(skip(state, request), fields(username = %request.username, therapist = %request.therapist))]
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), ApiError> {
    let session = state
        .sessions
        .signup_patient(PatientSignup {
            username: request.username,
            password: request.password,
            display_name: request.display_name,
            therapist: request.therapist,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(session.into())))
}

pub async fn logout(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<StatusCode, ApiError> {
    state.sessions.logout(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn current_session(CurrentSession(session): CurrentSession) -> Json<SessionView> {
    Json(SessionView::from(&session))
}

/// Change the password of the signed-in local account
#[instrument(skip_all, fields(username = %session.username()))]
pub async fn change_password(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    if session.auth_method() != AuthMethod::Local {
        return Err(ApiError::Forbidden(
            "directory accounts have no local password".to_string(),
        ));
    }

    state
        .credentials
        .change_password(
            session.username().as_str(),
            &request.current_password,
            request.new_password,
        )
        .await?;

    info!("Password changed");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use domain::{EmailAddress, User, Username};

    use super::*;

    fn patient_session() -> Session {
        let user = User::new_local(
            Username::new("birgit").unwrap(),
            "$argon2id$fake",
            Role::Patient,
            Some("Birgit".to_string()),
            Some(Username::new("terapeut@hospital.dk").unwrap()),
        )
        .unwrap();
        Session::for_user(&user)
    }

    #[test]
    fn patient_view_lists_only_program_access() {
        let view = SessionView::from(&patient_session());
        assert_eq!(view.permissions, [Permission::UseProgram]);
        assert_eq!(view.display_name, "Birgit");
    }

    #[test]
    fn login_response_carries_the_session_id() {
        let email = EmailAddress::new("terapeut@hospital.dk").unwrap();
        let session = Session::for_user(&User::new_directory(&email, Role::Therapist).unwrap());
        let id = session.id().to_string();
        let response = LoginResponse::from(session);

        assert_eq!(response.token, id);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["session"]["role"], "therapist");
        assert_eq!(json["session"]["auth_method"], "directory");
    }

    #[test]
    fn login_request_accepts_plain_password() {
        let request: LoginRequest =
            serde_json::from_str(r#"{"username": "anna", "password": "hemmelig1"}"#).unwrap();
        assert_eq!(request.username, "anna");
    }
}
