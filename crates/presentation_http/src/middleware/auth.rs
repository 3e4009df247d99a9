//! Session authentication
//!
//! Handlers that need a signed-in user take [`CurrentSession`]. The token is
//! the session id from a `Bearer` authorization header.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use domain::{Permission, Session};

use crate::{error::ApiError, state::AppState};

/// The caller's live session
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

impl CurrentSession {
    /// Fail with 403 unless the session's role grants `permission`
    pub fn require(&self, permission: Permission) -> Result<&Session, ApiError> {
        if self.0.has_permission(permission) {
            Ok(&self.0)
        } else {
            Err(ApiError::Forbidden(permission.as_str().to_string()))
        }
    }
}

/// Token part of `Authorization: Bearer <token>`
pub fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(ApiError::Unauthorized)?;
        let session = state.sessions.resolve(token).await?;
        Ok(Self(session))
    }
}
