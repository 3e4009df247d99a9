//! API error handling
//!
//! Error responses never carry internal details. Sign-in failures share one
//! generic message so a caller cannot tell unknown users from wrong passwords
//! or rejected domains.

use application::ApplicationError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Message of every failed sign-in
pub const LOGIN_FAILED: &str = "Login failed";

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Any failed sign-in, whatever the cause
    #[error("Login failed")]
    LoginFailed,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::LoginFailed | Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    const fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::LoginFailed => "login_failed",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::RateLimited => "rate_limited",
            Self::ServiceUnavailable(_) => "service_unavailable",
            Self::Internal(_) => "internal_error",
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::BadRequest(msg) | Self::NotFound(msg) | Self::Conflict(msg) => msg.clone(),
            Self::LoginFailed => LOGIN_FAILED.to_string(),
            Self::Unauthorized => "Authentication required".to_string(),
            Self::Forbidden(_) => "Access denied".to_string(),
            Self::RateLimited => "Rate limit exceeded".to_string(),
            Self::ServiceUnavailable(_) => "Service temporarily unavailable".to_string(),
            Self::Internal(_) => "An internal error occurred".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(detail) = &self {
            error!(error = %detail, "Request failed");
        }

        let body = ErrorResponse {
            error: self.public_message(),
            code: self.code().to_string(),
        };

        (self.status(), Json(body)).into_response()
    }
}

impl From<ApplicationError> for ApiError {
    fn from(err: ApplicationError) -> Self {
        match err {
            ApplicationError::Domain(e) => Self::BadRequest(e.to_string()),
            ApplicationError::DuplicateUser(name) => {
                Self::Conflict(format!("User already exists: {name}"))
            },
            ApplicationError::InvalidCredentials | ApplicationError::DomainRejected(_) => {
                Self::LoginFailed
            },
            ApplicationError::UpstreamUnavailable(msg) => Self::ServiceUnavailable(msg),
            ApplicationError::Unauthenticated => Self::Unauthorized,
            ApplicationError::Forbidden(msg) => Self::Forbidden(msg),
            ApplicationError::NotFound(msg) => Self::NotFound(msg),
            ApplicationError::RateLimited => Self::RateLimited,
            ApplicationError::Configuration(msg) | ApplicationError::Internal(msg) => {
                Self::Internal(msg)
            },
        }
    }
}
