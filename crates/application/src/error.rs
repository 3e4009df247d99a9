//! Application-level errors

use domain::DomainError;
use thiserror::Error;

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain-level error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A user with this username already exists
    #[error("User already exists: {0}")]
    DuplicateUser(String),

    /// Unknown user, wrong password or non-local account
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Directory identity rejected by the email-domain policy
    #[error("Domain rejected: {0}")]
    DomainRejected(String),

    /// LLM or transcription service could not be reached
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// No valid session
    #[error("Not authenticated")]
    Unauthenticated,

    /// Session lacks the required permission
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Requested record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Check if this error is retryable
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::UpstreamUnavailable(_))
    }

    /// Whether this error must be shown as a generic login failure
    pub const fn is_login_failure(&self) -> bool {
        matches!(self, Self::InvalidCredentials | Self::DomainRejected(_))
    }
}
