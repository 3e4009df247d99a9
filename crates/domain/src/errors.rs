//! Domain-level errors

use thiserror::Error;

/// Errors that can occur in the domain layer
#[derive(Debug, Error)]
pub enum DomainError {
    /// Invalid email address format
    #[error("Invalid email address: {0}")]
    InvalidEmailAddress(String),

    /// Username is empty or malformed
    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    /// Unknown role name
    #[error("Unknown role: {0}")]
    InvalidRole(String),

    /// Password does not satisfy the password policy
    #[error("Password too weak: {0}")]
    WeakPassword(String),

    /// Entity not found
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    /// Validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),

    /// Operation not permitted
    #[error("Operation not permitted: {0}")]
    NotPermitted(String),
}

impl DomainError {
    /// Create a not found error
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }
}
