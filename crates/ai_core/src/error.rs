//! Inference errors

use thiserror::Error;

/// Errors that can occur during inference
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Failed to connect to inference server
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request to inference server failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Model not found or not loaded
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Response parsing failed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Timeout during inference
    #[error("Inference timed out")]
    Timeout,

    /// Server error
    #[error("Server error: {0}")]
    ServerError(String),
}

impl InferenceError {
    /// Whether the server could not be reached at all
    pub const fn is_unreachable(&self) -> bool {
        matches!(self, Self::ConnectionFailed(_) | Self::Timeout)
    }
}

impl From<reqwest::Error> for InferenceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::ConnectionFailed(err.to_string())
        } else {
            Self::RequestFailed(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_errors() {
        assert!(InferenceError::Timeout.is_unreachable());
        assert!(InferenceError::ConnectionFailed("refused".into()).is_unreachable());
        assert!(!InferenceError::ServerError("500".into()).is_unreachable());
    }
}
