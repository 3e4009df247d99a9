//! Inference port - Interface for LLM inference

use async_trait::async_trait;
use domain::ChatMessage;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// One chat completion request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// System prompt sent first
    pub system_prompt: String,
    /// Prior messages, oldest first
    pub history: Vec<ChatMessage>,
    /// The new user utterance
    pub user_input: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask the model to answer with a JSON object
    pub json_output: bool,
}

/// Result of an inference call
#[derive(Debug, Clone)]
pub struct InferenceResult {
    /// Generated response content
    pub content: String,
    /// Model used for generation
    pub model: String,
    /// Number of tokens used (if available)
    pub tokens_used: Option<u32>,
    /// Latency in milliseconds
    pub latency_ms: u64,
}

/// Port for inference operations
#[cfg_attr(test, automock)]
#[async_trait]
pub trait InferencePort: Send + Sync {
    /// Generate the next assistant message
    ///
    /// Connection failures and timeouts map to
    /// `ApplicationError::UpstreamUnavailable`.
    async fn complete(&self, request: &CompletionRequest) -> Result<InferenceResult, ApplicationError>;

    /// Check if the inference backend is healthy
    async fn is_healthy(&self) -> bool;

    /// Get the name of the current model
    fn current_model(&self) -> String;
}
