//! Ollama inference adapter - Implements InferencePort using ai_core

use std::time::Instant;

use ai_core::{InferenceConfig, InferenceEngine, InferenceError, InferenceRequest, OllamaInferenceEngine};
use application::{
    error::ApplicationError,
    ports::{CompletionRequest, InferencePort, InferenceResult},
};
use async_trait::async_trait;
use tracing::{debug, instrument, warn};

/// Adapter for Ollama-compatible inference servers
#[derive(Debug)]
pub struct OllamaInferenceAdapter {
    engine: OllamaInferenceEngine,
}

impl OllamaInferenceAdapter {
    /// Create a new adapter with the given configuration
    pub fn new(config: InferenceConfig) -> Result<Self, ApplicationError> {
        let engine = OllamaInferenceEngine::new(config)
            .map_err(|e| ApplicationError::Configuration(e.to_string()))?;

        Ok(Self { engine })
    }

    /// Convert ai_core error to application error
    fn map_error(e: InferenceError) -> ApplicationError {
        match e {
            e if e.is_unreachable() => {
                ApplicationError::UpstreamUnavailable(format!("language model: {e}"))
            },
            InferenceError::ServerError(msg) => {
                ApplicationError::UpstreamUnavailable(format!("language model error: {msg}"))
            },
            InferenceError::ModelNotAvailable(model) => {
                ApplicationError::Configuration(format!("model not available: {model}"))
            },
            other => ApplicationError::Internal(other.to_string()),
        }
    }

    fn build_request(request: &CompletionRequest) -> InferenceRequest {
        let built = InferenceRequest::chat(
            &request.system_prompt,
            &request.history,
            &request.user_input,
        )
        .with_temperature(request.temperature)
        .with_max_tokens(request.max_tokens);

        if request.json_output {
            built.json()
        } else {
            built
        }
    }
}

#[async_trait]
impl InferencePort for OllamaInferenceAdapter {
    #[instrument(skip(self, request), fields(history = request.history.len(), json = request.json_output))]
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<InferenceResult, ApplicationError> {
        let start = Instant::now();

        let response = self
            .engine
            .generate(Self::build_request(request))
            .await
            .map_err(|e| {
                warn!(error = %e, "Inference failed");
                Self::map_error(e)
            })?;

        #[allow(clippy::cast_possible_truncation)]
        let latency_ms = start.elapsed().as_millis() as u64;

        debug!(
            model = %response.model,
            tokens = ?response.usage.as_ref().map(|u| u.total_tokens),
            latency_ms = latency_ms,
            "Inference completed"
        );

        Ok(InferenceResult {
            content: response.content,
            model: response.model,
            tokens_used: response.usage.map(|u| u.total_tokens),
            latency_ms,
        })
    }

    async fn is_healthy(&self) -> bool {
        self.engine.health_check().await.unwrap_or(false)
    }

    fn current_model(&self) -> String {
        self.engine.default_model().to_string()
    }
}

#[cfg(test)]
mod tests {
    use domain::ChatMessage;

    use super::*;

    fn completion(json_output: bool) -> CompletionRequest {
        CompletionRequest {
            system_prompt: "Du er en venlig samtalepartner.".to_string(),
            history: vec![
                ChatMessage::user("Hej"),
                ChatMessage::assistant("Hej! Skal vi handle ind?"),
            ],
            user_input: "Ja".to_string(),
            temperature: 0.2,
            max_tokens: 400,
            json_output,
        }
    }

    #[test]
    fn request_keeps_history_order() {
        let request = OllamaInferenceAdapter::build_request(&completion(true));
        let roles: Vec<_> = request.messages.iter().map(|m| m.role.as_str()).collect();

        assert_eq!(roles, ["system", "user", "assistant", "user"]);
        assert_eq!(request.messages[3].content, "Ja");
        assert_eq!(request.temperature, Some(0.2));
        assert_eq!(request.max_tokens, Some(400));
        assert!(request.json_output);
    }

    #[test]
    fn plain_requests_do_not_ask_for_json() {
        assert!(!OllamaInferenceAdapter::build_request(&completion(false)).json_output);
    }

    #[test]
    fn map_error_unreachable() {
        let mapped = OllamaInferenceAdapter::map_error(InferenceError::Timeout);
        assert!(matches!(mapped, ApplicationError::UpstreamUnavailable(_)));

        let mapped = OllamaInferenceAdapter::map_error(InferenceError::ConnectionFailed(
            "refused".to_string(),
        ));
        assert!(mapped.is_retryable());
    }

    #[test]
    fn map_error_server_error() {
        let mapped =
            OllamaInferenceAdapter::map_error(InferenceError::ServerError("500".to_string()));
        assert!(matches!(mapped, ApplicationError::UpstreamUnavailable(_)));
    }

    #[test]
    fn map_error_missing_model() {
        let mapped = OllamaInferenceAdapter::map_error(InferenceError::ModelNotAvailable(
            "gemma3:4b".to_string(),
        ));
        let ApplicationError::Configuration(msg) = mapped else {
            unreachable!("Expected Configuration error");
        };
        assert!(msg.contains("gemma3:4b"));
    }

    #[test]
    fn map_error_other() {
        let mapped =
            OllamaInferenceAdapter::map_error(InferenceError::InvalidResponse("bad".to_string()));
        assert!(matches!(mapped, ApplicationError::Internal(_)));
    }

    #[test]
    fn current_model_comes_from_config() {
        let adapter = OllamaInferenceAdapter::new(InferenceConfig {
            default_model: "llama3.2:3b".to_string(),
            ..InferenceConfig::default()
        })
        .unwrap();
        assert_eq!(adapter.current_model(), "llama3.2:3b");
    }
}
