//! Ollama chat client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::{
    config::InferenceConfig,
    error::InferenceError,
    ports::{InferenceEngine, InferenceMessage, InferenceRequest, InferenceResponse, TokenUsage},
};

/// Inference engine backed by an Ollama-compatible server
#[derive(Debug)]
pub struct OllamaInferenceEngine {
    client: Client,
    config: InferenceConfig,
}

impl OllamaInferenceEngine {
    /// Create a new engine
    ///
    /// # Errors
    ///
    /// Fails when the HTTP client cannot be built.
    pub fn new(config: InferenceConfig) -> Result<Self, InferenceError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| InferenceError::ConnectionFailed(e.to_string()))?;

        info!(
            base_url = %config.base_url,
            model = %config.default_model,
            "Initialized Ollama inference engine"
        );

        Ok(Self { client, config })
    }

    pub const fn config(&self) -> &InferenceConfig {
        &self.config
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!(
            "{}/api/{}",
            self.config.normalized_base_url(),
            endpoint.trim_start_matches('/')
        )
    }

    fn resolve_model<'a>(&'a self, request: &'a InferenceRequest) -> &'a str {
        request
            .model
            .as_deref()
            .unwrap_or(&self.config.default_model)
    }

    fn to_wire(&self, request: &InferenceRequest) -> OllamaChatRequest {
        OllamaChatRequest {
            model: self.resolve_model(request).to_string(),
            messages: request.messages.clone(),
            stream: false,
            format: request.json_output.then_some("json"),
            options: OllamaOptions {
                temperature: request.temperature.unwrap_or(self.config.temperature),
                num_predict: request.max_tokens.unwrap_or(self.config.max_tokens),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<InferenceMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    model: String,
    message: OllamaResponseMessage,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaModelsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Debug, Deserialize)]
struct OllamaModel {
    name: String,
}

#[async_trait]
impl InferenceEngine for OllamaInferenceEngine {
    #[instrument(skip(self, request), fields(model = %self.resolve_model(&request), messages = request.messages.len()))]
    async fn generate(&self, request: InferenceRequest) -> Result<InferenceResponse, InferenceError> {
        let body = self.to_wire(&request);

        let response = self
            .client
            .post(self.api_url("chat"))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(InferenceError::ModelNotAvailable(body.model));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %text, "Inference request failed");
            return Err(InferenceError::ServerError(format!("Status {status}: {text}")));
        }

        let parsed: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::InvalidResponse(e.to_string()))?;

        let usage = match (parsed.prompt_eval_count, parsed.eval_count) {
            (Some(prompt), Some(completion)) => Some(TokenUsage {
                prompt_tokens: prompt,
                completion_tokens: completion,
                total_tokens: prompt + completion,
            }),
            _ => None,
        };

        debug!(tokens = ?usage, "Inference completed");

        Ok(InferenceResponse {
            content: parsed.message.content,
            model: parsed.model,
            usage,
            finish_reason: parsed.done.then(|| "stop".to_string()),
        })
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<bool, InferenceError> {
        let response = self
            .client
            .get(self.api_url("tags"))
            .timeout(Duration::from_millis(self.config.health_timeout_ms))
            .send()
            .await;

        match response {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(e) if e.is_timeout() || e.is_connect() => Ok(false),
            Err(e) => Err(InferenceError::RequestFailed(e.to_string())),
        }
    }

    #[instrument(skip(self))]
    async fn list_models(&self) -> Result<Vec<String>, InferenceError> {
        let response = self.client.get(self.api_url("tags")).send().await?;

        if !response.status().is_success() {
            return Err(InferenceError::ServerError(response.status().to_string()));
        }

        let models: OllamaModelsResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::InvalidResponse(e.to_string()))?;

        Ok(models.models.into_iter().map(|m| m.name).collect())
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }
}
