//! HTTP client for the realtime transcription service
//!
//! The service exposes `GET /final` and `GET /partial`, both answering
//! `{"text": "..."}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::{config::TranscriptionConfig, error::SpeechError, ports::TranscriptSource};

#[derive(Debug, Deserialize)]
struct TranscriptResponse {
    #[serde(default)]
    text: Option<String>,
}

/// Polls the transcription service over HTTP
#[derive(Debug)]
pub struct HttpTranscriptionClient {
    client: Client,
    config: TranscriptionConfig,
}

impl HttpTranscriptionClient {
    /// Create a client
    ///
    /// # Errors
    ///
    /// Fails for an empty base URL or when the HTTP client cannot be built.
    pub fn new(config: TranscriptionConfig) -> Result<Self, SpeechError> {
        if config.base_url.trim().is_empty() {
            return Err(SpeechError::Configuration(
                "transcription base URL is empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| SpeechError::Configuration(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub const fn config(&self) -> &TranscriptionConfig {
        &self.config
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.config.base_url.trim_end_matches('/'))
    }

    async fn fetch(&self, endpoint: &str) -> Result<Option<String>, SpeechError> {
        let response = self.client.get(self.url(endpoint)).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!(endpoint, status = %status, "Transcription service returned error");
            return Err(SpeechError::ServiceUnavailable(format!("status {status}")));
        }

        let body: TranscriptResponse = response
            .json()
            .await
            .map_err(|e| SpeechError::InvalidResponse(e.to_string()))?;

        Ok(body
            .text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()))
    }
}

#[async_trait]
impl TranscriptSource for HttpTranscriptionClient {
    #[instrument(skip(self))]
    async fn final_text(&self) -> Result<Option<String>, SpeechError> {
        let text = self.fetch("final").await?;
        debug!(has_text = text.is_some(), "Fetched final transcript");
        Ok(text)
    }

    async fn partial_text(&self) -> Result<Option<String>, SpeechError> {
        self.fetch("partial").await
    }

    async fn is_available(&self) -> bool {
        match self
            .client
            .get(self.url("final"))
            .timeout(Duration::from_millis(self.config.probe_timeout_ms))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "Transcription probe failed");
                false
            },
        }
    }
}
