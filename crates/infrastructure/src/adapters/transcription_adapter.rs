//! Transcription adapter - Implements TranscriptionPort using ai_speech

use ai_speech::{HttpTranscriptionClient, SpeechError, TranscriptSource, TranscriptionConfig};
use application::{error::ApplicationError, ports::TranscriptionPort};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Adapter polling the realtime transcription service
#[derive(Debug)]
pub struct TranscriptionAdapter {
    client: HttpTranscriptionClient,
}

impl TranscriptionAdapter {
    /// Create a new transcription adapter
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be configured.
    pub fn new(config: TranscriptionConfig) -> Result<Self, ApplicationError> {
        let client = HttpTranscriptionClient::new(config)
            .map_err(|e| ApplicationError::Configuration(e.to_string()))?;
        Ok(Self { client })
    }

    /// Map speech error to application error
    fn map_error(err: SpeechError) -> ApplicationError {
        match err {
            e if e.is_unreachable() => {
                ApplicationError::UpstreamUnavailable(format!("transcription: {e}"))
            },
            SpeechError::Configuration(e) => ApplicationError::Configuration(e),
            SpeechError::RequestFailed(e) => {
                ApplicationError::UpstreamUnavailable(format!("transcription request failed: {e}"))
            },
            other => ApplicationError::Internal(other.to_string()),
        }
    }
}

#[async_trait]
impl TranscriptionPort for TranscriptionAdapter {
    #[instrument(skip(self))]
    async fn final_text(&self) -> Result<Option<String>, ApplicationError> {
        self.client.final_text().await.map_err(Self::map_error)
    }

    async fn partial_text(&self) -> Result<Option<String>, ApplicationError> {
        self.client.partial_text().await.map_err(Self::map_error)
    }

    async fn is_available(&self) -> bool {
        let available = self.client.is_available().await;
        debug!(available, "Transcription availability checked");
        available
    }
}
