//! Speech adapter - Implements SpeechPort using ai_speech

use ai_speech::{PlaceholderSpeaker, SpeechConfig, TextToSpeech};
use application::{
    error::ApplicationError,
    ports::{SpeechCue, SpeechPort},
};
use async_trait::async_trait;
use tracing::instrument;

/// Adapter turning assistant text into read-aloud cues
#[derive(Debug, Clone, Default)]
pub struct SpeechAdapter {
    speaker: PlaceholderSpeaker,
}

impl SpeechAdapter {
    #[must_use]
    pub const fn new(config: SpeechConfig) -> Self {
        Self {
            speaker: PlaceholderSpeaker::new(config),
        }
    }
}

#[async_trait]
impl SpeechPort for SpeechAdapter {
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    async fn speak(&self, text: &str) -> Result<Option<SpeechCue>, ApplicationError> {
        let spoken = self
            .speaker
            .speak(text)
            .await
            .map_err(|e| ApplicationError::Internal(e.to_string()))?;

        Ok(spoken.map(|s| SpeechCue {
            text: s.text,
            voice: s.voice,
            language: s.language,
        }))
    }

    async fn is_available(&self) -> bool {
        self.speaker.is_available().await
    }

    fn voice(&self) -> String {
        self.speaker.voice().to_string()
    }
}
