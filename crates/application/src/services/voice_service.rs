//! Voice service - transcription polling and read-aloud cues

use std::{fmt, sync::Arc};

use tracing::{debug, instrument};

use crate::{
    error::ApplicationError,
    ports::{SpeechCue, SpeechPort, TranscriptionPort},
};

/// Bridges the realtime transcription service and the speech output
pub struct VoiceService {
    transcription: Arc<dyn TranscriptionPort>,
    speech: Arc<dyn SpeechPort>,
}

impl fmt::Debug for VoiceService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoiceService")
            .field("voice", &self.speech.voice())
            .finish_non_exhaustive()
    }
}

impl VoiceService {
    pub fn new(transcription: Arc<dyn TranscriptionPort>, speech: Arc<dyn SpeechPort>) -> Self {
        Self {
            transcription,
            speech,
        }
    }

    /// Latest finished utterance, trimmed; `None` when nothing was said
    ///
    /// # Errors
    ///
    /// `UpstreamUnavailable` when the transcription service is unreachable.
    #[instrument(skip(self))]
    pub async fn latest_final(&self) -> Result<Option<String>, ApplicationError> {
        let text = normalize(self.transcription.final_text().await?);
        debug!(has_text = text.is_some(), "Polled final transcript");
        Ok(text)
    }

    /// Utterance in progress, trimmed; `None` when silent
    pub async fn latest_partial(&self) -> Result<Option<String>, ApplicationError> {
        Ok(normalize(self.transcription.partial_text().await?))
    }

    /// Prepare a reply for reading aloud
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn read_aloud(&self, text: &str) -> Result<Option<SpeechCue>, ApplicationError> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        self.speech.speak(text).await
    }
}

fn normalize(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}
