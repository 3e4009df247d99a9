//! Port definitions for speech processing

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SpeechError;

/// Source of live transcripts
///
/// The transcription service listens to the microphone by itself; callers
/// only poll for the latest text.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Latest finished utterance, `None` when empty
    async fn final_text(&self) -> Result<Option<String>, SpeechError>;

    /// Utterance in progress, `None` when empty
    async fn partial_text(&self) -> Result<Option<String>, SpeechError>;

    /// Check if the service answers
    async fn is_available(&self) -> bool;
}

/// Text prepared for speaking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpokenText {
    pub text: String,
    pub voice: String,
    pub language: String,
}

/// Port for text-to-speech implementations
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Prepare `text` for speaking, `None` when nothing speakable remains
    async fn speak(&self, text: &str) -> Result<Option<SpokenText>, SpeechError>;

    /// Check if speech output is available
    async fn is_available(&self) -> bool;

    /// Configured voice
    fn voice(&self) -> &str;
}
