//! Transcription port - the realtime speech-to-text service
//!
//! The service transcribes microphone audio on its own; this side only
//! polls for the latest partial and final text.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for polling the transcription service
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TranscriptionPort: Send + Sync {
    /// Latest finished utterance, `None` when nothing was said
    async fn final_text(&self) -> Result<Option<String>, ApplicationError>;

    /// Text of the utterance in progress, `None` when silent
    async fn partial_text(&self) -> Result<Option<String>, ApplicationError>;

    /// Check if the transcription service is reachable
    async fn is_available(&self) -> bool;
}
