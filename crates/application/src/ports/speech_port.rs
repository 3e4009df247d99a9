//! Speech port - Interface for reading replies aloud

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::error::ApplicationError;

/// Instruction for the client to speak a text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechCue {
    /// Text to speak, without emoji
    pub text: String,
    /// Voice identifier, e.g. "da-DK-JeppeNeural"
    pub voice: String,
    /// BCP 47 language tag
    pub language: String,
}

/// Port for text-to-speech
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SpeechPort: Send + Sync {
    /// Prepare `text` for reading aloud
    ///
    /// Returns `None` when nothing speakable remains.
    async fn speak(&self, text: &str) -> Result<Option<SpeechCue>, ApplicationError>;

    /// Check if speech output is available
    async fn is_available(&self) -> bool;

    /// Name of the configured voice
    fn voice(&self) -> String;
}
