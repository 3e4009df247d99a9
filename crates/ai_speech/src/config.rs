//! Configuration for speech processing

use serde::{Deserialize, Serialize};

/// Realtime transcription service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    /// Base URL; `/final` and `/partial` are appended
    #[serde(default = "default_transcription_url")]
    pub base_url: String,

    /// Timeout of a poll in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Timeout of the availability probe in milliseconds
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

fn default_transcription_url() -> String {
    "http://localhost:9000".to_string()
}

const fn default_timeout_ms() -> u64 {
    5_000
}

const fn default_probe_timeout_ms() -> u64 {
    1_500
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            base_url: default_transcription_url(),
            timeout_ms: default_timeout_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
        }
    }
}

/// Read-aloud settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Voice identifier handed to the client
    #[serde(default = "default_voice")]
    pub voice: String,

    /// BCP 47 language tag
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_voice() -> String {
    "da-DK-JeppeNeural".to_string()
}

fn default_language() -> String {
    "da-DK".to_string()
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            voice: default_voice(),
            language: default_language(),
        }
    }
}
