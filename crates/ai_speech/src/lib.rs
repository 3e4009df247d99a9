//! AI Speech - transcription polling and read-aloud preparation
//!
//! - `TranscriptSource` polls a realtime speech-to-text service
//! - `TextToSpeech` prepares replies for reading aloud
//!
//! Follows the ports & adapters pattern: `ports` defines the traits,
//! `providers` holds the implementations.

pub mod config;
pub mod error;
pub mod ports;
pub mod providers;

pub use config::{SpeechConfig, TranscriptionConfig};
pub use error::SpeechError;
pub use ports::{SpokenText, TextToSpeech, TranscriptSource};
pub use providers::{HttpTranscriptionClient, PlaceholderSpeaker, strip_emojis};
