//! Speech provider implementations

pub mod http_transcription;
pub mod placeholder;

pub use http_transcription::HttpTranscriptionClient;
pub use placeholder::{PlaceholderSpeaker, strip_emojis};
