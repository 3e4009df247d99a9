//! Infrastructure adapters
//!
//! Adapters connect application ports to concrete implementations.

mod argon2_password_hasher;
mod file_scenario_catalog;
mod in_memory_session_store;
mod ollama_inference_adapter;
mod speech_adapter;
mod transcription_adapter;

pub use argon2_password_hasher::Argon2PasswordHasher;
pub use file_scenario_catalog::FileScenarioCatalog;
pub use in_memory_session_store::InMemorySessionStore;
pub use ollama_inference_adapter::OllamaInferenceAdapter;
pub use speech_adapter::SpeechAdapter;
pub use transcription_adapter::TranscriptionAdapter;
