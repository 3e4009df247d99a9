//! AI Core - Language model client
//!
//! Provides the inference engine abstraction and an Ollama-compatible
//! implementation used by the conversation trainer.

pub mod config;
pub mod error;
pub mod ollama;
pub mod ports;

pub use config::InferenceConfig;
pub use error::InferenceError;
pub use ollama::OllamaInferenceEngine;
pub use ports::{InferenceEngine, InferenceMessage, InferenceRequest, InferenceResponse, TokenUsage};
