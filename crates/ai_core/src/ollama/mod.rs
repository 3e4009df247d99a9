//! Ollama-compatible inference engine
//!
//! Talks to the `/api/chat` and `/api/tags` endpoints of a standard Ollama
//! server or anything mimicking it.

mod client;

pub use client::OllamaInferenceEngine;
