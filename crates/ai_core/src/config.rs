//! Configuration for the inference engine

use serde::{Deserialize, Serialize};

/// Configuration for the Ollama-compatible inference server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Base URL of the inference server
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for every request
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Timeout of the `/api/tags` health probe in milliseconds
    #[serde(default = "default_health_timeout_ms")]
    pub health_timeout_ms: u64,

    /// Maximum tokens to generate when a request sets none
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature when a request sets none
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "gemma3:4b".to_string()
}

const fn default_timeout_ms() -> u64 {
    60_000
}

const fn default_health_timeout_ms() -> u64 {
    5_000
}

const fn default_max_tokens() -> u32 {
    400
}

const fn default_temperature() -> f32 {
    0.2
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            default_model: default_model(),
            timeout_ms: default_timeout_ms(),
            health_timeout_ms: default_health_timeout_ms(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl InferenceConfig {
    /// Base URL without trailing slashes
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_trainer_settings() {
        let config = InferenceConfig::default();
        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.timeout_ms, 60_000);
        assert_eq!(config.max_tokens, 400);
        assert!((config.temperature - 0.2).abs() < 0.01);
    }

    #[test]
    fn config_deserialization_with_defaults() {
        let config: InferenceConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.health_timeout_ms, 5_000);
    }

    #[test]
    fn config_deserialization_overrides() {
        let json = r#"{"base_url":"http://gpu-box:11434/","default_model":"llama3.1:8b"}"#;
        let config: InferenceConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.default_model, "llama3.1:8b");
        assert_eq!(config.normalized_base_url(), "http://gpu-box:11434");
    }
}
