//! Scenario catalog and conversation prompt configuration.

use application::ConversationSettings;
use serde::{Deserialize, Serialize};

/// Scenario and conversation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Directory holding `<id>.json` scenario files
    #[serde(default = "default_dir")]
    pub dir: String,

    /// Replaces the built-in base system prompt
    #[serde(default)]
    pub system_prompt: Option<String>,
}

fn default_dir() -> String {
    "scenarios".to_string()
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            system_prompt: None,
        }
    }
}

impl ScenarioConfig {
    /// Conversation settings with the configured prompt and sampling values
    pub fn conversation_settings(&self, temperature: f32, max_tokens: u32) -> ConversationSettings {
        let mut settings = ConversationSettings {
            temperature,
            max_tokens,
            ..ConversationSettings::default()
        };
        if let Some(prompt) = self.system_prompt.as_deref().filter(|p| !p.trim().is_empty()) {
            settings.system_prompt = prompt.to_string();
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use application::DEFAULT_SYSTEM_PROMPT;

    use super::*;

    #[test]
    fn default_prompt_is_kept() {
        let settings = ScenarioConfig::default().conversation_settings(0.3, 200);
        assert_eq!(settings.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(settings.max_tokens, 200);
    }

    #[test]
    fn blank_override_is_ignored() {
        let config = ScenarioConfig {
            system_prompt: Some("  ".to_string()),
            ..ScenarioConfig::default()
        };
        assert_eq!(
            config.conversation_settings(0.2, 400).system_prompt,
            DEFAULT_SYSTEM_PROMPT
        );
    }

    #[test]
    fn override_replaces_prompt() {
        let config = ScenarioConfig {
            system_prompt: Some("Tal langsomt.".to_string()),
            ..ScenarioConfig::default()
        };
        assert_eq!(config.conversation_settings(0.2, 400).system_prompt, "Tal langsomt.");
    }
}
