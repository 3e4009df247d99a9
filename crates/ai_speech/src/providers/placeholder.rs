//! Placeholder text-to-speech
//!
//! No audio is synthesized here. The speaker strips emoji and hands back
//! the text with the configured voice, so the browser can read it aloud.

use async_trait::async_trait;

use crate::{
    config::SpeechConfig,
    error::SpeechError,
    ports::{SpokenText, TextToSpeech},
};

/// Code point ranges removed before speaking
const EMOJI_RANGES: &[(u32, u32)] = &[
    (0x1F600, 0x1F64F), // emoticons
    (0x1F300, 0x1F5FF), // symbols and pictographs
    (0x1F680, 0x1F6FF), // transport and map
    (0x1F1E0, 0x1F1FF), // flags
    (0x1F900, 0x1F9FF), // supplemental symbols
    (0x1FA70, 0x1FAFF), // symbols and pictographs extended-A
    (0x2600, 0x26FF),   // miscellaneous symbols
    (0x2702, 0x27B0),   // dingbats
    (0x24C2, 0x24C2),
    (0x1F170, 0x1F251), // enclosed alphanumerics and ideographs
    (0xFE0F, 0xFE0F),   // variation selector-16
    (0x200D, 0x200D),   // zero width joiner
];

fn is_emoji(c: char) -> bool {
    let cp = u32::from(c);
    EMOJI_RANGES
        .iter()
        .any(|&(start, end)| (start..=end).contains(&cp))
}

/// Remove emoji and collapse the whitespace they leave behind
pub fn strip_emojis(text: &str) -> String {
    let stripped: String = text.chars().filter(|c| !is_emoji(*c)).collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Speaker that only prepares text for the client's own speech engine
#[derive(Debug, Clone, Default)]
pub struct PlaceholderSpeaker {
    config: SpeechConfig,
}

impl PlaceholderSpeaker {
    pub const fn new(config: SpeechConfig) -> Self {
        Self { config }
    }

    pub fn language(&self) -> &str {
        &self.config.language
    }
}

#[async_trait]
impl TextToSpeech for PlaceholderSpeaker {
    async fn speak(&self, text: &str) -> Result<Option<SpokenText>, SpeechError> {
        let clean = strip_emojis(text);
        if clean.is_empty() {
            return Ok(None);
        }

        Ok(Some(SpokenText {
            text: clean,
            voice: self.config.voice.clone(),
            language: self.config.language.clone(),
        }))
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn voice(&self) -> &str {
        &self.config.voice
    }
}
