//! Text-to-Speech: synthesizer trait, voice profiles and the speech pipeline.
//!
//! Synthesis itself is delegated to a remote collaborator (see
//! [`crate::gemini`]). This module decides *what* gets sent and owns the
//! request → decode → playback flow.

pub mod pipeline;

use std::future::Future;
use std::pin::Pin;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub use pipeline::SpeechPipeline;

/// Which voice a request is spoken in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceProfile {
    /// Japanese lesson content (kanji, vocabulary, examples, chat replies).
    Content,
    /// Indonesian help text for the current screen.
    Guidance,
}

impl std::fmt::Display for VoiceProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Content => write!(f, "content"),
            Self::Guidance => write!(f, "guidance"),
        }
    }
}

/// Common trait for speech synthesis collaborators (dyn-compatible).
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` and return the base64-encoded S16LE 24 kHz mono payload.
    fn synthesize(
        &self,
        text: &str,
        profile: VoiceProfile,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + '_>>;

    /// Display name for this synthesizer (e.g. "Gemini TTS (gemini-2.5-flash-preview-tts)").
    fn name(&self) -> String;
}

static PARENTHETICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\(.*?\)\s*").expect("parenthetical pattern is valid"));

/// Strip reading/translation hints from lesson text.
///
/// Keeps only the first line and removes every `( ... )` group together
/// with the whitespace around it: `"わたし (saya)"` → `"わたし"`.
pub fn normalize_spoken_text(text: &str) -> String {
    let first_line = text.split('\n').next().unwrap_or_default();
    PARENTHETICAL.replace_all(first_line, "").trim().to_string()
}

/// Wrap a lone glyph as `「X」と読みます。`.
fn with_carrier_phrase(text: String) -> String {
    if text.chars().count() == 1 {
        format!("「{}」と読みます。", text)
    } else {
        text
    }
}

/// Build the exact text sent to the synthesizer, or `None` if there is
/// nothing to say.
pub fn prepare_speech(text: &str, profile: VoiceProfile) -> Option<String> {
    match profile {
        VoiceProfile::Content => {
            let cleaned = normalize_spoken_text(text);
            if cleaned.is_empty() {
                None
            } else {
                Some(with_carrier_phrase(cleaned))
            }
        }
        VoiceProfile::Guidance => {
            if text.trim().is_empty() {
                None
            } else {
                Some(text.to_string())
            }
        }
    }
}
