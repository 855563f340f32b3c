//! IPC protocol types for communication with the UI shell.
//!
//! Events use `{"event": "<name>", "data": {...}}` format (core -> UI).
//! Commands use `{"command": "<name>", ...}` format (UI -> core).

pub mod bridge;

use serde::{Deserialize, Serialize};

use crate::audio::guard::SpeechState;
use crate::audio::SpeakingIdentity;
use crate::chat::ChatTurn;
use crate::content::{EbookChapter, JlptLevel, LevelContent};
use crate::exercise::{ExerciseSnapshot, Verdict};
use crate::tts::VoiceProfile;

// ---------------------------------------------------------------------------
// Events: core -> UI (stdout)
// ---------------------------------------------------------------------------

/// All events emitted to the UI via stdout as JSON lines.
///
/// Serialized as `{"event": "<variant>", "data": {...}}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
#[serde(rename_all = "snake_case")]
pub enum AppEvent {
    Starting {},
    Loading { step: String },
    Ready {},
    Pong {},
    Stopping {},
    Error { message: String },
    Levels {
        alphabet: JlptLevel,
        levels: Vec<JlptLevel>,
    },
    LevelSelected { level: JlptLevel },
    LevelUnlocked { level: JlptLevel },
    Content {
        level_id: String,
        content: LevelContent,
    },
    Alphabet {
        hiragana: Vec<String>,
        katakana: Vec<String>,
    },
    Exercise {
        level_id: String,
        snapshot: ExerciseSnapshot,
    },
    ExerciseUnavailable { level_id: String },
    Verdict { verdict: Verdict, message: String },
    Chapters {
        level_id: String,
        titles: Vec<String>,
        selected: usize,
    },
    Chapter { index: usize, chapter: EbookChapter },
    ChatHistory {
        scenario: String,
        history: Vec<ChatTurn>,
        loading: bool,
    },
    SpeakingStart { text: String, profile: VoiceProfile },
    SpeakingEnd {
        text: String,
        profile: VoiceProfile,
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    SpeakRejected { text: String, reason: String },
    SpeechStatus {
        speaking: bool,
        state: SpeechState,
        current: Option<SpeakingIdentity>,
    },
}

// ---------------------------------------------------------------------------
// Commands: UI -> core (stdin)
// ---------------------------------------------------------------------------

/// All commands received from the UI via stdin as JSON lines.
///
/// Deserialized from `{"command": "<variant>", ...}`. Optional `level_id`
/// fields default to the currently selected level.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command")]
#[serde(rename_all = "snake_case")]
pub enum AppCommand {
    Ping {},
    Stop {},
    ListLevels {},
    SelectLevel {
        level_id: String,
    },
    UnlockNextLevel {},
    GetContent {
        #[serde(default)]
        level_id: Option<String>,
    },
    GetAlphabet {},
    LoadExercise {
        #[serde(default)]
        level_id: Option<String>,
        #[serde(default)]
        index: usize,
    },
    PlaceFromPool {
        position: usize,
    },
    ReturnToPool {
        position: usize,
    },
    CheckExercise {},
    Hint {},
    ResetExercise {},
    NextExercise {},
    ListChapters {
        #[serde(default)]
        level_id: Option<String>,
    },
    SelectChapter {
        index: usize,
    },
    /// Speak item `index` of the open chapter (example lines only).
    SpeakChapterItem {
        index: usize,
    },
    StartScenario {
        #[serde(default)]
        scenario: Option<String>,
    },
    SendChat {
        text: String,
    },
    SpeakContent {
        text: String,
    },
    SpeakGuidance {
        text: String,
    },
    GetSpeechStatus {},
}
