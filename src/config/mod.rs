//! Configuration reading and data directory paths.

pub mod paths;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::tts::pipeline::SpeechTimeouts;
use paths::get_data_dir;

/// Environment variables checked for the Gemini API key, in order.
const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Top-level nihongo_config.json shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub speech: SpeechSettings,
    #[serde(default)]
    pub exercise: ExerciseSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Remote model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub chat_model: String,
    pub tts_model: String,
    /// Voice for Japanese lesson content.
    pub content_voice: String,
    /// Voice for Indonesian screen guidance.
    pub guidance_voice: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            chat_model: "gemini-2.5-flash".to_string(),
            tts_model: "gemini-2.5-flash-preview-tts".to_string(),
            content_voice: "Kore".to_string(),
            guidance_voice: "Zephyr".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpeechSettings {
    pub volume: f32,
    pub request_timeout_secs: u64,
    pub playback_grace_secs: u64,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            volume: 1.0,
            request_timeout_secs: 30,
            playback_grace_secs: 5,
        }
    }
}

impl SpeechSettings {
    pub fn timeouts(&self) -> SpeechTimeouts {
        SpeechTimeouts {
            request: Duration::from_secs(self.request_timeout_secs.max(1)),
            playback_grace: Duration::from_secs(self.playback_grace_secs),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSettings {
    /// Fixed shuffle seed; unset means a fresh shuffle every time.
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingSettings {
    /// Also write a daily log file under `<data_dir>/logs`.
    #[serde(default)]
    pub file: bool,
}

impl AppConfig {
    /// API key from the environment, falling back to the config file.
    pub fn api_key(&self) -> Option<String> {
        API_KEY_ENV_VARS
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()))
            .or_else(|| self.gemini.api_key.clone().filter(|v| !v.trim().is_empty()))
    }
}

/// Read nihongo_config.json from the data directory.
pub fn read_app_config() -> AppConfig {
    read_json_file(&get_config_path()).unwrap_or_default()
}

/// Path to nihongo_config.json.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("nihongo_config.json")
}

/// Directory for rolling log files.
pub fn get_log_dir() -> PathBuf {
    get_data_dir().join("logs")
}

/// Generic helper: read a JSON file and deserialize it.
fn read_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(val) => Some(val),
            Err(e) => {
                warn!("Failed to parse {}: {}", path.display(), e);
                None
            }
        },
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to read {}: {}", path.display(), e);
            }
            None
        }
    }
}
