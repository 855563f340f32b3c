//! Google Gemini REST adapter.
//!
//! One HTTP client backs both collaborators:
//! - roleplay chat via `models/{chat_model}:generateContent`
//! - speech synthesis via `models/{tts_model}:generateContent` with an
//!   AUDIO response modality; audio comes back as base64 S16LE 24 kHz PCM
//!   in `candidates[0].content.parts[0].inlineData.data`.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::chat::{system_instruction, ChatRole, ChatTurn, RoleplayModel};
use crate::config::GeminiConfig;
use crate::tts::{SpeechSynthesizer, VoiceProfile};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn text(role: Option<&str>, text: &str) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part {
                text: Some(text.to_string()),
                inline_data: None,
            }],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    data: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<String>,
    speech_config: SpeechConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig {
    voice_config: VoiceConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig {
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig {
    voice_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

impl GenerateContentResponse {
    fn first_parts(&self) -> &[Part] {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .unwrap_or_default()
    }

    /// Base64 audio of the first part of the first candidate.
    fn audio_payload(&self) -> anyhow::Result<String> {
        match self.first_parts().first().and_then(|p| p.inline_data.as_ref()) {
            Some(inline) if !inline.data.is_empty() => Ok(inline.data.clone()),
            _ => anyhow::bail!("No audio data returned from API."),
        }
    }

    /// Concatenated text parts of the first candidate.
    fn reply_text(&self) -> anyhow::Result<String> {
        let text: String = self
            .first_parts()
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            anyhow::bail!("Empty chat response from API");
        }
        Ok(text)
    }
}

fn role_name(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "user",
        ChatRole::Model => "model",
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct GeminiClient {
    config: GeminiConfig,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig, api_key: &str) -> Self {
        Self {
            config,
            api_key: api_key.to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn voice_for(&self, profile: VoiceProfile) -> &str {
        match profile {
            VoiceProfile::Content => &self.config.content_voice,
            VoiceProfile::Guidance => &self.config.guidance_voice,
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        )
    }

    async fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> anyhow::Result<GenerateContentResponse> {
        let resp = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Gemini request failed: {}", e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error {}: {}", status, body);
        }

        resp.json::<GenerateContentResponse>()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to parse Gemini response: {}", e))
    }

    fn speech_request(&self, text: &str, profile: VoiceProfile) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::text(None, text)],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_modalities: vec!["AUDIO".to_string()],
                speech_config: SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: self.voice_for(profile).to_string(),
                        },
                    },
                },
            }),
        }
    }

    fn chat_request(
        level_id: &str,
        scenario: &str,
        history: &[ChatTurn],
    ) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: history
                .iter()
                .map(|turn| Content::text(Some(role_name(turn.role)), &turn.text))
                .collect(),
            system_instruction: Some(Content::text(None, &system_instruction(level_id, scenario))),
            generation_config: None,
        }
    }
}

impl SpeechSynthesizer for GeminiClient {
    fn synthesize(
        &self,
        text: &str,
        profile: VoiceProfile,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + '_>> {
        let request = self.speech_request(text, profile);
        let text_len = text.chars().count();
        Box::pin(async move {
            info!(
                voice = %self.voice_for(profile),
                text_len,
                "Gemini TTS request"
            );
            let resp = self.generate(&self.config.tts_model, &request).await?;
            let payload = resp.audio_payload()?;
            debug!(payload_len = payload.len(), "Gemini TTS payload received");
            Ok(payload)
        })
    }

    fn name(&self) -> String {
        format!("Gemini TTS ({})", self.config.tts_model)
    }
}

impl RoleplayModel for GeminiClient {
    fn reply(
        &self,
        level_id: &str,
        scenario: &str,
        history: Vec<ChatTurn>,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + '_>> {
        let request = Self::chat_request(level_id, scenario, &history);
        Box::pin(async move {
            info!(turns = history.len(), model = %self.config.chat_model, "Gemini chat request");
            let resp = self.generate(&self.config.chat_model, &request).await?;
            resp.reply_text()
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn client() -> GeminiClient {
        GeminiClient::new(GeminiConfig::default(), "test-key")
    }

    #[test]
    fn test_speech_request_shape() {
        let req = client().speech_request("ねこ", VoiceProfile::Content);
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({
                "contents": [{"parts": [{"text": "ねこ"}]}],
                "generationConfig": {
                    "responseModalities": ["AUDIO"],
                    "speechConfig": {
                        "voiceConfig": {"prebuiltVoiceConfig": {"voiceName": "Kore"}}
                    }
                }
            })
        );

        let guidance = client().speech_request("Halo", VoiceProfile::Guidance);
        let value = serde_json::to_value(&guidance).unwrap();
        let voice = &value["generationConfig"]["speechConfig"]["voiceConfig"];
        assert_eq!(voice["prebuiltVoiceConfig"]["voiceName"], "Zephyr");
    }

    #[test]
    fn test_chat_request_shape() {
        let history = vec![ChatTurn::model("こんにちは！"), ChatTurn::user("コーヒーをください")];
        let req = GeminiClient::chat_request("N4", "Memesan di kafe", &history);
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["contents"][0]["role"], "model");
        assert_eq!(value["contents"][1]["role"], "user");
        assert_eq!(value["contents"][1]["parts"][0]["text"], "コーヒーをください");
        assert!(value["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("JLPT N4"));
        assert!(value.get("generationConfig").is_none());
    }

    #[test]
    fn test_audio_payload_extraction() {
        let resp: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"inlineData": {"mimeType": "audio/L16;codec=pcm;rate=24000", "data": "AIA="}}
                ]}
            }]
        }))
        .unwrap();
        assert_eq!(resp.audio_payload().unwrap(), "AIA=");
    }

    #[test]
    fn test_missing_audio_is_error() {
        let resp: GenerateContentResponse =
            serde_json::from_value(json!({"candidates": []})).unwrap();
        let err = resp.audio_payload().unwrap_err();
        assert!(err.to_string().contains("No audio data"));

        let text_only = json!({"candidates": [{"content": {"parts": [{"text": "hi"}]}}]});
        let resp: GenerateContentResponse = serde_json::from_value(text_only).unwrap();
        assert!(resp.audio_payload().is_err());
    }

    #[test]
    fn test_reply_text_concatenates_parts() {
        let resp: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "はい、"}, {"text": "そうです。"}]}}]
        }))
        .unwrap();
        assert_eq!(resp.reply_text().unwrap(), "はい、そうです。");

        let empty: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert!(empty.reply_text().is_err());
    }

    #[test]
    fn test_endpoint() {
        let c = client();
        assert_eq!(
            c.endpoint("gemini-2.5-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
