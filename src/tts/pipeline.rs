//! Speak pipeline: guard → synthesize → decode → play.
//!
//! At most one request is in flight across the whole process. A request
//! made while anything is speaking is rejected, never queued. The permit
//! taken at the start is dropped on every exit path, so failures and
//! timeouts always return the pipeline to idle. A playback timeout stops the
//! output device before the permit goes, so the next clip never overlaps a
//! stalled one.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::{prepare_speech, SpeechSynthesizer, VoiceProfile};
use crate::audio::pcm::duration_of;
use crate::audio::{
    decode_base64_pcm, AudioOutput, DecodeError, SpeakingGuard, SpeakingIdentity,
    SpeakingPermit, SAMPLE_RATE,
};

/// Why a speak request did not produce audio.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeakError {
    /// Something else is already speaking.
    Busy,
    /// Nothing left to say after normalization.
    EmptyText,
    /// The synthesis collaborator failed.
    Synthesis(String),
    /// The returned payload could not be decoded.
    Decode(DecodeError),
    /// The output device failed.
    Playback(String),
    /// A stage took longer than its budget.
    Timeout(&'static str),
}

impl SpeakError {
    /// Rejections are handled silently; everything else is a failure.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Busy | Self::EmptyText)
    }
}

impl std::fmt::Display for SpeakError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Busy => write!(f, "already speaking"),
            Self::EmptyText => write!(f, "nothing to speak"),
            Self::Synthesis(msg) => write!(f, "speech synthesis failed: {}", msg),
            Self::Decode(e) => write!(f, "audio decode failed: {}", e),
            Self::Playback(msg) => write!(f, "audio playback failed: {}", msg),
            Self::Timeout(stage) => write!(f, "{} timed out", stage),
        }
    }
}

impl std::error::Error for SpeakError {}

impl From<DecodeError> for SpeakError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

/// Time budgets for one speak request.
#[derive(Debug, Clone, Copy)]
pub struct SpeechTimeouts {
    /// Upper bound on the synthesis round trip.
    pub request: Duration,
    /// Added to the decoded audio length to bound playback.
    pub playback_grace: Duration,
}

impl Default for SpeechTimeouts {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(30),
            playback_grace: Duration::from_secs(5),
        }
    }
}

#[derive(Clone)]
pub struct SpeechPipeline {
    guard: Arc<SpeakingGuard>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    output: Arc<dyn AudioOutput>,
    timeouts: SpeechTimeouts,
}

impl SpeechPipeline {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        output: Arc<dyn AudioOutput>,
        timeouts: SpeechTimeouts,
    ) -> Self {
        info!(synthesizer = %synthesizer.name(), "Speech pipeline ready");
        Self {
            guard: SpeakingGuard::new(),
            synthesizer,
            output,
            timeouts,
        }
    }

    pub fn guard(&self) -> &Arc<SpeakingGuard> {
        &self.guard
    }

    /// Claim the output and start speaking in the background.
    ///
    /// Rejections (`Busy`, `EmptyText`) are reported immediately; anything
    /// that happens after the claim comes back through the join handle.
    pub fn try_speak(
        &self,
        text: &str,
        profile: VoiceProfile,
    ) -> Result<(SpeakingIdentity, JoinHandle<Result<usize, SpeakError>>), SpeakError> {
        let (permit, request) = self.claim(text, profile)?;
        let identity = permit.identity().clone();
        let pipeline = self.clone();
        let handle = tokio::spawn(async move { pipeline.run(permit, request).await });
        Ok((identity, handle))
    }

    fn claim(
        &self,
        text: &str,
        profile: VoiceProfile,
    ) -> Result<(SpeakingPermit, String), SpeakError> {
        let Some(request) = prepare_speech(text, profile) else {
            warn!(original = %text, "Skipping TTS for empty text after cleaning");
            return Err(SpeakError::EmptyText);
        };
        let Some(permit) = self.guard.try_acquire(text, profile) else {
            debug!(
                %profile,
                state = ?self.guard.state(),
                busy_with = ?self.guard.current().map(|c| c.text),
                "Speak request rejected: already speaking"
            );
            return Err(SpeakError::Busy);
        };
        Ok((permit, request))
    }

    async fn run(&self, permit: SpeakingPermit, request: String) -> Result<usize, SpeakError> {
        let profile = permit.identity().profile;
        let result = self.synthesize_and_play(&permit, &request, profile).await;
        match &result {
            Ok(samples) => info!(%profile, samples, "Speech finished"),
            Err(e) => error!(%profile, request = %request, "Error playing audio: {}", e),
        }
        drop(permit);
        result
    }

    async fn synthesize_and_play(
        &self,
        permit: &SpeakingPermit,
        request: &str,
        profile: VoiceProfile,
    ) -> Result<usize, SpeakError> {
        let payload = tokio::time::timeout(
            self.timeouts.request,
            self.synthesizer.synthesize(request, profile),
        )
        .await
        .map_err(|_| SpeakError::Timeout("speech synthesis"))?
        .map_err(|e| SpeakError::Synthesis(e.to_string()))?;

        let samples = decode_base64_pcm(&payload)?;
        let count = samples.len();
        let budget = duration_of(count) + self.timeouts.playback_grace;

        permit.mark_playing();
        match tokio::time::timeout(budget, self.output.play(samples, SAMPLE_RATE)).await {
            Ok(played) => played.map_err(|e| SpeakError::Playback(e.to_string()))?,
            Err(_) => {
                warn!(?budget, "Playback overran its budget, stopping output");
                self.output.stop();
                return Err(SpeakError::Timeout("audio playback"));
            }
        }
        Ok(count)
    }
}
