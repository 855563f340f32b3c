//! Raw PCM payload decoding.
//!
//! The TTS collaborator returns base64-encoded signed 16-bit little-endian
//! mono samples at 24 kHz. Samples are normalized to `[-1.0, 1.0)` by
//! dividing by 32768.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Sample rate of synthesized speech.
pub const SAMPLE_RATE: u32 = 24_000;

/// Channel count of synthesized speech.
pub const CHANNELS: u16 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Payload is not valid base64.
    Base64(String),
    /// Byte length is not a whole number of 16-bit samples.
    OddLength(usize),
    /// Payload decoded to zero samples.
    Empty,
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Base64(msg) => write!(f, "invalid base64 audio payload: {}", msg),
            Self::OddLength(len) => write!(f, "PCM payload has odd length {} bytes", len),
            Self::Empty => write!(f, "no audio data in payload"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Convert S16LE bytes to f32 samples.
pub fn pcm16_to_f32(bytes: &[u8]) -> Result<Vec<f32>, DecodeError> {
    if bytes.len() % 2 != 0 {
        return Err(DecodeError::OddLength(bytes.len()));
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|chunk| {
            let sample = i16::from_le_bytes([chunk[0], chunk[1]]);
            sample as f32 / 32768.0
        })
        .collect())
}

/// Decode a base64 S16LE payload into playable samples.
pub fn decode_base64_pcm(payload: &str) -> Result<Vec<f32>, DecodeError> {
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| DecodeError::Base64(e.to_string()))?;
    let samples = pcm16_to_f32(&bytes)?;
    if samples.is_empty() {
        return Err(DecodeError::Empty);
    }
    Ok(samples)
}

/// Playback length of `sample_count` mono samples at [`SAMPLE_RATE`].
pub fn duration_of(sample_count: usize) -> std::time::Duration {
    std::time::Duration::from_secs_f64(sample_count as f64 / SAMPLE_RATE as f64)
}
