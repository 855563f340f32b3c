//! PCM decoding, playback and the single-flight speaking guard.

pub mod guard;
pub mod pcm;
pub mod playback;

pub use guard::{SpeakingGuard, SpeakingIdentity, SpeakingPermit};
pub use pcm::{decode_base64_pcm, DecodeError, SAMPLE_RATE};
pub use playback::{AudioOutput, AudioPlayer};
