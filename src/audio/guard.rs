//! Single-flight speaking guard.
//!
//! One guard is shared by every call site that can produce speech. A caller
//! must hold a [`SpeakingPermit`] for the whole request + playback; the
//! permit releases the guard when dropped, on every exit path.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;

use crate::tts::VoiceProfile;

/// Speech pipeline states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SpeechState {
    Idle = 0,
    /// Waiting on the synthesis collaborator.
    Requesting = 1,
    /// Decoded audio is on the output device.
    Playing = 2,
}

impl SpeechState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Requesting,
            2 => Self::Playing,
            _ => Self::Idle,
        }
    }
}

/// What is currently being spoken. `text` is the caller's original text,
/// used by the UI to highlight the active speaker button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeakingIdentity {
    pub text: String,
    pub profile: VoiceProfile,
}

#[derive(Debug)]
pub struct SpeakingGuard {
    state: AtomicU8,
    current: Mutex<Option<SpeakingIdentity>>,
}

impl SpeakingGuard {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn state(&self) -> SpeechState {
        SpeechState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_speaking(&self) -> bool {
        self.state() != SpeechState::Idle
    }

    pub fn current(&self) -> Option<SpeakingIdentity> {
        self.lock_current().clone()
    }

    /// Claim the guard. Returns `None` if anything is already speaking.
    pub fn try_acquire(
        self: &Arc<Self>,
        text: &str,
        profile: VoiceProfile,
    ) -> Option<SpeakingPermit> {
        self.state
            .compare_exchange(
                SpeechState::Idle as u8,
                SpeechState::Requesting as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .ok()?;
        let identity = SpeakingIdentity {
            text: text.to_string(),
            profile,
        };
        *self.lock_current() = Some(identity.clone());
        Some(SpeakingPermit {
            guard: Arc::clone(self),
            identity,
        })
    }

    fn lock_current(&self) -> MutexGuard<'_, Option<SpeakingIdentity>> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for SpeakingGuard {
    fn default() -> Self {
        Self {
            state: AtomicU8::new(SpeechState::Idle as u8),
            current: Mutex::new(None),
        }
    }
}

/// Exclusive right to the audio output. Releases the guard on drop.
#[derive(Debug)]
pub struct SpeakingPermit {
    guard: Arc<SpeakingGuard>,
    identity: SpeakingIdentity,
}

impl SpeakingPermit {
    pub fn identity(&self) -> &SpeakingIdentity {
        &self.identity
    }

    /// Requesting -> Playing.
    pub fn mark_playing(&self) {
        self.guard
            .state
            .store(SpeechState::Playing as u8, Ordering::Release);
    }
}

impl Drop for SpeakingPermit {
    fn drop(&mut self) {
        // Identity first, so observers never see Idle with a stale identity.
        *self.guard.lock_current() = None;
        self.guard
            .state
            .store(SpeechState::Idle as u8, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_flight() {
        let guard = SpeakingGuard::new();
        let permit = guard.try_acquire("ねこ", VoiceProfile::Content).unwrap();
        assert_eq!(guard.state(), SpeechState::Requesting);
        assert!(guard.try_acquire("いぬ", VoiceProfile::Guidance).is_none());
        assert_eq!(guard.current().unwrap().text, "ねこ");

        permit.mark_playing();
        assert_eq!(guard.state(), SpeechState::Playing);
        assert!(guard.try_acquire("いぬ", VoiceProfile::Content).is_none());

        drop(permit);
        assert_eq!(guard.state(), SpeechState::Idle);
        assert!(guard.current().is_none());
        assert!(guard.try_acquire("いぬ", VoiceProfile::Content).is_some());
    }

    #[test]
    fn test_released_on_panic() {
        let guard = SpeakingGuard::new();
        let g = Arc::clone(&guard);
        let result = std::thread::spawn(move || {
            let _permit = g.try_acquire("x", VoiceProfile::Content).unwrap();
            panic!("playback blew up");
        })
        .join();
        assert!(result.is_err());
        assert!(!guard.is_speaking());
    }

    #[test]
    fn test_concurrent_acquire_only_one_wins() {
        let guard = SpeakingGuard::new();
        let barrier = Arc::new(std::sync::Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let guard = Arc::clone(&guard);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    guard.try_acquire(&i.to_string(), VoiceProfile::Content)
                })
            })
            .collect();
        let permits: Vec<_> = handles
            .into_iter()
            .filter_map(|h| h.join().unwrap())
            .collect();
        assert_eq!(permits.len(), 1);
    }
}
