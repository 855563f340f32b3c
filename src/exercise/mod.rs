//! Sentence construction exercise ("Susun Kalimat").
//!
//! A target sentence is split into characters and shuffled into a pool.
//! The learner moves characters between the pool and the constructed
//! sequence one at a time, then checks the result against the target.
//! Characters are positional entries, so sentences with repeated glyphs
//! work without any value-identity tricks: only the multiset is conserved.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::debug;

use crate::content::SentencePair;

const CORRECT_MESSAGE: &str = "Benar! Kerja bagus!";
const INCORRECT_MESSAGE: &str = "Belum tepat. Coba lagi atau gunakan bantuan!";

/// Outcome of comparing the constructed sequence with the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Correct,
    Incorrect,
}

impl Verdict {
    pub fn message(self) -> &'static str {
        match self {
            Self::Correct => CORRECT_MESSAGE,
            Self::Incorrect => INCORRECT_MESSAGE,
        }
    }
}

/// Learner-facing feedback from the last `check()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feedback {
    pub kind: Verdict,
    pub message: &'static str,
}

impl From<Verdict> for Feedback {
    fn from(kind: Verdict) -> Self {
        Self {
            kind,
            message: kind.message(),
        }
    }
}

/// One unscramble exercise for a single target sentence.
#[derive(Debug, Clone)]
pub struct SentenceExercise {
    target: Vec<char>,
    meaning: String,
    pool: Vec<char>,
    constructed: Vec<char>,
    feedback: Option<Feedback>,
}

impl SentenceExercise {
    /// Build an exercise with the pool shuffled by `rng`.
    pub fn new<R: Rng + ?Sized>(target: &str, meaning: &str, rng: &mut R) -> Self {
        let target: Vec<char> = target.chars().collect();
        let mut pool = target.clone();
        pool.shuffle(rng);
        let constructed = Vec::with_capacity(target.len());
        Self {
            target,
            meaning: meaning.to_string(),
            pool,
            constructed,
            feedback: None,
        }
    }

    #[cfg(test)]
    pub fn target(&self) -> &[char] {
        &self.target
    }

    pub fn target_text(&self) -> String {
        self.target.iter().collect()
    }

    pub fn meaning(&self) -> &str {
        &self.meaning
    }

    pub fn pool(&self) -> &[char] {
        &self.pool
    }

    pub fn constructed(&self) -> &[char] {
        &self.constructed
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    /// Move the pool entry at `position` to the end of the constructed
    /// sequence. Returns `false` (and changes nothing) for a bad position.
    pub fn place_from_pool(&mut self, position: usize) -> bool {
        if position >= self.pool.len() {
            debug!(position, pool_len = self.pool.len(), "place_from_pool: position out of range");
            return false;
        }
        let ch = self.pool.remove(position);
        self.constructed.push(ch);
        self.feedback = None;
        true
    }

    /// Move the constructed entry at `position` back to the end of the pool.
    pub fn return_to_pool(&mut self, position: usize) -> bool {
        if position >= self.constructed.len() {
            debug!(
                position,
                constructed_len = self.constructed.len(),
                "return_to_pool: position out of range"
            );
            return false;
        }
        let ch = self.constructed.remove(position);
        self.pool.push(ch);
        self.feedback = None;
        true
    }

    /// Exact, character-for-character comparison against the target.
    pub fn check(&mut self) -> Verdict {
        let verdict = if self.constructed == self.target {
            Verdict::Correct
        } else {
            Verdict::Incorrect
        };
        debug!(
            target = %self.target_text(),
            attempt = %self.constructed.iter().collect::<String>(),
            ?verdict,
            "check"
        );
        self.feedback = Some(verdict.into());
        verdict
    }

    pub fn is_solved(&self) -> bool {
        matches!(self.feedback, Some(Feedback { kind: Verdict::Correct, .. }))
    }

    pub fn hint_available(&self) -> bool {
        self.constructed.len() < self.target.len() && !self.is_solved()
    }

    /// Place the next correct character, if it is still in the pool.
    pub fn hint(&mut self) -> bool {
        if !self.hint_available() {
            return false;
        }
        let next = self.target[self.constructed.len()];
        match self.pool.iter().position(|&c| c == next) {
            Some(position) => self.place_from_pool(position),
            None => {
                debug!(%next, "hint: next character not in pool");
                false
            }
        }
    }

    /// Return every character to the pool and reshuffle.
    pub fn reshuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.pool.clear();
        self.pool.extend_from_slice(&self.target);
        self.pool.shuffle(rng);
        self.constructed.clear();
        self.feedback = None;
    }
}

/// Serializable view of the current exercise for the front end.
#[derive(Debug, Clone, Serialize)]
pub struct ExerciseSnapshot {
    pub index: usize,
    pub total: usize,
    pub meaning: String,
    pub pool: Vec<char>,
    pub constructed: Vec<char>,
    pub feedback: Option<Feedback>,
    pub hint_available: bool,
}

/// Drives exercises over a fixed ordered list of sentences.
///
/// An empty list leaves the set permanently unavailable.
pub struct ExerciseSet<R = StdRng> {
    sentences: Vec<SentencePair>,
    index: usize,
    current: Option<SentenceExercise>,
    rng: R,
}

impl ExerciseSet<StdRng> {
    /// Seeded when `seed` is given, otherwise from OS entropy.
    pub fn with_seed(sentences: Vec<SentencePair>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(sentences, rng)
    }
}

impl<R: Rng> ExerciseSet<R> {
    pub fn new(sentences: Vec<SentencePair>, rng: R) -> Self {
        let mut set = Self {
            sentences,
            index: 0,
            current: None,
            rng,
        };
        set.load(0);
        set
    }

    pub fn is_available(&self) -> bool {
        self.current.is_some()
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> Option<&SentenceExercise> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut SentenceExercise> {
        self.current.as_mut()
    }

    /// Start a fresh exercise for `index`. Out-of-range indices are ignored.
    pub fn load(&mut self, index: usize) -> bool {
        let Some(pair) = self.sentences.get(index) else {
            debug!(index, total = self.sentences.len(), "load: index out of range");
            return false;
        };
        self.current = Some(SentenceExercise::new(&pair.ja, &pair.meaning, &mut self.rng));
        self.index = index;
        true
    }

    /// Reshuffle the current sentence and drop all progress.
    pub fn reset(&mut self) -> bool {
        match self.current.as_mut() {
            Some(ex) => {
                ex.reshuffle(&mut self.rng);
                true
            }
            None => false,
        }
    }

    /// Move on to the next sentence, wrapping after the last one.
    pub fn advance(&mut self) -> bool {
        if self.is_empty() {
            return false;
        }
        self.load((self.index + 1) % self.len())
    }

    pub fn snapshot(&self) -> Option<ExerciseSnapshot> {
        self.current().map(|ex| ExerciseSnapshot {
            index: self.index(),
            total: self.len(),
            meaning: ex.meaning().to_string(),
            pool: ex.pool().to_vec(),
            constructed: ex.constructed().to_vec(),
            feedback: ex.feedback().cloned(),
            hint_available: ex.hint_available(),
        })
    }
}
