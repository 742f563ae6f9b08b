use std::fmt;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

/// Decision interface for a simulated learner.
pub trait LearnerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Whether to reveal one more letter before typing the answer.
    fn wants_hint(&mut self, word: &str, revealed: usize, charges: u8) -> bool;

    /// The spelling submitted on the given attempt (0-based).
    fn spell(&mut self, word: &str, attempt: u32) -> String;
}

/// Built-in learner strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LearnerStrategy {
    Perfect,
    Sloppy,
    HintHeavy,
    Random,
}

impl LearnerStrategy {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Perfect => "Perfect",
            Self::Sloppy => "Sloppy",
            Self::HintHeavy => "Hint Heavy",
            Self::Random => "Random",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn LearnerPolicy> {
        match self {
            Self::Perfect => Box::new(PerfectLearner),
            Self::Sloppy => Box::new(SloppyLearner::new(seed, SLOPPY_MISTAKE_RATE)),
            Self::HintHeavy => Box::new(HintHeavyLearner),
            Self::Random => Box::new(RandomLearner::new(seed)),
        }
    }
}

impl fmt::Display for LearnerStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const SLOPPY_MISTAKE_RATE: f64 = 0.35;
const RANDOM_MISTAKE_RATE: f64 = 0.2;
const RANDOM_HINT_RATE: f64 = 0.3;

struct PerfectLearner;
struct HintHeavyLearner;

struct SloppyLearner {
    rng: ChaCha20Rng,
    mistake_rate: f64,
}

impl SloppyLearner {
    fn new(seed: u64, mistake_rate: f64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            mistake_rate,
        }
    }
}

struct RandomLearner {
    rng: ChaCha20Rng,
}

impl RandomLearner {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed ^ 0x5EED_CAFE),
        }
    }
}

/// Swap one letter of `word` for a different one.
fn misspell(word: &str, rng: &mut ChaCha20Rng) -> String {
    let mut letters: Vec<char> = word.chars().collect();
    if letters.is_empty() {
        return "x".to_string();
    }
    let index = rng.gen_range(0..letters.len());
    let original = letters[index].to_ascii_lowercase();
    let shift: u8 = rng.gen_range(1..26);
    let base = if original.is_ascii_lowercase() {
        original as u8 - b'a'
    } else {
        0
    };
    letters[index] = char::from(b'a' + (base + shift) % 26);
    letters.into_iter().collect()
}

impl LearnerPolicy for PerfectLearner {
    fn name(&self) -> &'static str {
        "perfect"
    }

    fn wants_hint(&mut self, _word: &str, _revealed: usize, _charges: u8) -> bool {
        false
    }

    fn spell(&mut self, word: &str, _attempt: u32) -> String {
        word.to_string()
    }
}

impl LearnerPolicy for HintHeavyLearner {
    fn name(&self) -> &'static str {
        "hint-heavy"
    }

    fn wants_hint(&mut self, word: &str, revealed: usize, charges: u8) -> bool {
        charges > 0 && revealed < word.len()
    }

    fn spell(&mut self, word: &str, _attempt: u32) -> String {
        word.to_string()
    }
}

impl LearnerPolicy for SloppyLearner {
    fn name(&self) -> &'static str {
        "sloppy"
    }

    fn wants_hint(&mut self, _word: &str, _revealed: usize, _charges: u8) -> bool {
        false
    }

    fn spell(&mut self, word: &str, _attempt: u32) -> String {
        if self.rng.gen_bool(self.mistake_rate) {
            misspell(word, &mut self.rng)
        } else {
            word.to_string()
        }
    }
}

impl LearnerPolicy for RandomLearner {
    fn name(&self) -> &'static str {
        "random"
    }

    fn wants_hint(&mut self, word: &str, revealed: usize, charges: u8) -> bool {
        charges > 0 && revealed < word.len() && self.rng.gen_bool(RANDOM_HINT_RATE)
    }

    fn spell(&mut self, word: &str, _attempt: u32) -> String {
        if self.rng.gen_bool(RANDOM_MISTAKE_RATE) {
            misspell(word, &mut self.rng)
        } else {
            word.to_string()
        }
    }
}
