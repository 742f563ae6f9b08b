//! Word-by-word spelling session for one scene.
//!
//! The session owns the transient per-scene state (which word is up, what has
//! been typed, whether the word is already answered) and reports results to a
//! borrowed [`ProgressStore`], which stays the only holder of persistent
//! progress.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{Catalog, Scene};
use crate::constants::WORD_XP_REWARD;
use crate::progress::ProgressStore;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChallengeError {
    #[error("unknown scene {0}")]
    UnknownScene(u32),
    #[error("scene {0} has no words")]
    NoWords(u32),
}

/// Result of checking the typed answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmitOutcome {
    /// Word spelled correctly; `caught` is the reward collected for it, if
    /// the scene still had one left.
    Correct { caught: Option<u32> },
    Incorrect,
    /// Word already answered; nothing was recorded.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HintOutcome {
    Revealed(char),
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdvanceOutcome {
    NextWord,
    SceneComplete,
    /// Current word not spelled yet; the session stays where it is.
    NotAnswered,
}

/// Spelling challenge bound to one scene's word list.
#[derive(Debug, Clone)]
pub struct SpellingChallenge {
    scene: Scene,
    words: Vec<String>,
    reward_ids: Vec<u32>,
    index: usize,
    input: String,
    answered: bool,
    finished: bool,
}

impl SpellingChallenge {
    /// Start a challenge at the first word of `scene_id`.
    ///
    /// # Errors
    ///
    /// Returns an error when the scene is missing from the catalog or its
    /// word range is empty.
    pub fn new(catalog: &Catalog, scene_id: u32) -> Result<Self, ChallengeError> {
        let scene = catalog
            .scene(scene_id)
            .ok_or(ChallengeError::UnknownScene(scene_id))?;
        let words: Vec<String> = catalog
            .scene_words(scene)
            .iter()
            .map(|word| word.to_ascii_lowercase())
            .collect();
        if words.is_empty() {
            return Err(ChallengeError::NoWords(scene_id));
        }
        let reward_ids = catalog
            .rewards_for_scene(scene_id)
            .map(|reward| reward.id)
            .collect();
        Ok(Self {
            scene: scene.clone(),
            words,
            reward_ids,
            index: 0,
            input: String::new(),
            answered: false,
            finished: false,
        })
    }

    #[must_use]
    pub const fn scene(&self) -> &Scene {
        &self.scene
    }

    #[must_use]
    pub fn current_word(&self) -> &str {
        self.words.get(self.index).map_or("", String::as_str)
    }

    #[must_use]
    pub const fn word_index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    #[must_use]
    pub const fn is_answered(&self) -> bool {
        self.answered
    }

    #[must_use]
    pub const fn is_scene_finished(&self) -> bool {
        self.finished
    }

    /// Typed letters upper-cased, with `_` for every letter still missing.
    #[must_use]
    pub fn blanks(&self) -> String {
        let mut typed = self.input.chars();
        self.current_word()
            .chars()
            .map(|_| typed.next().map_or('_', |c| c.to_ascii_uppercase()))
            .collect()
    }

    /// Replace the typed text, keeping ASCII letters only.
    ///
    /// Input longer than the current word is ignored.
    pub fn set_input(&mut self, raw: &str) {
        if self.answered {
            return;
        }
        let sanitized: String = raw
            .chars()
            .filter(char::is_ascii_alphabetic)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        if sanitized.len() <= self.current_word().len() {
            self.input = sanitized;
        }
    }

    /// On-screen keyboard press.
    pub fn push_letter(&mut self, letter: char) {
        if self.answered
            || !letter.is_ascii_alphabetic()
            || self.input.len() >= self.current_word().len()
        {
            return;
        }
        self.input.push(letter.to_ascii_lowercase());
    }

    /// Drop the last typed letter. An answered word is frozen, so this does
    /// nothing until the session advances.
    pub fn backspace(&mut self) {
        if !self.answered {
            self.input.pop();
        }
    }

    /// Reveal the next correct letter, paying one hint charge.
    pub fn use_hint(&mut self, store: &mut ProgressStore) -> HintOutcome {
        if self.answered || !store.snapshot().can_use_hint() {
            return HintOutcome::Unavailable;
        }
        let Some(next) = self.current_word().chars().nth(self.input.len()) else {
            return HintOutcome::Unavailable;
        };
        self.input.push(next);
        store.spend_hint();
        HintOutcome::Revealed(next)
    }

    /// Check the typed answer and record a correct one.
    pub fn submit(&mut self, store: &mut ProgressStore) -> SubmitOutcome {
        if self.answered || self.finished || self.current_word().is_empty() {
            return SubmitOutcome::Ignored;
        }
        if !self.input.eq_ignore_ascii_case(self.current_word()) {
            log::debug!(
                "scene {} word {}: incorrect attempt",
                self.scene.id,
                self.index
            );
            return SubmitOutcome::Incorrect;
        }

        self.answered = true;
        store.add_xp(WORD_XP_REWARD);
        store.increment_words_mastered();

        let caught = self
            .reward_ids
            .iter()
            .copied()
            .find(|id| !store.snapshot().has_collected(*id));
        if let Some(reward_id) = caught {
            store.catch_item(reward_id);
        }
        SubmitOutcome::Correct { caught }
    }

    /// Move past an answered word, completing the scene after the last one.
    ///
    /// Words cannot be skipped: until the current word is spelled this
    /// returns [`AdvanceOutcome::NotAnswered`] and records nothing.
    pub fn advance(&mut self, store: &mut ProgressStore) -> AdvanceOutcome {
        if self.finished {
            return AdvanceOutcome::SceneComplete;
        }
        if !self.answered {
            return AdvanceOutcome::NotAnswered;
        }
        if self.index + 1 < self.words.len() {
            self.index += 1;
            self.input.clear();
            self.answered = false;
            return AdvanceOutcome::NextWord;
        }
        self.finished = true;
        store.complete_scene(self.scene.id);
        AdvanceOutcome::SceneComplete
    }
}
