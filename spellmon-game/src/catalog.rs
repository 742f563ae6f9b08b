//! Static scene, reward, and badge data supplied at startup.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;

use crate::unlock::{UnlockThreshold, is_scene_unlocked};

/// A map region: a word range plus the XP needed to enter it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub unlock_xp: u32,
    /// First index (inclusive) into [`Catalog::words`].
    pub word_start: usize,
    /// Last index (inclusive) into [`Catalog::words`].
    pub word_end: usize,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub music: Option<String>,
}

impl UnlockThreshold for Scene {
    fn scene_id(&self) -> u32 {
        self.id
    }

    fn unlock_xp(&self) -> u32 {
        self.unlock_xp
    }
}

/// A collectible creature granted by correct spelling in one scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub id: u32,
    pub name: String,
    pub scene_id: u32,
}

/// Badge shown on the tracker once its scene is completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Problems found while validating catalog data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: u32 },
    #[error("scene {scene_id} has word range {start}..={end} outside 0..{len}")]
    WordRange {
        scene_id: u32,
        start: usize,
        end: usize,
        len: usize,
    },
    #[error("reward {reward_id} points at unknown scene {scene_id}")]
    UnknownScene { reward_id: u32, scene_id: u32 },
}

/// Container for all static game data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Catalog {
    pub scenes: Vec<Scene>,
    #[serde(default)]
    pub rewards: Vec<Reward>,
    #[serde(default)]
    pub badges: Vec<Badge>,
    #[serde(default)]
    pub words: Vec<String>,
}

impl Catalog {
    /// Create an empty catalog (useful for tests)
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load a catalog from a single JSON document
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a catalog.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Assemble a catalog from the per-file JSON assets.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the documents fails to parse.
    pub fn from_parts(
        scenes_json: &str,
        words_json: &str,
        rewards_json: &str,
        badges_json: &str,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            scenes: serde_json::from_str(scenes_json)?,
            words: serde_json::from_str(words_json)?,
            rewards: serde_json::from_str(rewards_json)?,
            badges: serde_json::from_str(badges_json)?,
        })
    }

    #[must_use]
    pub fn scene(&self, scene_id: u32) -> Option<&Scene> {
        self.scenes.iter().find(|scene| scene.id == scene_id)
    }

    /// Words assigned to a scene; empty when the range is out of bounds.
    #[must_use]
    pub fn scene_words(&self, scene: &Scene) -> &[String] {
        if scene.word_start > scene.word_end {
            return &[];
        }
        self.words
            .get(scene.word_start..=scene.word_end)
            .unwrap_or_default()
    }

    pub fn rewards_for_scene(&self, scene_id: u32) -> impl Iterator<Item = &Reward> {
        self.rewards
            .iter()
            .filter(move |reward| reward.scene_id == scene_id)
    }

    /// First reward of the scene that has not been collected yet.
    #[must_use]
    pub fn next_reward(&self, scene_id: u32, collected: &BTreeSet<u32>) -> Option<&Reward> {
        self.rewards_for_scene(scene_id)
            .find(|reward| !collected.contains(&reward.id))
    }

    #[must_use]
    pub fn reward(&self, reward_id: u32) -> Option<&Reward> {
        self.rewards.iter().find(|reward| reward.id == reward_id)
    }

    #[must_use]
    pub fn badge(&self, badge_id: u32) -> Option<&Badge> {
        self.badges.iter().find(|badge| badge.id == badge_id)
    }

    #[must_use]
    pub fn is_scene_unlocked(&self, scene_id: u32, xp: u32) -> bool {
        is_scene_unlocked(&self.scenes, scene_id, xp)
    }

    /// Check ids are unique and every reference resolves.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> Result<(), CatalogError> {
        check_unique("scene", self.scenes.iter().map(|scene| scene.id))?;
        check_unique("reward", self.rewards.iter().map(|reward| reward.id))?;
        check_unique("badge", self.badges.iter().map(|badge| badge.id))?;

        let len = self.words.len();
        for scene in &self.scenes {
            if scene.word_start > scene.word_end || scene.word_end >= len {
                return Err(CatalogError::WordRange {
                    scene_id: scene.id,
                    start: scene.word_start,
                    end: scene.word_end,
                    len,
                });
            }
        }

        for reward in &self.rewards {
            if self.scene(reward.scene_id).is_none() {
                return Err(CatalogError::UnknownScene {
                    reward_id: reward.id,
                    scene_id: reward.scene_id,
                });
            }
        }
        Ok(())
    }
}

fn check_unique(kind: &'static str, ids: impl Iterator<Item = u32>) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(CatalogError::DuplicateId { kind, id });
        }
    }
    Ok(())
}
