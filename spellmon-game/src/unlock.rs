//! Scene unlock gating.
//!
//! Pure queries over a scene catalog: they never mutate progress and are safe
//! to call on every render.
use serde::{Deserialize, Serialize};

/// Anything that carries a scene id and the XP needed to enter it.
pub trait UnlockThreshold {
    fn scene_id(&self) -> u32;
    fn unlock_xp(&self) -> u32;
}

/// Minimal scene record: just the id and its XP threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneUnlock {
    pub id: u32,
    pub unlock_xp: u32,
}

impl UnlockThreshold for SceneUnlock {
    fn scene_id(&self) -> u32 {
        self.id
    }

    fn unlock_xp(&self) -> u32 {
        self.unlock_xp
    }
}

/// The next locked scene and how much XP is still missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextUnlock {
    pub scene_id: u32,
    pub unlock_xp: u32,
    pub xp_needed: u32,
}

/// Returns true if the scene exists and `xp` meets its threshold.
///
/// Unknown scene ids are never unlocked.
#[must_use]
pub fn is_scene_unlocked<S: UnlockThreshold>(scenes: &[S], scene_id: u32, xp: u32) -> bool {
    scenes
        .iter()
        .find(|scene| scene.scene_id() == scene_id)
        .is_some_and(|scene| xp >= scene.unlock_xp())
}

/// Ids of every scene enterable at `xp`, in catalog order.
#[must_use]
pub fn unlocked_scene_ids<S: UnlockThreshold>(scenes: &[S], xp: u32) -> Vec<u32> {
    scenes
        .iter()
        .filter(|scene| xp >= scene.unlock_xp())
        .map(UnlockThreshold::scene_id)
        .collect()
}

/// The locked scene with the lowest threshold, if any remain.
#[must_use]
pub fn next_unlock<S: UnlockThreshold>(scenes: &[S], xp: u32) -> Option<NextUnlock> {
    scenes
        .iter()
        .filter(|scene| xp < scene.unlock_xp())
        .min_by_key(|scene| scene.unlock_xp())
        .map(|scene| NextUnlock {
            scene_id: scene.scene_id(),
            unlock_xp: scene.unlock_xp(),
            xp_needed: scene.unlock_xp() - xp,
        })
}
