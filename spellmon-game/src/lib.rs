//! Spellmon Game Engine
//!
//! Platform-agnostic progression logic for the Spellmon spelling game.
//! This crate provides the progression store, scene gating, and the spelling
//! challenge without UI or platform-specific dependencies.

pub mod catalog;
pub mod challenge;
pub mod constants;
pub mod map;
pub mod progress;
pub mod storage;
pub mod unlock;

use anyhow::Context;

// Re-export commonly used types
pub use catalog::{Badge, Catalog, CatalogError, Reward, Scene};
pub use challenge::{
    AdvanceOutcome, ChallengeError, HintOutcome, SpellingChallenge, SubmitOutcome,
};
pub use constants::{
    HINT_BONUS_INTERVAL, HINT_MAX, LEVEL_UP_XP_BASE, STORAGE_KEY, WORD_XP_REWARD,
};
pub use map::{MapDirection, MapGrid, Region, RegionState, region_states};
pub use progress::{
    LevelProgress, PlayerProgress, ProgressChange, ProgressStore, SubscriptionId,
};
pub use storage::{JsonFileStorage, MemoryStorage, PersistedProgress, StorageError};
pub use unlock::{
    NextUnlock, SceneUnlock, UnlockThreshold, is_scene_unlocked, next_unlock, unlocked_scene_ids,
};

/// Trait for abstracting data loading operations
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the scene, reward, badge, and word catalog
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded or parsed.
    fn load_catalog(&self) -> Result<Catalog, Self::Error>;
}

/// Trait for abstracting save/load operations
/// Platform-specific implementations should provide this
pub trait ProgressStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save a progress snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be saved.
    fn save_progress(&self, key: &str, progress: &PlayerProgress) -> Result<(), Self::Error>;

    /// Load a progress snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot exists but cannot be read or parsed.
    fn load_progress(&self, key: &str) -> Result<Option<PlayerProgress>, Self::Error>;

    /// Delete a saved snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be deleted.
    fn delete_progress(&self, key: &str) -> Result<(), Self::Error>;
}

/// Main engine wiring data loading and persistence around a [`ProgressStore`]
pub struct GameEngine<L, S>
where
    L: DataLoader,
    S: ProgressStorage,
{
    data_loader: L,
    storage: S,
}

impl<L, S> GameEngine<L, S>
where
    L: DataLoader,
    S: ProgressStorage,
{
    /// Create a new game engine with the provided data loader and storage
    pub const fn new(data_loader: L, storage: S) -> Self {
        Self {
            data_loader,
            storage,
        }
    }

    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Load the static catalog
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    pub fn load_catalog(&self) -> Result<Catalog, L::Error> {
        self.data_loader.load_catalog()
    }

    /// Open a store from the saved snapshot under `key`.
    ///
    /// A missing, unreadable, or malformed save yields the initial snapshot;
    /// storage failures are logged and never reach the caller.
    pub fn open_store(&self, key: &str) -> ProgressStore {
        match self.storage.load_progress(key) {
            Ok(Some(progress)) => {
                log::debug!("restored progress from '{key}'");
                ProgressStore::from_progress(progress)
            }
            Ok(None) => ProgressStore::new(),
            Err(err) => {
                log::warn!("discarding unreadable progress '{key}': {err}");
                ProgressStore::new()
            }
        }
    }

    /// Save a snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be saved.
    pub fn save(&self, key: &str, progress: &PlayerProgress) -> Result<(), S::Error> {
        self.storage.save_progress(key, progress)
    }

    /// Reset the store and drop the saved snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the saved snapshot cannot be deleted.
    pub fn reset(&self, key: &str, store: &mut ProgressStore) -> Result<(), S::Error> {
        store.reset_progress();
        self.storage.delete_progress(key)
    }

    /// Save after every state-changing transition, best effort.
    ///
    /// Failures are logged; they never interrupt play.
    pub fn persist_on_change(&self, store: &mut ProgressStore, key: &str) -> SubscriptionId
    where
        S: Clone + 'static,
    {
        let storage = self.storage.clone();
        let key = key.to_string();
        store.subscribe(move |progress, change| {
            if change.is_noop() {
                return;
            }
            if let Err(err) = storage.save_progress(&key, progress) {
                log::warn!("failed to save progress '{key}': {err}");
            }
        })
    }

    /// Load and validate the catalog, then open the saved store.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded or is inconsistent.
    pub fn bootstrap(&self, key: &str) -> Result<(Catalog, ProgressStore), anyhow::Error> {
        let catalog = self
            .data_loader
            .load_catalog()
            .context("loading catalog")?;
        catalog.validate().context("validating catalog")?;
        Ok((catalog, self.open_store(key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[derive(Clone, Copy, Default)]
    struct FixtureLoader;

    impl DataLoader for FixtureLoader {
        type Error = Infallible;

        fn load_catalog(&self) -> Result<Catalog, Self::Error> {
            Ok(Catalog::from_json(
                r#"{
                    "scenes": [{"id": 1, "name": "Grove", "word_start": 0, "word_end": 0}],
                    "rewards": [{"id": 4, "name": "Charmander", "scene_id": 1}],
                    "words": ["fire"]
                }"#,
            )
            .unwrap())
        }
    }

    #[derive(Clone, Copy, Default)]
    struct BrokenLoader;

    impl DataLoader for BrokenLoader {
        type Error = serde_json::Error;

        fn load_catalog(&self) -> Result<Catalog, Self::Error> {
            Catalog::from_json("{")
        }
    }

    #[test]
    fn engine_saves_and_restores_progress() {
        let engine = GameEngine::new(FixtureLoader, MemoryStorage::new());
        let mut store = engine.open_store(STORAGE_KEY);
        store.add_xp(150);
        store.catch_item(4);
        engine.save(STORAGE_KEY, store.snapshot()).unwrap();

        let restored = engine.open_store(STORAGE_KEY);
        assert_eq!(restored.snapshot(), store.snapshot());
        assert_eq!(engine.open_store("missing").snapshot(), &PlayerProgress::initial());
    }

    #[test]
    fn malformed_save_falls_back_to_initial() {
        let storage = MemoryStorage::new();
        storage.insert_raw(STORAGE_KEY, "{\"state\": {\"xp\": -4}}");
        let engine = GameEngine::new(FixtureLoader, storage);
        assert_eq!(
            engine.open_store(STORAGE_KEY).snapshot(),
            &PlayerProgress::initial()
        );
    }

    #[test]
    fn persist_on_change_saves_every_mutation() {
        let storage = MemoryStorage::new();
        let engine = GameEngine::new(FixtureLoader, storage.clone());
        let mut store = engine.open_store(STORAGE_KEY);
        engine.persist_on_change(&mut store, STORAGE_KEY);

        store.add_xp(30);
        store.complete_scene(1);
        let saved = storage.load_progress(STORAGE_KEY).unwrap().unwrap();
        assert_eq!(&saved, store.snapshot());
        assert!(saved.has_badge(1));
    }

    #[test]
    fn persist_on_change_skips_noops() {
        let storage = MemoryStorage::new();
        let engine = GameEngine::new(FixtureLoader, storage.clone());
        let mut store = engine.open_store(STORAGE_KEY);
        engine.persist_on_change(&mut store, STORAGE_KEY);
        store.add_xp(0);
        assert!(storage.is_empty());
    }

    #[test]
    fn reset_clears_saved_snapshot() {
        let storage = MemoryStorage::new();
        let engine = GameEngine::new(FixtureLoader, storage.clone());
        let mut store = engine.open_store(STORAGE_KEY);
        store.add_xp(80);
        engine.save(STORAGE_KEY, store.snapshot()).unwrap();
        engine.reset(STORAGE_KEY, &mut store).unwrap();
        assert_eq!(store.snapshot(), &PlayerProgress::initial());
        assert!(storage.raw(STORAGE_KEY).is_none());
    }

    #[test]
    fn bootstrap_validates_catalog() {
        let engine = GameEngine::new(FixtureLoader, MemoryStorage::new());
        let (catalog, store) = engine.bootstrap(STORAGE_KEY).unwrap();
        assert_eq!(catalog.scenes.len(), 1);
        assert_eq!(store.snapshot().level(), 1);

        let broken = GameEngine::new(BrokenLoader, MemoryStorage::new());
        let err = broken.bootstrap(STORAGE_KEY).unwrap_err();
        assert!(format!("{err:#}").contains("loading catalog"));
    }
}
