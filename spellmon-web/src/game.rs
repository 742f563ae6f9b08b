//! Web-specific game engine implementation
//!
//! This module provides browser implementations of the spellmon-game traits
//! and re-exports the core progression types.

use crate::dom;

// Re-export all types from spellmon-game
pub use spellmon_game::*;

/// Web-specific data loader backed by the bundled static assets
#[derive(Debug, Clone, Copy, Default)]
pub struct WebDataLoader;

#[derive(Debug, thiserror::Error)]
pub enum WebDataError {
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

impl WebDataLoader {
    /// Load the world map regions.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled region list cannot be parsed.
    pub fn load_regions(&self) -> Result<Vec<Region>, WebDataError> {
        let json = include_str!("../static/assets/data/regions.json");
        serde_json::from_str(json).map_err(WebDataError::Json)
    }
}

impl DataLoader for WebDataLoader {
    type Error = WebDataError;

    fn load_catalog(&self) -> Result<Catalog, Self::Error> {
        let catalog = Catalog::from_parts(
            include_str!("../static/assets/data/scenes.json"),
            include_str!("../static/assets/data/words.json"),
            include_str!("../static/assets/data/rewards.json"),
            include_str!("../static/assets/data/badges.json"),
        )?;
        catalog.validate()?;
        Ok(catalog)
    }
}

/// Web-specific progress storage using `localStorage`.
///
/// Saves live under the bare key (`game-state` for the main save), which is
/// where earlier versions of the game left theirs.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebProgressStorage;

#[derive(Debug, thiserror::Error)]
pub enum WebStorageError {
    #[error("localStorage is unavailable")]
    Unavailable,
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] StorageError),
}

impl WebProgressStorage {
    fn storage() -> Result<web_sys::Storage, WebStorageError> {
        dom::local_storage().ok_or(WebStorageError::Unavailable)
    }
}

impl ProgressStorage for WebProgressStorage {
    type Error = WebStorageError;

    fn save_progress(&self, key: &str, progress: &PlayerProgress) -> Result<(), Self::Error> {
        let raw = PersistedProgress::encode(progress)?;
        Self::storage()?
            .set_item(key, &raw)
            .map_err(|err| WebStorageError::Storage(dom::js_error_message(&err)))
    }

    fn load_progress(&self, key: &str) -> Result<Option<PlayerProgress>, Self::Error> {
        let raw = Self::storage()?
            .get_item(key)
            .map_err(|err| WebStorageError::Storage(dom::js_error_message(&err)))?;
        match raw {
            Some(raw) => Ok(Some(PersistedProgress::decode(&raw)?)),
            None => Ok(None),
        }
    }

    fn delete_progress(&self, key: &str) -> Result<(), Self::Error> {
        Self::storage()?
            .remove_item(key)
            .map_err(|err| WebStorageError::Storage(dom::js_error_message(&err)))
    }
}

/// Create a web-compatible game engine with `WebDataLoader` and `WebProgressStorage`
#[must_use]
pub const fn create_web_game_engine() -> GameEngine<WebDataLoader, WebProgressStorage> {
    GameEngine::new(WebDataLoader, WebProgressStorage)
}

