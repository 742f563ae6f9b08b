//! JavaScript-facing progress handle.
//!
//! The UI layer owns one [`ProgressHandle`]; every mutation goes through the
//! wrapped [`ProgressStore`] and is saved to `localStorage` by the
//! subscription installed at construction.

use wasm_bindgen::prelude::*;

use crate::dom;
use crate::game::{
    Catalog, GameEngine, ProgressStore, STORAGE_KEY, WebDataLoader, WebProgressStorage,
    create_web_game_engine, next_unlock, unlocked_scene_ids,
};

#[wasm_bindgen]
pub struct ProgressHandle {
    engine: GameEngine<WebDataLoader, WebProgressStorage>,
    catalog: Catalog,
    store: ProgressStore,
}

#[wasm_bindgen]
impl ProgressHandle {
    /// Load the bundled catalog and restore the saved progress.
    ///
    /// # Errors
    ///
    /// Returns a JS `Error` if the bundled catalog is invalid.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<ProgressHandle, JsValue> {
        let engine = create_web_game_engine();
        let (catalog, mut store) = engine
            .bootstrap(STORAGE_KEY)
            .map_err(|err| dom::js_error(&format!("{err:#}")))?;
        engine.persist_on_change(&mut store, STORAGE_KEY);
        Ok(Self {
            engine,
            catalog,
            store,
        })
    }

    #[wasm_bindgen(js_name = addXp)]
    pub fn add_xp(&mut self, amount: u32) {
        self.store.add_xp(amount);
    }

    #[wasm_bindgen(js_name = spendHint)]
    pub fn spend_hint(&mut self) {
        self.store.spend_hint();
    }

    #[wasm_bindgen(js_name = incrementWordsMastered)]
    pub fn increment_words_mastered(&mut self) {
        self.store.increment_words_mastered();
    }

    #[wasm_bindgen(js_name = catchItem)]
    pub fn catch_item(&mut self, item_id: u32) {
        self.store.catch_item(item_id);
    }

    #[wasm_bindgen(js_name = completeScene)]
    pub fn complete_scene(&mut self, scene_id: u32) {
        self.store.complete_scene(scene_id);
    }

    /// Return to the initial snapshot and drop the saved copy.
    #[wasm_bindgen(js_name = resetProgress)]
    pub fn reset_progress(&mut self) {
        if let Err(err) = self.engine.reset(STORAGE_KEY, &mut self.store) {
            log::warn!("failed to clear saved progress: {err}");
        }
    }

    /// Current snapshot as a plain JS object with the persisted field names.
    ///
    /// # Errors
    ///
    /// Returns a JS `Error` if the snapshot cannot be converted.
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.store.snapshot())
            .map_err(|err| dom::js_error(&err.to_string()))
    }

    /// `{ current, total }` for the level bar.
    ///
    /// # Errors
    ///
    /// Returns a JS `Error` if the value cannot be converted.
    #[wasm_bindgen(js_name = levelProgress)]
    pub fn level_progress(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.store.snapshot().level_progress())
            .map_err(|err| dom::js_error(&err.to_string()))
    }

    #[wasm_bindgen(js_name = isSceneUnlocked)]
    pub fn is_scene_unlocked(&self, scene_id: u32) -> bool {
        self.catalog
            .is_scene_unlocked(scene_id, self.store.snapshot().xp())
    }

    #[wasm_bindgen(js_name = unlockedSceneIds)]
    pub fn unlocked_scene_ids(&self) -> Vec<u32> {
        unlocked_scene_ids(&self.catalog.scenes, self.store.snapshot().xp())
    }

    /// XP still missing before the next locked scene opens; `undefined` once
    /// every scene is open.
    #[wasm_bindgen(js_name = xpToNextUnlock)]
    pub fn xp_to_next_unlock(&self) -> Option<u32> {
        next_unlock(&self.catalog.scenes, self.store.snapshot().xp()).map(|next| next.xp_needed)
    }
}
