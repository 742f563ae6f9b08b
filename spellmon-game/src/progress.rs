//! Player progression snapshot and the store that owns it.
//!
//! [`PlayerProgress`] carries the persisted numbers (XP, level, hint charges,
//! collections) and implements every progression rule as an infallible
//! transition. [`ProgressStore`] is the single writer the UI layer holds: it
//! applies transitions, notifies subscribers, and hands back the new snapshot.
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::constants::{
    HINT_BONUS_INTERVAL, HINT_MAX, LEVEL_UP_XP_BASE, STARTING_LEVEL, debug_log_enabled,
};

/// Persistent progression state for one player.
///
/// Field names serialize in camelCase and collections keep the names used by
/// earlier saves, so existing snapshots load unchanged. Missing fields fall
/// back to the initial snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerProgress {
    xp: u32,
    level: u32,
    xp_to_next_level: u32,
    hint_charges: u8,
    words_mastered: u32,
    #[serde(rename = "collectedPokemonIds")]
    collected_item_ids: BTreeSet<u32>,
    #[serde(rename = "completedScenes")]
    completed_scene_ids: BTreeSet<u32>,
    #[serde(rename = "earnedBadges")]
    earned_badge_ids: BTreeSet<u32>,
}

impl Default for PlayerProgress {
    fn default() -> Self {
        Self::initial()
    }
}

/// What a single transition did to the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressChange {
    XpGained { amount: u32, xp: u32 },
    LeveledUp { amount: u32, xp: u32, level: u32 },
    HintSpent { remaining: u8 },
    HintUnavailable,
    WordMastered { words_mastered: u32, hint_granted: bool },
    ItemCaught { item_id: u32 },
    ItemAlreadyCaught { item_id: u32 },
    SceneCompleted { scene_id: u32 },
    SceneAlreadyCompleted { scene_id: u32 },
    Reset,
}

impl ProgressChange {
    /// True when the transition left every field untouched.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        matches!(
            self,
            Self::XpGained { amount: 0, .. }
                | Self::HintUnavailable
                | Self::ItemAlreadyCaught { .. }
                | Self::SceneAlreadyCompleted { .. }
        )
    }
}

impl fmt::Display for ProgressChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::XpGained { amount, xp } => write!(f, "+{amount} xp ({xp} total)"),
            Self::LeveledUp { amount, xp, level } => {
                write!(f, "+{amount} xp ({xp} total), reached level {level}")
            }
            Self::HintSpent { remaining } => write!(f, "hint spent ({remaining} left)"),
            Self::HintUnavailable => write!(f, "no hint charges left"),
            Self::WordMastered {
                words_mastered,
                hint_granted,
            } => {
                write!(f, "word mastered (#{words_mastered})")?;
                if *hint_granted {
                    write!(f, ", bonus hint")?;
                }
                Ok(())
            }
            Self::ItemCaught { item_id } => write!(f, "caught #{item_id}"),
            Self::ItemAlreadyCaught { item_id } => write!(f, "#{item_id} already caught"),
            Self::SceneCompleted { scene_id } => write!(f, "scene {scene_id} completed"),
            Self::SceneAlreadyCompleted { scene_id } => {
                write!(f, "scene {scene_id} already completed")
            }
            Self::Reset => write!(f, "progress reset"),
        }
    }
}

/// XP earned inside the current level versus the span of that level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub current: u32,
    pub total: u32,
}

impl LevelProgress {
    /// Fill fraction for a progress bar, clamped to `0.0..=1.0`.
    #[must_use]
    pub fn ratio(self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (f64::from(self.current) / f64::from(self.total)).min(1.0)
    }
}

fn threshold_for(level: u32) -> u32 {
    level.saturating_mul(LEVEL_UP_XP_BASE)
}

impl PlayerProgress {
    /// The snapshot every new or reset player starts from.
    #[must_use]
    pub fn initial() -> Self {
        Self {
            xp: 0,
            level: STARTING_LEVEL,
            xp_to_next_level: threshold_for(STARTING_LEVEL),
            hint_charges: HINT_MAX,
            words_mastered: 0,
            collected_item_ids: BTreeSet::new(),
            completed_scene_ids: BTreeSet::new(),
            earned_badge_ids: BTreeSet::new(),
        }
    }

    #[must_use]
    pub const fn xp(&self) -> u32 {
        self.xp
    }

    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    #[must_use]
    pub const fn xp_to_next_level(&self) -> u32 {
        self.xp_to_next_level
    }

    #[must_use]
    pub const fn hint_charges(&self) -> u8 {
        self.hint_charges
    }

    #[must_use]
    pub const fn words_mastered(&self) -> u32 {
        self.words_mastered
    }

    #[must_use]
    pub const fn collected_item_ids(&self) -> &BTreeSet<u32> {
        &self.collected_item_ids
    }

    #[must_use]
    pub const fn completed_scene_ids(&self) -> &BTreeSet<u32> {
        &self.completed_scene_ids
    }

    #[must_use]
    pub const fn earned_badge_ids(&self) -> &BTreeSet<u32> {
        &self.earned_badge_ids
    }

    #[must_use]
    pub fn has_collected(&self, item_id: u32) -> bool {
        self.collected_item_ids.contains(&item_id)
    }

    #[must_use]
    pub fn has_completed_scene(&self, scene_id: u32) -> bool {
        self.completed_scene_ids.contains(&scene_id)
    }

    #[must_use]
    pub fn has_badge(&self, badge_id: u32) -> bool {
        self.earned_badge_ids.contains(&badge_id)
    }

    #[must_use]
    pub const fn can_use_hint(&self) -> bool {
        self.hint_charges > 0
    }

    /// Progress inside the current level, as shown on the tracker screen.
    #[must_use]
    pub fn level_progress(&self) -> LevelProgress {
        let floor = threshold_for(self.level.saturating_sub(1));
        LevelProgress {
            current: self.xp.saturating_sub(floor),
            total: self.xp_to_next_level.saturating_sub(floor),
        }
    }

    /// Grant XP, evaluating at most one threshold crossing.
    ///
    /// The reported `amount` is what was actually added, which is less than
    /// requested once XP saturates.
    pub fn add_xp(&mut self, amount: u32) -> ProgressChange {
        let before = self.xp;
        self.xp = self.xp.saturating_add(amount);
        let gained = self.xp - before;
        if self.xp >= self.xp_to_next_level && self.level < u32::MAX {
            self.level += 1;
            self.xp_to_next_level = threshold_for(self.level);
            return ProgressChange::LeveledUp {
                amount: gained,
                xp: self.xp,
                level: self.level,
            };
        }
        ProgressChange::XpGained {
            amount: gained,
            xp: self.xp,
        }
    }

    /// Consume one hint charge; a no-op when none are left.
    pub fn spend_hint(&mut self) -> ProgressChange {
        if self.hint_charges == 0 {
            return ProgressChange::HintUnavailable;
        }
        self.hint_charges -= 1;
        ProgressChange::HintSpent {
            remaining: self.hint_charges,
        }
    }

    /// Count a correctly spelled word, refunding a hint on every fifth one.
    pub fn increment_words_mastered(&mut self) -> ProgressChange {
        self.words_mastered = self.words_mastered.saturating_add(1);
        let hint_granted =
            self.words_mastered % HINT_BONUS_INTERVAL == 0 && self.hint_charges < HINT_MAX;
        if hint_granted {
            self.hint_charges += 1;
        }
        ProgressChange::WordMastered {
            words_mastered: self.words_mastered,
            hint_granted,
        }
    }

    pub fn catch_item(&mut self, item_id: u32) -> ProgressChange {
        if self.collected_item_ids.insert(item_id) {
            ProgressChange::ItemCaught { item_id }
        } else {
            ProgressChange::ItemAlreadyCaught { item_id }
        }
    }

    /// Mark a scene finished and award its badge in the same transition.
    pub fn complete_scene(&mut self, scene_id: u32) -> ProgressChange {
        if self.completed_scene_ids.contains(&scene_id) {
            return ProgressChange::SceneAlreadyCompleted { scene_id };
        }
        self.completed_scene_ids.insert(scene_id);
        self.earned_badge_ids.insert(scene_id);
        ProgressChange::SceneCompleted { scene_id }
    }

    pub fn reset(&mut self) -> ProgressChange {
        *self = Self::initial();
        ProgressChange::Reset
    }

    /// Pull a deserialized snapshot back inside the progression invariants.
    ///
    /// Saves are external input: hint charges are capped at [`HINT_MAX`],
    /// the level floor is [`STARTING_LEVEL`], a zero threshold is recomputed
    /// from the level, and scene/badge sets are re-joined as their union.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.level = self.level.max(STARTING_LEVEL);
        if self.xp_to_next_level == 0 {
            self.xp_to_next_level = threshold_for(self.level);
        }
        self.hint_charges = self.hint_charges.min(HINT_MAX);
        let joined: BTreeSet<u32> = self
            .completed_scene_ids
            .union(&self.earned_badge_ids)
            .copied()
            .collect();
        self.completed_scene_ids.clone_from(&joined);
        self.earned_badge_ids = joined;
        self
    }
}

/// Callback invoked after every applied transition.
pub type Subscriber = Box<dyn FnMut(&PlayerProgress, &ProgressChange)>;

/// Handle returned by [`ProgressStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Single authoritative owner of a [`PlayerProgress`].
pub struct ProgressStore {
    progress: PlayerProgress,
    last_change: Option<ProgressChange>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl fmt::Debug for ProgressStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressStore")
            .field("progress", &self.progress)
            .field("last_change", &self.last_change)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl Default for ProgressStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressStore {
    /// Create a store holding the initial snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::from_progress(PlayerProgress::initial())
    }

    /// Create a store around a previously saved snapshot.
    #[must_use]
    pub fn from_progress(progress: PlayerProgress) -> Self {
        Self {
            progress: progress.normalized(),
            last_change: None,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    #[must_use]
    pub const fn snapshot(&self) -> &PlayerProgress {
        &self.progress
    }

    /// The most recent transition, if any has been applied.
    #[must_use]
    pub const fn last_change(&self) -> Option<&ProgressChange> {
        self.last_change.as_ref()
    }

    #[must_use]
    pub fn into_progress(self) -> PlayerProgress {
        self.progress
    }

    /// Register a callback run after every transition.
    pub fn subscribe(
        &mut self,
        subscriber: impl FnMut(&PlayerProgress, &ProgressChange) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    /// Remove a subscriber. Returns false when the id was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
        self.subscribers.len() != before
    }

    pub fn add_xp(&mut self, amount: u32) -> &PlayerProgress {
        self.apply(|progress| progress.add_xp(amount))
    }

    pub fn spend_hint(&mut self) -> &PlayerProgress {
        self.apply(PlayerProgress::spend_hint)
    }

    pub fn increment_words_mastered(&mut self) -> &PlayerProgress {
        self.apply(PlayerProgress::increment_words_mastered)
    }

    pub fn catch_item(&mut self, item_id: u32) -> &PlayerProgress {
        self.apply(|progress| progress.catch_item(item_id))
    }

    pub fn complete_scene(&mut self, scene_id: u32) -> &PlayerProgress {
        self.apply(|progress| progress.complete_scene(scene_id))
    }

    pub fn reset_progress(&mut self) -> &PlayerProgress {
        self.apply(PlayerProgress::reset)
    }

    fn apply(
        &mut self,
        transition: impl FnOnce(&mut PlayerProgress) -> ProgressChange,
    ) -> &PlayerProgress {
        let change = transition(&mut self.progress);
        match change {
            ProgressChange::LeveledUp { level, .. } => log::info!("level up: now level {level}"),
            ProgressChange::SceneCompleted { scene_id } => {
                log::info!("scene {scene_id} completed, badge earned");
            }
            _ => log::debug!("progress: {change}"),
        }
        if debug_log_enabled() {
            println!(
                "Progress: {change} | xp {}/{} level {} hints {} words {}",
                self.progress.xp,
                self.progress.xp_to_next_level,
                self.progress.level,
                self.progress.hint_charges,
                self.progress.words_mastered
            );
        }
        for (_, subscriber) in &mut self.subscribers {
            subscriber(&self.progress, &change);
        }
        self.last_change = Some(change);
        &self.progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn assert_initial(progress: &PlayerProgress) {
        assert_eq!(progress.xp(), 0);
        assert_eq!(progress.level(), 1);
        assert_eq!(progress.xp_to_next_level(), 100);
        assert_eq!(progress.hint_charges(), HINT_MAX);
        assert_eq!(progress.words_mastered(), 0);
        assert!(progress.collected_item_ids().is_empty());
        assert!(progress.completed_scene_ids().is_empty());
        assert!(progress.earned_badge_ids().is_empty());
    }

    #[test]
    fn initial_snapshot_matches_documented_values() {
        assert_initial(&PlayerProgress::initial());
        assert_initial(ProgressStore::new().snapshot());
    }

    #[test]
    fn add_xp_crosses_first_threshold() {
        let mut store = ProgressStore::new();
        let state = store.add_xp(150);
        assert_eq!(state.xp(), 150);
        assert_eq!(state.level(), 2);
        assert_eq!(state.xp_to_next_level(), 200);
    }

    #[test]
    fn add_xp_below_threshold_keeps_level() {
        let mut progress = PlayerProgress::initial();
        assert_eq!(
            progress.add_xp(99),
            ProgressChange::XpGained { amount: 99, xp: 99 }
        );
        assert_eq!(progress.level(), 1);
        assert_eq!(progress.xp_to_next_level(), 100);
        assert!(matches!(
            progress.add_xp(1),
            ProgressChange::LeveledUp { level: 2, xp: 100, .. }
        ));
    }

    #[test]
    fn add_xp_applies_single_level_per_call() {
        let mut progress = PlayerProgress::initial();
        progress.add_xp(500);
        assert_eq!(progress.level(), 2);
        assert_eq!(progress.xp_to_next_level(), 200);
        progress.add_xp(0);
        assert_eq!(progress.level(), 3);
        assert_eq!(progress.xp_to_next_level(), 300);
    }

    #[test]
    fn zero_xp_grant_is_a_valid_noop() {
        let mut progress = PlayerProgress::initial();
        let change = progress.add_xp(0);
        assert!(change.is_noop());
        assert_eq!(progress, PlayerProgress::initial());
    }

    #[test]
    fn saturated_xp_grant_is_a_noop() {
        let mut progress: PlayerProgress = serde_json::from_str(
            r#"{"xp": 4294967295, "level": 4294967295, "xpToNextLevel": 4294967295}"#,
        )
        .unwrap();
        let before = progress.clone();
        let change = progress.add_xp(10);
        assert_eq!(
            change,
            ProgressChange::XpGained {
                amount: 0,
                xp: u32::MAX
            }
        );
        assert!(change.is_noop());
        assert_eq!(progress, before);
    }

    #[test]
    fn xp_and_level_never_decrease() {
        let mut progress = PlayerProgress::initial();
        let grants = [0, 1, 37, 99, 250, 0, 1_000, 3, 64, 512];
        for grant in grants {
            let (xp, level) = (progress.xp(), progress.level());
            progress.add_xp(grant);
            assert!(progress.xp() >= xp);
            assert!(progress.level() >= level);
        }
    }

    #[test]
    fn add_xp_saturates_instead_of_overflowing() {
        let mut progress = PlayerProgress::initial();
        progress.add_xp(u32::MAX);
        progress.add_xp(u32::MAX);
        assert_eq!(progress.xp(), u32::MAX);
    }

    #[test]
    fn spend_hint_floors_at_zero() {
        let mut store = ProgressStore::new();
        for _ in 0..5 {
            store.spend_hint();
        }
        assert_eq!(store.snapshot().hint_charges(), 0);
        assert_eq!(store.last_change(), Some(&ProgressChange::HintUnavailable));
    }

    #[test]
    fn fifth_word_refunds_a_hint() {
        let mut store = ProgressStore::new();
        store.spend_hint();
        store.spend_hint();
        for _ in 0..4 {
            store.increment_words_mastered();
        }
        assert_eq!(store.snapshot().hint_charges(), 0);
        let state = store.increment_words_mastered();
        assert_eq!(state.words_mastered(), 5);
        assert_eq!(state.hint_charges(), 1);
    }

    #[test]
    fn word_bonus_respects_hint_cap() {
        let mut progress = PlayerProgress::initial();
        for _ in 0..10 {
            progress.increment_words_mastered();
        }
        assert_eq!(progress.words_mastered(), 10);
        assert_eq!(progress.hint_charges(), HINT_MAX);
    }

    #[test]
    fn hint_bounds_hold_for_every_short_sequence() {
        // Exhaustively walk every spend/master sequence up to length 8.
        for len in 0..=8u32 {
            for mask in 0..(1u32 << len) {
                let mut progress = PlayerProgress::initial();
                for step in 0..len {
                    if mask & (1 << step) == 0 {
                        progress.spend_hint();
                    } else {
                        progress.increment_words_mastered();
                    }
                    assert!(progress.hint_charges() <= HINT_MAX);
                }
            }
        }
    }

    #[test]
    fn catch_item_is_idempotent() {
        let mut store = ProgressStore::new();
        store.catch_item(7);
        let once = store.snapshot().collected_item_ids().clone();
        store.catch_item(7);
        assert_eq!(store.snapshot().collected_item_ids(), &once);
        assert_eq!(once.into_iter().collect::<Vec<_>>(), vec![7]);
        assert_eq!(
            store.last_change(),
            Some(&ProgressChange::ItemAlreadyCaught { item_id: 7 })
        );
    }

    #[test]
    fn complete_scene_awards_one_badge() {
        let mut store = ProgressStore::new();
        store.complete_scene(3);
        store.complete_scene(3);
        let state = store.snapshot();
        let scenes: Vec<u32> = state.completed_scene_ids().iter().copied().collect();
        let badges: Vec<u32> = state.earned_badge_ids().iter().copied().collect();
        assert_eq!(scenes, vec![3]);
        assert_eq!(badges, vec![3]);
        assert!(state.has_badge(3));
        assert!(state.has_completed_scene(3));
    }

    #[test]
    fn scene_and_badge_sets_stay_equal() {
        let mut progress = PlayerProgress::initial();
        for scene in [4, 1, 4, 9, 1, 2] {
            progress.complete_scene(scene);
            assert_eq!(progress.completed_scene_ids(), progress.earned_badge_ids());
        }
    }

    #[test]
    fn reset_restores_initial_snapshot() {
        let mut store = ProgressStore::new();
        store.add_xp(150);
        store.catch_item(1);
        store.spend_hint();
        store.increment_words_mastered();
        store.complete_scene(2);
        let state = store.reset_progress();
        assert_initial(state);
        assert_eq!(state, &PlayerProgress::initial());
    }

    #[test]
    fn level_progress_tracks_current_level_span() {
        let mut progress = PlayerProgress::initial();
        progress.add_xp(150);
        let bar = progress.level_progress();
        assert_eq!(bar, LevelProgress { current: 50, total: 100 });
        assert!((bar.ratio() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn level_progress_ratio_clamps_after_large_grants() {
        let mut progress = PlayerProgress::initial();
        progress.add_xp(500);
        let bar = progress.level_progress();
        assert_eq!(bar.current, 400);
        assert!((bar.ratio() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn subscribers_see_each_new_snapshot() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut store = ProgressStore::new();
        let sink = Rc::clone(&seen);
        let id = store.subscribe(move |progress, change| {
            sink.borrow_mut().push((progress.xp(), *change));
        });
        store.add_xp(10);
        store.catch_item(4);
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.add_xp(10);

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], (10, ProgressChange::XpGained { amount: 10, xp: 10 }));
        assert_eq!(seen[1], (10, ProgressChange::ItemCaught { item_id: 4 }));
    }

    #[test]
    fn serializes_with_legacy_field_names() {
        let mut progress = PlayerProgress::initial();
        progress.catch_item(25);
        progress.complete_scene(1);
        let value = serde_json::to_value(&progress).unwrap();
        assert_eq!(value["xpToNextLevel"], 100);
        assert_eq!(value["hintCharges"], 2);
        assert_eq!(value["collectedPokemonIds"], serde_json::json!([25]));
        assert_eq!(value["completedScenes"], serde_json::json!([1]));
        assert_eq!(value["earnedBadges"], serde_json::json!([1]));
    }

    #[test]
    fn partial_snapshot_fills_from_initial_values() {
        let loaded: PlayerProgress = serde_json::from_str(r#"{"xp": 40}"#).unwrap();
        assert_eq!(loaded.xp(), 40);
        assert_eq!(loaded.level(), 1);
        assert_eq!(loaded.hint_charges(), HINT_MAX);
    }

    #[test]
    fn normalized_clamps_out_of_range_saves() {
        let loaded: PlayerProgress = serde_json::from_str(
            r#"{"level": 0, "xpToNextLevel": 0, "hintCharges": 9,
                "completedScenes": [1], "earnedBadges": [2]}"#,
        )
        .unwrap();
        let store = ProgressStore::from_progress(loaded);
        let state = store.snapshot();
        assert_eq!(state.level(), 1);
        assert_eq!(state.xp_to_next_level(), 100);
        assert_eq!(state.hint_charges(), HINT_MAX);
        assert_eq!(state.completed_scene_ids(), state.earned_badge_ids());
        assert!(state.has_completed_scene(2));
    }

    #[test]
    fn change_display_is_readable() {
        let change = ProgressChange::WordMastered {
            words_mastered: 5,
            hint_granted: true,
        };
        assert_eq!(change.to_string(), "word mastered (#5), bonus hint");
        assert_eq!(ProgressChange::Reset.to_string(), "progress reset");
    }
}
