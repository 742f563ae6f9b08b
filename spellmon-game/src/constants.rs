//! Centralized balance and tuning constants for Spellmon progression.
//!
//! These values define the deterministic math of the progression store.
//! Keeping them together ensures that the reward economy can only be adjusted
//! via code changes reviewed in version control, rather than through external
//! JSON assets.

// Logging keys -------------------------------------------------------------
pub(crate) const DEBUG_ENV_VAR: &str = "SPELLMON_DEBUG_LOGS";

// Levels -------------------------------------------------------------------
/// XP step between level thresholds: level `n` ends at `n * LEVEL_UP_XP_BASE`.
pub const LEVEL_UP_XP_BASE: u32 = 100;
pub const STARTING_LEVEL: u32 = 1;

// Hints --------------------------------------------------------------------
pub const HINT_MAX: u8 = 2;
/// Every n-th mastered word refunds one hint charge.
pub const HINT_BONUS_INTERVAL: u32 = 5;

// Rewards ------------------------------------------------------------------
pub const WORD_XP_REWARD: u32 = 10;

// Persistence --------------------------------------------------------------
pub const STORAGE_KEY: &str = "game-state";
pub const SNAPSHOT_VERSION: u32 = 0;

#[cfg(debug_assertions)]
pub(crate) fn debug_log_enabled() -> bool {
    matches!(std::env::var(DEBUG_ENV_VAR), Ok(val) if val != "0")
}

#[cfg(not(debug_assertions))]
pub(crate) const fn debug_log_enabled() -> bool {
    false
}
