use anyhow::{Context, Result, ensure};
use spellmon_game::{Catalog, HINT_BONUS_INTERVAL, HINT_MAX, PlayerProgress};

use super::TestScenario;
use crate::logic::{LearnerStrategy, SimulationPlan, SimulationSummary};

fn hint_ledger_balances(summary: &SimulationSummary, _catalog: &Catalog) -> Result<()> {
    let charges = u32::from(summary.final_state.hint_charges());
    let expected = (u32::from(HINT_MAX) + summary.hints_granted)
        .checked_sub(summary.hints_spent)
        .context("more hints spent than were ever available")?;
    ensure!(
        charges == expected,
        "{charges} charges left, ledger says {expected} ({HINT_MAX} + {} granted - {} spent)",
        summary.hints_granted,
        summary.hints_spent
    );
    ensure!(summary.hints_spent > 0, "learner never used a hint");
    Ok(())
}

fn refunds_follow_interval(summary: &SimulationSummary, _catalog: &Catalog) -> Result<()> {
    let words = summary.final_state.words_mastered();
    ensure!(
        summary.hints_granted <= words / HINT_BONUS_INTERVAL,
        "{} hints granted for {words} words",
        summary.hints_granted
    );
    let used: u32 = summary.scene_runs.iter().map(|run| run.hints_used).sum();
    ensure!(
        used == summary.hints_spent,
        "{used} letters revealed but {} charges spent",
        summary.hints_spent
    );
    Ok(())
}

fn reset_restores_initial(summary: &SimulationSummary, _catalog: &Catalog) -> Result<()> {
    let before = summary
        .before_reset
        .as_ref()
        .context("run ended without a reset")?;
    ensure!(
        before != &PlayerProgress::initial(),
        "nothing happened before the reset"
    );
    ensure!(
        summary.final_state == PlayerProgress::initial(),
        "reset left {:?}",
        summary.final_state
    );
    Ok(())
}

pub fn hint_economy() -> TestScenario {
    TestScenario::simulation(
        "hint-economy",
        SimulationPlan::new(LearnerStrategy::HintHeavy)
            .with_expectation(hint_ledger_balances)
            .with_expectation(refunds_follow_interval),
    )
}

pub fn reset_roundtrip() -> TestScenario {
    TestScenario::simulation(
        "reset-roundtrip",
        SimulationPlan::new(LearnerStrategy::Random)
            .with_scene_limit(3)
            .with_reset_at_end()
            .with_expectation(reset_restores_initial),
    )
}
