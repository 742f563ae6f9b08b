use anyhow::{Result, ensure};
use spellmon_game::{Catalog, WORD_XP_REWARD};

use super::TestScenario;
use crate::logic::{LearnerStrategy, SimulationPlan, SimulationSummary};

fn first_scene_cleared(summary: &SimulationSummary, catalog: &Catalog) -> Result<()> {
    let first = catalog
        .scenes
        .first()
        .ok_or_else(|| anyhow::anyhow!("catalog has no scenes"))?;
    let words = u32::try_from(catalog.scene_words(first).len())?;
    let state = &summary.final_state;

    ensure!(
        summary.scene_runs.len() == 1,
        "expected one scene run, saw {}",
        summary.scene_runs.len()
    );
    ensure!(
        state.words_mastered() == words,
        "expected {words} words mastered, saw {}",
        state.words_mastered()
    );
    ensure!(
        state.xp() == words * WORD_XP_REWARD,
        "expected {} xp, saw {}",
        words * WORD_XP_REWARD,
        state.xp()
    );
    ensure!(state.has_badge(first.id), "badge for scene {} missing", first.id);
    ensure!(
        state.has_completed_scene(first.id),
        "scene {} not completed",
        first.id
    );
    Ok(())
}

pub fn smoke() -> TestScenario {
    TestScenario::simulation(
        "smoke",
        SimulationPlan::new(LearnerStrategy::Perfect)
            .with_scene_limit(1)
            .with_expectation(first_scene_cleared),
    )
}
