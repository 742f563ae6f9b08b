use anyhow::{Result, bail, ensure};
use spellmon_game::{Catalog, WORD_XP_REWARD, unlocked_scene_ids};
use std::collections::BTreeSet;

use super::TestScenario;
use crate::logic::{LearnerStrategy, SimulationPlan, SimulationSummary};

fn not_stuck(summary: &SimulationSummary, _catalog: &Catalog) -> Result<()> {
    if let Some(scene_id) = summary.stuck_at {
        bail!("scene {scene_id} never unlocked");
    }
    Ok(())
}

fn every_scene_cleared(summary: &SimulationSummary, catalog: &Catalog) -> Result<()> {
    let state = &summary.final_state;
    let cleared: Vec<u32> = summary.first_clears().map(|run| run.scene_id).collect();
    let expected: Vec<u32> = catalog.scenes.iter().map(|scene| scene.id).collect();
    ensure!(
        cleared == expected,
        "scenes cleared out of order: {cleared:?}"
    );
    ensure!(
        state.completed_scene_ids().len() == catalog.scenes.len(),
        "completed {} of {} scenes",
        state.completed_scene_ids().len(),
        catalog.scenes.len()
    );
    ensure!(
        state.earned_badge_ids().len() == catalog.badges.len(),
        "earned {} of {} badges",
        state.earned_badge_ids().len(),
        catalog.badges.len()
    );
    Ok(())
}

fn every_reward_caught_once(summary: &SimulationSummary, catalog: &Catalog) -> Result<()> {
    let collected = summary.final_state.collected_item_ids();
    ensure!(
        summary.total_caught() == catalog.rewards.len(),
        "caught {} times for {} rewards",
        summary.total_caught(),
        catalog.rewards.len()
    );
    for reward in &catalog.rewards {
        ensure!(
            collected.contains(&reward.id),
            "{} (#{}) never caught",
            reward.name,
            reward.id
        );
    }
    Ok(())
}

fn no_duplicate_catches(summary: &SimulationSummary, _catalog: &Catalog) -> Result<()> {
    let mut seen = BTreeSet::new();
    for run in &summary.scene_runs {
        for id in &run.caught {
            ensure!(seen.insert(*id), "#{id} caught twice (scene {})", run.scene_id);
        }
    }
    ensure!(
        &seen == summary.final_state.collected_item_ids(),
        "collection {:?} differs from catches {seen:?}",
        summary.final_state.collected_item_ids()
    );
    Ok(())
}

fn replays_add_no_badges(summary: &SimulationSummary, _catalog: &Catalog) -> Result<()> {
    let played: BTreeSet<u32> = summary.scene_runs.iter().map(|run| run.scene_id).collect();
    ensure!(
        summary.final_state.earned_badge_ids() == &played,
        "badges {:?} differ from scenes played {played:?}",
        summary.final_state.earned_badge_ids()
    );
    ensure!(
        summary.scene_runs.iter().any(|run| run.replay),
        "no replays were played"
    );
    Ok(())
}

fn xp_matches_words(summary: &SimulationSummary, _catalog: &Catalog) -> Result<()> {
    let correct: u32 = summary.scene_runs.iter().map(|run| run.words_correct).sum();
    let state = &summary.final_state;
    ensure!(
        state.words_mastered() == correct,
        "{} words mastered for {correct} correct answers",
        state.words_mastered()
    );
    ensure!(
        state.xp() == correct * WORD_XP_REWARD,
        "{} xp for {correct} correct answers",
        state.xp()
    );
    Ok(())
}

fn scenes_entered_only_when_open(summary: &SimulationSummary, catalog: &Catalog) -> Result<()> {
    for run in &summary.scene_runs {
        let threshold = catalog
            .scene(run.scene_id)
            .map(|scene| scene.unlock_xp)
            .ok_or_else(|| anyhow::anyhow!("played unknown scene {}", run.scene_id))?;
        ensure!(
            run.unlocked_at_entry && run.xp_at_entry >= threshold,
            "entered scene {} at {} xp (needs {threshold})",
            run.scene_id,
            run.xp_at_entry
        );
    }

    let xp = summary.final_state.xp();
    let open = unlocked_scene_ids(&catalog.scenes, xp);
    let expected: Vec<u32> = catalog
        .scenes
        .iter()
        .filter(|scene| xp >= scene.unlock_xp)
        .map(|scene| scene.id)
        .collect();
    ensure!(
        open == expected,
        "unlocked {open:?} at {xp} xp, expected {expected:?}"
    );
    ensure!(
        !catalog.is_scene_unlocked(u32::MAX, xp),
        "unknown scene reported as unlocked"
    );
    Ok(())
}

pub fn full_campaign() -> TestScenario {
    TestScenario::simulation(
        "full-campaign",
        SimulationPlan::new(LearnerStrategy::Perfect)
            .with_expectation(not_stuck)
            .with_expectation(every_scene_cleared)
            .with_expectation(every_reward_caught_once)
            .with_expectation(xp_matches_words),
    )
}

pub fn replay_idempotence() -> TestScenario {
    TestScenario::simulation(
        "replay-idempotence",
        SimulationPlan::new(LearnerStrategy::Random)
            .with_replays(2)
            .with_expectation(not_stuck)
            .with_expectation(replays_add_no_badges)
            .with_expectation(no_duplicate_catches)
            .with_expectation(xp_matches_words),
    )
}

pub fn unlock_gating() -> TestScenario {
    TestScenario::simulation(
        "unlock-gating",
        SimulationPlan::new(LearnerStrategy::Sloppy)
            .with_expectation(not_stuck)
            .with_expectation(scenes_entered_only_when_open)
            .with_expectation(every_scene_cleared)
            .with_expectation(no_duplicate_catches),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::{GameTester, TesterAssets};
    use std::sync::Arc;

    fn run(scenario: &TestScenario, seed: u64) -> (SimulationSummary, Arc<TesterAssets>) {
        let assets = Arc::new(TesterAssets::load_default().unwrap());
        let tester = GameTester::new(Arc::clone(&assets), false);
        (tester.run_plan(&scenario.name, &scenario.plan, seed), assets)
    }

    #[test]
    fn campaign_expectations_hold_for_their_learners() {
        for scenario in [full_campaign(), replay_idempotence(), unlock_gating()] {
            let (summary, assets) = run(&scenario, 1337);
            assert!(summary.violations.is_empty(), "{:?}", summary.violations);
            for expectation in &scenario.plan.expectations {
                expectation
                    .evaluate(&summary, assets.catalog())
                    .unwrap_or_else(|err| panic!("{}: {err:#}", scenario.name));
            }
        }
    }

    #[test]
    fn gating_check_rejects_early_entry() {
        let (mut summary, assets) = run(&unlock_gating(), 5);
        let run = summary
            .scene_runs
            .iter_mut()
            .find(|run| run.scene_id == 2)
            .unwrap();
        run.xp_at_entry = 0;
        assert!(scenes_entered_only_when_open(&summary, assets.catalog()).is_err());
    }

    #[test]
    fn duplicate_catch_is_flagged() {
        let (mut summary, assets) = run(&full_campaign(), 2);
        let first = summary.scene_runs[0].caught[0];
        summary.scene_runs[1].caught.push(first);
        assert!(no_duplicate_catches(&summary, assets.catalog()).is_err());
    }
}
