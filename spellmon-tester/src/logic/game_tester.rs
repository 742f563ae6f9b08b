use anyhow::{Context, Result};
use serde::Serialize;
use std::cell::RefCell;
use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use spellmon_game::{
    AdvanceOutcome, Catalog, DataLoader, GameEngine, HintOutcome, JsonFileStorage, PlayerProgress,
    ProgressStorage, ProgressStore, SpellingChallenge, SubmitOutcome, next_unlock,
};

use super::invariants::InvariantChecker;
use super::policy::{LearnerPolicy, LearnerStrategy};
use crate::common::run_key;

/// Submissions allowed per word before the learner copies the answer.
pub const MAX_ATTEMPTS_PER_WORD: u32 = 3;
/// Extra plays of unlocked scenes allowed while waiting for the next gate.
pub const DEFAULT_GRIND_BUDGET: usize = 25;

/// Static catalog shared by every simulated run.
#[derive(Debug)]
pub struct TesterAssets {
    catalog: Catalog,
}

impl TesterAssets {
    fn assets_data_root() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("spellmon-web")
            .join("static")
            .join("assets")
            .join("data")
    }

    fn read_asset(root: &Path, name: &str) -> Result<String> {
        let path = root.join(name);
        std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))
    }

    /// Load the catalog the web build ships with.
    pub fn load_default() -> Result<Self> {
        let root = Self::assets_data_root();
        let catalog = Catalog::from_parts(
            &Self::read_asset(&root, "scenes.json")?,
            &Self::read_asset(&root, "words.json")?,
            &Self::read_asset(&root, "rewards.json")?,
            &Self::read_asset(&root, "badges.json")?,
        )
        .context("parsing bundled catalog")?;
        Self::from_catalog(catalog)
    }

    /// Load a single-document catalog (`scenes`, `words`, `rewards`, `badges`).
    pub fn load_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading catalog {}", path.display()))?;
        let catalog = Catalog::from_json(&raw)
            .with_context(|| format!("parsing catalog {}", path.display()))?;
        Self::from_catalog(catalog)
    }

    pub fn from_catalog(catalog: Catalog) -> Result<Self> {
        catalog.validate().context("validating catalog")?;
        Ok(Self { catalog })
    }

    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

#[derive(Clone)]
struct AssetLoader(Arc<TesterAssets>);

impl DataLoader for AssetLoader {
    type Error = Infallible;

    fn load_catalog(&self) -> Result<Catalog, Self::Error> {
        Ok(self.0.catalog.clone())
    }
}

/// What a scenario asks the simulated learner to do.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub strategy: LearnerStrategy,
    /// Stop after this many distinct scenes have been cleared.
    pub scene_limit: Option<usize>,
    /// Extra plays of each scene right after its first clear.
    pub replays: usize,
    pub grind_budget: usize,
    pub reset_at_end: bool,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub const fn new(strategy: LearnerStrategy) -> Self {
        Self {
            strategy,
            scene_limit: None,
            replays: 0,
            grind_budget: DEFAULT_GRIND_BUDGET,
            reset_at_end: false,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_scene_limit(mut self, limit: usize) -> Self {
        self.scene_limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_replays(mut self, replays: usize) -> Self {
        self.replays = replays;
        self
    }

    #[must_use]
    pub fn with_reset_at_end(mut self) -> Self {
        self.reset_at_end = true;
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn =
    Arc<dyn Fn(&SimulationSummary, &Catalog) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl std::fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    pub fn evaluate(&self, summary: &SimulationSummary, catalog: &Catalog) -> Result<()> {
        (self.0)(summary, catalog)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary, &Catalog) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// One pass through a scene's word list.
#[derive(Debug, Clone, Serialize)]
pub struct SceneRun {
    pub scene_id: u32,
    pub xp_at_entry: u32,
    pub unlocked_at_entry: bool,
    pub replay: bool,
    pub words_correct: u32,
    /// Words the learner only got after copying the answer off the card.
    pub words_copied: u32,
    /// Set when the run ended before the scene was completed.
    pub abandoned: bool,
    pub incorrect_attempts: u32,
    pub hints_used: u32,
    pub caught: Vec<u32>,
}

/// Complete record of a simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationSummary {
    pub seed: u64,
    pub strategy: LearnerStrategy,
    pub scene_runs: Vec<SceneRun>,
    /// Scene that never opened within the grind budget.
    pub stuck_at: Option<u32>,
    pub final_state: PlayerProgress,
    /// Snapshot right before the closing reset, when the plan asks for one.
    pub before_reset: Option<PlayerProgress>,
    pub changes_observed: usize,
    pub noop_changes: usize,
    pub hints_spent: u32,
    pub hints_granted: u32,
    pub violations: Vec<String>,
    /// Whether the saved file reloaded to the final snapshot (`--save-dir`).
    pub reload_matches: Option<bool>,
}

impl SimulationSummary {
    pub fn first_clears(&self) -> impl Iterator<Item = &SceneRun> {
        self.scene_runs.iter().filter(|run| !run.replay)
    }

    pub fn total_caught(&self) -> usize {
        self.scene_runs.iter().map(|run| run.caught.len()).sum()
    }
}

/// Headless deterministic runner for the progression core.
#[derive(Clone)]
pub struct GameTester {
    verbose: bool,
    assets: Arc<TesterAssets>,
    save_dir: Option<PathBuf>,
}

impl GameTester {
    pub const fn new(assets: Arc<TesterAssets>, verbose: bool) -> Self {
        Self {
            verbose,
            assets,
            save_dir: None,
        }
    }

    #[must_use]
    pub fn with_save_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.save_dir = dir;
        self
    }

    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn catalog(&self) -> &Catalog {
        self.assets.catalog()
    }

    pub fn run_plan(&self, name: &str, plan: &SimulationPlan, seed: u64) -> SimulationSummary {
        let mut store = ProgressStore::new();
        let checker = Rc::new(RefCell::new(InvariantChecker::new(
            store.snapshot().clone(),
        )));
        let sink = Rc::clone(&checker);
        store.subscribe(move |progress, change| sink.borrow_mut().observe(progress, change));

        let key = run_key(name, seed);
        let engine = self.save_dir.as_ref().map(|dir| {
            GameEngine::new(
                AssetLoader(Arc::clone(&self.assets)),
                JsonFileStorage::new(dir),
            )
        });
        let mut extra_violations = Vec::new();
        if let Some(engine) = &engine {
            if let Err(err) = engine.storage().delete_progress(&key) {
                extra_violations.push(format!("could not clear old save '{key}': {err}"));
            }
            engine.persist_on_change(&mut store, &key);
        }

        let mut policy = plan.strategy.create_policy(seed);
        let (scene_runs, stuck_at) = self.play_campaign(plan, &mut store, policy.as_mut());

        let before_reset = if plan.reset_at_end {
            let snapshot = store.snapshot().clone();
            match &engine {
                Some(engine) => {
                    if let Err(err) = engine.reset(&key, &mut store) {
                        extra_violations.push(format!("reset could not clear '{key}': {err}"));
                    }
                }
                None => {
                    store.reset_progress();
                }
            }
            Some(snapshot)
        } else {
            None
        };

        let reload_matches = engine.as_ref().map(|engine| {
            let reopened = engine.open_store(&key);
            reopened.snapshot() == store.snapshot()
        });

        let checker = checker.borrow();
        let mut violations = checker.violations().to_vec();
        violations.extend(extra_violations);

        if self.verbose {
            println!(
                "  ↳ {} seed {seed}: {} scene runs, {} changes, xp {} level {}",
                policy.name(),
                scene_runs.len(),
                checker.changes(),
                store.snapshot().xp(),
                store.snapshot().level()
            );
        }

        SimulationSummary {
            seed,
            strategy: plan.strategy,
            scene_runs,
            stuck_at,
            final_state: store.snapshot().clone(),
            before_reset,
            changes_observed: checker.changes(),
            noop_changes: checker.noops(),
            hints_spent: checker.hints_spent(),
            hints_granted: checker.hints_granted(),
            violations,
            reload_matches,
        }
    }

    fn play_campaign(
        &self,
        plan: &SimulationPlan,
        store: &mut ProgressStore,
        policy: &mut dyn LearnerPolicy,
    ) -> (Vec<SceneRun>, Option<u32>) {
        let catalog = self.assets.catalog();
        let mut runs = Vec::new();
        let mut cleared = 0usize;

        for scene in &catalog.scenes {
            if plan.scene_limit.is_some_and(|limit| cleared >= limit) {
                break;
            }
            let mut grind = 0usize;
            while !catalog.is_scene_unlocked(scene.id, store.snapshot().xp()) {
                let Some(practice) = runs.last().map(|run: &SceneRun| run.scene_id) else {
                    return (runs, Some(scene.id));
                };
                if grind >= plan.grind_budget {
                    log::warn!(
                        "scene {} still locked after {grind} practice runs ({:?})",
                        scene.id,
                        next_unlock(&catalog.scenes, store.snapshot().xp())
                    );
                    return (runs, Some(scene.id));
                }
                runs.push(self.play_scene(practice, true, store, policy));
                grind += 1;
            }

            runs.push(self.play_scene(scene.id, false, store, policy));
            for _ in 0..plan.replays {
                runs.push(self.play_scene(scene.id, true, store, policy));
            }
            cleared += 1;
        }
        (runs, None)
    }

    fn play_scene(
        &self,
        scene_id: u32,
        replay: bool,
        store: &mut ProgressStore,
        policy: &mut dyn LearnerPolicy,
    ) -> SceneRun {
        let catalog = self.assets.catalog();
        let xp_at_entry = store.snapshot().xp();
        let mut run = SceneRun {
            scene_id,
            xp_at_entry,
            unlocked_at_entry: catalog.is_scene_unlocked(scene_id, xp_at_entry),
            replay,
            words_correct: 0,
            words_copied: 0,
            abandoned: false,
            incorrect_attempts: 0,
            hints_used: 0,
            caught: Vec::new(),
        };
        // Validated catalogs always have words for every scene.
        let Ok(mut challenge) = SpellingChallenge::new(catalog, scene_id) else {
            return run;
        };

        loop {
            let word = challenge.current_word().to_string();
            while policy.wants_hint(&word, challenge.input().len(), store.snapshot().hint_charges())
            {
                match challenge.use_hint(store) {
                    HintOutcome::Revealed(_) => run.hints_used += 1,
                    HintOutcome::Unavailable => break,
                }
            }

            let mut answered = false;
            for attempt in 0..MAX_ATTEMPTS_PER_WORD {
                challenge.set_input(&policy.spell(&word, attempt));
                match challenge.submit(store) {
                    SubmitOutcome::Correct { caught } => {
                        run.words_correct += 1;
                        run.caught.extend(caught);
                        answered = true;
                        break;
                    }
                    SubmitOutcome::Incorrect => run.incorrect_attempts += 1,
                    SubmitOutcome::Ignored => break,
                }
            }
            if !answered {
                challenge.set_input(&word);
                if let SubmitOutcome::Correct { caught } = challenge.submit(store) {
                    run.words_correct += 1;
                    run.words_copied += 1;
                    run.caught.extend(caught);
                }
            }

            match challenge.advance(store) {
                AdvanceOutcome::NextWord => {}
                AdvanceOutcome::SceneComplete => break,
                AdvanceOutcome::NotAnswered => {
                    log::warn!("scene {scene_id}: stuck on word {}", challenge.word_index());
                    run.abandoned = true;
                    break;
                }
            }
        }

        if self.verbose {
            println!(
                "    scene {scene_id}{}: {} correct, {} copied, {} hints, caught {:?}",
                if replay { " (replay)" } else { "" },
                run.words_correct,
                run.words_copied,
                run.hints_used,
                run.caught
            );
        }
        run
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spellmon_game::HINT_MAX;

    fn tester() -> GameTester {
        GameTester::new(Arc::new(TesterAssets::load_default().unwrap()), false)
    }

    fn temp_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "spellmon-tester-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    #[test]
    fn perfect_learner_clears_campaign_without_violations() {
        let tester = tester();
        let summary = tester.run_plan("perfect", &SimulationPlan::new(LearnerStrategy::Perfect), 1);
        assert!(summary.violations.is_empty(), "{:?}", summary.violations);
        assert_eq!(summary.stuck_at, None);
        assert_eq!(summary.first_clears().count(), tester.catalog().scenes.len());
        assert_eq!(summary.total_caught(), tester.catalog().rewards.len());
        assert_eq!(summary.final_state.level(), 5);
        assert!(summary.scene_runs.iter().all(|run| run.unlocked_at_entry));
    }

    #[test]
    fn scene_limit_stops_early() {
        let tester = tester();
        let plan = SimulationPlan::new(LearnerStrategy::Perfect).with_scene_limit(1);
        let summary = tester.run_plan("smoke", &plan, 3);
        assert_eq!(summary.scene_runs.len(), 1);
        assert_eq!(summary.final_state.xp(), 50);
        assert!(summary.final_state.has_badge(1));
    }

    #[test]
    fn hint_heavy_run_balances_hint_ledger() {
        let tester = tester();
        let plan = SimulationPlan::new(LearnerStrategy::HintHeavy);
        let summary = tester.run_plan("hints", &plan, 5);
        assert!(summary.violations.is_empty(), "{:?}", summary.violations);
        assert!(summary.hints_spent > 0);
        let expected = u32::from(HINT_MAX) + summary.hints_granted - summary.hints_spent;
        assert_eq!(u32::from(summary.final_state.hint_charges()), expected);
    }

    #[test]
    fn reset_plan_returns_to_initial_and_clears_save() {
        let dir = temp_dir("reset");
        let tester = tester().with_save_dir(Some(dir.clone()));
        let plan = SimulationPlan::new(LearnerStrategy::Sloppy)
            .with_scene_limit(2)
            .with_reset_at_end();
        let summary = tester.run_plan("reset", &plan, 11);
        assert_eq!(summary.final_state, PlayerProgress::initial());
        assert!(summary.before_reset.is_some_and(|state| state.xp() > 0));
        assert_eq!(summary.reload_matches, Some(true));
        assert!(!JsonFileStorage::new(&dir).path_for(&run_key("reset", 11)).exists());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn saved_run_reloads_identically() {
        let dir = temp_dir("save");
        let tester = tester().with_save_dir(Some(dir.clone()));
        let plan = SimulationPlan::new(LearnerStrategy::Random).with_scene_limit(3);
        let summary = tester.run_plan("save", &plan, 21);
        assert_eq!(summary.reload_matches, Some(true));
        assert!(summary.violations.is_empty(), "{:?}", summary.violations);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn sloppy_learner_copies_missed_words_instead_of_skipping() {
        let tester = tester();
        let plan = SimulationPlan::new(LearnerStrategy::Sloppy).with_scene_limit(4);
        let summary = tester.run_plan("sloppy", &plan, 13);
        assert!(summary.violations.is_empty(), "{:?}", summary.violations);
        assert!(summary.scene_runs.iter().all(|run| !run.abandoned));
        for run in &summary.scene_runs {
            let words = tester
                .catalog()
                .scene(run.scene_id)
                .map(|scene| tester.catalog().scene_words(scene).len())
                .unwrap();
            assert_eq!(run.words_correct as usize, words, "scene {}", run.scene_id);
            assert!(run.words_copied <= run.words_correct);
        }
    }

    #[test]
    fn bad_catalog_file_is_reported() {
        let path = temp_dir("catalog").with_extension("json");
        std::fs::write(&path, "{\"scenes\": [}").unwrap();
        let err = TesterAssets::load_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("parsing catalog"));
        let _ = std::fs::remove_file(path);
    }
}
