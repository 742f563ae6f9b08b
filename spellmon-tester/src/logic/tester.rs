use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::common::scenario::TestScenario;
use crate::logic::game_tester::{GameTester, SimulationPlan, SimulationSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub strategy: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

pub struct LogicTester {
    tester: GameTester,
}

impl LogicTester {
    pub const fn new(tester: GameTester) -> Self {
        Self { tester }
    }

    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for &seed in seeds {
            if self.tester.verbose() {
                println!(
                    "🧪 Testing scenario: {} (learner: {} seed: {})",
                    scenario.name.bright_white(),
                    scenario.plan.strategy,
                    seed
                );
            }

            let result = self.run_single_scenario(scenario, seed, iterations);
            results.push(result);
        }

        results
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let (successes, failures, performance_data) =
            self.run_simulation_iterations(&scenario.name, &scenario.plan, seed, iterations);

        let avg_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.name.clone(),
            strategy: scenario.plan.strategy.label().to_string(),
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration: avg_duration,
            performance_data,
        }
    }

    fn run_simulation_iterations(
        &self,
        name: &str,
        plan: &SimulationPlan,
        seed: u64,
        iterations: usize,
    ) -> (usize, Vec<String>, Vec<Duration>) {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));

            let summary = self.tester.run_plan(name, plan, iteration_seed);

            if let Some(err) = evaluate_expectations(plan, &summary, &self.tester) {
                let state = &summary.final_state;
                failures.push(format!(
                    "Iteration {} (learner {}, seed {}, scene runs {}): {} | final xp {} level {} hints {} words {} badges {}",
                    i + 1,
                    summary.strategy,
                    summary.seed,
                    summary.scene_runs.len(),
                    err,
                    state.xp(),
                    state.level(),
                    state.hint_charges(),
                    state.words_mastered(),
                    state.earned_badge_ids().len()
                ));

                if self.tester.verbose() {
                    println!(
                        "  ❌ Iteration {}/{} failed: {}",
                        i + 1,
                        iterations,
                        err.red()
                    );
                }
            } else {
                successes += 1;
                let duration = start_time.elapsed();
                performance_data.push(duration);

                if self.tester.verbose() {
                    println!(
                        "  ✅ Iteration {}/{} passed ({duration:?}) xp:{} level:{} changes:{}",
                        i + 1,
                        iterations,
                        summary.final_state.xp(),
                        summary.final_state.level(),
                        summary.changes_observed
                    );
                }
            }
        }

        (successes, failures, performance_data)
    }
}

fn evaluate_expectations(
    plan: &SimulationPlan,
    summary: &SimulationSummary,
    tester: &GameTester,
) -> Option<String> {
    if let Some(first) = summary.violations.first() {
        return Some(format!(
            "{} invariant violation(s), first: {first}",
            summary.violations.len()
        ));
    }
    if summary.reload_matches == Some(false) {
        return Some("saved progress did not reload to the final snapshot".to_string());
    }
    for expectation in &plan.expectations {
        if let Err(err) = expectation.evaluate(summary, tester.catalog()) {
            return Some(format!("{err:#}"));
        }
    }
    None
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_micros().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros = u128::deserialize(deserializer)?;
        Ok(Duration::from_micros(u64::try_from(micros).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let micros: Vec<u128> = durations.iter().map(Duration::as_micros).collect();
        micros.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros = Vec::<u128>::deserialize(deserializer)?;
        Ok(micros
            .into_iter()
            .map(|m| Duration::from_micros(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}
