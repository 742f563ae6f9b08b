use crate::logic::SimulationPlan;

pub mod campaign;
pub mod economy;
pub mod smoke;

/// A named simulation plan.
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn simulation(name: impl Into<String>, plan: SimulationPlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }
}

type ScenarioFactory = fn() -> TestScenario;

const SCENARIOS: &[(&str, &str, ScenarioFactory)] = &[
    (
        "smoke",
        "Clear the first scene with a perfect learner",
        smoke::smoke,
    ),
    (
        "full-campaign",
        "Clear every scene in order with a sloppy learner",
        campaign::full_campaign,
    ),
    (
        "hint-economy",
        "Spend hints at every chance and balance the hint ledger",
        economy::hint_economy,
    ),
    (
        "replay-idempotence",
        "Replay each scene and confirm no duplicate badges or rewards",
        campaign::replay_idempotence,
    ),
    (
        "reset-roundtrip",
        "Play part of the campaign, then reset to the initial snapshot",
        economy::reset_roundtrip,
    ),
    (
        "unlock-gating",
        "Only enter scenes whose XP threshold has been reached",
        campaign::unlock_gating,
    ),
];

/// Names of every registered scenario, in run order.
pub fn scenario_names() -> impl Iterator<Item = &'static str> {
    SCENARIOS.iter().map(|(name, _, _)| *name)
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    SCENARIOS
        .iter()
        .map(|(name, description, _)| (*name, *description))
        .collect()
}

pub fn get_scenario(name: &str) -> Option<TestScenario> {
    let key = name.trim().to_ascii_lowercase();
    SCENARIOS
        .iter()
        .find(|(candidate, _, _)| *candidate == key)
        .map(|(_, _, factory)| factory())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_scenario_resolves() {
        for (name, description) in list_scenarios() {
            assert!(!description.is_empty());
            let scenario = get_scenario(name).unwrap();
            assert_eq!(scenario.name, name);
        }
        assert_eq!(scenario_names().count(), 6);
    }

    #[test]
    fn lookup_ignores_case_and_padding() {
        assert!(get_scenario(" Smoke ").is_some());
        assert!(get_scenario("unknown").is_none());
    }
}
