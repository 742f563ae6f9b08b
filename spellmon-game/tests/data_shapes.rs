use spellmon_game::{Catalog, PersistedProgress, PlayerProgress, ProgressStore, Region};
use std::collections::HashSet;

fn load_catalog() -> Catalog {
    Catalog::from_parts(
        include_str!("../../spellmon-web/static/assets/data/scenes.json"),
        include_str!("../../spellmon-web/static/assets/data/words.json"),
        include_str!("../../spellmon-web/static/assets/data/rewards.json"),
        include_str!("../../spellmon-web/static/assets/data/badges.json"),
    )
    .unwrap()
}

#[test]
fn shipped_catalog_is_consistent() {
    let catalog = load_catalog();
    catalog.validate().unwrap();
    assert_eq!(catalog.scenes.len(), 9);
    assert_eq!(catalog.scenes[0].unlock_xp, 0, "first scene must be open");

    let scene_ids: HashSet<u32> = catalog.scenes.iter().map(|scene| scene.id).collect();
    let badge_ids: HashSet<u32> = catalog.badges.iter().map(|badge| badge.id).collect();
    assert_eq!(scene_ids, badge_ids, "one badge per scene");

    for scene in &catalog.scenes {
        assert!(!catalog.scene_words(scene).is_empty());
        assert!(catalog.rewards_for_scene(scene.id).count() > 0);
    }
}

#[test]
fn unlock_thresholds_are_non_decreasing() {
    let catalog = load_catalog();
    let thresholds: Vec<u32> = catalog.scenes.iter().map(|scene| scene.unlock_xp).collect();
    assert!(thresholds.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[test]
fn regions_point_at_known_scenes() {
    let catalog = load_catalog();
    let regions: Vec<Region> = serde_json::from_str(include_str!(
        "../../spellmon-web/static/assets/data/regions.json"
    ))
    .unwrap();
    assert_eq!(regions.len(), 9);
    for region in &regions {
        assert!(catalog.scene(region.scene_id).is_some(), "{}", region.name);
    }
}

#[test]
fn initial_snapshot_serialization_is_stable() {
    let encoded = PersistedProgress::encode(&PlayerProgress::initial()).unwrap();
    assert_eq!(
        encoded,
        concat!(
            r#"{"state":{"xp":0,"level":1,"xpToNextLevel":100,"hintCharges":2,"#,
            r#""wordsMastered":0,"collectedPokemonIds":[],"completedScenes":[],"#,
            r#""earnedBadges":[]},"version":0}"#
        )
    );
}

#[test]
fn legacy_save_loads_into_store() {
    let raw = r#"{
        "state": {
            "xp": 230, "level": 3, "xpToNextLevel": 300, "hintCharges": 1,
            "wordsMastered": 23, "collectedPokemonIds": [16, 19, 10, 16],
            "completedScenes": [1, 2], "earnedBadges": [1, 2]
        },
        "version": 0
    }"#;
    let store = ProgressStore::from_progress(PersistedProgress::decode(raw).unwrap());
    let state = store.snapshot();
    assert_eq!(state.level(), 3);
    assert_eq!(state.collected_item_ids().len(), 3);
    assert!(state.has_completed_scene(2));
    assert_eq!(state.level_progress().current, 30);
}
