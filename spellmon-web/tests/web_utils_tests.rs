use spellmon_web::game::{
    DataLoader, MapGrid, WebDataLoader, region_states,
};

#[cfg(target_arch = "wasm32")]
use spellmon_web::dom;

#[cfg(target_arch = "wasm32")]
#[test]
fn dom_helpers_find_window() {
    assert!(dom::window().is_some());
}

#[test]
fn bundled_catalog_loads_and_validates() {
    let catalog = WebDataLoader.load_catalog().unwrap();
    assert_eq!(catalog.scenes.len(), 9);
    assert_eq!(catalog.words.len(), 45);
    assert_eq!(catalog.badges.len(), catalog.scenes.len());
    let first = catalog.scene(1).unwrap();
    assert_eq!(first.unlock_xp, 0);
    assert_eq!(catalog.scene_words(first).len(), 5);
}

#[test]
fn bundled_regions_fill_the_map_grid() {
    let loader = WebDataLoader;
    let catalog = loader.load_catalog().unwrap();
    let regions = loader.load_regions().unwrap();
    let grid = MapGrid::default();
    assert_eq!(regions.len(), grid.columns * grid.rows);

    let states = region_states(&regions, &catalog.scenes, 0);
    let open: Vec<&str> = states
        .iter()
        .filter(|state| state.unlocked)
        .map(|state| state.region.name.as_str())
        .collect();
    assert_eq!(open.len(), 1, "only the first region starts open: {open:?}");
}

