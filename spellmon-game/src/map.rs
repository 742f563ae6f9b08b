//! World map regions and keyboard focus movement between them.
use serde::{Deserialize, Serialize};

use crate::unlock::{UnlockThreshold, is_scene_unlocked};

/// A clickable region on the world map, linked to the scene it opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: u32,
    pub name: String,
    pub scene_id: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapDirection {
    Left,
    Right,
    Up,
    Down,
}

impl MapDirection {
    /// Map a DOM `KeyboardEvent.key` value to a direction.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowLeft" => Some(Self::Left),
            "ArrowRight" => Some(Self::Right),
            "ArrowUp" => Some(Self::Up),
            "ArrowDown" => Some(Self::Down),
            _ => None,
        }
    }
}

/// Row-major grid the map regions are laid out on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapGrid {
    pub columns: usize,
    pub rows: usize,
}

impl Default for MapGrid {
    fn default() -> Self {
        Self {
            columns: 3,
            rows: 3,
        }
    }
}

impl MapGrid {
    /// Index focus moves to; stays put at the grid edges.
    #[must_use]
    pub const fn step(self, index: usize, direction: MapDirection) -> usize {
        if self.columns == 0 {
            return index;
        }
        let row = index / self.columns;
        let col = index % self.columns;
        match direction {
            MapDirection::Left if col > 0 => index - 1,
            MapDirection::Right if col + 1 < self.columns => index + 1,
            MapDirection::Up if row > 0 => index - self.columns,
            MapDirection::Down if row + 1 < self.rows => index + self.columns,
            _ => index,
        }
    }
}

/// A region together with whether the player may enter it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionState {
    pub region: Region,
    pub unlocked: bool,
}

#[must_use]
pub fn region_states<S: UnlockThreshold>(
    regions: &[Region],
    scenes: &[S],
    xp: u32,
) -> Vec<RegionState> {
    regions
        .iter()
        .map(|region| RegionState {
            region: region.clone(),
            unlocked: is_scene_unlocked(scenes, region.scene_id, xp),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unlock::SceneUnlock;

    #[test]
    fn step_moves_within_grid() {
        let grid = MapGrid::default();
        assert_eq!(grid.step(0, MapDirection::Right), 1);
        assert_eq!(grid.step(4, MapDirection::Up), 1);
        assert_eq!(grid.step(4, MapDirection::Down), 7);
        assert_eq!(grid.step(4, MapDirection::Left), 3);
    }

    #[test]
    fn step_clamps_at_edges() {
        let grid = MapGrid::default();
        assert_eq!(grid.step(2, MapDirection::Right), 2);
        assert_eq!(grid.step(3, MapDirection::Left), 3);
        assert_eq!(grid.step(1, MapDirection::Up), 1);
        assert_eq!(grid.step(7, MapDirection::Down), 7);
    }

    #[test]
    fn parses_arrow_keys() {
        assert_eq!(MapDirection::from_key("ArrowUp"), Some(MapDirection::Up));
        assert_eq!(MapDirection::from_key("Enter"), None);
    }

    #[test]
    fn region_states_follow_scene_thresholds() {
        let regions = vec![
            Region {
                id: 1,
                name: "Glendor Grove".to_string(),
                scene_id: 1,
            },
            Region {
                id: 2,
                name: "Willowshade Woods".to_string(),
                scene_id: 2,
            },
            Region {
                id: 3,
                name: "Nowhere".to_string(),
                scene_id: 42,
            },
        ];
        let scenes = [
            SceneUnlock { id: 1, unlock_xp: 0 },
            SceneUnlock { id: 2, unlock_xp: 100 },
        ];
        let states = region_states(&regions, &scenes, 100);
        let unlocked: Vec<bool> = states.iter().map(|state| state.unlocked).collect();
        assert_eq!(unlocked, vec![true, true, false]);
        assert!(!region_states(&regions, &scenes, 99)[1].unlocked);
    }
}
