/// GridState: the complete snapshot of a level in play.
///
/// ## Layers
///
/// Static terrain (`walls`, `targets`) is copied from the level on load and
/// never mutated. Dynamic occupancy (`player`, `crates`) changes only through
/// `sim::step`. Crates live in an index-addressed arena: `crates[i]` always
/// refers to the same crate, so `reset` can restore it to `level.crates[i]`.
///
/// Renderers receive clones of this struct. Nothing they do reaches the engine.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::entity::{Direction, Position};
use crate::domain::rules::{self, MapView};
use crate::domain::tile::Tile;
use super::level::LevelDefinition;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    InProgress,
    Won,
    Lost,
}

impl Status {
    /// Won and Lost only leave through reset or reload.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Status::InProgress)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridState {
    pub width: usize,
    pub height: usize,

    // ── Terrain ──
    pub walls: HashSet<Position>,
    pub targets: HashSet<Position>,

    // ── Occupancy ──
    pub player: Position,
    pub crates: Vec<Position>,

    // ── Tracking ──
    pub move_count: u32,
    pub status: Status,
    pub facing: Direction,
}

impl GridState {
    /// Fresh state at the level's starting layout.
    pub fn from_level(level: &LevelDefinition) -> Self {
        GridState {
            width: level.width,
            height: level.height,
            walls: level.walls.iter().copied().collect(),
            targets: level.targets.iter().copied().collect(),
            player: level.player_start,
            crates: level.crates.clone(),
            move_count: 0,
            status: Status::InProgress,
            facing: Direction::default(),
        }
    }

    /// Borrowed view for the rule functions.
    #[inline]
    pub fn map_view(&self) -> MapView<'_> {
        MapView {
            walls: &self.walls,
            crates: &self.crates,
            width: self.width,
            height: self.height,
        }
    }

    /// Static terrain at `p`. Out of bounds reads as wall.
    pub fn tile_at(&self, p: Position) -> Tile {
        if !p.in_bounds(self.width, self.height) || self.walls.contains(&p) {
            Tile::Wall
        } else if self.targets.contains(&p) {
            Tile::Target
        } else {
            Tile::Floor
        }
    }

    pub fn crate_at(&self, p: Position) -> Option<usize> {
        self.crates.iter().position(|c| *c == p)
    }

    pub fn crates_on_targets(&self) -> usize {
        rules::crates_on_targets(&self.crates, &self.targets)
    }

    pub fn all_on_targets(&self) -> bool {
        rules::all_on_targets(&self.crates, &self.targets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level::LevelCatalog;

    #[test]
    fn from_level_copies_the_start_layout() {
        let catalog = LevelCatalog::builtin();
        let level = catalog.get(1).unwrap();
        let state = GridState::from_level(level);

        assert_eq!(state.player, level.player_start);
        assert_eq!(state.crates, level.crates);
        assert_eq!(state.targets.len(), 3);
        assert_eq!(state.move_count, 0);
        assert_eq!(state.status, Status::InProgress);
        assert_eq!(state.facing, Direction::Down);
    }

    #[test]
    fn tile_queries() {
        let catalog = LevelCatalog::builtin();
        let state = GridState::from_level(catalog.get(0).unwrap());

        assert_eq!(state.tile_at(Position::new(0, 0)), Tile::Wall);
        assert_eq!(state.tile_at(Position::new(-1, 2)), Tile::Wall);
        assert_eq!(state.tile_at(Position::new(5, 2)), Tile::Target);
        assert_eq!(state.tile_at(Position::new(1, 1)), Tile::Floor);
        assert_eq!(state.crate_at(Position::new(3, 2)), Some(1));
        assert_eq!(state.crate_at(Position::new(4, 2)), None);
        assert_eq!(state.crates_on_targets(), 0);
        assert!(!state.all_on_targets());
    }

    #[test]
    fn snapshot_survives_json() {
        let catalog = LevelCatalog::builtin();
        let mut state = GridState::from_level(catalog.get(2).unwrap());
        state.move_count = 7;
        state.facing = Direction::Left;
        let text = serde_json::to_string(&state).unwrap();
        let back: GridState = serde_json::from_str(&text).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn only_in_progress_is_live() {
        assert!(!Status::InProgress.is_terminal());
        assert!(Status::Won.is_terminal());
        assert!(Status::Lost.is_terminal());
    }
}
