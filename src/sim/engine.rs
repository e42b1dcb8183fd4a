/// PuzzleEngine: owns the grid of the level in play.
///
/// Hosts feed it directions and read back outcomes or snapshots. The engine
/// keeps the loaded level so `reset` can rebuild the start layout.

use tracing::{debug, info};

use crate::config::RulesConfig;
use crate::domain::entity::Direction;
use crate::error::{EngineError, EngineResult};
use super::level::LevelDefinition;
use super::step::{self, MoveOutcome};
use super::world::{GridState, Status};

#[derive(Clone, Debug)]
struct Loaded {
    level: LevelDefinition,
    grid: GridState,
}

#[derive(Clone, Debug, Default)]
pub struct PuzzleEngine {
    rules: RulesConfig,
    loaded: Option<Loaded>,
}

impl PuzzleEngine {
    pub fn new(rules: RulesConfig) -> Self {
        PuzzleEngine { rules, loaded: None }
    }

    /// Start `level` from its initial layout.
    pub fn load(&mut self, level: &LevelDefinition) {
        info!(id = level.id, name = %level.name, "level loaded");
        self.loaded = Some(Loaded {
            level: level.clone(),
            grid: GridState::from_level(level),
        });
    }

    /// Back to the start layout of the loaded level. Idempotent.
    pub fn reset(&mut self) -> EngineResult<()> {
        let loaded = self.loaded.as_mut().ok_or(EngineError::NotLoaded)?;
        debug!(id = loaded.level.id, "level reset");
        loaded.grid = GridState::from_level(&loaded.level);
        Ok(())
    }

    pub fn attempt_move(&mut self, dir: Direction) -> EngineResult<MoveOutcome> {
        let loaded = self.loaded.as_mut().ok_or(EngineError::NotLoaded)?;
        let outcome = step::step(&mut loaded.grid, dir, &self.rules);
        if outcome.moved {
            debug!(?dir, pushed = outcome.pushed_crate, moves = loaded.grid.move_count, "moved");
        }
        match outcome.status {
            Status::Won if outcome.solved() => {
                info!(id = loaded.level.id, moves = loaded.grid.move_count, "level solved");
            }
            Status::Lost if outcome.moved => {
                info!(id = loaded.level.id, "player is stuck");
            }
            _ => {}
        }
        Ok(outcome)
    }

    pub fn is_won(&self) -> bool {
        self.status() == Some(Status::Won)
    }

    pub fn is_lost(&self) -> bool {
        self.status() == Some(Status::Lost)
    }

    /// Cell-changing moves since the last load or reset; 0 before any load.
    pub fn move_count(&self) -> u32 {
        self.loaded.as_ref().map_or(0, |l| l.grid.move_count)
    }

    /// A copy of the current grid.
    pub fn snapshot(&self) -> EngineResult<GridState> {
        self.loaded
            .as_ref()
            .map(|l| l.grid.clone())
            .ok_or(EngineError::NotLoaded)
    }

    pub fn level(&self) -> Option<&LevelDefinition> {
        self.loaded.as_ref().map(|l| &l.level)
    }

    /// `(placed, total)` crates for HUDs. `(0, 0)` before any load.
    pub fn crates_on_targets(&self) -> (usize, usize) {
        self.loaded
            .as_ref()
            .map_or((0, 0), |l| (l.grid.crates_on_targets(), l.grid.crates.len()))
    }

    fn status(&self) -> Option<Status> {
        self.loaded.as_ref().map(|l| l.grid.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Position;
    use crate::sim::event::GameEvent;
    use crate::sim::level::LevelCatalog;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn scenario_level() -> LevelDefinition {
        let pack = "\
######
#@   #
# $ .#
#    #
######
";
        LevelCatalog::from_pack_str(pack).unwrap().get(0).unwrap().clone()
    }

    fn loaded_engine(level: &LevelDefinition) -> PuzzleEngine {
        let mut engine = PuzzleEngine::new(RulesConfig::default());
        engine.load(level);
        engine
    }

    #[test]
    fn use_before_load_is_an_error() {
        let mut engine = PuzzleEngine::new(RulesConfig::default());
        assert_eq!(engine.attempt_move(Direction::Up).unwrap_err(), EngineError::NotLoaded);
        assert_eq!(engine.reset().unwrap_err(), EngineError::NotLoaded);
        assert_eq!(engine.snapshot().unwrap_err(), EngineError::NotLoaded);
        assert!(!engine.is_won());
        assert!(!engine.is_lost());
        assert_eq!(engine.move_count(), 0);
        assert_eq!(engine.crates_on_targets(), (0, 0));
        assert!(engine.level().is_none());
    }

    #[test]
    fn load_starts_fresh() {
        let level = scenario_level();
        let engine = loaded_engine(&level);
        let snap = engine.snapshot().unwrap();
        assert_eq!(snap.player, Position::new(1, 1));
        assert_eq!(snap.crates, vec![Position::new(2, 2)]);
        assert_eq!(snap.status, Status::InProgress);
        assert_eq!(snap.facing, Direction::Down);
        assert_eq!(engine.move_count(), 0);
        assert_eq!(engine.level(), Some(&level));
    }

    #[test]
    fn push_crate_onto_target_scenario() {
        let mut engine = loaded_engine(&scenario_level());

        let down = engine.attempt_move(Direction::Down).unwrap();
        assert!(down.moved && !down.pushed_crate);

        let first = engine.attempt_move(Direction::Right).unwrap();
        assert!(first.pushed_crate);
        assert_eq!(first.status, Status::InProgress);
        assert!(!engine.is_won());
        assert_eq!(engine.snapshot().unwrap().crates, vec![Position::new(3, 2)]);

        let second = engine.attempt_move(Direction::Right).unwrap();
        assert!(second.moved && second.pushed_crate);
        assert_eq!(second.status, Status::Won);
        assert!(engine.is_won());
        assert_eq!(engine.move_count(), 3);
        assert_eq!(engine.crates_on_targets(), (1, 1));

        let snap = engine.snapshot().unwrap();
        assert_eq!(snap.crates, vec![Position::new(4, 2)]);
        assert_eq!(snap.player, Position::new(3, 2));
    }

    #[test]
    fn win_is_reported_once() {
        let mut engine = loaded_engine(&scenario_level());
        engine.attempt_move(Direction::Down).unwrap();
        engine.attempt_move(Direction::Right).unwrap();
        let winning = engine.attempt_move(Direction::Right).unwrap();
        assert!(winning.events.contains(&GameEvent::LevelSolved { moves: 3 }));

        let after = engine.attempt_move(Direction::Left).unwrap();
        assert!(!after.moved);
        assert_eq!(after.status, Status::Won);
        assert!(!after.solved());
        assert_eq!(engine.move_count(), 3);
    }

    #[test]
    fn blocked_attempts_do_not_count() {
        let mut engine = loaded_engine(&scenario_level());
        let out = engine.attempt_move(Direction::Up).unwrap();
        assert!(!out.moved);
        assert_eq!(engine.move_count(), 0);
        assert_eq!(engine.snapshot().unwrap().facing, Direction::Up);
    }

    #[test]
    fn snapshot_is_a_copy() {
        let mut engine = loaded_engine(&scenario_level());
        let mut snap = engine.snapshot().unwrap();
        snap.crates[0] = Position::new(4, 2);
        snap.status = Status::Won;
        assert!(!engine.is_won());
        assert_eq!(engine.snapshot().unwrap().crates, vec![Position::new(2, 2)]);
        assert!(engine.attempt_move(Direction::Right).unwrap().moved);
    }

    #[test]
    fn reset_after_win_restores_play() {
        let level = scenario_level();
        let mut engine = loaded_engine(&level);
        for dir in [Direction::Down, Direction::Right, Direction::Right] {
            engine.attempt_move(dir).unwrap();
        }
        assert!(engine.is_won());

        engine.reset().unwrap();
        engine.reset().unwrap();
        assert_eq!(engine.snapshot().unwrap(), loaded_engine(&level).snapshot().unwrap());
        assert!(engine.attempt_move(Direction::Down).unwrap().moved);
    }

    fn any_direction() -> impl Strategy<Value = Direction> {
        prop_oneof![
            Just(Direction::Up),
            Just(Direction::Down),
            Just(Direction::Left),
            Just(Direction::Right),
        ]
    }

    proptest! {
        #[test]
        fn random_play_keeps_the_grid_consistent(
            level_index in 0usize..3,
            moves in prop::collection::vec(any_direction(), 0..200),
        ) {
            let catalog = LevelCatalog::builtin();
            let level = catalog.get(level_index).unwrap();
            let mut engine = loaded_engine(level);
            let mut counted = 0u32;

            for dir in moves {
                let before = engine.snapshot().unwrap();
                let out = engine.attempt_move(dir).unwrap();
                let after = engine.snapshot().unwrap();

                if before.status == Status::InProgress {
                    prop_assert_eq!(after.facing, dir);
                }
                if out.moved {
                    counted += 1;
                } else {
                    prop_assert_eq!(&after.player, &before.player);
                    prop_assert_eq!(&after.crates, &before.crates);
                    prop_assert_eq!(after.move_count, before.move_count);
                }

                let distinct: HashSet<_> = after.crates.iter().collect();
                prop_assert_eq!(distinct.len(), after.crates.len());
                for c in &after.crates {
                    prop_assert!(!after.walls.contains(c));
                    prop_assert!(c.in_bounds(after.width, after.height));
                }
                prop_assert!(!after.walls.contains(&after.player));
                prop_assert!(after.crate_at(after.player).is_none());
                prop_assert_eq!(engine.is_won(), after.all_on_targets());
                // The cell just vacated is always open to walk back into.
                prop_assert!(!engine.is_lost());
            }
            prop_assert_eq!(engine.move_count(), counted);

            engine.reset().unwrap();
            prop_assert_eq!(engine.snapshot().unwrap(), GridState::from_level(level));
        }
    }
}
