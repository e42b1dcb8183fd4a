/// Session: the play loop shared by every host.
///
/// Owns the catalog, the engine and the progress tracker, and keeps them
/// in step: the engine always holds the tracker's current level, and a win
/// is recorded the moment it happens.

use tracing::debug;

use crate::config::RulesConfig;
use crate::domain::entity::Direction;
use crate::error::EngineResult;
use super::engine::PuzzleEngine;
use super::level::{LevelCatalog, LevelDefinition};
use super::progress::ProgressTracker;
use super::save::KeyValueStore;
use super::step::MoveOutcome;

/// Something the player asked for.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Intent {
    Move(Direction),
    Reset,
    Next,
    Previous,
    GoTo(usize),
    ResetProgress,
}

/// What handling an intent changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionUpdate {
    /// Present for `Intent::Move`.
    pub outcome: Option<MoveOutcome>,
    /// A different level (or a fresh copy of the same one) was loaded.
    pub level_changed: bool,
    /// The current level was marked complete by this intent.
    pub completed_now: bool,
}

pub struct Session<S: KeyValueStore> {
    catalog: LevelCatalog,
    engine: PuzzleEngine,
    progress: ProgressTracker<S>,
}

impl<S: KeyValueStore> Session<S> {
    /// Restore progress from `store` and load the current level.
    pub fn new(catalog: LevelCatalog, store: S, rules: RulesConfig) -> EngineResult<Self> {
        let progress = ProgressTracker::new(store, catalog.len());
        let mut session = Session {
            catalog,
            engine: PuzzleEngine::new(rules),
            progress,
        };
        session.load_current()?;
        Ok(session)
    }

    pub fn handle(&mut self, intent: Intent) -> EngineResult<SessionUpdate> {
        debug!(?intent, "intent");
        let mut update = SessionUpdate::default();
        match intent {
            Intent::Move(dir) => {
                let outcome = self.engine.attempt_move(dir)?;
                if outcome.solved() {
                    self.progress.complete_current();
                    update.completed_now = true;
                }
                update.outcome = Some(outcome);
            }
            Intent::Reset => {
                self.engine.reset()?;
                update.level_changed = true;
            }
            Intent::Next => {
                if self.progress.advance() {
                    self.load_current()?;
                    update.level_changed = true;
                }
            }
            Intent::Previous => {
                if self.progress.retreat() {
                    self.load_current()?;
                    update.level_changed = true;
                }
            }
            Intent::GoTo(index) => {
                if self.progress.go_to(index) {
                    self.load_current()?;
                    update.level_changed = true;
                }
            }
            Intent::ResetProgress => {
                self.progress.reset_progress();
                self.load_current()?;
                update.level_changed = true;
            }
        }
        Ok(update)
    }

    pub fn engine(&self) -> &PuzzleEngine {
        &self.engine
    }

    pub fn progress(&self) -> &ProgressTracker<S> {
        &self.progress
    }

    pub fn catalog(&self) -> &LevelCatalog {
        &self.catalog
    }

    pub fn current_level(&self) -> EngineResult<&LevelDefinition> {
        self.catalog.get(self.progress.current_index())
    }

    fn load_current(&mut self) -> EngineResult<()> {
        let level = self.catalog.get(self.progress.current_index())?;
        self.engine.load(level);
        Ok(())
    }
}
