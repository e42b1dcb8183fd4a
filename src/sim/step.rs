/// The step function: applies one move attempt to a grid.
///
/// Processing order:
///   1. Terminal guard (Won / Lost ignore input)
///   2. Facing update (always, even when blocked)
///   3. Movement resolution via `rules::resolve_move`
///   4. Win check (only after a crate moved)
///   5. Stuck check (only after the player moved, only with deadlock detection)
///
/// Either every position update of a move happens or none does.

use tracing::{debug, trace};

use crate::config::RulesConfig;
use crate::domain::entity::Direction;
use crate::domain::rules::{self, MoveRule};
use super::event::GameEvent;
use super::world::{GridState, Status};

/// What a single move attempt did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveOutcome {
    pub moved: bool,
    pub pushed_crate: bool,
    pub status: Status,
    pub events: Vec<GameEvent>,
}

impl MoveOutcome {
    fn refused(status: Status, events: Vec<GameEvent>) -> Self {
        MoveOutcome { moved: false, pushed_crate: false, status, events }
    }

    /// Did this move end the level in a win?
    pub fn solved(&self) -> bool {
        self.events.iter().any(|e| matches!(e, GameEvent::LevelSolved { .. }))
    }
}

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(state: &mut GridState, dir: Direction, rules: &RulesConfig) -> MoveOutcome {
    if state.status.is_terminal() {
        return MoveOutcome::refused(state.status, vec![]);
    }

    let mut events: Vec<GameEvent> = Vec::new();
    state.facing = dir;

    let pushed = match rules::resolve_move(&state.map_view(), state.player, dir) {
        MoveRule::Blocked(reason) => {
            trace!(?dir, ?reason, "move blocked");
            events.push(GameEvent::Bumped { dir });
            return MoveOutcome::refused(state.status, events);
        }
        MoveRule::Walk { to } => {
            events.push(GameEvent::PlayerMoved { from: state.player, to });
            state.player = to;
            false
        }
        MoveRule::Push { crate_index, to, crate_to } => {
            let from = state.crates[crate_index];
            state.crates[crate_index] = crate_to;
            events.push(GameEvent::CratePushed {
                index: crate_index,
                from,
                to: crate_to,
                on_target: state.targets.contains(&crate_to),
            });
            events.push(GameEvent::PlayerMoved { from: state.player, to });
            state.player = to;
            true
        }
    };

    state.move_count += 1;

    if pushed {
        resolve_win(state, &mut events);
    }
    if rules.deadlock_detection {
        resolve_stuck(state, &mut events);
    }

    MoveOutcome {
        moved: true,
        pushed_crate: pushed,
        status: state.status,
        events,
    }
}

// ══════════════════════════════════════════════════════════════
// Win / lose checks
// ══════════════════════════════════════════════════════════════

fn resolve_win(state: &mut GridState, events: &mut Vec<GameEvent>) {
    if state.all_on_targets() {
        state.status = Status::Won;
        debug!(moves = state.move_count, "all crates on targets");
        events.push(GameEvent::LevelSolved { moves: state.move_count });
    }
}

/// Strict mode: no direction offers a walk or a push.
fn resolve_stuck(state: &mut GridState, events: &mut Vec<GameEvent>) {
    if state.status != Status::InProgress {
        return;
    }
    if !rules::has_any_move(&state.map_view(), state.player) {
        state.status = Status::Lost;
        debug!(player = ?state.player, "no legal move left");
        events.push(GameEvent::Stuck);
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
