/// Movement and push rules, truth-table driven.
///
/// Pure functions over an immutable map view. These encode "what is
/// legal" without performing the action; `sim::step` applies the result.
///
/// ## Movement Truth Table
///
/// Let `next = player + dir` and `beyond = next + dir`.
/// Rows are evaluated top to bottom; the first match wins.
///
/// ┌──────────────────────────────────┬──────────────┬──────────────────┐
/// │ Condition                         │ Result       │ Notes            │
/// ├──────────────────────────────────┼──────────────┼──────────────────┤
/// │ next out of bounds                │ Blocked(Edge)│ map edge         │
/// │ next is a wall                    │ Blocked(Wall)│                  │
/// │ next holds a crate, beyond is     │ Blocked(Crate)│ crate can't move│
/// │   out of bounds / wall / crate    │              │                  │
/// │ next holds a crate                │ Push         │ crate → beyond   │
/// │ Otherwise                         │ Walk         │ player → next    │
/// └──────────────────────────────────┴──────────────┴──────────────────┘
///
/// ## Stuck (strict mode)
///
/// The player is stuck when `resolve_move` is `Blocked` for all four
/// directions. Targets play no part in movement: a crate on a target is
/// pushed like any other.
///
/// ## Win
///
/// Every crate position is a member of the target set.

use std::collections::HashSet;

use super::entity::{Direction, Position};

/// Why a move was refused.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Blocked {
    Edge,
    Wall,
    Crate,
}

/// The legal effect of a move attempt.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveRule {
    Blocked(Blocked),
    Walk { to: Position },
    Push { crate_index: usize, to: Position, crate_to: Position },
}

impl MoveRule {
    pub fn is_blocked(&self) -> bool {
        matches!(self, MoveRule::Blocked(_))
    }
}

/// Immutable view of walls and crates for rule queries.
pub struct MapView<'a> {
    pub walls: &'a HashSet<Position>,
    pub crates: &'a [Position],
    pub width: usize,
    pub height: usize,
}

impl<'a> MapView<'a> {
    /// In bounds and not a wall. Crates are not considered.
    #[inline]
    pub fn is_open(&self, p: Position) -> bool {
        p.in_bounds(self.width, self.height) && !self.walls.contains(&p)
    }

    /// Arena index of the crate at `p`, if any.
    pub fn crate_at(&self, p: Position) -> Option<usize> {
        self.crates.iter().position(|c| *c == p)
    }

    /// Open and not holding a crate.
    pub fn is_free(&self, p: Position) -> bool {
        self.is_open(p) && self.crate_at(p).is_none()
    }
}

// ── Movement ──

/// Decide what a move attempt from `player` towards `dir` does.
/// See truth table above.
pub fn resolve_move(map: &MapView, player: Position, dir: Direction) -> MoveRule {
    let next = player.step(dir);
    if !next.in_bounds(map.width, map.height) {
        return MoveRule::Blocked(Blocked::Edge);
    }
    if map.walls.contains(&next) {
        return MoveRule::Blocked(Blocked::Wall);
    }
    match map.crate_at(next) {
        Some(crate_index) => {
            let beyond = next.step(dir);
            if map.is_free(beyond) {
                MoveRule::Push { crate_index, to: next, crate_to: beyond }
            } else {
                MoveRule::Blocked(Blocked::Crate)
            }
        }
        None => MoveRule::Walk { to: next },
    }
}

/// Can the player do anything at all from `player`?
pub fn has_any_move(map: &MapView, player: Position) -> bool {
    Direction::ALL
        .iter()
        .any(|&dir| !resolve_move(map, player, dir).is_blocked())
}

// ── Win ──

/// Every crate rests on a target.
pub fn all_on_targets(crates: &[Position], targets: &HashSet<Position>) -> bool {
    crates.iter().all(|c| targets.contains(c))
}

/// How many crates currently rest on a target.
pub fn crates_on_targets(crates: &[Position], targets: &HashSet<Position>) -> usize {
    crates.iter().filter(|c| targets.contains(c)).count()
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
