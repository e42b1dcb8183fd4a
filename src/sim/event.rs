/// Events emitted by a move attempt.
/// The presentation layer consumes these for animation and overlays.

use crate::domain::entity::{Direction, Position};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    /// The move was refused; only the facing changed.
    Bumped { dir: Direction },
    PlayerMoved { from: Position, to: Position },
    CratePushed { index: usize, from: Position, to: Position, on_target: bool },
    LevelSolved { moves: u32 },
    Stuck,
}
