/// Pure puzzle vocabulary: positions, tiles and the movement rules.
/// Nothing here owns state.

pub mod entity;
pub mod rules;
pub mod tile;
