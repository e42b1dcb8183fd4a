/// Static tile types and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.
///
/// Crates and the player are not tiles: they move, and live in the
/// grid state's position arena instead.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Tile {
    #[default]
    Floor,
    Wall,
    Target, // Floor a crate must end up on
}

impl Tile {
    /// Can anything (player or crate) occupy this tile?
    pub fn is_solid(self) -> bool {
        matches!(self, Tile::Wall)
    }

    /// Does a crate resting here count towards the win?
    pub fn is_target(self) -> bool {
        matches!(self, Tile::Target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_walls_are_solid() {
        assert!(Tile::Wall.is_solid());
        assert!(!Tile::Floor.is_solid());
        assert!(!Tile::Target.is_solid());
    }

    #[test]
    fn default_is_floor() {
        assert_eq!(Tile::default(), Tile::Floor);
        assert!(!Tile::default().is_target());
    }
}
