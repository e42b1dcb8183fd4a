/// Level definitions, the level catalog, and the plain-text pack loader.
///
/// ## Sources (priority order):
///   1. Pack file named by `general.levels_pack` in `config.toml`
///   2. Built-in levels
///
/// ## Pack format:
///   ```text
///   ## Pack Name
///   ## Author: name
///   ---
///   # First Level
///   ########
///   #@ $  .#
///   ########
///   ---
///   # Second Level
///   <map rows>
///   ```
///
/// Levels are separated by a line containing only `---`.
/// Pack metadata lines start with `##` and precede the first `---`.
/// A file without any `---` is read as a single level.
///
/// ## Tile legend:
///   '#' = Wall            ' ', '-', '_' = Floor
///   '@' = Player          '+' = Player on target
///   '$' = Crate           '*' = Crate on target
///   '.' = Target

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::entity::Position;
use crate::error::{EngineError, EngineResult, LevelError};

/// One authored puzzle. Immutable once it is in a catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDefinition {
    pub id: u32,
    pub name: String,
    pub width: usize,
    pub height: usize,
    pub player_start: Position,
    /// Order matters: reset restores crate `i` to `crates[i]`.
    pub crates: Vec<Position>,
    pub targets: Vec<Position>,
    pub walls: Vec<Position>,
}

impl LevelDefinition {
    /// Check the authoring invariants the engine relies on.
    pub fn validate(&self) -> Result<(), LevelError> {
        let invalid = |reason: String| LevelError::Invalid { id: self.id, reason };

        if self.id == 0 {
            return Err(invalid("id must be positive".into()));
        }
        if self.width == 0 || self.height == 0 {
            return Err(invalid(format!("size {}x{} is empty", self.width, self.height)));
        }
        if self.crates.is_empty() {
            return Err(invalid("level has no crates".into()));
        }

        let all = std::iter::once(&self.player_start)
            .chain(&self.crates)
            .chain(&self.targets)
            .chain(&self.walls);
        for p in all {
            if !p.in_bounds(self.width, self.height) {
                return Err(invalid(format!("({}, {}) is outside the grid", p.x, p.y)));
            }
        }

        let walls: HashSet<Position> = self.walls.iter().copied().collect();
        if walls.contains(&self.player_start) {
            return Err(invalid("player starts inside a wall".into()));
        }

        let mut crates = HashSet::with_capacity(self.crates.len());
        for c in &self.crates {
            if walls.contains(c) {
                return Err(invalid(format!("crate at ({}, {}) is inside a wall", c.x, c.y)));
            }
            if *c == self.player_start {
                return Err(invalid(format!("crate at ({}, {}) is on the player start", c.x, c.y)));
            }
            if !crates.insert(*c) {
                return Err(invalid(format!("two crates at ({}, {})", c.x, c.y)));
            }
        }

        let mut targets = HashSet::with_capacity(self.targets.len());
        for t in &self.targets {
            if walls.contains(t) {
                return Err(invalid(format!("target at ({}, {}) is inside a wall", t.x, t.y)));
            }
            if !targets.insert(*t) {
                return Err(invalid(format!("duplicate target at ({}, {})", t.x, t.y)));
            }
        }
        if targets.len() != crates.len() {
            return Err(invalid(format!(
                "{} crates but {} targets", crates.len(), targets.len(),
            )));
        }
        // Won is only evaluated after a push.
        if crates.is_subset(&targets) {
            return Err(invalid("level is already solved".into()));
        }

        Ok(())
    }
}

/// Pack metadata shown by hosts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PackInfo {
    pub name: String,
    pub author: String,
}

/// Ordered, immutable collection of levels.
#[derive(Clone, Debug)]
pub struct LevelCatalog {
    info: PackInfo,
    levels: Vec<LevelDefinition>,
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

impl LevelCatalog {
    /// Build a catalog, validating every level and id uniqueness.
    pub fn new(levels: Vec<LevelDefinition>) -> Result<Self, LevelError> {
        if levels.is_empty() {
            return Err(LevelError::Empty);
        }
        let mut ids = HashSet::with_capacity(levels.len());
        for level in &levels {
            level.validate()?;
            if !ids.insert(level.id) {
                return Err(LevelError::Invalid {
                    id: level.id,
                    reason: "duplicate level id".into(),
                });
            }
        }
        Ok(LevelCatalog { info: PackInfo::default(), levels })
    }

    /// The levels shipped with the game.
    pub fn builtin() -> Self {
        LevelCatalog {
            info: PackInfo {
                name: "Built-in Levels".to_string(),
                author: "Pushbox".to_string(),
            },
            levels: builtin_levels(),
        }
    }

    /// Parse a pack from text.
    pub fn from_pack_str(content: &str) -> Result<Self, LevelError> {
        let info = parse_pack_info(content);
        let levels = parse_pack_levels(content)?;
        if levels.is_empty() {
            return Err(LevelError::EmptyPack);
        }
        debug!(pack = %info.name, levels = levels.len(), "parsed level pack");
        let mut catalog = Self::new(levels)?;
        catalog.info = info;
        Ok(catalog)
    }

    /// Read and parse a pack file.
    pub fn load_pack(path: &Path) -> Result<Self, LevelError> {
        let content = std::fs::read_to_string(path)?;
        let mut catalog = Self::from_pack_str(&content)?;
        if catalog.info.name.is_empty() {
            catalog.info.name = path
                .file_stem()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string();
        }
        info!(path = %path.display(), levels = catalog.len(), "loaded level pack");
        Ok(catalog)
    }

    pub fn get(&self, index: usize) -> EngineResult<&LevelDefinition> {
        self.levels.get(index).ok_or(EngineError::OutOfRange {
            index,
            len: self.levels.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Always false for a constructed catalog; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LevelDefinition> {
        self.levels.iter()
    }

    /// Level names in catalog order, for level-select screens.
    pub fn names(&self) -> Vec<&str> {
        self.levels.iter().map(|l| l.name.as_str()).collect()
    }

    pub fn info(&self) -> &PackInfo {
        &self.info
    }
}

// ══════════════════════════════════════════════════════════════
// Pack parsing
// ══════════════════════════════════════════════════════════════

/// Read pack metadata from the `##` lines at the top.
fn parse_pack_info(content: &str) -> PackInfo {
    let mut info = PackInfo::default();

    for line in content.lines() {
        let trimmed = line.trim();
        if let Some(author) = trimmed.strip_prefix("## Author:") {
            info.author = author.trim().to_string();
        } else if let Some(name) = trimmed.strip_prefix("##") {
            if info.name.is_empty() && is_name_line(trimmed) {
                info.name = name.trim().to_string();
            }
        } else if trimmed == "---" || trimmed.starts_with('#') {
            break; // Done with metadata
        }
    }

    info
}

/// Split a pack into level sections and parse each one.
fn parse_pack_levels(content: &str) -> Result<Vec<LevelDefinition>, LevelError> {
    let has_separator = content.lines().any(|l| l.trim() == "---");
    let mut sections: Vec<String> = vec![];
    let mut current = String::new();
    let mut in_levels = !has_separator;

    for line in content.lines() {
        if line.trim() == "---" {
            if in_levels && !current.is_empty() {
                sections.push(std::mem::take(&mut current));
            }
            current.clear();
            in_levels = true;
            continue;
        }
        // Skip pack metadata before the first ---
        if !in_levels || line.trim_start().starts_with("##") && is_name_line(line) {
            continue;
        }
        current.push_str(line);
        current.push('\n');
    }
    if !current.is_empty() {
        sections.push(current);
    }

    let mut levels = vec![];
    for section in &sections {
        let id = levels.len() as u32 + 1;
        if let Some(def) = parse_level(section, id)? {
            levels.push(def);
        }
    }
    Ok(levels)
}

// ══════════════════════════════════════════════════════════════
// Single-level parsing
// ══════════════════════════════════════════════════════════════

/// Parse one level section. Blank sections yield `None`.
fn parse_level(content: &str, id: u32) -> Result<Option<LevelDefinition>, LevelError> {
    let mut name = String::new();
    let mut rows: Vec<&str> = vec![];

    for line in content.lines() {
        if line.starts_with('#') && name.is_empty() && is_name_line(line) {
            name = line[1..].trim().to_string();
        } else {
            rows.push(line.trim_end());
        }
    }

    while rows.first().map_or(false, |r| r.is_empty()) {
        rows.remove(0);
    }
    while rows.last().map_or(false, |r| r.is_empty()) {
        rows.pop();
    }
    if rows.is_empty() {
        return Ok(None);
    }
    if name.is_empty() {
        name = format!("Level {}", id);
    }

    let parse_err = |reason: String| LevelError::Parse { level: name.clone(), reason };

    let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    let height = rows.len();
    let mut player = None;
    let mut crates = vec![];
    let mut targets = vec![];
    let mut walls = vec![];

    for (y, row) in rows.iter().enumerate() {
        for (x, ch) in row.chars().enumerate() {
            let p = Position::new(x as i32, y as i32);
            match ch {
                '#' => walls.push(p),
                '$' => crates.push(p),
                '.' => targets.push(p),
                '*' => {
                    crates.push(p);
                    targets.push(p);
                }
                '@' | '+' => {
                    if player.replace(p).is_some() {
                        return Err(parse_err("more than one player".into()));
                    }
                    if ch == '+' {
                        targets.push(p);
                    }
                }
                ' ' | '-' | '_' => {}
                other => return Err(parse_err(format!("unexpected character '{}'", other))),
            }
        }
    }

    let player_start = player.ok_or_else(|| parse_err("no player".into()))?;
    let def = LevelDefinition {
        id,
        name,
        width,
        height,
        player_start,
        crates,
        targets,
        walls,
    };
    def.validate()?;
    Ok(Some(def))
}

/// Distinguish `# Level Name` from `########` (level data).
/// A name line starts with `#` and contains at least one letter.
fn is_name_line(line: &str) -> bool {
    line.trim_start_matches('#').chars().any(|c| c.is_alphabetic())
}

// ══════════════════════════════════════════════════════════════
// Built-in levels
// ══════════════════════════════════════════════════════════════

fn builtin_levels() -> Vec<LevelDefinition> {
    vec![
        make_builtin(1, "First Steps", 8, 6, (1, 1),
            &[(2, 2), (3, 2)],
            &[(5, 2), (6, 2)],
            &[],
        ),
        make_builtin(2, "Around the Corner", 9, 7, (1, 1),
            &[(3, 2), (4, 3), (5, 2)],
            &[(6, 1), (7, 1), (7, 2)],
            &[(2, 4), (3, 4), (4, 4)],
        ),
        make_builtin(3, "Tight Squeeze", 10, 8, (1, 6),
            &[(2, 5), (3, 4), (4, 3), (5, 2)],
            &[(7, 1), (8, 1), (8, 2), (8, 3)],
            &[(6, 4), (6, 5), (6, 6), (1, 3), (2, 3), (3, 3)],
        ),
    ]
}

/// A level enclosed by a one-cell wall border plus `inner` walls.
fn make_builtin(
    id: u32,
    name: &str,
    width: usize,
    height: usize,
    player: (i32, i32),
    crates: &[(i32, i32)],
    targets: &[(i32, i32)],
    inner: &[(i32, i32)],
) -> LevelDefinition {
    let (w, h) = (width as i32, height as i32);
    let mut walls: Vec<Position> = vec![];
    for x in 0..w {
        walls.push(Position::new(x, 0));
    }
    for y in 1..h - 1 {
        walls.push(Position::new(0, y));
        walls.push(Position::new(w - 1, y));
    }
    for x in 0..w {
        walls.push(Position::new(x, h - 1));
    }
    walls.extend(inner.iter().map(|&p| Position::from(p)));

    LevelDefinition {
        id,
        name: name.to_string(),
        width,
        height,
        player_start: player.into(),
        crates: crates.iter().map(|&p| p.into()).collect(),
        targets: targets.iter().map(|&p| p.into()).collect(),
        walls,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut v: Vec<Position>) -> Vec<Position> {
        v.sort();
        v
    }

    #[test]
    fn builtin_levels_are_valid() {
        let builtin = LevelCatalog::builtin();
        assert_eq!(builtin.len(), 3);
        let checked = LevelCatalog::new(builtin.iter().cloned().collect());
        assert!(checked.is_ok(), "{:?}", checked.err());
        assert_eq!(builtin.names(), vec!["First Steps", "Around the Corner", "Tight Squeeze"]);
    }

    #[test]
    fn builtin_border_is_closed() {
        let level = LevelCatalog::builtin().get(0).unwrap().clone();
        // 8x6 border = 2*8 + 2*4 cells
        assert_eq!(level.walls.len(), 24);
        assert!(level.walls.contains(&Position::new(7, 5)));
        assert!(level.walls.contains(&Position::new(0, 3)));
    }

    #[test]
    fn get_out_of_range() {
        let catalog = LevelCatalog::builtin();
        assert_eq!(catalog.get(3).unwrap_err(), EngineError::OutOfRange { index: 3, len: 3 });
        assert_eq!(catalog.get(2).unwrap().id, 3);
    }

    #[test]
    fn empty_catalog_rejected() {
        assert!(matches!(LevelCatalog::new(vec![]), Err(LevelError::Empty)));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let a = LevelCatalog::builtin().get(0).unwrap().clone();
        let b = a.clone();
        let err = LevelCatalog::new(vec![a, b]).unwrap_err();
        assert!(matches!(err, LevelError::Invalid { id: 1, .. }));
    }

    #[test]
    fn validate_rejects_crate_in_wall() {
        let mut level = LevelCatalog::builtin().get(0).unwrap().clone();
        level.crates[0] = Position::new(0, 0);
        assert!(matches!(level.validate(), Err(LevelError::Invalid { .. })));
    }

    #[test]
    fn validate_rejects_count_mismatch() {
        let mut level = LevelCatalog::builtin().get(0).unwrap().clone();
        level.targets.pop();
        assert!(level.validate().is_err());
    }

    #[test]
    fn validate_rejects_presolved_level() {
        let mut level = LevelCatalog::builtin().get(0).unwrap().clone();
        level.crates = level.targets.clone();
        let err = level.validate().unwrap_err();
        assert!(matches!(err, LevelError::Invalid { id: 1, ref reason } if reason == "level is already solved"));

        // One crate off its target is enough to be playable.
        assert!(LevelCatalog::from_pack_str("######\n#@*$.#\n######\n").is_ok());
    }

    #[test]
    fn level_from_json_can_be_validated() {
        let level = LevelCatalog::builtin().get(1).unwrap().clone();
        let text = serde_json::to_string(&level).unwrap();
        assert!(text.contains(r#""player_start":{"x":"#));
        let back: LevelDefinition = serde_json::from_str(&text).unwrap();
        assert!(back.validate().is_ok());
        assert_eq!(back, level);
    }

    #[test]
    fn validate_rejects_out_of_bounds() {
        let mut level = LevelCatalog::builtin().get(0).unwrap().clone();
        level.player_start = Position::new(8, 1);
        assert!(level.validate().is_err());
    }

    #[test]
    fn pack_matches_builtin_first_level() {
        let pack = "\
## Classics
## Author: tester
---
# First Steps
########
#@     #
# $$ ..#
#      #
#      #
########
";
        let catalog = LevelCatalog::from_pack_str(pack).unwrap();
        assert_eq!(catalog.info().name, "Classics");
        assert_eq!(catalog.info().author, "tester");
        assert_eq!(catalog.len(), 1);

        let parsed = catalog.get(0).unwrap();
        let builtin = LevelCatalog::builtin().get(0).unwrap().clone();
        assert_eq!(parsed.id, builtin.id);
        assert_eq!(parsed.name, builtin.name);
        assert_eq!((parsed.width, parsed.height), (builtin.width, builtin.height));
        assert_eq!(parsed.player_start, builtin.player_start);
        assert_eq!(parsed.crates, builtin.crates);
        assert_eq!(parsed.targets, builtin.targets);
        assert_eq!(sorted(parsed.walls.clone()), sorted(builtin.walls));
    }

    #[test]
    fn shipped_pack_matches_builtin_levels() {
        let pack = LevelCatalog::from_pack_str(include_str!("../../packs/classic.txt")).unwrap();
        let builtin = LevelCatalog::builtin();
        assert_eq!(pack.info().name, "Classic Pushbox");
        assert_eq!(pack.len(), builtin.len());

        for (parsed, expected) in pack.iter().zip(builtin.iter()) {
            assert_eq!(parsed.id, expected.id);
            assert_eq!(parsed.name, expected.name);
            assert_eq!((parsed.width, parsed.height), (expected.width, expected.height));
            assert_eq!(parsed.player_start, expected.player_start);
            assert_eq!(sorted(parsed.crates.clone()), sorted(expected.crates.clone()));
            assert_eq!(sorted(parsed.targets.clone()), sorted(expected.targets.clone()));
            assert_eq!(sorted(parsed.walls.clone()), sorted(expected.walls.clone()));
        }
    }

    #[test]
    fn load_pack_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mini.txt");
        std::fs::write(&path, "#####\n#@$.#\n#####\n").unwrap();
        let catalog = LevelCatalog::load_pack(&path).unwrap();
        assert_eq!(catalog.info().name, "mini");
        assert!(matches!(
            LevelCatalog::load_pack(&dir.path().join("missing.txt")),
            Err(LevelError::Io(_))
        ));
    }

    #[test]
    fn pack_with_several_levels_numbers_ids() {
        let pack = "\
---
# One
#####
#@$.#
#####
---

# Two
######
#+$  #
#  *$.
######
---
";
        let catalog = LevelCatalog::from_pack_str(pack).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(0).unwrap().id, 1);
        let two = catalog.get(1).unwrap();
        assert_eq!(two.id, 2);
        assert_eq!(two.name, "Two");
        assert_eq!(two.player_start, Position::new(1, 1));
        // '+' and '*' both add targets
        assert_eq!(two.targets.len(), 3);
        assert_eq!(two.crates.len(), 3);
    }

    #[test]
    fn single_level_file_without_separator() {
        let text = "\
#####
#@$.#
#####
";
        let catalog = LevelCatalog::from_pack_str(text).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(0).unwrap().name, "Level 1");
        assert_eq!(catalog.get(0).unwrap().width, 5);
    }

    #[test]
    fn ragged_rows_use_longest_width() {
        let text = "\
#####
#@$.###
#####
";
        let catalog = LevelCatalog::from_pack_str(text).unwrap();
        assert_eq!(catalog.get(0).unwrap().width, 7);
    }

    #[test]
    fn pack_errors() {
        assert!(matches!(LevelCatalog::from_pack_str("## Nothing\n---\n\n---\n"), Err(LevelError::EmptyPack)));
        assert!(matches!(
            LevelCatalog::from_pack_str("#####\n#@$@.#\n#####\n"),
            Err(LevelError::Parse { .. })
        ));
        assert!(matches!(
            LevelCatalog::from_pack_str("#####\n# $.#\n#####\n"),
            Err(LevelError::Parse { .. })
        ));
        assert!(matches!(
            LevelCatalog::from_pack_str("#####\n#@$?#\n#####\n"),
            Err(LevelError::Parse { .. })
        ));
        // Parsed but fails validation: two crates, one target.
        assert!(matches!(
            LevelCatalog::from_pack_str("######\n#@$$.#\n######\n"),
            Err(LevelError::Invalid { .. })
        ));
        // Every crate already on a target.
        assert!(matches!(
            LevelCatalog::from_pack_str("####\n#@*#\n####\n"),
            Err(LevelError::Invalid { .. })
        ));
    }

    #[test]
    fn name_lines_need_letters() {
        assert!(is_name_line("# Level 1"));
        assert!(is_name_line("## Pack"));
        assert!(!is_name_line("########"));
        assert!(!is_name_line("#  $ .#"));
    }
}
