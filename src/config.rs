/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to defaults if the file is missing, incomplete or malformed.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

// ── Public Config Structs ──

#[derive(Clone, Debug, Default)]
pub struct GameConfig {
    pub rules: RulesConfig,
    /// Level pack to play instead of the built-in levels.
    pub levels_pack: Option<PathBuf>,
    /// Where progress is saved. `None` means the default data directory.
    pub save_dir: Option<PathBuf>,
}

/// Switches that change how the puzzle engine judges a position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RulesConfig {
    /// Declare the level lost when the player has no legal move left.
    /// Only guards the check run after a move that relocated the player;
    /// that move always leaves the vacated cell open, so in normal play
    /// the check never fires.
    pub deadlock_detection: bool,
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig {
            deadlock_detection: default_deadlock_detection(),
        }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    rules: TomlRules,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlRules {
    #[serde(default = "default_deadlock_detection")]
    deadlock_detection: bool,
}

#[derive(Deserialize, Debug, Default)]
struct TomlGeneral {
    #[serde(default)]
    levels_pack: Option<String>,
    #[serde(default)]
    save_dir: Option<String>,
}

// ── Defaults ──

fn default_deadlock_detection() -> bool { true }

impl Default for TomlRules {
    fn default() -> Self {
        TomlRules {
            deadlock_detection: default_deadlock_detection(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: exe directory, CWD, then the data directories.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        Self::from_toml(toml_cfg, &search_dirs)
    }

    /// Parse config text directly. Relative paths resolve against the CWD.
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        let toml_cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(Self::from_toml(toml_cfg, &[]))
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let levels_pack = toml_cfg
            .general
            .levels_pack
            .filter(|s| !s.trim().is_empty())
            .map(|s| resolve_path(&s, search_dirs));
        let save_dir = toml_cfg
            .general
            .save_dir
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        GameConfig {
            rules: RulesConfig {
                deadlock_detection: toml_cfg.rules.deadlock_detection,
            },
            levels_pack,
            save_dir,
        }
    }
}

/// Absolute paths are kept; relative ones are looked up in the search dirs,
/// falling back to the path as written (relative to CWD).
fn resolve_path(raw: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        return path;
    }
    search_dirs
        .iter()
        .map(|d| d.join(&path))
        .find(|p| p.exists())
        .unwrap_or(path)
}

/// Candidate directories to search: exe dir + CWD + data paths (deduplicated).
pub fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so a linked binary still finds its data.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/pushbox)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/pushbox");
        push_if_dir(&mut dirs, xdg);
    }

    // 4. System data directory
    push_if_dir(&mut dirs, PathBuf::from("/usr/share/pushbox"));

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

fn push_if_dir(dirs: &mut Vec<PathBuf>, dir: PathBuf) {
    if dir.is_dir() && !dirs.iter().any(|d| d == &dir) {
        dirs.push(dir);
    }
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            return read_toml(&path);
        }
    }
    debug!("no config.toml found, using defaults");
    TomlConfig::default()
}

fn read_toml(path: &Path) -> TomlConfig {
    match std::fs::read_to_string(path) {
        Ok(text) => match toml::from_str::<TomlConfig>(&text) {
            Ok(cfg) => {
                debug!(path = %path.display(), "loaded config");
                cfg
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "config.toml parse error, using defaults");
                TomlConfig::default()
            }
        },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read config.toml");
            TomlConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = GameConfig::parse("").unwrap();
        assert!(cfg.rules.deadlock_detection);
        assert!(cfg.levels_pack.is_none());
        assert!(cfg.save_dir.is_none());
    }

    #[test]
    fn reads_every_key() {
        let cfg = GameConfig::parse(
            r#"
            [rules]
            deadlock_detection = false

            [general]
            levels_pack = "/opt/packs/classic.txt"
            save_dir = "/tmp/pushbox-saves"
            "#,
        )
        .unwrap();
        assert!(!cfg.rules.deadlock_detection);
        assert_eq!(cfg.levels_pack, Some(PathBuf::from("/opt/packs/classic.txt")));
        assert_eq!(cfg.save_dir, Some(PathBuf::from("/tmp/pushbox-saves")));
    }

    #[test]
    fn blank_paths_are_ignored() {
        let cfg = GameConfig::parse("[general]\nlevels_pack = \"\"\nsave_dir = \"  \"\n").unwrap();
        assert!(cfg.levels_pack.is_none());
        assert!(cfg.save_dir.is_none());
    }

    #[test]
    fn malformed_file_is_an_error_for_parse() {
        assert!(GameConfig::parse("[rules\ndeadlock_detection = ").is_err());
    }

    #[test]
    fn malformed_file_falls_back_when_loading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[rules]\ndeadlock_detection = \"maybe\"\n").unwrap();
        let cfg = read_toml(&path);
        assert!(cfg.rules.deadlock_detection);
    }

    #[test]
    fn relative_pack_resolves_against_search_dirs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("classic.txt"), "").unwrap();
        let found = resolve_path("classic.txt", &[dir.path().to_path_buf()]);
        assert_eq!(found, dir.path().join("classic.txt"));
        assert_eq!(resolve_path("missing.txt", &[dir.path().to_path_buf()]), PathBuf::from("missing.txt"));
    }
}
