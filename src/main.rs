/// Entry point and terminal play loop.

mod ui;

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pushbox::config::GameConfig;
use pushbox::sim::level::LevelCatalog;
use pushbox::sim::save::{self, FileStore, KeyValueStore};
use pushbox::sim::session::{Intent, Session, SessionUpdate};
use ui::input::{self, Command};
use ui::renderer::{Frame, Renderer};

const LOG_FILE: &str = "pushbox.log";
const POLL_TIMEOUT: Duration = Duration::from_millis(100);

fn main() -> Result<()> {
    let data_dir = save::default_data_dir();
    init_logging(&data_dir);
    info!("Pushbox starting, version {}", env!("CARGO_PKG_VERSION"));

    let config = GameConfig::load();
    let catalog = load_catalog(&config);
    let store = FileStore::new(config.save_dir.clone().unwrap_or(data_dir));
    info!(dir = %store.dir().display(), "progress store");

    let mut session = Session::new(catalog, store, config.rules)
        .context("could not load the first level")?;

    let mut renderer = Renderer::new();
    renderer.init().context("terminal init failed")?;

    let result = game_loop(&mut session, &mut renderer);
    let cleanup = renderer.cleanup();
    result?;
    cleanup.context("terminal cleanup failed")?;

    let progress = session.progress();
    println!();
    println!("Thanks for playing Pushbox!");
    println!(
        "Solved {} of {} levels ({}%).",
        progress.completed_indexes().len(),
        progress.total_levels(),
        progress.progress_percentage(),
    );
    info!("Pushbox shutdown");
    Ok(())
}

/// Log to a file: the terminal belongs to the renderer while playing.
fn init_logging(dir: &Path) {
    let file = match OpenOptions::new().create(true).append(true).open(dir.join(LOG_FILE)) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Warning: logging disabled, could not open {}: {e}", LOG_FILE);
            return;
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pushbox=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .init();
}

/// Configured pack if it loads, built-in levels otherwise.
fn load_catalog(config: &GameConfig) -> LevelCatalog {
    let Some(path) = &config.levels_pack else {
        return LevelCatalog::builtin();
    };
    match LevelCatalog::load_pack(path) {
        Ok(catalog) => catalog,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "level pack unusable, using built-in levels");
            LevelCatalog::builtin()
        }
    }
}

fn game_loop<S: KeyValueStore>(session: &mut Session<S>, renderer: &mut Renderer) -> Result<()> {
    let mut message = String::new();

    loop {
        draw(session, renderer, &message)?;

        let command = match input::next_command(POLL_TIMEOUT)? {
            Some(command) => command,
            None => continue,
        };
        match command {
            Command::Quit => break,
            Command::Play(intent) => {
                let update = session.handle(intent)?;
                message = feedback(session, intent, &update).unwrap_or_default();
            }
        }
    }

    Ok(())
}

fn draw<S: KeyValueStore>(session: &Session<S>, renderer: &mut Renderer, message: &str) -> Result<()> {
    let grid = session.engine().snapshot()?;
    let level = session.current_level()?;
    let progress = session.progress();
    let completed: Vec<bool> = (0..progress.total_levels())
        .map(|i| progress.is_completed(i).unwrap_or(false))
        .collect();

    renderer.render(&Frame {
        grid: &grid,
        pack: session.catalog().info(),
        level_name: &level.name,
        level_index: progress.current_index(),
        completed: &completed,
        percentage: progress.progress_percentage(),
        message,
    })?;
    Ok(())
}

/// One-line note for the status bar, when an intent deserves one.
fn feedback<S: KeyValueStore>(session: &Session<S>, intent: Intent, update: &SessionUpdate) -> Option<String> {
    let progress = session.progress();
    if update.completed_now && progress.progress_percentage() == 100 {
        return Some("Every level solved!".to_string());
    }
    if update.level_changed {
        return match intent {
            Intent::ResetProgress => Some("Progress cleared.".to_string()),
            _ => None,
        };
    }
    match intent {
        Intent::Next => Some("This is the last level.".to_string()),
        Intent::Previous => Some("This is the first level.".to_string()),
        Intent::GoTo(index) => Some(format!("There is no level {}.", index + 1)),
        _ => None,
    }
}
