/// Keyboard input: terminal key events to session intents.
///
/// Play is turn-based, so every Press (and auto-repeat) is one command.
/// Release events are ignored.

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use pushbox::domain::entity::Direction;
use pushbox::sim::session::Intent;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Play(Intent),
    Quit,
}

/// Wait up to `timeout` for the next meaningful key.
pub fn next_command(timeout: Duration) -> std::io::Result<Option<Command>> {
    if !event::poll(timeout)? {
        return Ok(None);
    }
    match event::read()? {
        Event::Key(key) if key.kind != KeyEventKind::Release => Ok(map_key(key)),
        _ => Ok(None),
    }
}

pub fn map_key(key: KeyEvent) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('C') => Some(Command::Quit),
            _ => None,
        };
    }

    let intent = match key.code {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Intent::Move(Direction::Up),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Intent::Move(Direction::Down),
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Intent::Move(Direction::Left),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Intent::Move(Direction::Right),
        KeyCode::Char('r') | KeyCode::Char('R') => Intent::Reset,
        KeyCode::Char('n') | KeyCode::Char('N') => Intent::Next,
        KeyCode::Char('p') | KeyCode::Char('P') => Intent::Previous,
        KeyCode::Char('x') | KeyCode::Char('X') => Intent::ResetProgress,
        KeyCode::Char(c @ '1'..='9') => Intent::GoTo(c as usize - '1' as usize),
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Some(Command::Quit),
        _ => return None,
    };
    Some(Command::Play(intent))
}
