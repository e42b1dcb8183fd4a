/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The renderer only ever sees a `Frame` built from engine snapshots.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use pushbox::domain::entity::{Direction, Position};
use pushbox::domain::tile::Tile;
use pushbox::sim::level::PackInfo;
use pushbox::sim::world::{GridState, Status};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, so row gaps
    /// match the cell color on terminals with a different default.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Frame: everything one screen shows ──

/// Read-only view handed to the renderer by the host.
pub struct Frame<'a> {
    pub grid: &'a GridState,
    pub pack: &'a PackInfo,
    pub level_name: &'a str,
    pub level_index: usize,
    /// One flag per catalog level.
    pub completed: &'a [bool],
    pub percentage: u32,
    pub message: &'a str,
}

// ── Renderer ──

/// Each game cell = 2 terminal columns.
const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const LEVELS_ROW: usize = 1;
const MAP_ROW: usize = 3;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, frame: &Frame) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        self.compose(frame);
        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        // Force full repaint: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        // Explicit base colors; ResetColor would fall back to the terminal default.
        queue!(
            self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }

                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose(&mut self, f: &Frame) {
        self.front.clear();
        let g = f.grid;

        // ── HUD row ──
        let (placed, total) = (g.crates_on_targets(), g.crates.len());
        let hud = format!(
            " Level {}/{}  {}   Moves:{:<4}  Crates:{}/{}  Solved:{}% ",
            f.level_index + 1,
            f.completed.len(),
            f.level_name,
            g.move_count,
            placed,
            total,
            f.percentage,
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        // ── Level strip ──
        let mut x = 1;
        for (i, done) in f.completed.iter().enumerate() {
            let label = format!("{}{}", i + 1, if *done { '✓' } else { ' ' });
            let (fg, bg) = if i == f.level_index {
                (Color::Black, Color::Rgb { r: 100, g: 200, b: 255 })
            } else if *done {
                (Color::Rgb { r: 80, g: 255, b: 80 }, Color::Reset)
            } else {
                (Color::DarkGrey, Color::Reset)
            };
            self.front.put_str(x, LEVELS_ROW, &label, fg, bg);
            x += label.chars().count() + 1;
        }
        let credit = if f.pack.author.is_empty() {
            format!(" {}", f.pack.name)
        } else {
            format!(" {} by {}", f.pack.name, f.pack.author)
        };
        self.front.put_str(x + 1, LEVELS_ROW, &credit, Color::DarkGrey, Color::Reset);

        // ── Map, centered horizontally ──
        let map_cols = g.width * CELL_W;
        let left = self.front.width.saturating_sub(map_cols) / 2;
        for gy in 0..g.height {
            let row = MAP_ROW + gy;
            if row >= self.front.height {
                break;
            }
            for gx in 0..g.width {
                let col = left + gx * CELL_W;
                self.compose_cell(g, Position::new(gx as i32, gy as i32), col, row);
            }
        }

        // ── Status / message bar ──
        let msg_row = MAP_ROW + g.height + 1;
        let status = match g.status {
            Status::Won => " Solved! N: next level   R: play again ".to_string(),
            Status::Lost => " Stuck! R: restart the level ".to_string(),
            Status::InProgress if !f.message.is_empty() => format!(" {} ", f.message),
            Status::InProgress => String::new(),
        };
        if !status.is_empty() {
            self.front.fill_row(msg_row, MSG_BG);
            self.front.put_str(0, msg_row, &status, Color::Black, MSG_BG);
        }
        if g.status.is_terminal() && !f.message.is_empty() {
            self.front.put_str(0, msg_row + 1, &format!(" {}", f.message), Color::White, Color::Reset);
        }

        // ── Help bar ──
        let help_row = msg_row + 3;
        let help = " Arrows/WASD:Move  R:Reset  N/P:Next/Prev  1-9:Level  X:Clear progress  Q:Quit";
        self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
    }

    /// Write the visual for game cell `p` into the front buffer at (col, row).
    fn compose_cell(&mut self, g: &GridState, p: Position, col: usize, row: usize) {
        let tile = g.tile_at(p);
        let on_target = tile.is_target();

        let (c0, c1, fg, bg) = if p == g.player {
            let (c0, c1) = match g.facing {
                Direction::Up => ('@', '^'),
                Direction::Down => ('@', 'v'),
                Direction::Left => ('<', '@'),
                Direction::Right => ('@', '>'),
            };
            let bg = if on_target { Color::Rgb { r: 60, g: 40, b: 70 } } else { Color::Reset };
            (c0, c1, Color::Rgb { r: 255, g: 220, b: 50 }, bg)
        } else if g.crate_at(p).is_some() {
            if on_target {
                ('[', ']', Color::Black, Color::Rgb { r: 80, g: 200, b: 80 })
            } else {
                ('[', ']', Color::Black, Color::Rgb { r: 180, g: 120, b: 60 })
            }
        } else {
            match tile {
                Tile::Wall => ('█', '█', Color::Rgb { r: 120, g: 120, b: 120 }, Color::Rgb { r: 70, g: 70, b: 70 }),
                Tile::Target => ('(', ')', Color::Rgb { r: 200, g: 120, b: 220 }, Color::Reset),
                Tile::Floor => (' ', ' ', Color::Reset, Color::Reset),
            }
        };
        self.front.set(col, row, Cell::new(c0, fg, bg));
        self.front.set(col + 1, row, Cell::new(c1, fg, bg));
    }
}
