/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// This eliminates flicker caused by full-screen redraws.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::actor::Species;
use crate::domain::tile::{TILE_HEIGHT, TILE_WIDTH};
use crate::sim::world::{Phase, Session};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, so the
    /// inter-row gap pixels on VTE terminals match the cell color and
    /// no horizontal seams show.
    const BASE_BG: Color = Color::Rgb { r: 18, g: 22, b: 28 };

    const BLANK: Cell = Cell {
        ch: ' ',
        fg: Color::White,
        bg: Cell::BASE_BG,
    };

    /// Sentinel used to invalidate the back buffer. Different from any
    /// real cell, so every position will be diff'd.
    const INVALID: Cell = Cell {
        ch: '?',
        fg: Color::Magenta,
        bg: Color::Magenta,
    };

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

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width {
                break;
            }
            self.set(cx, y, Cell::new(ch, fg, bg));
            cx += 1;
        }
    }

    fn fill_row(&mut self, y: usize, fg: Color, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', fg, bg));
        }
    }

    fn put_centered(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        let len = s.chars().count();
        let x = self.width.saturating_sub(len) / 2;
        self.put_str(x, y, s, fg, bg);
    }
}

// ── Renderer ──

/// Each game cell is drawn as 2 terminal columns, so tiles come out
/// roughly square.
const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

const HUD_BG: Color = Color::Rgb { r: 24, g: 36, b: 30 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    key_release: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            key_release: false,
        }
    }

    /// True when the terminal reports key Release events, letting the
    /// input layer skip its hold-timeout fallback.
    pub fn key_release_supported(&self) -> bool {
        self.key_release
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

        self.key_release = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if self.key_release {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.key_release {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// How many game cells fit in the current viewport.
    fn view_size(&self, session: &Session) -> (usize, usize) {
        let reserved = MAP_ROW + 4; // HUD + gap + msg + help
        let view_w = (self.term_w / CELL_W).min(session.world.grid.width().max(1));
        let view_h = if self.term_h > reserved {
            (self.term_h - reserved).min(session.world.grid.height().max(1))
        } else {
            1
        };
        (view_w, view_h)
    }

    pub fn render(&mut self, session: &mut Session) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(
                self.writer,
                SetBackgroundColor(Cell::BASE_BG),
                Clear(ClearType::All)
            )?;
        }

        // Phase change → clear for a clean transition
        let phase_changed = self.last_phase != Some(session.phase);
        if phase_changed {
            self.back.cells.fill(Cell::INVALID);
            queue!(
                self.writer,
                SetBackgroundColor(Cell::BASE_BG),
                Clear(ClearType::All)
            )?;
            self.last_phase = Some(session.phase);
        }

        // Keep the camera on the possessed actor.
        if matches!(session.phase, Phase::Playing | Phase::Dying) {
            let (view_w, view_h) = self.view_size(session);
            let focus = session.world.active_actor().position;
            session
                .camera
                .center_on(focus, &session.world.grid, view_w, view_h);
        }

        self.front.clear();

        match session.phase {
            Phase::Title => self.compose_title(session),
            Phase::Playing | Phase::Dying => self.compose_game(session),
            Phase::LevelComplete => self.compose_banner(
                session,
                "LEVEL CLEAR",
                "The wood grows a little lighter.",
                "[Enter] Next level   [Esc] Quit",
            ),
            Phase::GameOver => self.compose_banner(
                session,
                "FADED AWAY",
                "No hosts left to carry you.",
                "[Enter] Try again   [Esc] Quit",
            ),
            Phase::GameComplete => self.compose_banner(
                session,
                "THE WOOD RESTS",
                "Every level cleared. Thank you for playing.",
                "[Enter/Esc] Title",
            ),
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors at start of frame. Not ResetColor: that
        // resets to the terminal's native default, which may differ
        // from BASE_BG and cause line artifacts.
        queue!(
            self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        let mut scratch = [0u8; 4];
        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch.encode_utf8(&mut scratch)))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_game(&mut self, session: &Session) {
        let world = &session.world;

        // HUD row
        let host = world.active_actor();
        let hearts = "♥".repeat(session.lives as usize);
        let hud = format!(
            " {}  {}/{}  {}  host: {} ",
            session.level_name,
            session.level_index + 1,
            session.level_count,
            hearts,
            host.species.name(),
        );
        self.front.fill_row(HUD_ROW, Color::White, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        // Map viewport
        let (view_w, view_h) = self.view_size(session);
        let cam_x = (session.camera.x / TILE_WIDTH).floor() as i32;
        let cam_y = (session.camera.y / TILE_HEIGHT).floor() as i32;

        for vy in 0..view_h {
            let wy = cam_y + vy as i32;
            let row = MAP_ROW + vy;
            if row >= self.front.height {
                break;
            }
            for vx in 0..view_w {
                let wx = cam_x + vx as i32;
                let col = vx * CELL_W;
                if col + 1 >= self.front.width {
                    break;
                }
                self.compose_tile(session, wx, wy, col, row);
            }
        }

        // Actors on top of the terrain.
        for actor in &world.actors {
            if !actor.alive {
                continue;
            }
            let center = actor.bounding_rect().center();
            let gx = (center.x / TILE_WIDTH).floor() as i32 - cam_x;
            let gy = (center.y / TILE_HEIGHT).floor() as i32 - cam_y;
            if gx < 0 || gy < 0 || gx as usize >= view_w || gy as usize >= view_h {
                continue;
            }
            let col = gx as usize * CELL_W;
            let row = MAP_ROW + gy as usize;
            let (glyph, fg) = actor_look(actor.species, actor.active);
            self.front.set(col, row, Cell::new(glyph, fg, Cell::BASE_BG));
        }

        // Message bar
        let msg_row = MAP_ROW + view_h + 1;
        if !session.message.is_empty() && msg_row < self.front.height {
            let bar_bg = Color::Rgb {
                r: 190,
                g: 170,
                b: 60,
            };
            self.front.fill_row(msg_row, Color::Black, bar_bg);
            self.front
                .put_str(0, msg_row, &format!(" {} ", session.message), Color::Black, bar_bg);
        }

        // Help bar
        let help_row = MAP_ROW + view_h + 3;
        if help_row < self.front.height {
            let help = " ←→/AD:Move  ↑↓/WS:Climb  Space:Jump  E:Possess  R:Restart  Esc:Quit";
            self.front
                .put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
        }
    }

    /// Write the visual for world cell (wx, wy) at buffer (col, row).
    /// Each game cell spans 2 terminal columns.
    fn compose_tile(&mut self, session: &Session, wx: i32, wy: i32, col: usize, row: usize) {
        let world = &session.world;
        let in_bounds = wx >= 0
            && wy >= 0
            && (wx as usize) < world.grid.width()
            && (wy as usize) < world.grid.height();
        if !in_bounds {
            self.front.set(col, row, Cell::BLANK);
            self.front.set(col + 1, row, Cell::BLANK);
            return;
        }

        let glyph = world.grid.glyph_at(wx as usize, wy as usize).unwrap_or('.');
        let (l, r, fg, bg) = tile_look(glyph, session.anim_tick);
        self.front.set(col, row, Cell::new(l, fg, bg));
        self.front.set(col + 1, row, Cell::new(r, fg, bg));
    }

    fn compose_title(&mut self, session: &Session) {
        let mid = self.front.height / 2;
        let title_fg = Color::Rgb {
            r: 170,
            g: 220,
            b: 255,
        };
        self.front
            .put_centered(mid.saturating_sub(4), "W I S P W O O D", title_fg, Color::Reset);
        self.front.put_centered(
            mid.saturating_sub(2),
            "a ghost in borrowed bodies",
            Color::DarkGrey,
            Color::Reset,
        );
        self.front.put_centered(
            mid + 1,
            &format!("{} levels loaded", session.level_count),
            Color::Grey,
            Color::Reset,
        );
        // Slow blink on the prompt.
        if session.anim_tick / 30 % 2 == 0 {
            self.front
                .put_centered(mid + 3, "[Enter] Begin    [Q] Quit", Color::White, Color::Reset);
        }
    }

    fn compose_banner(&mut self, session: &Session, title: &str, line: &str, keys: &str) {
        let mid = self.front.height / 2;
        self.front
            .put_centered(mid.saturating_sub(2), title, Color::Yellow, Color::Reset);
        self.front
            .put_centered(mid, line, Color::Grey, Color::Reset);
        if session.anim_tick / 30 % 2 == 0 {
            self.front
                .put_centered(mid + 2, keys, Color::White, Color::Reset);
        }
    }
}

/// Tile visuals keyed by the level glyph.
fn tile_look(glyph: char, anim_tick: u32) -> (char, char, Color, Color) {
    let stone = Color::Rgb {
        r: 90,
        g: 90,
        b: 100,
    };
    let grass = Color::Rgb { r: 40, g: 110, b: 50 };
    let dirt = Color::Rgb { r: 100, g: 70, b: 40 };
    let wood = Color::Rgb { r: 150, g: 110, b: 60 };
    match glyph {
        '#' => (' ', ' ', Color::White, stone),
        'g' => (' ', ' ', Color::White, grass),
        'd' => (' ', ' ', Color::White, dirt),
        '/' => ('/', ' ', Color::White, stone),
        '\\' => (' ', '\\', Color::White, stone),
        '-' => ('─', '─', grass, Color::Reset),
        '~' => ('~', '~', wood, Color::Reset),
        '|' => ('│', '│', wood, Color::Reset),
        ':' => ('░', '░', stone, Color::Reset),
        'x' => {
            // Exit shimmer.
            let fg = if anim_tick / 15 % 2 == 0 {
                Color::Magenta
            } else {
                Color::Cyan
            };
            ('◆', ' ', fg, Color::Reset)
        }
        _ => (' ', ' ', Color::White, Cell::BASE_BG),
    }
}

fn actor_look(species: Species, active: bool) -> (char, Color) {
    let glyph = if active {
        species.glyph().to_ascii_uppercase()
    } else {
        species.glyph()
    };
    let fg = match species {
        Species::Ghost => Color::Cyan,
        Species::Rabbit => Color::White,
        Species::Snake => Color::Green,
        Species::Squirrel => Color::Rgb {
            r: 200,
            g: 130,
            b: 60,
        },
        Species::Mouse => Color::Grey,
        Species::Kiwi => Color::Rgb {
            r: 140,
            g: 180,
            b: 90,
        },
        Species::Ostrich => Color::Magenta,
    };
    (glyph, fg)
}
