//! Terminal host: raw-mode input via crossterm, board drawing via ratatui, lock flash via tachyonfx.

use crate::app::Host;
use crate::game::{Board, GRID_HEIGHT, GRID_WIDTH};
use crate::input::{Binding, GameKey, HeldKeys, key_binding};
use crate::palette::Tile;
use crate::theme::Theme;
use anyhow::Result;
use crossterm::event::{
    self, DisableFocusChange, EnableFocusChange, Event, KeyEventKind, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::{cursor, execute, terminal};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use ratatui::{DefaultTerminal, Frame};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};
use tracing::{debug, warn};

/// One grid cell is two columns wide so it looks square.
const CELL_COLS: u16 = 2;
const CELL_ROWS: u16 = 1;
const BOARD_COLS: u16 = GRID_WIDTH as u16 * CELL_COLS;
const BOARD_ROWS: u16 = GRID_HEIGHT as u16 * CELL_ROWS;

/// Duration of the white flash on freshly locked cells.
const LOCK_FLASH_MS: u32 = 250;

const TITLE: &str = " elnutris ";

/// Colours drawn this frame, indexed [y][x].
type Canvas = [[Option<Color>; GRID_WIDTH as usize]; GRID_HEIGHT as usize];

const EMPTY_CANVAS: Canvas = [[None; GRID_WIDTH as usize]; GRID_HEIGHT as usize];

pub struct TerminalHost {
    terminal: DefaultTerminal,
    theme: Theme,
    keys: HeldKeys,
    close_requested: bool,
    canvas: Canvas,
    frame_started: Instant,
    /// Terminal reports key releases (kitty keyboard protocol).
    enhanced_keys: bool,
    animate: bool,
    /// Cells locked since the last present; turned into `lock_flash` once the board rect is known.
    pending_flash: Vec<(i32, i32)>,
    lock_flash: Option<Effect>,
    lock_flash_time: Option<Instant>,
}

impl TerminalHost {
    /// Enter raw mode and the alternate screen. Restored when dropped.
    pub fn new(theme: Theme, animate: bool) -> Result<Self> {
        terminal::enable_raw_mode()?;
        let setup = || -> Result<(DefaultTerminal, bool)> {
            let mut stdout = std::io::stdout();
            execute!(
                stdout,
                terminal::EnterAlternateScreen,
                cursor::Hide,
                EnableFocusChange
            )?;
            let enhanced = terminal::supports_keyboard_enhancement().unwrap_or(false);
            if enhanced {
                execute!(
                    stdout,
                    PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
                )?;
            }
            let terminal = DefaultTerminal::new(CrosstermBackend::new(stdout))?;
            Ok((terminal, enhanced))
        };
        let (terminal, enhanced_keys) = match setup() {
            Ok(t) => t,
            Err(e) => {
                restore(false);
                return Err(e);
            }
        };
        debug!(enhanced_keys, animate, "terminal ready");
        Ok(Self {
            terminal,
            theme,
            keys: HeldKeys::new(enhanced_keys),
            close_requested: false,
            canvas: EMPTY_CANVAS,
            frame_started: Instant::now(),
            enhanced_keys,
            animate,
            pending_flash: Vec::new(),
            lock_flash: None,
            lock_flash_time: None,
        })
    }

    fn handle_event(&mut self, event: &Event) {
        match event {
            Event::Key(key) => match key_binding(key) {
                Binding::Quit if key.kind == KeyEventKind::Press => {
                    debug!("close requested");
                    self.close_requested = true;
                }
                Binding::Game(game_key) => self.keys.handle(game_key, key.kind),
                Binding::Quit | Binding::None => {}
            },
            Event::FocusLost => {
                debug!("focus lost, releasing held keys");
                self.keys.release_all();
            }
            Event::Resize(cols, rows) => debug!(cols = *cols, rows = *rows, "terminal resized"),
            _ => {}
        }
    }

    fn drain_events(&mut self) -> Result<()> {
        while event::poll(Duration::ZERO)? {
            let ev = event::read()?;
            self.handle_event(&ev);
        }
        Ok(())
    }
}

impl Host for TerminalHost {
    fn poll_close_requested(&mut self) -> Result<bool> {
        self.drain_events()?;
        Ok(self.close_requested)
    }

    fn is_key_held(&self, key: GameKey) -> bool {
        self.keys.is_held(key)
    }

    fn clear_frame(&mut self) {
        self.canvas = EMPTY_CANVAS;
    }

    fn draw_cell(&mut self, x: i32, y: i32, tile: Tile, alpha: u8) {
        if Board::in_bounds(x, y) {
            self.canvas[y as usize][x as usize] = Some(tile.color(alpha, self.theme.bg));
        }
    }

    fn present_frame(&mut self) -> Result<()> {
        let now = Instant::now();
        let delta = self
            .lock_flash_time
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or(Duration::ZERO);
        let delta_ms = delta.as_millis().min(u128::from(u32::MAX)) as u32;

        let Self {
            terminal,
            theme,
            canvas,
            pending_flash,
            lock_flash,
            ..
        } = self;
        terminal.draw(|frame| {
            draw_frame(
                frame,
                theme,
                canvas,
                pending_flash,
                lock_flash,
                TfxDuration::from_millis(delta_ms),
            );
        })?;

        if self.lock_flash.as_ref().is_some_and(|e| e.done()) {
            self.lock_flash = None;
        }
        self.lock_flash_time = self.lock_flash.is_some().then_some(now);
        Ok(())
    }

    fn wait_frame(&mut self, interval: Duration) -> Result<()> {
        self.keys.next_tick();
        let deadline = self.frame_started + interval;
        loop {
            let timeout = deadline.saturating_duration_since(Instant::now());
            if self.close_requested || timeout.is_zero() {
                break;
            }
            if event::poll(timeout)? {
                let ev = event::read()?;
                self.handle_event(&ev);
            }
        }
        self.frame_started = Instant::now();
        Ok(())
    }

    fn piece_locked(&mut self, cells: &[(i32, i32)], _tile: Tile) {
        if self.animate {
            self.pending_flash.extend_from_slice(cells);
        }
    }
}

impl Drop for TerminalHost {
    fn drop(&mut self) {
        restore(self.enhanced_keys);
    }
}

fn restore(enhanced_keys: bool) {
    let mut stdout = std::io::stdout();
    if enhanced_keys {
        let _ = execute!(stdout, PopKeyboardEnhancementFlags);
    }
    if let Err(e) = execute!(
        stdout,
        DisableFocusChange,
        terminal::LeaveAlternateScreen,
        cursor::Show
    ) {
        warn!(error = %e, "leaving alternate screen");
    }
    if let Err(e) = terminal::disable_raw_mode() {
        warn!(error = %e, "disabling raw mode");
    }
}

/// Board plus any running lock flash. Locks queued while the board is hidden never flash.
fn draw_frame(
    frame: &mut Frame,
    theme: &Theme,
    canvas: &Canvas,
    pending_flash: &mut Vec<(i32, i32)>,
    lock_flash: &mut Option<Effect>,
    elapsed: TfxDuration,
) {
    let Some(board) = draw_board(frame, theme, canvas) else {
        pending_flash.clear();
        return;
    };
    if !pending_flash.is_empty() {
        *lock_flash = Some(lock_flash_effect(board, pending_flash));
        pending_flash.clear();
    }
    if let Some(effect) = lock_flash.as_mut() {
        frame.render_effect(effect, board, elapsed);
    }
}

/// Top-left buffer position of grid cell (x, y) inside `board`.
fn cell_origin(board: Rect, x: i32, y: i32) -> (u16, u16) {
    (
        board.x + x as u16 * CELL_COLS,
        board.y + y as u16 * CELL_ROWS,
    )
}

/// Draw the bordered board centred in the frame. Returns the inner board rect, or `None`
/// (after drawing a notice) when the terminal is too small.
fn draw_board(frame: &mut Frame, theme: &Theme, canvas: &Canvas) -> Option<Rect> {
    let area = frame.area();
    let (outer_w, outer_h) = (BOARD_COLS + 2, BOARD_ROWS + 2);
    if area.width < outer_w || area.height < outer_h {
        draw_too_small(frame, theme, area, outer_w, outer_h);
        return None;
    }

    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(outer_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(outer_h),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let outer = vert[1];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(TITLE, theme.title));
    let inner = block.inner(outer);
    block.render(outer, frame.buffer_mut());

    let buf = frame.buffer_mut();
    for (y, row) in canvas.iter().enumerate() {
        for (x, cell) in row.iter().enumerate() {
            let (rx, ry) = cell_origin(inner, x as i32, y as i32);
            let (symbol, color) = match cell {
                Some(c) => ("█", *c),
                None => (" ", theme.bg),
            };
            for dx in 0..CELL_COLS {
                buf[(rx + dx, ry)]
                    .set_symbol(symbol)
                    .set_style(Style::default().fg(color).bg(color));
            }
        }
    }
    Some(inner)
}

fn draw_too_small(frame: &mut Frame, theme: &Theme, area: Rect, need_w: u16, need_h: u16) {
    let lines = vec![
        Line::from(Span::styled(TITLE, theme.title)),
        Line::from(Span::styled(
            format!("terminal too small: need {need_w}x{need_h}"),
            Style::default().fg(theme.main_fg),
        )),
    ];
    let y = area.y + area.height.saturating_sub(2) / 2;
    let rect = Rect {
        x: area.x,
        y,
        width: area.width,
        height: area.height.min(2),
    };
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(rect, frame.buffer_mut());
}

/// Fade the given grid cells from white into whatever is drawn underneath.
fn lock_flash_effect(board: Rect, cells: &[(i32, i32)]) -> Effect {
    let positions: HashSet<(u16, u16)> = cells
        .iter()
        .filter(|&&(x, y)| Board::in_bounds(x, y))
        .flat_map(|&(x, y)| {
            let (rx, ry) = cell_origin(board, x, y);
            (0..CELL_COLS).map(move |dx| (rx + dx, ry))
        })
        .collect();
    let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
        positions.contains(&(pos.x, pos.y))
    }));
    fx::fade_from(
        Color::White,
        Color::White,
        (LOCK_FLASH_MS, Interpolation::QuadOut),
    )
    .with_filter(filter)
    .with_area(board)
}
