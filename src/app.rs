//! App: the frame loop. Polls the host, steps the game, renders, waits for the next tick.

use crate::GameConfig;
use crate::game::{Controls, FrameView, GameState};
use crate::input::GameKey;
use crate::palette::{GHOST_ALPHA, OPAQUE, Tile};
use anyhow::Result;
use std::time::Duration;
use tracing::{debug, info};

/// Rendering and input side of the game: a window, a terminal, or a test double.
pub trait Host {
    /// True once the user or the OS asked to stop.
    fn poll_close_requested(&mut self) -> Result<bool>;

    fn is_key_held(&self, key: GameKey) -> bool;

    fn clear_frame(&mut self);

    /// Draw one grid cell. `alpha` below 255 is translucent (the ghost).
    fn draw_cell(&mut self, x: i32, y: i32, tile: Tile, alpha: u8);

    fn present_frame(&mut self) -> Result<()>;

    /// Block until `interval` has passed since the previous frame. The only place the loop sleeps.
    fn wait_frame(&mut self, interval: Duration) -> Result<()>;

    /// A piece was written into the board at `cells`.
    fn piece_locked(&mut self, _cells: &[(i32, i32)], _tile: Tile) {}
}

pub struct App<H: Host> {
    host: H,
    config: GameConfig,
    state: GameState,
    frames: u64,
    fast: bool,
}

impl<H: Host> App<H> {
    pub fn new(host: H, config: GameConfig) -> Self {
        let state = GameState::new(config.seed);
        Self::with_state(host, config, state)
    }

    pub fn with_state(host: H, config: GameConfig, state: GameState) -> Self {
        Self {
            host,
            config,
            state,
            frames: 0,
            fast: false,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        info!(
            tick_rate = self.config.tick_rate,
            fast_tick_rate = self.config.fast_tick_rate,
            seed = ?self.config.seed,
            "game started"
        );
        while self.tick()? {}
        info!(
            frames = self.frames,
            locked = self.state.locked_count(),
            "game closed"
        );
        Ok(())
    }

    /// One frame. Returns false when the host asked to close.
    pub fn tick(&mut self) -> Result<bool> {
        if self.host.poll_close_requested()? {
            return Ok(false);
        }

        let interval = self.tick_interval();
        let controls = Controls {
            rotate: self.host.is_key_held(GameKey::Rotate),
            left: self.host.is_key_held(GameKey::MoveLeft),
            right: self.host.is_key_held(GameKey::MoveRight),
            hard_drop: self.host.is_key_held(GameKey::HardDrop),
        };
        let view = self.state.step(controls);
        self.render(&view)?;
        if view.landed {
            self.host.piece_locked(&view.cells, view.tile);
        }

        self.frames += 1;
        self.host.wait_frame(interval)?;
        Ok(true)
    }

    /// Normal or fast-forward interval, depending on the held key.
    fn tick_interval(&mut self) -> Duration {
        let fast = self.host.is_key_held(GameKey::FastForward);
        if fast != self.fast {
            debug!(fast, "tick rate changed");
            self.fast = fast;
        }
        let rate = if fast {
            self.config.fast_tick_rate
        } else {
            self.config.tick_rate
        };
        Duration::from_secs_f64(1.0 / rate)
    }

    /// Board first, then the ghost, then the piece on top.
    fn render(&mut self, view: &FrameView) -> Result<()> {
        self.host.clear_frame();
        for (x, y, tile) in self.state.board.filled() {
            self.host.draw_cell(x, y, tile, OPAQUE);
        }
        if self.config.show_ghost {
            for &(x, y) in &view.ghost {
                self.host.draw_cell(x, y, view.tile, GHOST_ALPHA);
            }
        }
        for &(x, y) in &view.cells {
            self.host.draw_cell(x, y, view.tile, OPAQUE);
        }
        self.host.present_frame()
    }
}
