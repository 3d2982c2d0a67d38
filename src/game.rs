//! Game state: board, active piece, and the per-tick rotate/shift/drop/lock logic.

use crate::palette::Tile;
use crate::piece::{Cells, Piece, ShapeKind};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, trace};

/// Board width in cells.
pub const GRID_WIDTH: i32 = 20;
/// Board height in cells.
pub const GRID_HEIGHT: i32 = 20;

const LAST_ROW: i32 = GRID_HEIGHT - 1;

/// Single board cell: empty or holding the tile of a locked piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Filled(Tile),
}

/// Locked landscape. y=0 is the top row; cells are only ever filled, never cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    rows: [[Cell; GRID_WIDTH as usize]; GRID_HEIGHT as usize],
}

impl Board {
    pub fn new() -> Self {
        Self {
            rows: [[Cell::Empty; GRID_WIDTH as usize]; GRID_HEIGHT as usize],
        }
    }

    #[inline]
    pub const fn in_bounds(x: i32, y: i32) -> bool {
        x >= 0 && x < GRID_WIDTH && y >= 0 && y < GRID_HEIGHT
    }

    /// Cell at (x, y); `None` outside the grid.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<Cell> {
        if !Self::in_bounds(x, y) {
            return None;
        }
        Some(self.rows[y as usize][x as usize])
    }

    #[inline]
    pub fn set(&mut self, x: i32, y: i32, cell: Cell) {
        if Self::in_bounds(x, y) {
            self.rows[y as usize][x as usize] = cell;
        }
    }

    #[inline]
    pub fn is_filled(&self, x: i32, y: i32) -> bool {
        matches!(self.get(x, y), Some(Cell::Filled(_)))
    }

    /// True if any cell lies outside the grid or on a filled board cell.
    pub fn is_obstructed(&self, cells: &[(i32, i32)]) -> bool {
        cells
            .iter()
            .any(|&(x, y)| !matches!(self.get(x, y), Some(Cell::Empty)))
    }

    /// True if any cell sits on the last row or directly above a filled cell.
    pub fn supports(&self, cells: &[(i32, i32)]) -> bool {
        cells
            .iter()
            .any(|&(x, y)| y >= LAST_ROW || self.is_filled(x, y + 1))
    }

    /// Filled cells in row-major order.
    pub fn filled(&self) -> impl Iterator<Item = (i32, i32, Tile)> + '_ {
        self.rows.iter().enumerate().flat_map(|(y, row)| {
            row.iter().enumerate().filter_map(move |(x, cell)| match cell {
                Cell::Filled(tile) => Some((x as i32, y as i32, *tile)),
                Cell::Empty => None,
            })
        })
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// Held keys that drive one tick of game logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Controls {
    pub rotate: bool,
    pub left: bool,
    pub right: bool,
    pub hard_drop: bool,
}

impl Controls {
    /// -1, 0 or +1; left and right together cancel.
    pub fn movement(&self) -> i32 {
        i32::from(self.right) - i32::from(self.left)
    }
}

/// What a tick looked like before the lock-or-fall decision: enough to draw the piece and its ghost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameView {
    pub tile: Tile,
    pub cells: Cells,
    pub ghost: Cells,
    /// The piece came to rest this tick and its cells were written into the board.
    pub landed: bool,
}

/// Game state: board, active piece, and the random source for spawning.
#[derive(Debug, Clone)]
pub struct GameState {
    pub board: Board,
    pub piece: Piece,
    rng: StdRng,
    locked: u64,
}

impl GameState {
    /// New game on an empty board. `seed` fixes the piece sequence.
    pub fn new(seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let piece = Piece::spawn(ShapeKind::random(&mut rng));
        debug!(kind = ?piece.kind, x = piece.x, "spawned first piece");
        Self {
            board: Board::new(),
            piece,
            rng,
            locked: 0,
        }
    }

    /// Game with a given active piece on a given board; later spawns use `seed`.
    #[cfg(test)]
    pub fn with_piece(board: Board, piece: Piece, seed: u64) -> Self {
        Self {
            board,
            piece,
            rng: StdRng::seed_from_u64(seed),
            locked: 0,
        }
    }

    /// Number of pieces locked into the board so far.
    pub const fn locked_count(&self) -> u64 {
        self.locked
    }

    /// One tick: rotate, shift, compute the drop distance (and hard drop), then lock or fall.
    pub fn step(&mut self, controls: Controls) -> FrameView {
        if controls.rotate {
            self.try_rotate();
        }
        self.try_shift(controls.movement());

        let distance = self.drop_distance();
        let ghost = self.piece.shifted(0, distance).cells();
        if controls.hard_drop && distance > 0 {
            self.piece.y += distance;
            debug!(distance, "hard drop");
        }

        let view = FrameView {
            tile: self.piece.tile(),
            cells: self.piece.cells(),
            ghost,
            landed: self.is_landed(),
        };
        self.settle(view.landed);
        view
    }

    /// Turn the piece a quarter; undone if the new cells are obstructed.
    pub fn try_rotate(&mut self) -> bool {
        let previous = self.piece.rotation();
        self.piece.rotate_cw();
        if self.board.is_obstructed(&self.piece.cells()) {
            self.piece.set_rotation(previous);
            trace!(kind = ?self.piece.kind, "rotation blocked");
            return false;
        }
        true
    }

    /// Shift by `movement` columns unless any probed cell is obstructed.
    pub fn try_shift(&mut self, movement: i32) -> bool {
        if movement == 0 {
            return false;
        }
        let probe = self.piece.shifted(movement, 0);
        if self.board.is_obstructed(&probe.cells()) {
            trace!(movement, "shift blocked");
            return false;
        }
        self.piece = probe;
        true
    }

    /// Rows the piece can fall before it rests on the floor or a filled cell. Does not move it.
    pub fn drop_distance(&self) -> i32 {
        let cells = self.piece.cells();
        (0..GRID_HEIGHT)
            .find(|&offset| {
                let moved: Cells = cells.map(|(x, y)| (x, y + offset));
                self.board.supports(&moved)
            })
            .unwrap_or(0)
    }

    /// True if the piece currently rests on the floor or on locked cells.
    pub fn is_landed(&self) -> bool {
        self.board.supports(&self.piece.cells())
    }

    /// Lock and respawn when `landed`, otherwise fall one row.
    fn settle(&mut self, landed: bool) {
        if landed {
            self.lock_piece();
        } else {
            self.piece.y += 1;
        }
    }

    fn lock_piece(&mut self) {
        let tile = self.piece.tile();
        for (x, y) in self.piece.cells() {
            self.board.set(x, y, Cell::Filled(tile));
        }
        self.locked += 1;
        debug!(kind = ?self.piece.kind, x = self.piece.x, y = self.piece.y, locked = self.locked, "piece locked");
        self.spawn_next();
    }

    fn spawn_next(&mut self) {
        self.piece = Piece::spawn(ShapeKind::random(&mut self.rng));
        debug!(kind = ?self.piece.kind, x = self.piece.x, "spawned piece");
    }
}
