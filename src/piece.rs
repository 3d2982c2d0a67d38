//! Shape catalog and the falling piece.

use crate::game::GRID_WIDTH;
use crate::palette::Tile;
use rand::Rng;

/// Square occupancy grid, row-major; 1 = occupied.
type Occupancy = &'static [&'static [u8]];

const I_GRID: Occupancy = &[&[0, 0, 0, 0], &[1, 1, 1, 1], &[0, 0, 0, 0], &[0, 0, 0, 0]];
const J_GRID: Occupancy = &[&[1, 0, 0], &[1, 1, 1], &[0, 0, 0]];
const L_GRID: Occupancy = &[&[0, 0, 1], &[1, 1, 1], &[0, 0, 0]];
const O_GRID: Occupancy = &[&[1, 1], &[1, 1]];
const S_GRID: Occupancy = &[&[0, 1, 1], &[1, 1, 0], &[0, 0, 0]];
const T_GRID: Occupancy = &[&[0, 1, 0], &[1, 1, 1], &[0, 0, 0]];
const Z_GRID: Occupancy = &[&[1, 1, 0], &[0, 1, 1], &[0, 0, 0]];

/// Every shape occupies exactly this many cells.
pub const PIECE_CELLS: usize = 4;

/// Absolute grid cells of a piece, in the shape grid's row-major scan order.
pub type Cells = [(i32, i32); PIECE_CELLS];

/// Shape kinds (I, J, L, O, S, T, Z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    I,
    J,
    L,
    O,
    S,
    T,
    Z,
}

impl ShapeKind {
    pub const ALL: [Self; 7] = [Self::I, Self::J, Self::L, Self::O, Self::S, Self::T, Self::Z];

    pub const fn occupancy(self) -> Occupancy {
        match self {
            Self::I => I_GRID,
            Self::J => J_GRID,
            Self::L => L_GRID,
            Self::O => O_GRID,
            Self::S => S_GRID,
            Self::T => T_GRID,
            Self::Z => Z_GRID,
        }
    }

    /// Side length of the occupancy grid.
    pub const fn side(self) -> i32 {
        self.occupancy().len() as i32
    }

    pub const fn tile(self) -> Tile {
        match self {
            Self::I => Tile::White,
            Self::J => Tile::Red,
            Self::L => Tile::Green,
            Self::O => Tile::Blue,
            Self::S => Tile::Yellow,
            Self::T => Tile::Magenta,
            Self::Z => Tile::Cyan,
        }
    }

    /// Only the square piece refuses to rotate.
    pub const fn rotatable(self) -> bool {
        !matches!(self, Self::O)
    }

    /// Uniform pick over the seven kinds.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

/// The falling piece: a shape kind, the grid position of its shape grid's origin, and a rotation (0..4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub kind: ShapeKind,
    pub x: i32,
    pub y: i32,
    rotation: u8,
}

impl Piece {
    /// New piece at the top row, horizontally centred, unrotated.
    pub const fn spawn(kind: ShapeKind) -> Self {
        Self::at(kind, GRID_WIDTH / 2 - kind.side() / 2, 0)
    }

    pub const fn at(kind: ShapeKind, x: i32, y: i32) -> Self {
        Self {
            kind,
            x,
            y,
            rotation: 0,
        }
    }

    #[inline]
    pub const fn rotation(&self) -> u8 {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: u8) {
        self.rotation = rotation % 4;
    }

    /// One quarter turn.
    pub fn rotate_cw(&mut self) {
        self.rotation = (self.rotation + 1) % 4;
    }

    pub const fn shifted(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    pub const fn tile(&self) -> Tile {
        self.kind.tile()
    }

    /// Occupied cells in absolute grid coordinates for the current rotation.
    pub fn cells(&self) -> Cells {
        let grid = self.kind.occupancy();
        let rotation = if self.kind.rotatable() {
            self.rotation % 4
        } else {
            0
        };
        let c = self.kind.side() / 2;
        let mut out = [(0, 0); PIECE_CELLS];
        let occupied = grid.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, v)| **v != 0)
                .map(move |(x, _)| (x as i32, y as i32))
        });
        for (slot, (x, y)) in out.iter_mut().zip(occupied) {
            let (ox, oy) = (x - c, y - c);
            let (rx, ry) = match rotation {
                0 => (x, y),
                1 => (c + oy, c - ox),
                2 => (c - ox, c - oy),
                _ => (c - oy, c + ox),
            };
            *slot = (self.x + rx, self.y + ry);
        }
        out
    }
}
