// src/board.rs
use serde::{Deserialize, Serialize};

/// Integer grid cell, `(row, col)`.
pub type Cell = (i32, i32);

/// Continuous cell-space position, `(row, col)`; fractional while a piece travels.
pub type Point = (f64, f64);

/// Static board geometry. Read-only for the engine once the game is built.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq)]
#[serde(default)]
pub struct Board {
    pub rows: i32,
    pub cols: i32,
    pub cell_w_pix: u32,
    pub cell_h_pix: u32,
    pub cell_w_m: f64, // physical width of one cell, metres
    pub cell_h_m: f64,
}

impl Default for Board {
    fn default() -> Self {
        Board { rows: 8, cols: 8, cell_w_pix: 64, cell_h_pix: 64, cell_w_m: 1.0, cell_h_m: 1.0 }
    }
}

impl Board {
    pub fn new(rows: i32, cols: i32) -> Self {
        Board { rows, cols, ..Board::default() }
    }

    #[inline]
    pub fn contains(&self, (row, col): Cell) -> bool {
        (0..self.rows).contains(&row) && (0..self.cols).contains(&col)
    }

    /// Clamps a cell into the board.
    pub fn clamp(&self, (row, col): Cell) -> Cell {
        (row.clamp(0, self.rows - 1), col.clamp(0, self.cols - 1))
    }

    /// Physical distance between two cell-space points.
    pub fn distance_m(&self, from: Point, to: Point) -> f64 {
        let dx = (to.1 - from.1) * self.cell_w_m;
        let dy = (to.0 - from.0) * self.cell_h_m;
        (dx * dx + dy * dy).sqrt()
    }

    /// Cell-space point to physical `(x, y)` in metres.
    pub fn to_metres(&self, (row, col): Point) -> (f64, f64) {
        (col * self.cell_w_m, row * self.cell_h_m)
    }

    /// Physical `(x, y)` to pixel `(x, y)` on the board image.
    pub fn metres_to_pixels(&self, (x, y): (f64, f64)) -> (i64, i64) {
        let px = x * self.cell_w_pix as f64 / self.cell_w_m;
        let py = y * self.cell_h_pix as f64 / self.cell_h_m;
        (px as i64, py as i64)
    }
}

/// Rounds a continuous position to the nearest grid cell.
#[inline]
pub fn round_cell((row, col): Point) -> Cell {
    (row.round() as i32, col.round() as i32)
}
