//! Board cells and the pavement occupancy map
//!
//! Board rows count from the river (row 0) down to the start row. The
//! occupancy map only covers the pavement rows in between and uses its own
//! zero-based row index; `Cell::pavement_row` converts.

use serde::{Deserialize, Serialize};

/// A grid cell in board coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub col: u8,
    /// Board row: 0 is the river
    pub row: u8,
}

impl Cell {
    pub const fn new(col: u8, row: u8) -> Self {
        Self { col, row }
    }

    /// Cell on the given zero-based pavement row
    pub const fn on_pavement(pavement_row: u8, col: u8) -> Self {
        Self {
            col,
            row: pavement_row + 1,
        }
    }

    /// Zero-based pavement row, if this cell is below the river
    pub fn pavement_row(&self) -> Option<u8> {
        self.row.checked_sub(1)
    }

    /// True for the goal row
    pub fn is_river(&self) -> bool {
        self.row == 0
    }
}

/// Which pavement cells hold an obstacle or pickup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyMap {
    rows: u8,
    cols: u8,
    cells: Vec<bool>,
}

impl OccupancyMap {
    pub fn new(rows: u8, cols: u8) -> Self {
        Self {
            rows,
            cols,
            cells: vec![false; rows as usize * cols as usize],
        }
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn cols(&self) -> u8 {
        self.cols
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Clear every cell
    pub fn reset(&mut self) {
        self.cells.fill(false);
    }

    /// Panics when `(row, col)` lies outside the map
    pub fn is_occupied(&self, row: u8, col: u8) -> bool {
        self.cells[self.index(row, col)]
    }

    /// Panics when `(row, col)` lies outside the map
    pub fn set_occupied(&mut self, row: u8, col: u8, occupied: bool) {
        let idx = self.index(row, col);
        self.cells[idx] = occupied;
    }

    /// Number of occupied cells, used to gate spawns
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| **c).count()
    }

    /// Free cells in row-major order
    pub fn free_cells(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        (0..self.rows)
            .flat_map(move |row| (0..self.cols).map(move |col| (row, col)))
            .filter(|&(row, col)| !self.is_occupied(row, col))
    }

    fn index(&self, row: u8, col: u8) -> usize {
        assert!(
            row < self.rows && col < self.cols,
            "occupancy access out of range: ({row}, {col}) on a {}x{} map",
            self.rows,
            self.cols
        );
        row as usize * self.cols as usize + col as usize
    }
}
