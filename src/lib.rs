//! Frogger - A grid river-crossing arcade game
//!
//! Core modules:
//! - `sim`: Deterministic game-state controller (entities, collisions, effects, stages, lifecycle)
//! - `host`: Collaborator interfaces the core calls into (renderer, status line, leaderboards)
//! - `platform`: Browser/native platform abstraction (wall clock)
//! - `persistence`: String key-value storage
//! - `tuning`: Data-driven game balance

pub mod host;
pub mod leaderboard;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod tuning;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use leaderboard::{LocalLeaderboard, Record, RecordList};
pub use settings::{Language, Role, Settings};
pub use tuning::Tuning;

use glam::Vec2;

/// Playfield geometry constants
pub mod consts {
    /// Cell size in pixels
    pub const CELL_WIDTH: f32 = 101.0;
    pub const CELL_HEIGHT: f32 = 83.0;

    /// Default board: river row, four pavement rows, grass start row
    pub const DEFAULT_COLS: u8 = 5;
    pub const DEFAULT_PAVEMENT_ROWS: u8 = 4;

    /// Default lives and the cap a LifeToken can reach
    pub const START_LIVES: u8 = 3;
    pub const MAX_LIVES: u8 = 5;
}

/// Top-left pixel position of a grid cell
#[inline]
pub fn cell_to_pixels(col: u8, row: u8) -> Vec2 {
    Vec2::new(col as f32 * consts::CELL_WIDTH, row as f32 * consts::CELL_HEIGHT)
}

/// Pixel y of a lane row
#[inline]
pub fn row_to_y(row: u8) -> f32 {
    row as f32 * consts::CELL_HEIGHT
}
