//! Entity and session types
//!
//! Hazards move in pixel space along a lane; obstacles and pickups sit on grid
//! cells and share one tagged `Prop` type.

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::difficulty::hazard_base_speed;
use super::grid::Cell;
use crate::Tuning;
use crate::consts::CELL_WIDTH;
use crate::row_to_y;

/// Lifecycle phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Normal play
    Running,
    /// Menu open or hit recovery in progress
    Paused,
    /// Lives exhausted, waiting for the leaderboard step and restart
    GameOver,
}

/// Discrete move requested by the input source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            "left" => Some(Direction::Left),
            "right" => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Pickup types, each bound to one effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickupKind {
    /// Slows time for a few seconds
    SpeedGem,
    /// Removes the newest hazard
    CullGem,
    /// Pushes every hazard off the left edge
    PushGem,
    /// One more life
    LifeToken,
    /// Removes a random obstacle
    RockRemover,
    /// Large score bonus
    BonusStar,
}

impl PickupKind {
    pub const ALL: [PickupKind; 6] = [
        PickupKind::SpeedGem,
        PickupKind::CullGem,
        PickupKind::PushGem,
        PickupKind::LifeToken,
        PickupKind::RockRemover,
        PickupKind::BonusStar,
    ];
}

/// The player token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub cell: Cell,
    pub lives: u8,
    pub score: u64,
    /// Input lock used during crossing and collision transitions
    pub can_move: bool,
}

impl Actor {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            cell: Self::start_cell(tuning),
            lives: tuning.start_lives,
            score: 0,
            can_move: true,
        }
    }

    pub fn start_cell(tuning: &Tuning) -> Cell {
        Cell::new(tuning.start_col(), tuning.start_row())
    }

    /// Back to the start cell
    pub fn relocate_to_start(&mut self, tuning: &Tuning) {
        self.cell = Self::start_cell(tuning);
    }

    /// Left edge in pixels
    pub fn x(&self) -> f32 {
        self.cell.col as f32 * CELL_WIDTH
    }

    /// Move one cell, staying on the board. Returns false when blocked by an edge.
    pub fn step(&mut self, dir: Direction, tuning: &Tuning) -> bool {
        let Cell { col, row } = self.cell;
        let next = match dir {
            Direction::Left if col > 0 => Cell::new(col - 1, row),
            Direction::Right if col + 1 < tuning.cols => Cell::new(col + 1, row),
            Direction::Up if row > 0 => Cell::new(col, row - 1),
            Direction::Down if row < tuning.start_row() => Cell::new(col, row + 1),
            _ => return false,
        };
        self.cell = next;
        true
    }
}

/// A moving enemy crossing a lane left to right
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    /// Left edge in pixels
    pub x: f32,
    /// Board row of the lane
    pub lane: u8,
    /// Pixels per second of game time
    pub speed: f32,
    pub level: u32,
}

impl Hazard {
    /// New hazard entering from the left on a random lane
    pub fn spawn(level: u32, rng: &mut Pcg32, tuning: &Tuning) -> Self {
        let mut hazard = Self {
            x: -CELL_WIDTH,
            lane: 1,
            speed: 0.0,
            level,
        };
        hazard.recycle(rng, tuning);
        hazard
    }

    /// Re-enter from the left with a fresh lane and speed for the current level
    pub fn recycle(&mut self, rng: &mut Pcg32, tuning: &Tuning) {
        self.x = -CELL_WIDTH;
        self.lane = rng.random_range(1..=tuning.pavement_rows);
        let jitter = rng.random_range(tuning.speed_jitter_min..=tuning.speed_jitter_max);
        self.speed = hazard_base_speed(self.level, tuning) * jitter;
    }

    /// Advance by `dt` seconds of scaled game time, recycling past the right edge
    pub fn update(&mut self, dt: f32, rng: &mut Pcg32, tuning: &Tuning) {
        self.x += self.speed * dt;
        if self.x > tuning.cols as f32 * CELL_WIDTH {
            self.recycle(rng, tuning);
        }
    }

    /// Pixel y of the lane
    pub fn y(&self) -> f32 {
        row_to_y(self.lane)
    }
}

/// What a static entity is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropKind {
    /// Blocks movement
    Obstacle,
    /// Consumed on contact
    Pickup(PickupKind),
}

/// A static, grid-aligned entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prop {
    pub cell: Cell,
    pub kind: PropKind,
}

/// Collection with two-phase removal: slots are marked empty while a scan runs
/// and elided later by `compact`, so indices stay valid during the scan.
#[derive(Debug, Clone, PartialEq)]
pub struct Slots<T> {
    entries: Vec<Option<T>>,
}

impl<T> Default for Slots<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> Slots<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append, returning the slot index
    pub fn push(&mut self, item: T) -> usize {
        self.entries.push(Some(item));
        self.entries.len() - 1
    }

    /// Live entries
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slots including ones marked for removal
    pub fn slot_count(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.entries.get(index).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.entries.get_mut(index).and_then(Option::as_mut)
    }

    /// Mark a slot removed and hand back its entry. Marking twice is a no-op.
    pub fn mark_removed(&mut self, index: usize) -> Option<T> {
        self.entries.get_mut(index).and_then(Option::take)
    }

    /// Drop the marked slots, keeping insertion order
    pub fn compact(&mut self) {
        self.entries.retain(Option::is_some);
    }

    /// Consuming form of `compact`
    pub fn compacted(mut self) -> Self {
        self.compact();
        self
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Live entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().flatten()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entries.iter_mut().flatten()
    }

    /// Live entries with their slot index
    pub fn indexed(&self) -> impl Iterator<Item = (usize, &T)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|item| (i, item)))
    }

    /// Slot index of the most recently added live entry
    pub fn last_live_index(&self) -> Option<usize> {
        self.entries.iter().rposition(Option::is_some)
    }
}
