//! Entity registry
//!
//! Owns the hazard, obstacle and pickup collections plus the occupancy map,
//! and keeps them in agreement: a pavement cell is marked occupied exactly when
//! one live obstacle or pickup sits on it.

use log::{debug, warn};
use rand::Rng;
use rand_pcg::Pcg32;
use thiserror::Error;

use super::difficulty::roll_pickup;
use super::grid::{Cell, OccupancyMap};
use super::state::{Hazard, PickupKind, Prop, PropKind, Slots};
use crate::Tuning;

/// A static entity could not be placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SpawnError {
    #[error("no free pavement cell for a new {0}")]
    BoardFull(&'static str),
}

/// Random probes before falling back to a scan of the free cells
const PROBES_PER_CELL: usize = 4;

#[derive(Debug, Clone)]
pub struct EntityRegistry {
    pub hazards: Slots<Hazard>,
    pub obstacles: Slots<Prop>,
    pub pickups: Slots<Prop>,
    map: OccupancyMap,
}

impl EntityRegistry {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            hazards: Slots::new(),
            obstacles: Slots::new(),
            pickups: Slots::new(),
            map: OccupancyMap::new(tuning.pavement_rows, tuning.cols),
        }
    }

    pub fn map(&self) -> &OccupancyMap {
        &self.map
    }

    pub fn occupied_count(&self) -> usize {
        self.map.occupied_count()
    }

    /// Drop every entity and clear the map
    pub fn clear(&mut self) {
        self.hazards.clear();
        self.obstacles.clear();
        self.pickups.clear();
        self.map.reset();
    }

    /// Fresh board: initial pickups, obstacles and hazards
    pub fn seed(&mut self, avoid: Cell, rng: &mut Pcg32, tuning: &Tuning) {
        self.clear();
        for _ in 0..tuning.initial_pickups {
            log_spawn(self.add_random_pickup(avoid, rng, tuning));
        }
        for _ in 0..tuning.initial_obstacles {
            log_spawn(self.add_obstacle(avoid, rng, tuning));
        }
        for _ in 0..tuning.initial_hazards {
            self.add_hazard(tuning.initial_hazard_level, rng, tuning);
        }
        debug!(
            "Board seeded: {} pickups, {} obstacles, {} hazards",
            self.pickups.len(),
            self.obstacles.len(),
            self.hazards.len()
        );
    }

    /// Add a hazard. An existing hazard's level wins over `level` so that the
    /// whole population moves at one difficulty.
    pub fn add_hazard(&mut self, level: u32, rng: &mut Pcg32, tuning: &Tuning) -> usize {
        let level = self.hazards.iter().next().map_or(level, |h| h.level);
        self.hazards.push(Hazard::spawn(level, rng, tuning))
    }

    /// Raise every hazard one level; speeds pick it up on their next recycle
    pub fn level_up_hazards(&mut self) {
        for hazard in self.hazards.iter_mut() {
            hazard.level = hazard.level.saturating_add(1);
        }
    }

    /// Place an obstacle on a free cell. `Ok(None)` when the board is too
    /// crowded to try.
    pub fn add_obstacle(
        &mut self,
        avoid: Cell,
        rng: &mut Pcg32,
        tuning: &Tuning,
    ) -> Result<Option<usize>, SpawnError> {
        if self.map.occupied_count() > tuning.obstacle_gate {
            return Ok(None);
        }
        let cell = self.pick_free_cell(avoid, rng, "obstacle")?;
        Ok(Some(self.place(cell, PropKind::Obstacle)))
    }

    /// Place a pickup of `kind` on a free cell. `Ok(None)` when gated.
    pub fn add_pickup(
        &mut self,
        kind: PickupKind,
        avoid: Cell,
        rng: &mut Pcg32,
        tuning: &Tuning,
    ) -> Result<Option<usize>, SpawnError> {
        if self.map.occupied_count() > tuning.pickup_gate {
            return Ok(None);
        }
        let cell = self.pick_free_cell(avoid, rng, "pickup")?;
        Ok(Some(self.place(cell, PropKind::Pickup(kind))))
    }

    /// Pickup drawn from the weighted lottery
    pub fn add_random_pickup(
        &mut self,
        avoid: Cell,
        rng: &mut Pcg32,
        tuning: &Tuning,
    ) -> Result<Option<usize>, SpawnError> {
        match roll_pickup(&tuning.pickup_weights, rng) {
            Some(kind) => self.add_pickup(kind, avoid, rng, tuning),
            None => Ok(None),
        }
    }

    /// Put a prop on `cell` and mark it occupied. The cell must be free.
    pub fn place(&mut self, cell: Cell, kind: PropKind) -> usize {
        if let Some(row) = cell.pavement_row() {
            self.map.set_occupied(row, cell.col, true);
        }
        let prop = Prop { cell, kind };
        let index = match kind {
            PropKind::Obstacle => self.obstacles.push(prop),
            PropKind::Pickup(_) => self.pickups.push(prop),
        };
        debug_assert!(self.is_consistent());
        index
    }

    /// Random probes first, then a uniform pick among the remaining free cells
    fn pick_free_cell(
        &self,
        avoid: Cell,
        rng: &mut Pcg32,
        what: &'static str,
    ) -> Result<Cell, SpawnError> {
        let rows = self.map.rows();
        let cols = self.map.cols();
        let is_free = |cell: Cell| {
            cell != avoid
                && cell
                    .pavement_row()
                    .is_some_and(|row| !self.map.is_occupied(row, cell.col))
        };

        for _ in 0..self.map.len() * PROBES_PER_CELL {
            let cell = Cell::on_pavement(rng.random_range(0..rows), rng.random_range(0..cols));
            if is_free(cell) {
                return Ok(cell);
            }
        }

        let free: Vec<Cell> = self
            .map
            .free_cells()
            .map(|(row, col)| Cell::on_pavement(row, col))
            .filter(|cell| *cell != avoid)
            .collect();
        if free.is_empty() {
            return Err(SpawnError::BoardFull(what));
        }
        Ok(free[rng.random_range(0..free.len())])
    }

    /// Mark a pickup consumed and free its cell. Compaction happens later.
    pub fn remove_pickup(&mut self, index: usize) -> Option<Prop> {
        let prop = self.pickups.mark_removed(index)?;
        self.free_cell(prop.cell);
        Some(prop)
    }

    pub fn remove_obstacle(&mut self, index: usize) -> Option<Prop> {
        let prop = self.obstacles.mark_removed(index)?;
        self.free_cell(prop.cell);
        Some(prop)
    }

    /// Remove a uniformly chosen obstacle
    pub fn remove_random_obstacle(&mut self, rng: &mut Pcg32) -> Option<Prop> {
        let live: Vec<usize> = self.obstacles.indexed().map(|(i, _)| i).collect();
        if live.is_empty() {
            return None;
        }
        let index = live[rng.random_range(0..live.len())];
        self.remove_obstacle(index)
    }

    /// Remove up to `count` of the most recently added hazards
    pub fn remove_newest_hazards(&mut self, count: usize) -> usize {
        let mut removed = 0;
        while removed < count {
            let Some(index) = self.hazards.last_live_index() else {
                break;
            };
            self.hazards.mark_removed(index);
            removed += 1;
        }
        removed
    }

    /// Park every hazard at `x`
    pub fn push_back_hazards(&mut self, x: f32) {
        for hazard in self.hazards.iter_mut() {
            hazard.x = x;
        }
    }

    fn free_cell(&mut self, cell: Cell) {
        if let Some(row) = cell.pavement_row() {
            self.map.set_occupied(row, cell.col, false);
        }
        debug_assert!(self.is_consistent());
    }

    /// Elide every slot marked for removal
    pub fn compact(&mut self) {
        self.hazards.compact();
        self.obstacles.compact();
        self.pickups.compact();
        debug_assert!(self.is_consistent());
    }

    /// Every occupied cell holds exactly one live static entity and vice versa
    pub fn is_consistent(&self) -> bool {
        let mut counts = vec![0u32; self.map.len()];
        for prop in self.obstacles.iter().chain(self.pickups.iter()) {
            let Some(row) = prop.cell.pavement_row() else {
                return false;
            };
            if row >= self.map.rows() || prop.cell.col >= self.map.cols() {
                return false;
            }
            counts[row as usize * self.map.cols() as usize + prop.cell.col as usize] += 1;
        }
        let mut idx = 0;
        for row in 0..self.map.rows() {
            for col in 0..self.map.cols() {
                let expected = if self.map.is_occupied(row, col) { 1 } else { 0 };
                if counts[idx] != expected {
                    return false;
                }
                idx += 1;
            }
        }
        true
    }
}

/// Spawn failures are not fatal: skip the entity and keep playing
pub fn log_spawn(result: Result<Option<usize>, SpawnError>) {
    if let Err(e) = result {
        warn!("Spawn skipped: {}", e);
    }
}
