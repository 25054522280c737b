//! Data-driven game balance
//!
//! Every speed, weight, threshold and delay the controller uses lives here so a
//! host can rebalance the game from a JSON document without recompiling.
//! Missing fields fall back to the stock values.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::PickupKind;

/// Tuning could not be loaded or describes an unplayable board
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("tuning is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning: {0}")]
    Invalid(String),
}

/// A score award that grows with the stage: `base + floor(per_stage * stage)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Award {
    pub base: u64,
    pub per_stage: f32,
}

impl Award {
    pub const fn new(base: u64, per_stage: f32) -> Self {
        Self { base, per_stage }
    }

    /// Points awarded at `stage`
    pub fn at(&self, stage: u32) -> u64 {
        self.base + (self.per_stage * stage as f32).floor() as u64
    }
}

/// Lottery weight of one pickup kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PickupWeight {
    pub kind: PickupKind,
    pub weight: u32,
}

/// Game balance knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Board ===
    /// Columns on every row
    pub cols: u8,
    /// Rows between the river and the start row (hazard lanes, occupancy map rows)
    pub pavement_rows: u8,

    // === Actor ===
    pub start_lives: u8,
    pub max_lives: u8,

    // === Initial board ===
    pub initial_pickups: u32,
    pub initial_obstacles: u32,
    pub initial_hazards: u32,
    pub initial_hazard_level: u32,

    // === Spawn gates (skip when more cells than this are occupied) ===
    pub obstacle_gate: usize,
    pub pickup_gate: usize,

    // === Hazards ===
    /// Horizontal distance (pixels) under which a hazard touches the actor
    pub hazard_contact_px: f32,
    /// Speed at level 0 before jitter
    pub hazard_base_speed: f32,
    /// Levels per speed band
    pub speed_band_levels: u32,
    /// Per-level speed increment for each band; the last one repeats forever
    pub speed_band_increments: Vec<f32>,
    /// Uniform jitter multiplier range applied to the base speed
    pub speed_jitter_min: f32,
    pub speed_jitter_max: f32,
    /// Where PushGem parks hazards (pixels, left of column 0)
    pub push_back_x: f32,

    // === Stages ===
    /// Seconds of game time per time-gated stage
    pub stage_interval_secs: f32,
    /// Score-gated stage = sqrt(score) * factor
    pub stage_score_factor: f32,
    /// Real-time cadence of the difficulty tick
    pub difficulty_tick_ms: u64,
    /// Hazard cap checked on every third stage
    pub hazard_cap_every_3: usize,
    /// Hazard cap checked on every fourth stage
    pub hazard_cap_every_4: usize,
    /// Late-game CullGem removes two hazards past this stage
    pub cull_double_after_stage: u32,
    pub pickup_weights: Vec<PickupWeight>,

    // === Slow motion ===
    pub slow_motion_ms: u64,
    pub slow_motion_tick_ms: u64,
    pub slow_motion_scale: f32,

    // === Delays ===
    pub relocate_ms: u64,
    pub message_revert_ms: u64,
    pub collision_recovery_ms: u64,
    pub game_over_delay_ms: u64,

    // === Crossing streak ===
    pub streak_window_ms: u64,
    pub max_streak: u32,

    // === Awards ===
    pub cross_award: Award,
    pub cull_fallback_award: Award,
    pub life_fallback_award: Award,
    pub rock_award: Award,
    pub star_award: Award,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            cols: DEFAULT_COLS,
            pavement_rows: DEFAULT_PAVEMENT_ROWS,

            start_lives: START_LIVES,
            max_lives: MAX_LIVES,

            initial_pickups: 2,
            initial_obstacles: 2,
            initial_hazards: 5,
            initial_hazard_level: 1,

            obstacle_gate: 10,
            pickup_gate: 12,

            hazard_contact_px: 50.0,
            hazard_base_speed: 36.0,
            speed_band_levels: 36,
            speed_band_increments: vec![1.0, 0.95, 0.88, 0.77, 0.6],
            speed_jitter_min: 2.0,
            speed_jitter_max: 5.0,
            push_back_x: -200.0,

            stage_interval_secs: 5.0,
            stage_score_factor: 1.25,
            difficulty_tick_ms: 1000,
            hazard_cap_every_3: 4,
            hazard_cap_every_4: 8,
            cull_double_after_stage: 60,
            pickup_weights: vec![
                PickupWeight { kind: PickupKind::SpeedGem, weight: 20 },
                PickupWeight { kind: PickupKind::CullGem, weight: 10 },
                PickupWeight { kind: PickupKind::PushGem, weight: 15 },
                PickupWeight { kind: PickupKind::LifeToken, weight: 10 },
                PickupWeight { kind: PickupKind::RockRemover, weight: 10 },
                PickupWeight { kind: PickupKind::BonusStar, weight: 5 },
            ],

            slow_motion_ms: 5000,
            slow_motion_tick_ms: 10,
            slow_motion_scale: 0.2,

            relocate_ms: 500,
            message_revert_ms: 1500,
            collision_recovery_ms: 1500,
            game_over_delay_ms: 10,

            streak_window_ms: 2800,
            max_streak: 4,

            cross_award: Award::new(10, 1.0),
            cull_fallback_award: Award::new(30, 2.0),
            life_fallback_award: Award::new(50, 2.0),
            rock_award: Award::new(20, 0.5),
            star_award: Award::new(100, 3.0),
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON document and validate it
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Row the actor starts on (directly below the last pavement row)
    pub fn start_row(&self) -> u8 {
        self.pavement_rows + 1
    }

    /// Column the actor starts on
    pub fn start_col(&self) -> u8 {
        self.cols / 2
    }

    /// Cells in the occupancy map
    pub fn pavement_cells(&self) -> usize {
        self.cols as usize * self.pavement_rows as usize
    }

    /// Reject values that would make the board unplayable or loop forever
    pub fn validate(&self) -> Result<(), TuningError> {
        let invalid = |msg: &str| Err(TuningError::Invalid(msg.to_string()));

        if self.cols == 0 || self.pavement_rows == 0 {
            return invalid("board needs at least one column and one pavement row");
        }
        // The start row index must fit in a u8
        if self.pavement_rows == u8::MAX {
            return invalid("too many pavement rows");
        }
        // One cell may hold the actor; the gated spawn must still find a free cell
        let cells = self.pavement_cells();
        if self.obstacle_gate + 2 > cells || self.pickup_gate + 2 > cells {
            return invalid("spawn gates leave no free pavement cell");
        }
        if self.start_lives == 0 || self.start_lives > self.max_lives {
            return invalid("start lives must be between 1 and max lives");
        }
        if self.pickup_weights.iter().map(|w| w.weight as u64).sum::<u64>() == 0 {
            return invalid("pickup weights must not all be zero");
        }
        if self.difficulty_tick_ms == 0 || self.slow_motion_tick_ms == 0 {
            return invalid("timer periods must be positive");
        }
        if self.stage_interval_secs <= 0.0 || self.stage_score_factor <= 0.0 {
            return invalid("stage interval and score factor must be positive");
        }
        if !(self.slow_motion_scale > 0.0 && self.slow_motion_scale <= 1.0) {
            return invalid("slow motion scale must be in (0, 1]");
        }
        if self.speed_band_levels == 0
            || self.speed_band_increments.is_empty()
            || self.speed_band_increments.iter().any(|inc| *inc < 0.0)
        {
            return invalid("speed bands need a positive width and non-negative increments");
        }
        if self.speed_jitter_min <= 0.0 || self.speed_jitter_min > self.speed_jitter_max {
            return invalid("speed jitter range must be positive and ordered");
        }
        if self.max_streak == 0 {
            return invalid("max streak must be at least 1");
        }
        Ok(())
    }
}
