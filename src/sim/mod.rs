//! Game-state controller
//!
//! All gameplay logic lives here. The module is deterministic:
//! - Seeded RNG only
//! - Time comes in from the caller, never from a wall clock
//! - Stable iteration order (insertion order in every collection)
//! - No rendering or platform dependencies

pub mod collision;
pub mod difficulty;
pub mod effects;
pub mod game;
pub mod grid;
pub mod registry;
pub mod state;
pub mod timers;

pub use collision::{Collider, Contact, check_collision};
pub use difficulty::{DifficultyScheduler, hazard_base_speed, pick_weighted, roll_pickup, stage_for};
pub use effects::{Effect, EffectContext, SlowMotion, SlowTick, apply_pickup_effect};
pub use game::{Game, GameStats};
pub use grid::{Cell, OccupancyMap};
pub use registry::{EntityRegistry, SpawnError};
pub use state::{Actor, Direction, GamePhase, Hazard, PickupKind, Prop, PropKind, Slots};
pub use timers::{TimerHandle, TimerKind, Timers};
