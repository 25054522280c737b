//! Difficulty scheduler
//!
//! The stage is the smaller of a time-gated and a score-gated value, so a
//! player can't race ahead by idling or by farming points alone. Each time it
//! rises, the board escalates: hazards speed up, new entities spawn on fixed
//! stage multiples, and one pickup is drawn from the weighted lottery.

use log::info;
use rand::Rng;
use rand_pcg::Pcg32;

use super::grid::Cell;
use super::registry::{EntityRegistry, log_spawn};
use super::state::PickupKind;
use crate::Tuning;
use crate::tuning::PickupWeight;

/// Speed at `level` before jitter.
///
/// Each band of `speed_band_levels` levels adds its own per-level increment,
/// and the last increment applies to every level beyond the listed bands, so
/// the curve is continuous, monotonic and flattens out late.
pub fn hazard_base_speed(level: u32, tuning: &Tuning) -> f32 {
    let band = tuning.speed_band_levels.max(1);
    let bands = &tuning.speed_band_increments;
    let mut speed = tuning.hazard_base_speed;
    let mut remaining = level;

    for (i, increment) in bands.iter().enumerate() {
        if remaining == 0 {
            break;
        }
        let take = if i + 1 == bands.len() {
            remaining
        } else {
            remaining.min(band)
        };
        speed += take as f32 * increment;
        remaining -= take;
    }
    speed
}

/// `floor(min(elapsed / interval, sqrt(score) * factor))`
pub fn stage_for(elapsed_secs: f32, score: u64, tuning: &Tuning) -> u32 {
    let by_time = elapsed_secs.max(0.0) / tuning.stage_interval_secs;
    let by_score = (score as f64).sqrt() as f32 * tuning.stage_score_factor;
    by_time.min(by_score).floor() as u32
}

/// Cumulative-weight bucketing. `draw` must be in `1..=total`; the first kind
/// whose running total reaches it wins, so zero-weight kinds never do.
pub fn pick_weighted(weights: &[PickupWeight], draw: u32) -> Option<PickupKind> {
    let mut cumulative = 0u32;
    for w in weights {
        cumulative = cumulative.saturating_add(w.weight);
        if w.weight > 0 && draw <= cumulative {
            return Some(w.kind);
        }
    }
    None
}

/// Draw a pickup kind in proportion to its weight
pub fn roll_pickup(weights: &[PickupWeight], rng: &mut Pcg32) -> Option<PickupKind> {
    let total: u32 = weights.iter().map(|w| w.weight).sum();
    if total == 0 {
        return None;
    }
    pick_weighted(weights, rng.random_range(1..=total))
}

/// Tracks the current stage; the stage never decreases within a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DifficultyScheduler {
    stage: u32,
}

impl DifficultyScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> u32 {
        self.stage
    }

    pub fn reset(&mut self) {
        self.stage = 0;
    }

    /// Recompute the stage. Returns the new stage when it rose.
    pub fn tick(&mut self, elapsed_secs: f32, score: u64, tuning: &Tuning) -> Option<u32> {
        let candidate = stage_for(elapsed_secs, score, tuning);
        if candidate > self.stage {
            self.stage = candidate;
            Some(candidate)
        } else {
            None
        }
    }
}

/// Board changes for reaching `stage`
pub fn escalate(
    stage: u32,
    registry: &mut EntityRegistry,
    avoid: Cell,
    rng: &mut Pcg32,
    tuning: &Tuning,
) {
    info!("Stage {} reached", stage);
    registry.level_up_hazards();
    log_spawn(registry.add_random_pickup(avoid, rng, tuning));

    if stage % 3 == 0 {
        if registry.hazards.len() < tuning.hazard_cap_every_3 {
            registry.add_hazard(stage, rng, tuning);
        }
        log_spawn(registry.add_obstacle(avoid, rng, tuning));
    }
    if stage % 4 == 0 && registry.hazards.len() < tuning.hazard_cap_every_4 {
        registry.add_hazard(stage, rng, tuning);
    }
    if stage % 6 == 0 {
        log_spawn(registry.add_pickup(PickupKind::RockRemover, avoid, rng, tuning));
    }
    if stage % 8 == 0 {
        log_spawn(registry.add_pickup(PickupKind::CullGem, avoid, rng, tuning));
    }
    if stage % 12 == 0 {
        log_spawn(registry.add_pickup(PickupKind::LifeToken, avoid, rng, tuning));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::PropKind;
    use rand::SeedableRng;

    #[test]
    fn test_base_speed_bands() {
        let tuning = Tuning::default();
        assert_eq!(hazard_base_speed(0, &tuning), 36.0);
        assert_eq!(hazard_base_speed(10, &tuning), 46.0);
        assert_eq!(hazard_base_speed(36, &tuning), 72.0);
        assert!((hazard_base_speed(40, &tuning) - (72.0 + 4.0 * 0.95)).abs() < 1e-3);
        // Past the listed bands the last increment repeats
        let at_180 = hazard_base_speed(180, &tuning);
        let at_190 = hazard_base_speed(190, &tuning);
        assert!((at_190 - at_180 - 6.0).abs() < 1e-3);
    }

    #[test]
    fn test_stage_is_min_of_time_and_score() {
        let tuning = Tuning::default();
        // 60s of play but no score
        assert_eq!(stage_for(60.0, 0, &tuning), 0);
        // Plenty of score but only 12s played
        assert_eq!(stage_for(12.0, 10_000, &tuning), 2);
        // sqrt(64) * 1.25 = 10 vs 100s / 5 = 20
        assert_eq!(stage_for(100.0, 64, &tuning), 10);
    }

    #[test]
    fn test_scheduler_only_rises() {
        let tuning = Tuning::default();
        let mut scheduler = DifficultyScheduler::new();
        assert_eq!(scheduler.tick(5.0, 1, &tuning), Some(1));
        assert_eq!(scheduler.tick(5.5, 1, &tuning), None);
        // A lower candidate leaves the stage alone
        assert_eq!(scheduler.tick(0.0, 0, &tuning), None);
        assert_eq!(scheduler.stage(), 1);
        scheduler.reset();
        assert_eq!(scheduler.stage(), 0);
    }

    #[test]
    fn test_pick_weighted_boundaries() {
        let weights = Tuning::default().pickup_weights;
        assert_eq!(pick_weighted(&weights, 1), Some(PickupKind::SpeedGem));
        assert_eq!(pick_weighted(&weights, 20), Some(PickupKind::SpeedGem));
        assert_eq!(pick_weighted(&weights, 21), Some(PickupKind::CullGem));
        assert_eq!(pick_weighted(&weights, 70), Some(PickupKind::BonusStar));
        assert_eq!(pick_weighted(&weights, 71), None);
    }

    #[test]
    fn test_zero_weight_never_wins() {
        let weights = [
            PickupWeight { kind: PickupKind::SpeedGem, weight: 0 },
            PickupWeight { kind: PickupKind::BonusStar, weight: 3 },
        ];
        for draw in 1..=3 {
            assert_eq!(pick_weighted(&weights, draw), Some(PickupKind::BonusStar));
        }
    }

    #[test]
    fn test_escalate_stage_twelve() {
        let tuning = Tuning::default();
        let mut registry = EntityRegistry::new(&tuning);
        let mut rng = Pcg32::seed_from_u64(3);
        let avoid = Cell::new(tuning.start_col(), tuning.start_row());
        registry.add_hazard(1, &mut rng, &tuning);

        escalate(12, &mut registry, avoid, &mut rng, &tuning);

        // 12 is a multiple of 3, 4, 6 and 12 but not 8. Newcomers join at
        // the leveled-up population's level.
        assert_eq!(registry.hazards.len(), 3);
        assert!(registry.hazards.iter().all(|h| h.level == 2));
        assert_eq!(registry.obstacles.len(), 1);
        let kinds: Vec<_> = registry
            .pickups
            .iter()
            .filter_map(|p| match p.kind {
                PropKind::Pickup(k) => Some(k),
                _ => None,
            })
            .collect();
        assert_eq!(kinds.len(), 3);
        assert!(kinds.contains(&PickupKind::RockRemover));
        assert!(kinds.contains(&PickupKind::LifeToken));
        assert!(registry.is_consistent());
    }

    #[test]
    fn test_each_stage_rise_adds_one_level() {
        let tuning = Tuning::default();
        let mut registry = EntityRegistry::new(&tuning);
        let mut rng = Pcg32::seed_from_u64(9);
        let avoid = Cell::new(tuning.start_col(), tuning.start_row());
        registry.add_hazard(1, &mut rng, &tuning);

        escalate(1, &mut registry, avoid, &mut rng, &tuning);
        assert_eq!(registry.hazards.iter().map(|h| h.level).collect::<Vec<_>>(), vec![2]);

        // A score-driven jump from stage 1 to 5 is still a single step
        escalate(5, &mut registry, avoid, &mut rng, &tuning);
        assert_eq!(registry.hazards.iter().map(|h| h.level).collect::<Vec<_>>(), vec![3]);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn base_speed_is_monotonic(level in 0u32..10_000) {
                let tuning = Tuning::default();
                prop_assert!(hazard_base_speed(level + 1, &tuning) >= hazard_base_speed(level, &tuning));
            }

            #[test]
            fn stage_never_decreases(samples in prop::collection::vec((0.0f32..10_000.0, 0u64..1_000_000), 1..50)) {
                let tuning = Tuning::default();
                let mut scheduler = DifficultyScheduler::new();
                let mut last = 0;
                for (elapsed, score) in samples {
                    scheduler.tick(elapsed, score, &tuning);
                    prop_assert!(scheduler.stage() >= last);
                    last = scheduler.stage();
                }
            }

            #[test]
            fn lottery_draw_always_lands(draw in 1u32..=70) {
                let weights = Tuning::default().pickup_weights;
                prop_assert!(pick_weighted(&weights, draw).is_some());
            }
        }
    }
}
