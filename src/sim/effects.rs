//! Pickup effects and the slow-motion countdown
//!
//! `apply_pickup_effect` mutates the world for one consumed pickup and tells
//! the controller what else to do (status updates, time scale, timers), since
//! those belong to the lifecycle layer.

use rand_pcg::Pcg32;

use super::registry::EntityRegistry;
use super::state::{Actor, PickupKind};
use crate::Tuning;
use crate::host::Message;

/// Slow-motion state machine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SlowMotion {
    #[default]
    Idle,
    Active {
        remaining_ms: u64,
    },
}

/// Result of one countdown tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlowTick {
    /// Still running; remaining / full duration
    Running(f32),
    /// Ran out on this tick
    Expired,
    /// Was not active
    Idle,
}

impl SlowMotion {
    /// Start or restart from the full duration
    pub fn start(&mut self, tuning: &Tuning) {
        *self = SlowMotion::Active {
            remaining_ms: tuning.slow_motion_ms,
        };
    }

    pub fn stop(&mut self) {
        *self = SlowMotion::Idle;
    }

    pub fn is_active(&self) -> bool {
        matches!(self, SlowMotion::Active { .. })
    }

    /// Remaining fraction of the full duration, 0 when idle
    pub fn ratio(&self, tuning: &Tuning) -> f32 {
        match self {
            SlowMotion::Idle => 0.0,
            SlowMotion::Active { remaining_ms } => {
                if tuning.slow_motion_ms == 0 {
                    0.0
                } else {
                    (*remaining_ms as f32 / tuning.slow_motion_ms as f32).clamp(0.0, 1.0)
                }
            }
        }
    }

    /// Count down by one tick period
    pub fn tick(&mut self, tuning: &Tuning) -> SlowTick {
        let SlowMotion::Active { remaining_ms } = *self else {
            return SlowTick::Idle;
        };
        let remaining_ms = remaining_ms.saturating_sub(tuning.slow_motion_tick_ms);
        if remaining_ms == 0 {
            *self = SlowMotion::Idle;
            SlowTick::Expired
        } else {
            *self = SlowMotion::Active { remaining_ms };
            SlowTick::Running(self.ratio(tuning))
        }
    }
}

/// Everything a pickup effect may touch
pub struct EffectContext<'a> {
    pub actor: &'a mut Actor,
    pub registry: &'a mut EntityRegistry,
    pub slow_motion: &'a mut SlowMotion,
    pub rng: &'a mut Pcg32,
    pub tuning: &'a Tuning,
    pub stage: u32,
}

/// Follow-up work for the controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Effect {
    pub message: Message,
    pub score_changed: bool,
    pub lives_changed: bool,
    /// Slow motion (re)started; time scale and countdown timer need setting
    pub slow_motion_started: bool,
}

impl Effect {
    fn message(message: Message) -> Self {
        Self {
            message,
            score_changed: false,
            lives_changed: false,
            slow_motion_started: false,
        }
    }

    fn scored(message: Message) -> Self {
        Self {
            score_changed: true,
            ..Self::message(message)
        }
    }
}

/// Consume the pickup at slot `index` and apply its effect. The pickup and
/// its cell are released whatever the effect; marked slots are compacted
/// before returning.
pub fn apply_pickup_effect(kind: PickupKind, index: usize, ctx: &mut EffectContext<'_>) -> Effect {
    let tuning = ctx.tuning;
    let stage = ctx.stage;

    let effect = match kind {
        PickupKind::SpeedGem => {
            ctx.slow_motion.start(tuning);
            Effect {
                slow_motion_started: true,
                ..Effect::message(Message::TimeSlowing)
            }
        }
        PickupKind::CullGem => {
            let live = ctx.registry.hazards.len();
            if live > 1 {
                let count = if live > 2 && stage > tuning.cull_double_after_stage {
                    2
                } else {
                    1
                };
                let removed = ctx.registry.remove_newest_hazards(count);
                Effect::message(Message::HazardsCulled(removed as u32))
            } else {
                let award = tuning.cull_fallback_award.at(stage);
                ctx.actor.score += award;
                Effect::scored(Message::BonusScore(award))
            }
        }
        PickupKind::PushGem => {
            ctx.registry.push_back_hazards(tuning.push_back_x);
            Effect::message(Message::HazardsPushed)
        }
        PickupKind::LifeToken => {
            if ctx.actor.lives < tuning.max_lives {
                ctx.actor.lives += 1;
                Effect {
                    lives_changed: true,
                    ..Effect::message(Message::ExtraLife)
                }
            } else {
                let award = tuning.life_fallback_award.at(stage);
                ctx.actor.score += award;
                Effect::scored(Message::BonusScore(award))
            }
        }
        PickupKind::RockRemover => {
            ctx.registry.remove_random_obstacle(ctx.rng);
            ctx.actor.score += tuning.rock_award.at(stage);
            Effect::scored(Message::RockRemoved)
        }
        PickupKind::BonusStar => {
            let award = tuning.star_award.at(stage);
            ctx.actor.score += award;
            Effect::scored(Message::BonusScore(award))
        }
    };

    ctx.registry.remove_pickup(index);
    ctx.registry.compact();
    effect
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Cell, Contact, check_collision};
    use rand::SeedableRng;

    struct World {
        actor: Actor,
        registry: EntityRegistry,
        slow_motion: SlowMotion,
        rng: Pcg32,
        tuning: Tuning,
    }

    impl World {
        fn new() -> Self {
            let tuning = Tuning::default();
            Self {
                actor: Actor::new(&tuning),
                registry: EntityRegistry::new(&tuning),
                slow_motion: SlowMotion::Idle,
                rng: Pcg32::seed_from_u64(11),
                tuning,
            }
        }

        /// Place `kind` under the actor and consume it
        fn consume(&mut self, kind: PickupKind, stage: u32) -> Effect {
            let avoid = Cell::new(0, 0);
            let index = self
                .registry
                .add_pickup(kind, avoid, &mut self.rng, &self.tuning)
                .unwrap()
                .unwrap();
            self.actor.cell = self.registry.pickups.get(index).unwrap().cell;
            let Contact::Pickup { index, kind } =
                check_collision(&self.actor, &self.registry.pickups, &self.tuning)
            else {
                panic!("pickup not under the actor");
            };
            let mut ctx = EffectContext {
                actor: &mut self.actor,
                registry: &mut self.registry,
                slow_motion: &mut self.slow_motion,
                rng: &mut self.rng,
                tuning: &self.tuning,
                stage,
            };
            apply_pickup_effect(kind, index, &mut ctx)
        }
    }

    #[test]
    fn test_slow_motion_counts_down_to_idle() {
        let tuning = Tuning::default();
        let mut slow = SlowMotion::Idle;
        assert_eq!(slow.tick(&tuning), SlowTick::Idle);

        slow.start(&tuning);
        assert_eq!(slow.ratio(&tuning), 1.0);
        let ticks = tuning.slow_motion_ms / tuning.slow_motion_tick_ms;
        for _ in 0..ticks - 1 {
            assert!(matches!(slow.tick(&tuning), SlowTick::Running(_)));
        }
        assert_eq!(slow.tick(&tuning), SlowTick::Expired);
        assert!(!slow.is_active());
    }

    #[test]
    fn test_second_gem_restarts_countdown() {
        let tuning = Tuning::default();
        let mut slow = SlowMotion::Idle;
        slow.start(&tuning);
        for _ in 0..100 {
            slow.tick(&tuning);
        }
        slow.start(&tuning);
        assert_eq!(
            slow,
            SlowMotion::Active {
                remaining_ms: tuning.slow_motion_ms
            }
        );
    }

    #[test]
    fn test_pickup_always_consumed() {
        let mut world = World::new();
        for kind in PickupKind::ALL {
            world.consume(kind, 0);
            assert!(world.registry.pickups.is_empty());
            assert_eq!(world.registry.occupied_count(), world.registry.obstacles.len());
            assert!(world.registry.is_consistent());
        }
    }

    #[test]
    fn test_cull_gem_with_single_hazard_awards() {
        let mut world = World::new();
        world.registry.add_hazard(1, &mut world.rng, &world.tuning);
        let effect = world.consume(PickupKind::CullGem, 5);
        assert_eq!(world.registry.hazards.len(), 1);
        assert_eq!(world.actor.score, 40);
        assert_eq!(effect.message, Message::BonusScore(40));
    }

    #[test]
    fn test_cull_gem_removes_newest() {
        let mut world = World::new();
        for _ in 0..4 {
            world.registry.add_hazard(1, &mut world.rng, &world.tuning);
        }
        world.consume(PickupKind::CullGem, 10);
        assert_eq!(world.registry.hazards.len(), 3);

        // Late game takes two
        let effect = world.consume(PickupKind::CullGem, 61);
        assert_eq!(world.registry.hazards.len(), 1);
        assert_eq!(effect.message, Message::HazardsCulled(2));
    }

    #[test]
    fn test_life_token_caps_then_awards() {
        let mut world = World::new();
        world.actor.lives = 4;
        let effect = world.consume(PickupKind::LifeToken, 0);
        assert!(effect.lives_changed);
        assert_eq!(world.actor.lives, 5);

        let effect = world.consume(PickupKind::LifeToken, 10);
        assert_eq!(world.actor.lives, 5);
        assert_eq!(world.actor.score, 70);
        assert!(effect.score_changed);
    }

    #[test]
    fn test_push_gem_parks_hazards() {
        let mut world = World::new();
        for _ in 0..3 {
            world.registry.add_hazard(1, &mut world.rng, &world.tuning);
        }
        world.consume(PickupKind::PushGem, 0);
        assert!(world.registry.hazards.iter().all(|h| h.x == -200.0));
    }

    #[test]
    fn test_rock_remover_removes_one_obstacle() {
        let mut world = World::new();
        let avoid = Cell::new(0, 0);
        for _ in 0..3 {
            world
                .registry
                .add_obstacle(avoid, &mut world.rng, &world.tuning)
                .unwrap();
        }
        world.consume(PickupKind::RockRemover, 4);
        assert_eq!(world.registry.obstacles.len(), 2);
        assert_eq!(world.actor.score, 22);
        assert_eq!(world.registry.occupied_count(), 2);
    }

    #[test]
    fn test_star_award() {
        let mut world = World::new();
        world.consume(PickupKind::BonusStar, 7);
        assert_eq!(world.actor.score, 121);
    }

    #[test]
    fn test_speed_gem_starts_slow_motion() {
        let mut world = World::new();
        let effect = world.consume(PickupKind::SpeedGem, 0);
        assert!(effect.slow_motion_started);
        assert!(world.slow_motion.is_active());
    }
}
