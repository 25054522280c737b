//! Lifecycle controller
//!
//! `Game` owns the world and drives it from three entry points: player input,
//! a per-frame update with the host's clock, and the timers that clock fires.
//! Everything the player sees goes out through the `Host` collaborators.

use log::{debug, info, warn};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use super::collision::{Contact, check_collision};
use super::difficulty::{DifficultyScheduler, escalate};
use super::effects::{EffectContext, SlowMotion, SlowTick, apply_pickup_effect};
use super::registry::EntityRegistry;
use super::state::{Actor, Direction, GamePhase, PickupKind};
use super::timers::{TimerKind, Timers};
use crate::tuning::{Tuning, TuningError};
use crate::host::{CHEERS, FrameView, Host, Message, MessageTone, Snapshot};
use crate::leaderboard::{Board, LOCAL_CAPACITY, REMOTE_CAPACITY, Record, RecordList, default_name};
use crate::settings::Role;

/// Longest real-time step a single frame may simulate (seconds)
pub const MAX_FRAME_DT: f32 = 0.1;

/// Session counters, kept across restarts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GameStats {
    pub crossings: u64,
    pub collisions: u64,
    pub pickups_collected: u64,
    pub games_over: u64,
    pub best_score: u64,
    pub max_stage: u32,
}

pub struct Game {
    tuning: Tuning,
    rng: Pcg32,
    actor: Actor,
    registry: EntityRegistry,
    difficulty: DifficultyScheduler,
    slow_motion: SlowMotion,
    timers: Timers,
    phase: GamePhase,
    /// Multiplier from real to game time: 1 normally, lower in slow motion, 0 when paused
    time_scale: f32,
    /// Game time played this session (seconds)
    elapsed_secs: f32,
    /// Latest host clock reading (ms)
    clock_ms: u64,
    last_frame_ms: Option<u64>,
    streak: u32,
    last_cross_ms: Option<u64>,
    role: Role,
    stats: GameStats,
    host: Host,
}

impl Game {
    /// Start a session at host time `now_ms`. Tuning is validated first since
    /// an impossible board cannot be seeded.
    pub fn new(seed: u64, tuning: Tuning, host: Host, now_ms: u64) -> Result<Self, TuningError> {
        tuning.validate()?;
        let mut game = Self {
            rng: Pcg32::seed_from_u64(seed),
            actor: Actor::new(&tuning),
            registry: EntityRegistry::new(&tuning),
            difficulty: DifficultyScheduler::new(),
            slow_motion: SlowMotion::Idle,
            timers: Timers::new(),
            phase: GamePhase::Running,
            time_scale: 1.0,
            elapsed_secs: 0.0,
            clock_ms: now_ms,
            last_frame_ms: None,
            streak: 0,
            last_cross_ms: None,
            role: Role::default(),
            stats: GameStats::default(),
            host,
            tuning,
        };
        info!("Session seeded with {}", seed);
        game.restart();
        Ok(game)
    }

    // === Accessors ===

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn stage(&self) -> u32 {
        self.difficulty.stage()
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn slow_motion(&self) -> SlowMotion {
        self.slow_motion
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed_secs
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    /// Sprite recorded with leaderboard entries
    pub fn set_role(&mut self, role: Role) {
        self.role = role;
    }

    pub fn host_mut(&mut self) -> &mut Host {
        &mut self.host
    }

    pub fn snapshot(&self) -> Snapshot {
        FrameView {
            actor: &self.actor,
            hazards: &self.registry.hazards,
            obstacles: &self.registry.obstacles,
            pickups: &self.registry.pickups,
            phase: self.phase,
            stage: self.difficulty.stage(),
            slow_motion_ratio: self.slow_motion.ratio(&self.tuning),
        }
        .snapshot()
    }

    // === Input ===

    /// One discrete move, stamped with the latest clock reading.
    ///
    /// Ignored unless the game is running and the actor is unlocked. Obstacles
    /// are resolved (and revert the move) before pickups are looked at.
    pub fn handle_input(&mut self, dir: Direction) {
        if self.phase != GamePhase::Running || !self.actor.can_move {
            return;
        }
        let from = self.actor.cell;
        if !self.actor.step(dir, &self.tuning) {
            return;
        }
        if self.actor.cell.is_river() {
            self.cross_river();
            return;
        }

        if let Contact::Obstacle(_) =
            check_collision(&self.actor, &self.registry.obstacles, &self.tuning)
        {
            self.actor.cell = from;
        }
        if let Contact::Pickup { index, kind } =
            check_collision(&self.actor, &self.registry.pickups, &self.tuning)
        {
            self.collect_pickup(index, kind);
        }
    }

    fn collect_pickup(&mut self, index: usize, kind: PickupKind) {
        debug!("Pickup {:?} collected", kind);
        let effect = apply_pickup_effect(
            kind,
            index,
            &mut EffectContext {
                actor: &mut self.actor,
                registry: &mut self.registry,
                slow_motion: &mut self.slow_motion,
                rng: &mut self.rng,
                tuning: &self.tuning,
                stage: self.difficulty.stage(),
            },
        );
        self.stats.pickups_collected += 1;

        if effect.slow_motion_started {
            self.time_scale = self.tuning.slow_motion_scale;
            self.timers
                .schedule_every(TimerKind::SlowMotion, self.clock_ms, self.tuning.slow_motion_tick_ms);
            self.host.status.set_progress_ratio(1.0);
        }
        if effect.score_changed {
            self.host.status.update_score(self.actor.score);
        }
        if effect.lives_changed {
            self.host.status.update_lives(self.actor.lives);
        }
        self.show_message(effect.message, MessageTone::Normal);
        self.timers
            .schedule_once(TimerKind::MessageRevert, self.clock_ms, self.tuning.message_revert_ms);
    }

    // === Frame ===

    /// Fire due timers, move hazards by the scaled frame time, resolve hazard
    /// contact, then draw.
    pub fn frame(&mut self, now_ms: u64) {
        self.advance(now_ms);

        let real_dt = self
            .last_frame_ms
            .map_or(0.0, |prev| self.clock_ms.saturating_sub(prev) as f32 / 1000.0);
        self.last_frame_ms = Some(self.clock_ms);
        self.update(real_dt.min(MAX_FRAME_DT) * self.time_scale);
        self.render();
    }

    fn update(&mut self, dt: f32) {
        if dt > 0.0 {
            for hazard in self.registry.hazards.iter_mut() {
                hazard.update(dt, &mut self.rng, &self.tuning);
            }
            self.elapsed_secs += dt;
        }

        if self.phase == GamePhase::Running && self.actor.can_move {
            if let Contact::Hazard(index) =
                check_collision(&self.actor, &self.registry.hazards, &self.tuning)
            {
                debug!("Hazard {} hit the actor at {:?}", index, self.actor.cell);
                self.collide_with_hazard();
            }
        }
    }

    fn render(&mut self) {
        let view = FrameView {
            actor: &self.actor,
            hazards: &self.registry.hazards,
            obstacles: &self.registry.obstacles,
            pickups: &self.registry.pickups,
            phase: self.phase,
            stage: self.difficulty.stage(),
            slow_motion_ratio: self.slow_motion.ratio(&self.tuning),
        };
        self.host.renderer.draw_frame(&view);
    }

    /// Fire every timer due by `now_ms`, in due order. A clock that went
    /// backwards is treated as standing still.
    pub fn advance(&mut self, now_ms: u64) {
        if now_ms < self.clock_ms {
            debug!("Clock went back {}ms, holding", self.clock_ms - now_ms);
        }
        let now_ms = now_ms.max(self.clock_ms);
        while let Some((kind, due_ms)) = self.timers.pop_due(now_ms) {
            self.clock_ms = self.clock_ms.max(due_ms);
            self.on_timer(kind);
        }
        self.clock_ms = now_ms;
    }

    fn on_timer(&mut self, kind: TimerKind) {
        match kind {
            TimerKind::Difficulty => self.difficulty_tick(),
            TimerKind::SlowMotion => self.slow_motion_tick(),
            TimerKind::Relocate => {
                self.actor.relocate_to_start(&self.tuning);
                self.actor.can_move = self.phase == GamePhase::Running;
            }
            TimerKind::MessageRevert => self.show_message(Message::Default, MessageTone::Normal),
            TimerKind::CollisionRecovery => {
                self.show_message(Message::Default, MessageTone::Normal);
                self.actor.relocate_to_start(&self.tuning);
                self.continue_game();
            }
            TimerKind::GameOver => {
                self.finalize_game_over();
                self.restart();
            }
        }
    }

    fn difficulty_tick(&mut self) {
        if let Some(stage) = self
            .difficulty
            .tick(self.elapsed_secs, self.actor.score, &self.tuning)
        {
            self.stats.max_stage = self.stats.max_stage.max(stage);
            escalate(stage, &mut self.registry, self.actor.cell, &mut self.rng, &self.tuning);
        }
    }

    fn slow_motion_tick(&mut self) {
        match self.slow_motion.tick(&self.tuning) {
            SlowTick::Running(ratio) => self.host.status.set_progress_ratio(ratio),
            SlowTick::Expired => {
                self.timers.cancel(TimerKind::SlowMotion);
                if self.phase == GamePhase::Running {
                    self.time_scale = 1.0;
                }
                self.host.status.set_progress_ratio(0.0);
                self.show_message(Message::Default, MessageTone::Normal);
                debug!("Slow motion over");
            }
            SlowTick::Idle => {
                self.timers.cancel(TimerKind::SlowMotion);
            }
        }
    }

    fn show_message(&mut self, message: Message, tone: MessageTone) {
        self.host.status.set_message_tone(tone);
        self.host.status.set_message(&message);
    }

    // === Lifecycle ===

    /// Freeze game time. Only the stage and slow-motion timers are suspended;
    /// pending transitions (relocation, recovery, message revert) still fire.
    pub fn pause_game(&mut self) {
        if self.phase != GamePhase::Running {
            return;
        }
        self.phase = GamePhase::Paused;
        self.actor.can_move = false;
        self.time_scale = 0.0;
        self.timers.cancel(TimerKind::Difficulty);
        self.timers.cancel(TimerKind::SlowMotion);
        debug!("Paused");
    }

    /// Resume from a pause. While a hit recovery is pending the recovery
    /// itself resumes play, so this is a no-op.
    pub fn continue_game(&mut self) {
        if self.phase != GamePhase::Paused || self.timers.is_scheduled(TimerKind::CollisionRecovery) {
            return;
        }
        self.phase = GamePhase::Running;
        self.actor.can_move = !self.timers.is_scheduled(TimerKind::Relocate);
        self.time_scale = if self.slow_motion.is_active() {
            self.tuning.slow_motion_scale
        } else {
            1.0
        };
        self.timers
            .schedule_every(TimerKind::Difficulty, self.clock_ms, self.tuning.difficulty_tick_ms);
        if self.slow_motion.is_active() {
            self.timers
                .schedule_every(TimerKind::SlowMotion, self.clock_ms, self.tuning.slow_motion_tick_ms);
        }
        debug!("Resumed");
    }

    fn cross_river(&mut self) {
        self.timers.cancel(TimerKind::MessageRevert);
        self.actor.can_move = false;

        let now = self.clock_ms;
        let fast = self
            .last_cross_ms
            .is_some_and(|prev| now.saturating_sub(prev) < self.tuning.streak_window_ms);
        self.streak = if fast {
            (self.streak + 1).min(self.tuning.max_streak)
        } else {
            1
        };
        self.last_cross_ms = Some(now);

        let award = self.tuning.cross_award.at(self.difficulty.stage());
        self.actor.score += award * self.streak as u64;
        self.stats.crossings += 1;
        self.host.status.update_score(self.actor.score);

        if self.streak > 1 {
            self.show_message(
                Message::FastCrossing {
                    streak: self.streak,
                    award,
                },
                MessageTone::Highlight,
            );
        } else {
            let cheer = self.rng.random_range(0..CHEERS.len()) as u8;
            self.show_message(Message::Crossed { cheer }, MessageTone::Normal);
        }
        info!(
            "Crossed the river (streak {}), score {}",
            self.streak, self.actor.score
        );

        self.timers
            .schedule_once(TimerKind::Relocate, now, self.tuning.relocate_ms);
        self.timers
            .schedule_once(TimerKind::MessageRevert, now, self.tuning.message_revert_ms);
    }

    fn collide_with_hazard(&mut self) {
        if self.phase != GamePhase::Running {
            return;
        }
        self.timers.cancel(TimerKind::Relocate);
        self.timers.cancel(TimerKind::MessageRevert);
        self.pause_game();

        self.actor.lives = self.actor.lives.saturating_sub(1);
        self.stats.collisions += 1;
        self.host.status.update_lives(self.actor.lives);

        if self.actor.lives > 0 {
            info!("Hit by a hazard, {} lives left", self.actor.lives);
            self.show_message(Message::HazardHit, MessageTone::Danger);
            self.timers.schedule_once(
                TimerKind::CollisionRecovery,
                self.clock_ms,
                self.tuning.collision_recovery_ms,
            );
        } else {
            self.end_game();
        }
    }

    fn end_game(&mut self) {
        self.phase = GamePhase::GameOver;
        self.actor.can_move = false;
        self.timers.cancel(TimerKind::Difficulty);
        self.timers.cancel(TimerKind::SlowMotion);
        self.slow_motion.stop();
        self.host.status.set_progress_ratio(0.0);
        self.show_message(Message::GameOver, MessageTone::Danger);

        self.stats.games_over += 1;
        self.stats.best_score = self.stats.best_score.max(self.actor.score);
        info!(
            "Game over at stage {} with score {}",
            self.difficulty.stage(),
            self.actor.score
        );
        self.timers
            .schedule_once(TimerKind::GameOver, self.clock_ms, self.tuning.game_over_delay_ms);
    }

    /// Offer the final score to the leaderboards it qualifies for
    fn finalize_game_over(&mut self) {
        let score = self.actor.score;
        let leaderboard = &mut self.host.leaderboard;

        let remote = match leaderboard.remote_top(REMOTE_CAPACITY) {
            Ok(records) => RecordList::from_records(records, REMOTE_CAPACITY).qualifies(score),
            Err(e) => {
                debug!("Remote leaderboard skipped: {}", e);
                false
            }
        };
        // A remote record is mirrored locally
        let boards = if remote {
            vec![Board::Remote, Board::Local]
        } else {
            match leaderboard.local_top(LOCAL_CAPACITY) {
                Ok(records) => {
                    if RecordList::from_records(records, LOCAL_CAPACITY).qualifies(score) {
                        vec![Board::Local]
                    } else {
                        Vec::new()
                    }
                }
                Err(e) => {
                    warn!("Local leaderboard unreadable: {}", e);
                    Vec::new()
                }
            }
        };

        let Some(&first) = boards.first() else {
            self.host.prompt.encourage();
            return;
        };

        let fallback = default_name(&mut self.rng);
        let name = self
            .host
            .prompt
            .ask_name(first, &fallback)
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or(fallback);
        let record = Record {
            name,
            score,
            role: self.role,
            time_ms: self.clock_ms,
        };
        for board in boards {
            match self.host.leaderboard.submit_record(&record, board) {
                Ok(()) => info!("Saved {} ({}) to the {:?} leaderboard", record.name, score, board),
                Err(e) => warn!("Could not save to the {:?} leaderboard: {}", board, e),
            }
        }
    }

    /// New session: cancel every timer, reset time, stage and streak, reseed
    /// the board and restart the stage clock.
    pub fn restart(&mut self) {
        self.timers.cancel_all();
        self.phase = GamePhase::Running;
        self.time_scale = 1.0;
        self.elapsed_secs = 0.0;
        self.slow_motion.stop();
        self.difficulty.reset();
        self.streak = 0;
        self.last_cross_ms = None;

        self.actor = Actor::new(&self.tuning);
        self.registry
            .seed(self.actor.cell, &mut self.rng, &self.tuning);
        self.timers
            .schedule_every(TimerKind::Difficulty, self.clock_ms, self.tuning.difficulty_tick_ms);

        let status = &mut self.host.status;
        status.update_score(self.actor.score);
        status.update_lives(self.actor.lives);
        status.set_progress_ratio(0.0);
        self.show_message(Message::Default, MessageTone::Normal);
        info!("New game started");
    }
}
