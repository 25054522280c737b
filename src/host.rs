//! Collaborator interfaces
//!
//! The core never draws, touches the DOM, or formats localized text. It hands
//! a read-only frame view to a `Renderer`, typed notifications to a
//! `StatusSink`, and talks to leaderboards through `LeaderboardStore`.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::leaderboard::{Board, LeaderboardStore, NoLeaderboard};
use crate::sim::{Actor, GamePhase, Hazard, PickupKind, Prop, PropKind, Slots};
use crate::{cell_to_pixels, row_to_y};

/// Status line text, localized by the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Message {
    /// Idle prompt
    Default,
    /// Plain crossing; `cheer` picks one of several congratulations
    Crossed { cheer: u8 },
    /// Crossing within the streak window
    FastCrossing { streak: u32, award: u64 },
    HazardHit,
    GameOver,
    TimeSlowing,
    HazardsCulled(u32),
    BonusScore(u64),
    HazardsPushed,
    ExtraLife,
    RockRemoved,
}

/// English congratulations for a plain crossing
pub const CHEERS: [&str; 4] = ["Good Job!", "Nice Move!", "Well Done!", "You Need Water!"];

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Default => write!(f, "Move to the river above"),
            Message::Crossed { cheer } => {
                write!(f, "{}", CHEERS[*cheer as usize % CHEERS.len()])
            }
            Message::FastCrossing { streak, award } => {
                write!(f, "Fast Crossing\n{streak} * {award} Scores Awarded")
            }
            Message::HazardHit => write!(f, "Oops! Collide with a bug!"),
            Message::GameOver => write!(f, "Game Over"),
            Message::TimeSlowing => write!(f, "Time Slowing Down"),
            Message::HazardsCulled(n) => write!(f, "{n} Bug Eliminated!"),
            Message::BonusScore(n) => write!(f, "{n} Scores Awarded!"),
            Message::HazardsPushed => write!(f, "Push Bugs Away!!"),
            Message::ExtraLife => write!(f, "One More Life!"),
            Message::RockRemoved => write!(f, "Remove a Rock!"),
        }
    }
}

/// Emphasis of the status line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageTone {
    Normal,
    /// Streak bonus
    Highlight,
    /// Lost a life
    Danger,
}

impl MessageTone {
    /// CSS color the browser build uses
    pub fn css_color(&self) -> &'static str {
        match self {
            MessageTone::Normal => "#fff",
            MessageTone::Highlight => "#fbf850",
            MessageTone::Danger => "#f13",
        }
    }
}

/// One-way status notifications
pub trait StatusSink {
    fn set_message(&mut self, message: &Message);
    fn set_message_tone(&mut self, tone: MessageTone);
    fn update_score(&mut self, score: u64);
    fn update_lives(&mut self, lives: u8);
    /// Slow-motion bar, `ratio` in [0, 1]
    fn set_progress_ratio(&mut self, ratio: f32);
}

/// Read-only view of the entities for one frame
pub struct FrameView<'a> {
    pub actor: &'a Actor,
    pub hazards: &'a Slots<Hazard>,
    pub obstacles: &'a Slots<Prop>,
    pub pickups: &'a Slots<Prop>,
    pub phase: GamePhase,
    pub stage: u32,
    pub slow_motion_ratio: f32,
}

impl FrameView<'_> {
    pub fn actor_pos(&self) -> Vec2 {
        cell_to_pixels(self.actor.cell.col, self.actor.cell.row)
    }

    pub fn hazard_positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.hazards.iter().map(|h| Vec2::new(h.x, row_to_y(h.lane)))
    }

    pub fn obstacle_positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.obstacles
            .iter()
            .map(|p| cell_to_pixels(p.cell.col, p.cell.row))
    }

    pub fn pickup_positions(&self) -> impl Iterator<Item = (Vec2, PickupKind)> + '_ {
        self.pickups.iter().filter_map(|p| match p.kind {
            PropKind::Pickup(kind) => Some((cell_to_pixels(p.cell.col, p.cell.row), kind)),
            PropKind::Obstacle => None,
        })
    }

    /// Owned, serializable copy for hosts across an FFI boundary
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            actor: self.actor_pos(),
            hazards: self.hazard_positions().collect(),
            obstacles: self.obstacle_positions().collect(),
            pickups: self.pickup_positions().collect(),
            phase: self.phase,
            stage: self.stage,
            score: self.actor.score,
            lives: self.actor.lives,
            slow_motion_ratio: self.slow_motion_ratio,
        }
    }
}

/// Pixel-space frame contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub actor: Vec2,
    pub hazards: Vec<Vec2>,
    pub obstacles: Vec<Vec2>,
    pub pickups: Vec<(Vec2, PickupKind)>,
    pub phase: GamePhase,
    pub stage: u32,
    pub score: u64,
    pub lives: u8,
    pub slow_motion_ratio: f32,
}

/// Draws one frame after each update
pub trait Renderer {
    fn draw_frame(&mut self, frame: &FrameView<'_>);
}

/// Asks the player for a name when a record qualifies
pub trait NamePrompt {
    /// `None` or an empty string keeps `default_name`
    fn ask_name(&mut self, board: Board, default_name: &str) -> Option<String>;
    /// Score did not make any list
    fn encourage(&mut self);
}

/// Every collaborator the controller talks to
pub struct Host {
    pub renderer: Box<dyn Renderer>,
    pub status: Box<dyn StatusSink>,
    pub leaderboard: Box<dyn LeaderboardStore>,
    pub prompt: Box<dyn NamePrompt>,
}

impl Default for Host {
    fn default() -> Self {
        Self {
            renderer: Box::new(NullRenderer),
            status: Box::new(NullSink),
            leaderboard: Box::new(NoLeaderboard),
            prompt: Box::new(NullPrompt),
        }
    }
}

impl Host {
    pub fn with_status(mut self, status: impl StatusSink + 'static) -> Self {
        self.status = Box::new(status);
        self
    }

    pub fn with_renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    pub fn with_leaderboard(mut self, leaderboard: impl LeaderboardStore + 'static) -> Self {
        self.leaderboard = Box::new(leaderboard);
        self
    }

    pub fn with_prompt(mut self, prompt: impl NamePrompt + 'static) -> Self {
        self.prompt = Box::new(prompt);
        self
    }
}

pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn draw_frame(&mut self, _frame: &FrameView<'_>) {}
}

pub struct NullSink;

impl StatusSink for NullSink {
    fn set_message(&mut self, _message: &Message) {}
    fn set_message_tone(&mut self, _tone: MessageTone) {}
    fn update_score(&mut self, _score: u64) {}
    fn update_lives(&mut self, _lives: u8) {}
    fn set_progress_ratio(&mut self, _ratio: f32) {}
}

/// Accepts default names silently
pub struct NullPrompt;

impl NamePrompt for NullPrompt {
    fn ask_name(&mut self, _board: Board, _default_name: &str) -> Option<String> {
        None
    }

    fn encourage(&mut self) {}
}

/// Writes status changes to the log (headless runs)
#[derive(Default)]
pub struct LogSink {
    last_progress_decile: Option<u32>,
}

impl StatusSink for LogSink {
    fn set_message(&mut self, message: &Message) {
        log::info!("[status] {}", message.to_string().replace('\n', " "));
    }

    fn set_message_tone(&mut self, tone: MessageTone) {
        log::debug!("[status] tone {:?}", tone);
    }

    fn update_score(&mut self, score: u64) {
        log::info!("[status] score {}", score);
    }

    fn update_lives(&mut self, lives: u8) {
        log::info!("[status] lives {}", "♥".repeat(lives as usize));
    }

    fn set_progress_ratio(&mut self, ratio: f32) {
        // The bar updates every few milliseconds; only log coarse steps
        let decile = (ratio.clamp(0.0, 1.0) * 10.0).ceil() as u32;
        if self.last_progress_decile != Some(decile) {
            self.last_progress_decile = Some(decile);
            log::debug!("[status] slow motion {}%", decile * 10);
        }
    }
}

/// A status notification, as recorded by `RecordingSink`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatusEvent {
    Message(Message),
    Tone(MessageTone),
    Score(u64),
    Lives(u8),
    Progress(f32),
}

/// Shared buffer of recorded notifications
pub type StatusLog = Rc<RefCell<Vec<StatusEvent>>>;

/// Buffers notifications so a host (or a test) can read them later
#[derive(Clone, Default)]
pub struct RecordingSink {
    log: StatusLog,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the buffer that stays valid after the sink is boxed
    pub fn log(&self) -> StatusLog {
        Rc::clone(&self.log)
    }
}

impl StatusSink for RecordingSink {
    fn set_message(&mut self, message: &Message) {
        self.log.borrow_mut().push(StatusEvent::Message(*message));
    }

    fn set_message_tone(&mut self, tone: MessageTone) {
        self.log.borrow_mut().push(StatusEvent::Tone(tone));
    }

    fn update_score(&mut self, score: u64) {
        self.log.borrow_mut().push(StatusEvent::Score(score));
    }

    fn update_lives(&mut self, lives: u8) {
        self.log.borrow_mut().push(StatusEvent::Lives(lives));
    }

    fn set_progress_ratio(&mut self, ratio: f32) {
        self.log
            .borrow_mut()
            .push(StatusEvent::Progress(ratio.clamp(0.0, 1.0)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_text() {
        assert_eq!(Message::Default.to_string(), "Move to the river above");
        assert_eq!(Message::Crossed { cheer: 5 }.to_string(), "Nice Move!");
        assert_eq!(
            Message::FastCrossing { streak: 2, award: 22 }.to_string(),
            "Fast Crossing\n2 * 22 Scores Awarded"
        );
    }

    #[test]
    fn test_recording_sink_shares_buffer() {
        let sink = RecordingSink::new();
        let log = sink.log();
        let mut boxed: Box<dyn StatusSink> = Box::new(sink);
        boxed.update_score(40);
        boxed.set_progress_ratio(1.5);
        assert_eq!(
            *log.borrow(),
            vec![StatusEvent::Score(40), StatusEvent::Progress(1.0)]
        );
    }
}
