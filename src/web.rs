//! Browser bindings
//!
//! JavaScript owns the canvas, the key listeners and the animation frame.
//! Each frame it calls `frame(now)`, draws from `snapshot()` and applies the
//! status updates from `drain_events()`.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::host::{Host, NamePrompt, RecordingSink, StatusEvent, StatusLog};
use crate::leaderboard::{Board, LocalLeaderboard};
use crate::persistence::LocalStorage;
use crate::platform;
use crate::settings::{Language, Role, Settings};
use crate::sim::{Direction, Game};
use crate::tuning::Tuning;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&format!("logger already set: {e}").into());
    }
    log::info!("Frogger core loaded");
}

/// `window.prompt` / `window.alert`
struct BrowserPrompt;

impl NamePrompt for BrowserPrompt {
    fn ask_name(&mut self, board: Board, default_name: &str) -> Option<String> {
        let question = match board {
            Board::Remote => "You made the global leaderboard! Enter your name:",
            Board::Local => "You made the local leaderboard! Enter your name:",
        };
        web_sys::window()?
            .prompt_with_message_and_default(question, default_name)
            .ok()
            .flatten()
    }

    fn encourage(&mut self) {
        if let Some(window) = web_sys::window() {
            let _ = window.alert_with_message("You could do better!");
        }
    }
}

#[derive(Serialize)]
struct WebEvent {
    #[serde(flatten)]
    event: StatusEvent,
    /// English text for message events
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    /// CSS color for tone events
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<&'static str>,
}

fn to_js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[wasm_bindgen]
pub struct WebGame {
    game: Game,
    events: StatusLog,
    settings: Settings,
}

#[wasm_bindgen]
impl WebGame {
    /// New session. `tuning_json` may be empty for stock balance.
    #[wasm_bindgen(constructor)]
    pub fn new(tuning_json: &str) -> Result<WebGame, JsValue> {
        let tuning = if tuning_json.trim().is_empty() {
            Tuning::default()
        } else {
            Tuning::from_json(tuning_json).map_err(to_js_error)?
        };

        let sink = RecordingSink::new();
        let events = sink.log();
        let mut host = Host::default().with_status(sink).with_prompt(BrowserPrompt);
        let settings = match LocalStorage::open() {
            Ok(store) => {
                let settings = Settings::load(&store);
                host = host.with_leaderboard(LocalLeaderboard::new(store));
                settings
            }
            Err(e) => {
                log::warn!("Leaderboard disabled: {}", e);
                Settings::default()
            }
        };

        let mut game = Game::new(platform::random_seed(), tuning, host, platform::now_ms())
            .map_err(to_js_error)?;
        game.set_role(settings.role);
        Ok(WebGame {
            game,
            events,
            settings,
        })
    }

    /// "up", "down", "left" or "right"; anything else is ignored
    pub fn input(&mut self, dir: &str) {
        if let Some(dir) = Direction::parse(dir) {
            self.game.handle_input(dir);
        }
    }

    pub fn frame(&mut self, now_ms: f64) {
        self.game.frame(now_ms.max(0.0) as u64);
    }

    pub fn pause(&mut self) {
        self.game.pause_game();
    }

    pub fn resume(&mut self) {
        self.game.continue_game();
    }

    pub fn restart(&mut self) {
        self.game.restart();
    }

    /// Current frame as JSON
    pub fn snapshot(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.game.snapshot()).map_err(to_js_error)
    }

    /// Status updates since the last call, as a JSON array
    pub fn drain_events(&mut self) -> Result<String, JsValue> {
        let events: Vec<WebEvent> = self
            .events
            .borrow_mut()
            .drain(..)
            .map(|event| {
                let text = match &event {
                    StatusEvent::Message(m) => Some(m.to_string()),
                    _ => None,
                };
                let color = match &event {
                    StatusEvent::Tone(t) => Some(t.css_color()),
                    _ => None,
                };
                WebEvent { event, text, color }
            })
            .collect();
        serde_json::to_string(&events).map_err(to_js_error)
    }

    pub fn role(&self) -> String {
        self.settings.role.as_str().to_string()
    }

    pub fn set_role(&mut self, role: &str) -> Result<(), JsValue> {
        let role = Role::from_str(role).ok_or_else(|| to_js_error(format!("unknown role {role}")))?;
        self.settings.role = role;
        self.game.set_role(role);
        self.save_settings()
    }

    pub fn language(&self) -> String {
        self.settings.language.as_str().to_string()
    }

    pub fn set_language(&mut self, language: &str) -> Result<(), JsValue> {
        self.settings.language = Language::from_str(language)
            .ok_or_else(|| to_js_error(format!("unknown language {language}")))?;
        self.save_settings()
    }
}

impl WebGame {
    fn save_settings(&self) -> Result<(), JsValue> {
        let mut store = LocalStorage::open().map_err(to_js_error)?;
        self.settings.save(&mut store).map_err(to_js_error)
    }
}
