//! Frogger entry point
//!
//! The browser build is driven from JavaScript through `frogger::web`. The
//! native binary plays a seeded headless session with a scripted player and
//! prints a JSON summary, which is handy for balancing tuning files.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::fs;
    use std::path::PathBuf;

    use clap::Parser;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;
    use serde::Serialize;
    use thiserror::Error;

    use frogger::consts::CELL_WIDTH;
    use frogger::host::{Host, LogSink};
    use frogger::leaderboard::{
        LOCAL_CAPACITY, LeaderboardStore, LocalLeaderboard, Record, format_age,
    };
    use frogger::persistence::{FileStore, KeyValueStore, MemoryStore, StoreError};
    use frogger::platform;
    use frogger::sim::{Direction, Game, GamePhase, GameStats};
    use frogger::tuning::{Tuning, TuningError};
    use frogger::Settings;

    /// Simulated frames per second
    const FPS: u64 = 60;
    /// Frames between scripted moves
    const MOVE_EVERY: u64 = 15;

    #[derive(Parser, Debug, Clone)]
    #[command(name = "frogger")]
    #[command(about = "Headless river-crossing session with a scripted player", long_about = None)]
    struct Args {
        /// Session seed (random when omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// JSON tuning file; missing fields keep stock values
        #[arg(long)]
        tuning: Option<PathBuf>,

        /// Simulated seconds to play
        #[arg(long, default_value_t = 120)]
        seconds: u64,

        /// JSON file keeping settings and the local leaderboard between runs
        #[arg(long)]
        store: Option<PathBuf>,
    }

    #[derive(Debug, Error)]
    enum RunError {
        #[error("could not read {path}: {source}")]
        Read {
            path: PathBuf,
            #[source]
            source: std::io::Error,
        },
        #[error(transparent)]
        Tuning(#[from] TuningError),
        #[error(transparent)]
        Store(#[from] StoreError),
        #[error("could not encode summary: {0}")]
        Summary(#[from] serde_json::Error),
    }

    #[derive(Serialize)]
    struct Summary {
        seed: u64,
        seconds: u64,
        phase: GamePhase,
        stage: u32,
        score: u64,
        lives: u8,
        stats: GameStats,
        local_top: Vec<Record>,
    }

    /// Waits for a gap in the lane above, then steps up; sidesteps when blocked
    struct ScriptedPlayer {
        rng: Pcg32,
    }

    impl ScriptedPlayer {
        fn next_move(&mut self, game: &Game) -> Option<Direction> {
            let actor = game.actor();
            if game.phase() != GamePhase::Running || !actor.can_move {
                return None;
            }
            let lane = actor.cell.row.checked_sub(1)?;
            let x = actor.x();
            let danger = game
                .registry()
                .hazards
                .iter()
                .any(|h| h.lane == lane && h.x > x - 2.5 * CELL_WIDTH && h.x < x + CELL_WIDTH);
            if danger {
                return None;
            }
            let above = frogger::sim::Cell::new(actor.cell.col, lane);
            let blocked = game.registry().obstacles.iter().any(|p| p.cell == above);
            if !blocked {
                return Some(Direction::Up);
            }
            let sidestep = if self.rng.random_bool(0.5) {
                Direction::Left
            } else {
                Direction::Right
            };
            Some(sidestep)
        }
    }

    fn open_store(path: Option<&PathBuf>) -> Result<Box<dyn StoreHandle>, RunError> {
        let store: Box<dyn StoreHandle> = match path {
            Some(path) => Box::new(FileStore::open(path)?),
            None => Box::new(MemoryStore::new()),
        };
        Ok(store)
    }

    /// Object-safe wrapper so either store can back the leaderboard
    trait StoreHandle {
        fn settings(&self) -> Settings;
        fn into_leaderboard(self: Box<Self>) -> Box<dyn LeaderboardStore>;
    }

    impl<S: KeyValueStore + 'static> StoreHandle for S {
        fn settings(&self) -> Settings {
            Settings::load(self)
        }

        fn into_leaderboard(self: Box<Self>) -> Box<dyn LeaderboardStore> {
            Box::new(LocalLeaderboard::new(*self))
        }
    }

    fn run(args: Args) -> Result<Summary, RunError> {
        let tuning = match &args.tuning {
            Some(path) => {
                let json = fs::read_to_string(path).map_err(|source| RunError::Read {
                    path: path.clone(),
                    source,
                })?;
                Tuning::from_json(&json)?
            }
            None => Tuning::default(),
        };

        let seed = args.seed.unwrap_or_else(platform::random_seed);
        let store = open_store(args.store.as_ref())?;
        let settings = store.settings();
        let mut host = Host::default().with_status(LogSink::default());
        host.leaderboard = store.into_leaderboard();

        let start = platform::now_ms();
        let mut game = Game::new(seed, tuning, host, start)?;
        game.set_role(settings.role);
        let mut player = ScriptedPlayer {
            rng: Pcg32::seed_from_u64(seed.wrapping_add(1)),
        };

        log::info!("Playing {}s with seed {}", args.seconds, seed);
        for frame in 0..args.seconds * FPS {
            if frame % MOVE_EVERY == 0 {
                if let Some(dir) = player.next_move(&game) {
                    game.handle_input(dir);
                }
            }
            game.frame(start + frame * 1000 / FPS);
        }

        let local_top = game
            .host_mut()
            .leaderboard
            .local_top(LOCAL_CAPACITY)
            .unwrap_or_default();
        let now = platform::now_ms();
        for (rank, record) in local_top.iter().enumerate() {
            log::info!(
                "#{} {} {} ({})",
                rank + 1,
                record.name,
                record.score,
                format_age(now, record.time_ms)
            );
        }
        Ok(Summary {
            seed,
            seconds: args.seconds,
            phase: game.phase(),
            stage: game.stage(),
            score: game.actor().score,
            lives: game.actor().lives,
            stats: game.stats().clone(),
            local_top,
        })
    }

    pub fn main() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        let args = Args::parse();

        match run(args).and_then(|summary| Ok(serde_json::to_string_pretty(&summary)?)) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                log::error!("{}", e);
                std::process::exit(1);
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    headless::main();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The browser entry point is `frogger::web::start`
}
