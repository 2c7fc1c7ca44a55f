//! Maze Chase entry point
//!
//! On the web this exposes a `WebGame` handle that the page drives once per
//! animation frame. Natively it plays a headless demo run on autopilot.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use glam::Vec2;
    use wasm_bindgen::prelude::*;

    use maze_chase::sim::{Abilities, GameState, Mode, TickInput, commit_pending_enter, tick};
    use maze_chase::{ControlSettings, HighScores, InputMode, Tuning};

    /// Frame time used when no previous timestamp exists
    const FIRST_FRAME_MS: f64 = 16.0;

    /// Game instance owned by the page
    #[wasm_bindgen]
    pub struct WebGame {
        state: GameState,
        input: TickInput,
        controls: ControlSettings,
        high_scores: HighScores,
        last_time: f64,
        /// Whether the finished run has been put on the leaderboard
        recorded: bool,
    }

    #[wasm_bindgen]
    impl WebGame {
        /// Start a run; `tuning_json` may be partial or empty
        #[wasm_bindgen(constructor)]
        pub fn new(seed: f64, tuning_json: Option<String>) -> WebGame {
            let tuning = tuning_json
                .as_deref()
                .map(Tuning::from_json_or_default)
                .unwrap_or_default();
            let seed = seed.max(0.0) as u64;
            log::info!("New run with seed {seed}");
            WebGame {
                state: GameState::new(seed, tuning),
                input: TickInput::default(),
                controls: ControlSettings::load(),
                high_scores: HighScores::load(),
                last_time: 0.0,
                recorded: false,
            }
        }

        /// Pointer position and the player's on-screen position, in pixels
        pub fn set_pointer(&mut self, x: f32, y: f32, player_x: f32, player_y: f32) {
            if self.controls.input_mode != InputMode::Pointer {
                return;
            }
            self.controls
                .pointer_steering(Vec2::new(x, y), Vec2::new(player_x, player_y))
                .apply(&mut self.input);
        }

        /// Latest device orientation, in degrees
        pub fn set_tilt(&mut self, beta: f32, gamma: f32) {
            if self.controls.input_mode != InputMode::Tilt {
                return;
            }
            self.controls.tilt_steering(beta, gamma).apply(&mut self.input);
        }

        pub fn calibrate_tilt(&mut self, beta: f32, gamma: f32) {
            self.controls.calibrate_tilt(beta, gamma);
            self.controls.save();
        }

        /// "pointer" or "tilt"
        pub fn set_input_mode(&mut self, mode: &str) {
            if let Some(mode) = InputMode::from_str(mode) {
                self.controls.input_mode = mode;
                self.input.steer = Vec2::ZERO;
                self.input.intensity = 0.0;
                self.controls.save();
            }
        }

        /// Advance the simulation to animation-frame time `time` (ms)
        pub fn frame(&mut self, time: f64) {
            let dt = if self.last_time > 0.0 {
                time - self.last_time
            } else {
                FIRST_FRAME_MS
            };
            self.last_time = time;

            tick(&mut self.state, &self.input, dt);

            // One-shot inputs
            self.input.fire = false;
            self.input.pause = false;

            if self.state.mode == Mode::GameOver && !self.recorded {
                self.recorded = true;
                let summary = self.state.summary();
                if self.high_scores.add_run(&summary, js_sys::Date::now()).is_some() {
                    self.high_scores.save();
                }
            }
        }

        pub fn fire(&mut self) {
            self.input.fire = true;
        }

        pub fn set_paused(&mut self, paused: bool) {
            self.state.set_paused(paused);
            // A resumed frame must not see the paused gap as elapsed time
            self.last_time = 0.0;
        }

        /// Apply the reward screen's abilities (JSON, may be empty) and resume.
        /// Returns false if no move was waiting.
        pub fn commit_reward(&mut self, abilities_json: &str) -> bool {
            if !abilities_json.trim().is_empty() {
                match serde_json::from_str::<Abilities>(abilities_json) {
                    Ok(abilities) => self.state.abilities = abilities.clamped(),
                    Err(e) => log::warn!("Ignoring malformed abilities: {e}"),
                }
            }
            self.last_time = 0.0;
            commit_pending_enter(&mut self.state)
        }

        /// Full renderer snapshot
        pub fn snapshot_json(&self) -> String {
            serde_json::to_string(&self.state).unwrap_or_default()
        }

        /// Events queued since the last call, as a JSON array
        pub fn drain_events_json(&mut self) -> String {
            let events = self.state.drain_events();
            serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string())
        }

        pub fn high_scores_json(&self) -> String {
            serde_json::to_string(&self.high_scores).unwrap_or_else(|_| "{}".to_string())
        }
    }

    pub fn init() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialised".into());
        }
        log::info!("Maze Chase starting...");
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::init();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Maze Chase (native) starting...");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(7);
    let summary = autopilot::run(seed, autopilot::DEMO_FRAMES);
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("Could not encode run summary: {e}"),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless demo: walk the shortest path to each north exit
#[cfg(not(target_arch = "wasm32"))]
mod autopilot {
    use glam::Vec2;

    use maze_chase::sim::pathfind::bfs_path;
    use maze_chase::sim::{
        EntryDir, GameEvent, GameState, Mode, RunSummary, TickInput, TilePos, commit_pending_enter,
        tick,
    };
    use maze_chase::Tuning;

    pub const DEMO_FRAMES: usize = 60 * 120;
    const FRAME_MS: f64 = 1000.0 / 60.0;

    pub fn run(seed: u64, frames: usize) -> RunSummary {
        let mut state = GameState::new(seed, Tuning::default());
        for _ in 0..frames {
            let input = steer(&state);
            tick(&mut state, &input, FRAME_MS);

            for event in state.drain_events() {
                log_event(&event);
            }
            match state.mode {
                Mode::AwaitingReward => {
                    commit_pending_enter(&mut state);
                }
                Mode::GameOver => break,
                _ => {}
            }
        }
        state.summary()
    }

    fn steer(state: &GameState) -> TickInput {
        let mut input = TickInput {
            fire: state.chaser.present && state.inventory.missiles > 0,
            ..Default::default()
        };
        let Some(chunk) = state.current() else {
            return input;
        };

        let here = TilePos::containing(state.player.pos);
        let exit = EntryDir::North.exit_tile();
        let target = if here == exit {
            state.player.pos - Vec2::Y
        } else {
            let path = bfs_path(&chunk.grid, here, exit);
            match path.get(1) {
                Some(next) => next.center(),
                None => return input,
            }
        };

        input.steer = target - state.player.pos;
        input.intensity = 1.0;
        input
    }

    fn log_event(event: &GameEvent) {
        match event {
            GameEvent::ChunkEntered { .. } | GameEvent::WallBroken { .. } => log::debug!("{event:?}"),
            _ => log::info!("{event:?}"),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_autopilot_climbs() {
            let summary = run(3, 60 * 20);
            assert!(summary.max_floor > 1);
        }
    }
}
