//! Maze Chase - chunked maze roguelite simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (maze generation, movement, chaser, boss)
//! - `tuning`: Data-driven game balance
//! - `settings`: Input preferences and steering conversion
//! - `highscores`: Local leaderboard fed by finished runs

pub mod highscores;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use highscores::HighScores;
pub use settings::{ControlSettings, InputMode};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    use glam::Vec2;

    /// Maze side length in tiles (odd so corridors and walls alternate)
    pub const MAZE_SIZE: usize = 17;
    /// Centre row/column; carving starts here and exits sit on it
    pub const MAZE_MID: i32 = (MAZE_SIZE / 2) as i32;

    /// Wall value encoding
    pub const FLOOR: u16 = 0;
    pub const GOLD_WALL: u16 = 100;
    pub const BOUNDARY_WALL: u16 = 200;

    pub const BOSS_FLOOR_INTERVAL: u32 = 20;
    /// Floors between reward offers
    pub const REWARD_FLOOR_INTERVAL: u32 = 10;
    /// Boss body centre in maze coordinates
    pub const BOSS_CENTER: Vec2 = Vec2::new(8.5, 8.5);
    pub const BOSS_HIT_RADIUS: f32 = 1.68;
}

/// Score multiplier for a floor: doubles every 10 floors
#[inline]
pub fn floor_score_multiplier(floor: u32) -> f64 {
    2f64.powi((floor / consts::REWARD_FLOOR_INTERVAL) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_multiplier_steps() {
        assert_eq!(floor_score_multiplier(1), 1.0);
        assert_eq!(floor_score_multiplier(9), 1.0);
        assert_eq!(floor_score_multiplier(10), 2.0);
        assert_eq!(floor_score_multiplier(25), 4.0);
    }
}
