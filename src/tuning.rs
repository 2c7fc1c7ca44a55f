//! Data-driven game balance
//!
//! Every gameplay constant the simulation reads lives here so a build can be
//! rebalanced from JSON without touching `sim`. Missing fields fall back to the
//! defaults, so a tuning file only needs the values it overrides.

use serde::{Deserialize, Serialize};

use crate::sim::ChunkCoord;

/// One durability tier of ordinary walls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallLevel {
    pub name: String,
    /// Display colour for the presentation layer
    pub color: [u8; 3],
    /// Multiplier on the base break time
    pub durability: f64,
    /// Appearance probability added every 10 floors once the tier unlocks
    pub start_prob: f64,
}

impl WallLevel {
    fn new(name: &str, color: [u8; 3], durability: f64, start_prob: f64) -> Self {
        Self {
            name: name.to_string(),
            color,
            durability,
            start_prob,
        }
    }
}

/// The ten wall tiers: brown through black
pub fn default_wall_levels() -> Vec<WallLevel> {
    vec![
        WallLevel::new("brown", [72, 50, 34], 1.0, 1.0),
        WallLevel::new("blue", [34, 50, 120], 2.0, 0.20),
        WallLevel::new("green", [34, 120, 50], 4.0, 0.15),
        WallLevel::new("purple", [100, 34, 120], 8.0, 0.12),
        WallLevel::new("yellow", [130, 120, 30], 16.0, 0.10),
        WallLevel::new("orange", [140, 80, 30], 32.0, 0.08),
        WallLevel::new("red", [140, 30, 30], 64.0, 0.07),
        WallLevel::new("grey", [80, 80, 80], 128.0, 0.06),
        WallLevel::new("white", [210, 210, 210], 256.0, 0.05),
        WallLevel::new("black", [25, 25, 25], 512.0, 0.05),
    ]
}

/// Smallest durability multiplier a wall tier may have
const MIN_DURABILITY: f64 = 0.1;
/// Smallest per-decade appearance probability of a wall tier
const MIN_START_PROB: f64 = 0.01;

/// Gameplay tuning. Distances are in maze cells, times in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === World ===
    /// Chunk columns; chunks only scroll vertically
    pub chunk_cols: i32,
    pub start_chunk: ChunkCoord,
    /// Chunk rows generated around the player
    pub view_radius: i32,
    /// Chunk rows kept when evicting
    pub keep_radius: i32,
    /// Eviction only runs once this many chunks are resident
    pub chunk_evict_threshold: usize,
    /// Frame dt clamp (tab resume protection)
    pub max_frame_ms: f64,
    /// Swipe animation between chunks; simulation is suspended meanwhile
    pub transition_ms: f64,

    // === Player ===
    pub player_radius: f32,
    /// Cells per second at full input intensity
    pub move_speed: f32,
    /// Invincibility after any absorbed or applied hit
    pub hit_invincible_ms: f64,
    pub start_lives: u32,

    // === Chaser ===
    /// First chunk row where the chaser activates
    pub chaser_start_row: i32,
    /// Cells per second before the speed multiplier
    pub chaser_speed: f32,
    pub chaser_radius: f32,
    pub chaser_repath_ms: f64,
    /// Pause granted after a caught reset
    pub chaser_grace_ms: f64,
    /// Contact damage cooldown
    pub chaser_contact_grace_ms: f64,
    pub chaser_entry_delay_ms: f64,
    pub chaser_entry_delay_max_ms: f64,
    pub chaser_speedup_per_chunk: f32,
    pub chaser_max_speed_mult: f32,
    /// Short pause after materialising so it never spawns onto the player
    pub chaser_spawn_grace_ms: f64,
    pub chaser_shot_interval_ms: f64,
    /// Floor from which the chaser fires projectiles
    pub chaser_shot_floor: u32,
    pub chaser_respawn_delay_ms: f64,
    pub chaser_respawn_warning_ms: f64,

    // === Missiles ===
    pub item_spawn_chance: f32,
    pub missile_speed: f32,
    /// Homing blend strength per second
    pub missile_turn_rate: f32,
    pub missile_damage: f32,
    pub missile_stagger_ms: f64,
    pub stun_ms: f64,
    pub gunpowder_damage_mult: f32,
    pub gunpowder_slow_mult: f32,
    pub gunpowder_slow_ms: f64,

    // === Walls ===
    pub wall_rub_break_ms: f64,
    /// Heat lost per millisecond while untouched
    pub wall_rub_decay_per_ms: f64,
    /// A tile touched within this window does not decay
    pub wall_rub_idle_ms: f64,
    /// Heat clamp relative to the break target
    pub wall_rub_overshoot: f64,
    /// Border thickness that can never be broken
    pub wall_unbreakable_margin: i32,
    pub wall_regen_ms: f64,
    pub wall_levels: Vec<WallLevel>,

    // === Boss ===
    pub boss_health: f32,
    pub boss_attack_interval_ms: f64,
    pub boss_missile_respawn_ms: f64,
    /// Chaser lockout after a boss defeat
    pub boss_cooldown_ms: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            chunk_cols: 5,
            start_chunk: ChunkCoord::new(2, 0),
            view_radius: 5,
            keep_radius: 7,
            chunk_evict_threshold: 100,
            max_frame_ms: 100.0,
            transition_ms: 260.0,

            player_radius: 0.3,
            move_speed: 12.0,
            hit_invincible_ms: 1000.0,
            start_lives: 3,

            chaser_start_row: 2,
            chaser_speed: 2.0,
            chaser_radius: 0.495,
            chaser_repath_ms: 250.0,
            chaser_grace_ms: 650.0,
            chaser_contact_grace_ms: 1500.0,
            chaser_entry_delay_ms: 1000.0,
            chaser_entry_delay_max_ms: 5000.0,
            chaser_speedup_per_chunk: 0.12,
            chaser_max_speed_mult: 3.0,
            chaser_spawn_grace_ms: 250.0,
            chaser_shot_interval_ms: 5000.0,
            chaser_shot_floor: 20,
            chaser_respawn_delay_ms: 2000.0,
            chaser_respawn_warning_ms: 3000.0,

            item_spawn_chance: 0.55,
            missile_speed: 9.0,
            missile_turn_rate: 16.0,
            missile_damage: 5.0,
            missile_stagger_ms: 200.0,
            stun_ms: 1200.0,
            gunpowder_damage_mult: 3.0,
            gunpowder_slow_mult: 0.8,
            gunpowder_slow_ms: 10000.0,

            wall_rub_break_ms: 5000.0,
            wall_rub_decay_per_ms: 0.9,
            wall_rub_idle_ms: 120.0,
            wall_rub_overshoot: 1.2,
            wall_unbreakable_margin: 1,
            wall_regen_ms: 10000.0,
            wall_levels: default_wall_levels(),

            boss_health: 50.0,
            boss_attack_interval_ms: 3000.0,
            boss_missile_respawn_ms: 5000.0,
            boss_cooldown_ms: 5000.0,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON tuning document
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<Tuning>(json).map(Tuning::sanitized)
    }

    /// Parse JSON, falling back to defaults on malformed input
    pub fn from_json_or_default(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(tuning) => tuning,
            Err(e) => {
                log::warn!("Invalid tuning JSON ({e}), using defaults");
                Self::default()
            }
        }
    }

    /// Repair values that would stall or break the simulation
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        if self.chunk_cols < 1 {
            log::warn!("chunk_cols {} < 1, using {}", self.chunk_cols, defaults.chunk_cols);
            self.chunk_cols = defaults.chunk_cols;
        }
        if !(0..self.chunk_cols).contains(&self.start_chunk.x) || self.start_chunk.y < 0 {
            let fixed = ChunkCoord::new(self.chunk_cols / 2, 0);
            log::warn!("start_chunk {} outside the world, using {}", self.start_chunk, fixed);
            self.start_chunk = fixed;
        }
        if self.keep_radius < self.view_radius {
            log::warn!("keep_radius {} below view_radius {}", self.keep_radius, self.view_radius);
            self.keep_radius = self.view_radius;
        }
        if self.wall_levels.is_empty() {
            log::warn!("Empty wall level table, using defaults");
            self.wall_levels = defaults.wall_levels;
        }
        for level in &mut self.wall_levels {
            if !level.durability.is_finite() || level.durability < MIN_DURABILITY {
                log::warn!("Wall level {} durability {} too low", level.name, level.durability);
                level.durability = if level.durability.is_finite() { MIN_DURABILITY } else { 1.0 };
            }
            if !level.start_prob.is_finite() || level.start_prob < MIN_START_PROB {
                log::warn!("Wall level {} start_prob {} too low", level.name, level.start_prob);
                level.start_prob = MIN_START_PROB;
            }
        }
        if self.max_frame_ms <= 0.0 {
            self.max_frame_ms = defaults.max_frame_ms;
        }
        if self.chaser_entry_delay_max_ms < self.chaser_entry_delay_ms {
            log::warn!("chaser entry delay max below min, clamping");
            self.chaser_entry_delay_max_ms = self.chaser_entry_delay_ms;
        }
        if self.wall_rub_overshoot < 1.0 {
            self.wall_rub_overshoot = 1.0;
        }
        self.start_lives = self.start_lives.max(1);
        self
    }

    /// Number of wall tiers
    pub fn level_count(&self) -> usize {
        self.wall_levels.len()
    }

    /// Durability multiplier for a tier (unknown tiers count as the first)
    pub fn durability(&self, level: usize) -> f64 {
        self.wall_levels
            .get(level)
            .or_else(|| self.wall_levels.first())
            .map(|l| l.durability)
            .unwrap_or(1.0)
    }
}
