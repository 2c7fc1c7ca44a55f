//! Upgrade inputs owned by the reward/shop collaborator
//!
//! The simulation only reads these. They are re-read every tick, so a reward
//! commit takes effect on the next frame.

use serde::{Deserialize, Serialize};

/// Caps enforced by [`Abilities::clamped`]
pub const MAX_WALL_BREAK_SPEED_MULT: f64 = 100.0;
pub const MAX_MOVE_SPEED_MULT: f32 = 3.0;
pub const MAX_MISSILE_COUNT: u32 = 5;
pub const MAX_HEART_DROP_CHANCE: f64 = 0.10;
pub const MAX_COIN_FIELD_SPAWN_BONUS: f64 = 3.0;
pub const MAX_SHIELDS: u32 = 3;
/// Durability weakening bottoms out at half strength
pub const MIN_WALL_DURABILITY_MULT: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Abilities {
    pub wall_break_unlocked: bool,
    pub wall_break_speed_mult: f64,
    pub move_speed_mult: f32,

    /// Per-group break time multipliers (levels 0-2, 3-5, 7-8, 9)
    pub wall_durability_mult_common: f64,
    pub wall_durability_mult_rare: f64,
    pub wall_durability_mult_epic: f64,
    pub wall_durability_mult_legendary: f64,

    pub gold_wall_unlocked: bool,
    pub gold_wall_prob: f64,
    pub coin_wall_coin_amount: u32,
    /// Added to every coin pickup
    pub coin_gain_bonus: u32,
    pub coin_field_spawn_bonus: f64,

    pub missile_count: u32,
    pub missile_stun_bonus_ms: f64,
    pub missile_spawn_chance_mult: f32,
    pub missile_field_spawn_bonus: f32,
    pub max_field_missile_items: u32,
    pub missile_wall_break_unlocked: bool,
    pub missile_wall_break_prob: f64,
    /// Chance that a broken wall hides gunpowder
    pub missile_gunpowder_prob: f64,
    pub kill_missile_unlocked: bool,
    pub intercept_missile_unlocked: bool,

    pub max_lives: u32,
    pub shield_max: u32,
    pub heart_drop_chance: f64,
}

impl Default for Abilities {
    fn default() -> Self {
        Self {
            wall_break_unlocked: false,
            wall_break_speed_mult: 1.0,
            move_speed_mult: 1.0,
            wall_durability_mult_common: 1.0,
            wall_durability_mult_rare: 1.0,
            wall_durability_mult_epic: 1.0,
            wall_durability_mult_legendary: 1.0,
            gold_wall_unlocked: false,
            gold_wall_prob: 0.03,
            coin_wall_coin_amount: 5,
            coin_gain_bonus: 0,
            coin_field_spawn_bonus: 0.0,
            missile_count: 1,
            missile_stun_bonus_ms: 0.0,
            missile_spawn_chance_mult: 1.0,
            missile_field_spawn_bonus: 0.0,
            max_field_missile_items: 1,
            missile_wall_break_unlocked: false,
            missile_wall_break_prob: 0.10,
            missile_gunpowder_prob: 0.0,
            kill_missile_unlocked: false,
            intercept_missile_unlocked: false,
            max_lives: 3,
            shield_max: 0,
            heart_drop_chance: 0.0,
        }
    }
}

impl Abilities {
    /// Copy with every upgrade pinned to its allowed range
    pub fn clamped(&self) -> Self {
        let weaken = |m: f64| m.clamp(MIN_WALL_DURABILITY_MULT, 1.0);
        Self {
            wall_break_speed_mult: self.wall_break_speed_mult.clamp(0.0, MAX_WALL_BREAK_SPEED_MULT),
            move_speed_mult: self.move_speed_mult.clamp(0.0, MAX_MOVE_SPEED_MULT),
            wall_durability_mult_common: weaken(self.wall_durability_mult_common),
            wall_durability_mult_rare: weaken(self.wall_durability_mult_rare),
            wall_durability_mult_epic: weaken(self.wall_durability_mult_epic),
            wall_durability_mult_legendary: weaken(self.wall_durability_mult_legendary),
            gold_wall_prob: self.gold_wall_prob.clamp(0.0, 1.0),
            coin_field_spawn_bonus: self.coin_field_spawn_bonus.clamp(0.0, MAX_COIN_FIELD_SPAWN_BONUS),
            missile_count: self.missile_count.clamp(1, MAX_MISSILE_COUNT),
            missile_stun_bonus_ms: self.missile_stun_bonus_ms.max(0.0),
            missile_field_spawn_bonus: self.missile_field_spawn_bonus.clamp(0.0, 1.0),
            max_field_missile_items: self.max_field_missile_items.max(1),
            missile_wall_break_prob: self.missile_wall_break_prob.clamp(0.0, 1.0),
            missile_gunpowder_prob: self.missile_gunpowder_prob.clamp(0.0, 1.0),
            max_lives: self.max_lives.max(1),
            shield_max: self.shield_max.min(MAX_SHIELDS),
            heart_drop_chance: self.heart_drop_chance.clamp(0.0, MAX_HEART_DROP_CHANCE),
            ..self.clone()
        }
    }

    /// Break-time multiplier from the durability weakening upgrades.
    ///
    /// Level 6 (red) belongs to no group and is never weakened.
    pub fn wall_weaken_mult(&self, level: usize) -> f64 {
        match level {
            0..=2 => self.wall_durability_mult_common,
            3..=5 => self.wall_durability_mult_rare,
            7 | 8 => self.wall_durability_mult_epic,
            9 => self.wall_durability_mult_legendary,
            _ => 1.0,
        }
    }
}
