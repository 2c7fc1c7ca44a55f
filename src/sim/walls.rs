//! Wall durability: rub heat, breaking, decay and regeneration
//!
//! Rubbing a wall adds heat. Once the heat reaches the wall's break target the
//! tile opens, and after the regen delay it closes again unless something is
//! standing in the gap.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::abilities::Abilities;
use super::chunk::Chunk;
use super::grid::TilePos;
use super::maze::wall_level_distribution;
use super::rng;
use crate::consts::{BOUNDARY_WALL, FLOOR, GOLD_WALL};
use crate::tuning::Tuning;

/// Accumulated rub time on one tile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallHeat {
    pub heat_ms: f64,
    pub last_touch_ms: f64,
}

/// A broken tile waiting to regenerate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrokenWall {
    /// Value restored on regen (gold walls come back ordinary)
    pub value: u16,
    pub broken_at_ms: f64,
}

/// A tile that just opened, with the one-time rewards it carried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallBreak {
    pub tile: TilePos,
    pub old_value: u16,
    pub gold: bool,
    pub gunpowder: bool,
}

/// Something that blocks regeneration near it (Chebyshev distance)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clearance {
    pub pos: Vec2,
    pub radius: f32,
}

/// True for values a player can wear down
pub fn is_breakable_value(value: u16) -> bool {
    value > FLOOR && value != BOUNDARY_WALL
}

/// Rub time needed to break a wall value, `None` for unbreakable values
pub fn break_target_ms(value: u16, tuning: &Tuning, abilities: &Abilities) -> Option<f64> {
    if !is_breakable_value(value) {
        return None;
    }
    let (durability, weaken) = if value == GOLD_WALL {
        (tuning.durability(0), 1.0)
    } else {
        let level = value as usize - 1;
        (tuning.durability(level), abilities.wall_weaken_mult(level))
    };
    Some(tuning.wall_rub_break_ms * durability * weaken)
}

/// Whether a wall hides gunpowder. A tile pays out once per chunk lifetime.
pub fn has_gunpowder_mark(chunk: &Chunk, tile: TilePos, value: u16, prob: f64) -> bool {
    if !is_breakable_value(value) || value == GOLD_WALL || prob <= 0.0 {
        return false;
    }
    if chunk.gunpowder_spent.contains(&tile) {
        return false;
    }
    rng::gunpowder_rng(chunk.coord, tile).random::<f64>() < prob
}

/// Ordinary value a gold wall regenerates as, drawn from the chunk's tier mix
pub fn ordinary_value_for(chunk: &Chunk, tile: TilePos, tuning: &Tuning) -> u16 {
    let dist = wall_level_distribution(chunk.coord.floor(), &tuning.wall_levels);
    let mut rng = rng::regen_wall_rng(chunk.coord, tile);
    let level = if rng.random::<f64>() < dist.next_prob {
        dist.next_level
    } else {
        dist.base_level
    };
    level as u16 + 1
}

/// Add rub time to a wall tile. Returns the break when heat reaches the target.
pub fn rub_wall(
    chunk: &mut Chunk,
    tile: TilePos,
    add_ms: f64,
    now_ms: f64,
    tuning: &Tuning,
    abilities: &Abilities,
) -> Option<WallBreak> {
    if !abilities.wall_break_unlocked || tile.in_border(tuning.wall_unbreakable_margin) {
        return None;
    }
    let value = chunk.grid.get(tile)?;
    let target = break_target_ms(value, tuning, abilities)?;

    let entry = chunk.wall_heat.entry(tile).or_insert(WallHeat {
        heat_ms: 0.0,
        last_touch_ms: now_ms,
    });
    entry.heat_ms = (entry.heat_ms + add_ms * abilities.wall_break_speed_mult)
        .min(target * tuning.wall_rub_overshoot);
    entry.last_touch_ms = now_ms;

    if entry.heat_ms >= target {
        break_wall(chunk, tile, now_ms, tuning, abilities)
    } else {
        None
    }
}

/// Open a breakable wall immediately and schedule its regeneration
pub fn break_wall(
    chunk: &mut Chunk,
    tile: TilePos,
    now_ms: f64,
    tuning: &Tuning,
    abilities: &Abilities,
) -> Option<WallBreak> {
    if tile.in_border(tuning.wall_unbreakable_margin) {
        return None;
    }
    let value = chunk.grid.get(tile).filter(|&v| is_breakable_value(v))?;

    let gold = value == GOLD_WALL;
    let gunpowder = has_gunpowder_mark(chunk, tile, value, abilities.missile_gunpowder_prob);
    if gunpowder {
        chunk.gunpowder_spent.insert(tile);
    }

    chunk.grid.set(tile, FLOOR);
    chunk.wall_heat.remove(&tile);
    let regen_value = if gold {
        ordinary_value_for(chunk, tile, tuning)
    } else {
        value
    };
    chunk.broken_walls.insert(
        tile,
        BrokenWall {
            value: regen_value,
            broken_at_ms: now_ms,
        },
    );

    Some(WallBreak {
        tile,
        old_value: value,
        gold,
        gunpowder,
    })
}

/// Cool tiles that have not been rubbed recently; fully cooled entries go away
pub fn decay_heat(chunk: &mut Chunk, dt_ms: f64, now_ms: f64, tuning: &Tuning) {
    let dec = tuning.wall_rub_decay_per_ms * dt_ms.min(80.0);
    chunk.wall_heat.retain(|_, heat| {
        if now_ms - heat.last_touch_ms < tuning.wall_rub_idle_ms {
            return true;
        }
        heat.heat_ms = (heat.heat_ms - dec).max(0.0);
        heat.heat_ms > 0.0
    });
}

/// Close broken walls whose delay has passed and whose cell is clear.
///
/// Returns the tiles that closed this call.
pub fn regen_walls(
    chunk: &mut Chunk,
    now_ms: f64,
    tuning: &Tuning,
    occupants: &[Clearance],
) -> Vec<TilePos> {
    let due: Vec<(TilePos, u16)> = chunk
        .broken_walls
        .iter()
        .filter(|(_, b)| now_ms - b.broken_at_ms > tuning.wall_regen_ms)
        .map(|(&tile, b)| (tile, b.value))
        .collect();

    let mut closed = Vec::new();
    for (tile, value) in due {
        let center = tile.center();
        let blocked = occupants.iter().any(|o| {
            let d = (o.pos - center).abs();
            d.x < o.radius && d.y < o.radius
        });
        if blocked {
            continue;
        }
        chunk.grid.set(tile, value);
        chunk.broken_walls.remove(&tile);
        closed.push(tile);
    }
    closed
}
