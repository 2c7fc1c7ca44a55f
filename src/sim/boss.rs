//! Boss encounter on every 20th floor
//!
//! The boss sits in the centre of a fixed arena and every few seconds rolls
//! one of five attacks: beam patterns from its centre, or telegraphed tile
//! blasts across the grid. Beams warn for longer while it is healthy.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

use glam::Vec2;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::grid::{ChunkCoord, EntryDir, TilePos};
use super::state::{GameEvent, GameState, HitSource, Mode, PendingEnter};
use crate::consts::{BOSS_CENTER, MAZE_SIZE};

/// Beam reach from the boss centre
pub const LASER_LENGTH: f32 = 10.0;
/// Player distance from a tile centre that counts as standing on it
const BLAST_HIT_RADIUS: f32 = 0.5;
const BLAST_WARN_MS: f64 = 1500.0;
const SWEEP_STEP_MS: f64 = 500.0;
const SCATTER_JITTER_MS: u32 = 800;
const SCATTER_FRACTION: f64 = 0.35;
/// Missile inventory the boss tops up to
const MISSILE_SUPPLY_CAP: u32 = 5;
const BOSS_DEFEAT_SCORE: f64 = 1000.0;
const BOSS_COINS_PER_FLOOR: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossPattern {
    AxisBeams,
    DiagonalBeams,
    Chessboard,
    /// Rows or columns blasting one after another
    Sweep,
    Scatter,
}

/// A beam cast from `origin` along `angle`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Laser {
    pub origin: Vec2,
    pub angle: f32,
    pub width: f32,
    pub start_ms: f64,
    pub warn_ms: f64,
    pub life_ms: f64,
}

impl Laser {
    fn new(angle: f32, width: f32, life_ms: f64, start_ms: f64, warn_ms: f64) -> Self {
        Self {
            origin: BOSS_CENTER,
            angle,
            width,
            start_ms,
            warn_ms,
            life_ms,
        }
    }

    /// Past its warning and still burning
    pub fn is_firing(&self, now_ms: f64) -> bool {
        now_ms - self.start_ms > self.warn_ms
    }

    pub fn is_expired(&self, now_ms: f64) -> bool {
        now_ms - self.start_ms > self.warn_ms + self.life_ms
    }

    /// True if `p` lies inside the beam's rectangle
    pub fn covers(&self, p: Vec2) -> bool {
        let dir = Vec2::from_angle(self.angle);
        let rel = p - self.origin;
        let along = rel.dot(dir);
        (0.0..LASER_LENGTH).contains(&along) && rel.perp_dot(dir).abs() < self.width / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlastState {
    /// Not yet telegraphed (staggered sweeps)
    Pending,
    Warning,
    Active,
    Done,
}

/// One telegraphed tile of a blast pattern
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlastTile {
    pub tile: TilePos,
    pub warn_start_ms: f64,
    pub damage_start_ms: f64,
    pub damage_end_ms: f64,
    pub state: BlastState,
    /// Each tile damages at most once
    pub hit: bool,
}

impl BlastTile {
    fn new(tile: TilePos, warn_start_ms: f64, damage_ms: f64) -> Self {
        let damage_start_ms = warn_start_ms + BLAST_WARN_MS;
        Self {
            tile,
            warn_start_ms,
            damage_start_ms,
            damage_end_ms: damage_start_ms + damage_ms,
            state: BlastState::Pending,
            hit: false,
        }
    }

    pub fn state_at(&self, now_ms: f64) -> BlastState {
        if now_ms < self.warn_start_ms {
            BlastState::Pending
        } else if now_ms < self.damage_start_ms {
            BlastState::Warning
        } else if now_ms < self.damage_end_ms {
            BlastState::Active
        } else {
            BlastState::Done
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileAttack {
    pub pattern: BossPattern,
    pub tiles: Vec<BlastTile>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Boss {
    pub active: bool,
    pub chunk: Option<ChunkCoord>,
    pub hp: f32,
    pub max_hp: f32,
    pub last_attack_ms: f64,
    pub last_missile_ms: f64,
    pub lasers: Vec<Laser>,
    pub tile_attacks: Vec<TileAttack>,
}

impl Boss {
    pub fn clear_attacks(&mut self) {
        self.lasers.clear();
        self.tile_attacks.clear();
    }

    /// Beam warning: 3 s at full health down to 0.5 s near death, in 0.5 s steps
    pub fn laser_warn_ms(&self) -> f64 {
        let frac = if self.max_hp > 0.0 {
            f64::from(self.hp / self.max_hp)
        } else {
            1.0
        };
        let t = ((frac - 0.1) / 0.9).clamp(0.0, 1.0);
        let raw_s = 0.5 + 2.5 * t;
        ((raw_s / 0.5).ceil() * 0.5 * 1000.0).round()
    }
}

fn all_tiles() -> impl Iterator<Item = TilePos> {
    let size = MAZE_SIZE as i32;
    (0..size).flat_map(move |y| (0..size).map(move |x| TilePos::new(x, y)))
}

/// Run the encounter for the current chunk
pub fn update(state: &mut GameState) {
    let coord = state.current_chunk;
    if !coord.is_boss_floor() {
        state.boss.active = false;
        return;
    }
    if state.chunks.get(coord).is_none_or(|c| c.cleared) {
        state.boss.active = false;
        state.boss.clear_attacks();
        return;
    }
    if !state.boss.active || state.boss.chunk != Some(coord) {
        start(state, coord);
    }

    let now = state.now_ms;
    if now - state.boss.last_attack_ms > state.tuning.boss_attack_interval_ms {
        state.boss.last_attack_ms = now;
        roll_attack(state);
    }

    update_lasers(state);
    update_tile_attacks(state);

    if now - state.boss.last_missile_ms > state.tuning.boss_missile_respawn_ms {
        state.boss.last_missile_ms = now;
        if state.inventory.missiles < MISSILE_SUPPLY_CAP {
            state.inventory.missiles += 1;
        }
    }
}

fn start(state: &mut GameState, coord: ChunkCoord) {
    let now = state.now_ms;
    let hp = state.tuning.boss_health;
    let boss = &mut state.boss;
    boss.active = true;
    boss.chunk = Some(coord);
    boss.hp = hp;
    boss.max_hp = hp;
    boss.last_attack_ms = now;
    boss.last_missile_ms = now;
    boss.clear_attacks();

    // the chaser sits the fight out
    state.chaser.present = false;
    state.chaser.last_shot_ms = now;
    state.enemy_projectiles.clear();

    log::info!("Boss fight started on floor {}", coord.floor());
    state.push_event(GameEvent::BossStarted { chunk: coord });
}

fn roll_attack(state: &mut GameState) {
    let now = state.now_ms;
    let warn = state.boss.laser_warn_ms();
    let pattern = match state.rng.random_range(0..5) {
        0 => BossPattern::AxisBeams,
        1 => BossPattern::DiagonalBeams,
        2 => BossPattern::Chessboard,
        3 => BossPattern::Sweep,
        _ => BossPattern::Scatter,
    };
    log::debug!("Boss attack {pattern:?}");

    match pattern {
        BossPattern::AxisBeams => {
            state.boss.lasers.extend(
                (0..4).map(|i| Laser::new(i as f32 * FRAC_PI_2, 2.0, 1500.0, now, warn)),
            );
        }
        BossPattern::DiagonalBeams => {
            state.boss.lasers.extend((0..4).map(|i| {
                Laser::new(FRAC_PI_4 + i as f32 * FRAC_PI_2, 1.5, 1200.0, now, warn)
            }));
        }
        BossPattern::Chessboard => {
            let tiles = all_tiles()
                .filter(|t| (t.x + t.y) % 2 == 0)
                .map(|t| BlastTile::new(t, now, 300.0))
                .collect();
            state.boss.tile_attacks.push(TileAttack { pattern, tiles });
        }
        BossPattern::Sweep => {
            let rows = state.rng.random_bool(0.5);
            let tiles = all_tiles()
                .map(|t| {
                    let step = if rows { t.y } else { t.x };
                    BlastTile::new(t, now + f64::from(step) * SWEEP_STEP_MS, 300.0)
                })
                .collect();
            state.boss.tile_attacks.push(TileAttack { pattern, tiles });
        }
        BossPattern::Scatter => {
            let mut pool: Vec<TilePos> = all_tiles().collect();
            pool.shuffle(&mut state.rng);
            let count = (pool.len() as f64 * SCATTER_FRACTION).floor() as usize;
            let tiles = pool
                .into_iter()
                .take(count)
                .map(|t| {
                    let jitter = state.rng.random_range(0..SCATTER_JITTER_MS);
                    BlastTile::new(t, now + f64::from(jitter), 2000.0)
                })
                .collect();
            state.boss.tile_attacks.push(TileAttack { pattern, tiles });
        }
    }
}

fn update_lasers(state: &mut GameState) {
    let now = state.now_ms;
    let player = state.player.pos;
    let lasers = &mut state.boss.lasers;
    lasers.retain(|l| !l.is_expired(now));
    let before = lasers.len();
    lasers.retain(|l| !(l.is_firing(now) && l.covers(player)));
    if lasers.len() < before {
        state.apply_player_hit(HitSource::Laser);
    }
}

fn update_tile_attacks(state: &mut GameState) {
    let now = state.now_ms;
    let player = state.player.pos;
    let mut hit = false;
    for attack in &mut state.boss.tile_attacks {
        for t in &mut attack.tiles {
            t.state = t.state_at(now);
            if t.state == BlastState::Active
                && !t.hit
                && player.distance(t.tile.center()) < BLAST_HIT_RADIUS
            {
                t.hit = true;
                hit = true;
            }
        }
    }
    state
        .boss
        .tile_attacks
        .retain(|a| a.tiles.iter().any(|t| t.state != BlastState::Done));
    if hit {
        state.apply_player_hit(HitSource::TileBlast);
    }
}

/// A missile reached the boss
pub(crate) fn take_damage(state: &mut GameState, amount: f32) {
    if !state.boss.active {
        return;
    }
    state.boss.hp -= amount;
    let hp = state.boss.hp.max(0.0);
    state.push_event(GameEvent::BossHit { hp });
    if state.boss.hp <= 0.0 {
        defeat(state);
    }
}

fn defeat(state: &mut GameState) {
    let now = state.now_ms;
    let coord = state.current_chunk;
    let floor = coord.floor();

    let boss = &mut state.boss;
    boss.active = false;
    boss.hp = 0.0;
    boss.clear_attacks();
    state.boss_kills += 1;
    if let Some(chunk) = state.chunks.get_mut(coord) {
        chunk.cleared = true;
    }
    state.add_score(BOSS_DEFEAT_SCORE);
    state.coins += u64::from(floor) * BOSS_COINS_PER_FLOOR;
    state.enemy_projectiles.clear();

    let cooldown = now + state.tuning.boss_cooldown_ms;
    let c = &mut state.chaser;
    c.present = false;
    c.last_shot_ms = now;
    c.cooldown_until_ms = cooldown;
    c.entry_until_ms = cooldown;

    state.pending_enter = Some(PendingEnter {
        chunk: coord.offset(0, 1),
        entry: EntryDir::South,
    });
    state.mode = Mode::AwaitingReward;

    log::info!("Boss defeated on floor {floor}");
    state.push_event(GameEvent::BossDefeated { chunk: coord });
    state.push_event(GameEvent::RewardOffered { floor });
}
