//! The chaser: a pursuer that follows the player from chunk to chunk
//!
//! It stays behind in the chunk the player left and re-enters the player's
//! chunk after a delay that grows with how far it was from the exit. Once
//! present it walks a BFS path toward the player's tile.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::grid::{ChunkCoord, EntryDir, TilePos};
use super::pathfind::{bfs_distance, bfs_path, find_nearest_open_cell, random_open_cell};
use super::projectile;
use super::rng;
use super::state::{GameEvent, GameState, HitSource, Mode};
use crate::consts::MAZE_SIZE;
use crate::tuning::Tuning;

/// Hit points against kill missiles
pub const CHASER_HP: f32 = 25.0;
/// How far behind the entry spawn point it materialises
const ENTRY_BACKSET: f32 = 0.35;
/// Contact damage fires inside this fraction of the catch distance
const TOUCH_FACTOR: f32 = 0.8;
/// Path steps over which the re-entry delay ramps to its maximum
const EXIT_DISTANCE_RAMP: f64 = 20.0;
const CHASER_KILL_SCORE: f64 = 500.0;

/// Where the chaser will appear when it next materialises
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EntryPlan {
    /// Just behind the spawn point of this edge
    Edge(EntryDir),
    /// A chosen cell (first activation, respawn after a kill)
    At(Vec2),
}

/// Coarse state, derived from the timers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChaserPhase {
    Inactive,
    Dead,
    /// Waiting to materialise
    Entering,
    Stunned,
    Grace,
    Hunting,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chaser {
    pub active: bool,
    pub chunk: ChunkCoord,
    pub pos: Vec2,
    pub present: bool,
    pub entry: EntryPlan,
    pub entry_until_ms: f64,
    /// Delay applied to the next scheduled entry
    pub next_entry_delay_ms: f64,
    /// Warning countdown before a respawn after a kill
    pub respawn_timer_ms: f64,
    pub path: Vec<TilePos>,
    pub path_index: usize,
    pub path_target: Option<TilePos>,
    pub last_repath_ms: f64,
    pub speed_mult: f32,
    pub grace_until_ms: f64,
    pub stun_until_ms: f64,
    pub slow_until_ms: f64,
    pub hp: f32,
    pub max_hp: f32,
    /// Killed; stays down until the player changes chunk
    pub dead: bool,
    pub last_shot_ms: f64,
    /// Locked out until this time after a boss defeat
    pub cooldown_until_ms: f64,
    pub caught_count: u32,
}

impl Chaser {
    pub fn new(chunk: ChunkCoord, tuning: &Tuning) -> Self {
        Self {
            active: false,
            chunk,
            pos: EntryDir::North.spawn_pos(),
            present: false,
            entry: EntryPlan::Edge(EntryDir::South),
            entry_until_ms: 0.0,
            next_entry_delay_ms: tuning.chaser_entry_delay_ms,
            respawn_timer_ms: 0.0,
            path: Vec::new(),
            path_index: 0,
            path_target: None,
            last_repath_ms: 0.0,
            speed_mult: 1.0,
            grace_until_ms: 0.0,
            stun_until_ms: 0.0,
            slow_until_ms: 0.0,
            hp: CHASER_HP,
            max_hp: CHASER_HP,
            dead: false,
            last_shot_ms: 0.0,
            cooldown_until_ms: 0.0,
            caught_count: 0,
        }
    }

    pub fn phase(&self, now_ms: f64) -> ChaserPhase {
        if !self.active {
            ChaserPhase::Inactive
        } else if self.dead {
            ChaserPhase::Dead
        } else if !self.present {
            ChaserPhase::Entering
        } else if now_ms < self.stun_until_ms {
            ChaserPhase::Stunned
        } else if now_ms < self.grace_until_ms {
            ChaserPhase::Grace
        } else {
            ChaserPhase::Hunting
        }
    }

    /// A chosen-cell entry is waiting; edge scheduling must not replace it
    fn fixed_entry_pending(&self) -> bool {
        !self.present && matches!(self.entry, EntryPlan::At(_))
    }

    fn clear_path(&mut self) {
        self.path.clear();
        self.path_index = 0;
        self.path_target = None;
    }
}

/// Spawn point of `dir` pushed back toward its edge
fn behind_entry(dir: EntryDir) -> Vec2 {
    let (ix, iy) = dir.inward();
    let p = dir.spawn_pos() - Vec2::new(ix as f32, iy as f32) * ENTRY_BACKSET;
    p.clamp(Vec2::splat(0.5), Vec2::splat(MAZE_SIZE as f32 - 0.5))
}

/// Chaser bookkeeping when the player arrives in a chunk
pub(crate) fn on_player_entered(state: &mut GameState) {
    if state.chaser.dead {
        schedule_respawn(state);
    }
    if state.current_chunk.y >= state.tuning.chaser_start_row {
        if state.chaser.active {
            schedule_entry(state);
        } else {
            activate(state);
        }
    }
}

/// First activation: appear on a random cell of the player's chunk
fn activate(state: &mut GameState) {
    let now = state.now_ms;
    let chunk = state.current_chunk;
    let fallback = state.entry_dir.opposite().spawn_pos();
    let pos = state
        .chunks
        .get(chunk)
        .and_then(|c| random_open_cell(&c.grid, &mut rng::chaser_start_rng(chunk)))
        .map_or(fallback, TilePos::center);

    let entry_until = now + state.tuning.chaser_entry_delay_ms;
    let c = &mut state.chaser;
    c.active = true;
    c.speed_mult = 1.0;
    c.chunk = chunk;
    c.entry = EntryPlan::At(pos);
    c.present = false;
    c.entry_until_ms = entry_until;
    c.grace_until_ms = c.grace_until_ms.max(entry_until);
    c.clear_path();

    log::info!("Chaser activated in chunk {chunk}");
    state.push_event(GameEvent::ChaserActivated { chunk });
}

/// Queue re-entry through the player's entry edge after the pending delay
pub(crate) fn schedule_entry(state: &mut GameState) {
    if state.chaser.fixed_entry_pending() {
        return;
    }
    let now = state.now_ms;
    let min = state.tuning.chaser_entry_delay_ms;
    let max = state.tuning.chaser_entry_delay_max_ms.max(min);
    let c = &mut state.chaser;
    let delay = c.next_entry_delay_ms.clamp(min, max);
    c.chunk = state.current_chunk;
    c.entry = EntryPlan::Edge(state.entry_dir);
    c.entry_until_ms = now + delay;
    c.present = false;
    c.grace_until_ms = c.grace_until_ms.max(c.entry_until_ms);
    c.next_entry_delay_ms = min;
    c.clear_path();
}

/// A killed chaser comes back on a random cell after a delay and a warning
fn schedule_respawn(state: &mut GameState) {
    let now = state.now_ms;
    let chunk = state.current_chunk;
    let fallback = state.entry_dir.opposite().spawn_pos();
    let pos = state
        .chunks
        .get(chunk)
        .and_then(|c| random_open_cell(&c.grid, &mut rng::chaser_respawn_rng(chunk, now)))
        .map_or(fallback, TilePos::center);

    let c = &mut state.chaser;
    c.dead = false;
    c.present = false;
    c.chunk = chunk;
    c.entry = EntryPlan::At(pos);
    c.entry_until_ms = now + state.tuning.chaser_respawn_delay_ms;
    c.respawn_timer_ms = state.tuning.chaser_respawn_warning_ms;
    c.clear_path();
}

fn materialize(state: &mut GameState) {
    let now = state.now_ms;
    let chunk = state.current_chunk;
    let pos = match state.chaser.entry {
        EntryPlan::At(p)
            if state
                .chunks
                .get(chunk)
                .is_some_and(|c| c.grid.is_open(TilePos::containing(p))) =>
        {
            p
        }
        EntryPlan::At(_) => behind_entry(state.entry_dir),
        EntryPlan::Edge(dir) => behind_entry(dir),
    };

    let c = &mut state.chaser;
    c.chunk = chunk;
    c.pos = pos;
    c.respawn_timer_ms = 0.0;
    c.hp = CHASER_HP;
    c.max_hp = CHASER_HP;
    c.entry = EntryPlan::Edge(state.entry_dir);
    c.present = true;
    c.grace_until_ms = c.grace_until_ms.max(now + state.tuning.chaser_spawn_grace_ms);
    c.clear_path();

    log::debug!("Chaser materialised at {pos} in chunk {chunk}");
    state.push_event(GameEvent::ChaserMaterialized { pos });
}

/// Re-entry delay for the chaser when the player leaves through `edge`:
/// longer the farther it has to walk to that exit
pub(crate) fn exit_delay_ms(state: &GameState, edge: EntryDir) -> f64 {
    let min = state.tuning.chaser_entry_delay_ms;
    let max = state.tuning.chaser_entry_delay_max_ms.max(min);
    let c = &state.chaser;
    if !c.present {
        return max;
    }
    let Some(chunk) = state.chunks.get(c.chunk) else {
        return max;
    };

    let from = find_nearest_open_cell(&chunk.grid, TilePos::containing(c.pos));
    let to = find_nearest_open_cell(&chunk.grid, edge.exit_tile());
    let steps = from
        .zip(to)
        .and_then(|(a, b)| bfs_distance(&chunk.grid, a, b));
    match steps {
        Some(d) => (min + (max - min) * (d as f64 / EXIT_DISTANCE_RAMP).min(1.0)).round(),
        None => max,
    }
}

/// Permanent speed-up for every chunk the player advances through
pub(crate) fn speed_up(state: &mut GameState) {
    if !state.chaser.active {
        return;
    }
    let max = state.tuning.chaser_max_speed_mult;
    let c = &mut state.chaser;
    c.speed_mult = (c.speed_mult + state.tuning.chaser_speedup_per_chunk).min(max);
}

/// Advance the chaser by `dt_ms`
pub fn update(state: &mut GameState, dt_ms: f64) {
    let now = state.now_ms;
    if !state.chaser.active || state.boss.active || now < state.chaser.cooldown_until_ms {
        return;
    }
    if state.chaser.dead {
        return;
    }

    // Waiting to enter: it materialises in the player's chunk
    if !state.chaser.present {
        if now >= state.chaser.entry_until_ms {
            if state.chaser.respawn_timer_ms > 0.0 {
                state.chaser.respawn_timer_ms -= dt_ms;
                if state.chaser.respawn_timer_ms <= 0.0 {
                    materialize(state);
                }
            } else {
                materialize(state);
            }
        }
        return;
    }
    if !state.chunks.contains(state.chaser.chunk) {
        return;
    }

    let same_chunk = state.chaser.chunk == state.current_chunk;
    let stunned = now < state.chaser.stun_until_ms;
    let reach = state.tuning.chaser_radius + state.tuning.player_radius;

    if same_chunk && !stunned {
        try_shoot(state);

        let dist = state.chaser.pos.distance(state.player.pos);
        if dist < reach * TOUCH_FACTOR && now >= state.chaser.grace_until_ms {
            state.apply_player_hit(HitSource::ChaserContact);
            state.chaser.grace_until_ms = now + state.tuning.chaser_contact_grace_ms;
            if state.mode == Mode::GameOver {
                return;
            }
        }
    }

    if stunned || now < state.chaser.grace_until_ms {
        return;
    }

    follow_path(state, dt_ms);

    if same_chunk && state.chaser.pos.distance_squared(state.player.pos) <= reach * reach {
        reset_after_caught(state);
    }
}

fn try_shoot(state: &mut GameState) {
    let now = state.now_ms;
    if state.floor() < state.tuning.chaser_shot_floor
        || now - state.chaser.last_shot_ms <= state.tuning.chaser_shot_interval_ms
    {
        return;
    }
    state.chaser.last_shot_ms = now;
    let from = state.chaser.pos;
    let target = state.player.pos;
    projectile::spawn_enemy_shot(state, from, target);
    state.push_event(GameEvent::ChaserShot { pos: from });
}

/// Walk the BFS path toward the player's tile, repathing when stale
fn follow_path(state: &mut GameState, dt_ms: f64) {
    let now = state.now_ms;
    let Some(chunk) = state.chunks.get(state.chaser.chunk) else {
        return;
    };
    let tuning = &state.tuning;
    let c = &mut state.chaser;

    let target = TilePos::containing(state.player.pos);
    let exhausted = c.path_index >= c.path.len();
    if c.path_target != Some(target) || now - c.last_repath_ms > tuning.chaser_repath_ms || exhausted {
        c.path = bfs_path(&chunk.grid, TilePos::containing(c.pos), target);
        c.path_index = usize::from(c.path.len() > 1);
        c.path_target = Some(target);
        c.last_repath_ms = now;
    }
    if c.path.len() <= 1 {
        return;
    }

    let slow = if now < c.slow_until_ms {
        tuning.gunpowder_slow_mult
    } else {
        1.0
    };
    let dt_s = (dt_ms.min(50.0) / 1000.0) as f32;
    let mut remaining = tuning.chaser_speed * c.speed_mult * slow * dt_s;

    while remaining > 0.0 && c.path_index < c.path.len() {
        let waypoint = c.path[c.path_index].center();
        let to = waypoint - c.pos;
        let dist = to.length();
        if dist < 1e-6 {
            c.path_index += 1;
            continue;
        }
        if remaining >= dist {
            c.pos = waypoint;
            remaining -= dist;
            c.path_index += 1;
        } else {
            c.pos += to / dist * remaining;
            remaining = 0.0;
        }
    }
}

/// Caught: cost a life (outside grace) and restart both from the entry edges
pub(crate) fn reset_after_caught(state: &mut GameState) {
    let now = state.now_ms;
    if now >= state.chaser.grace_until_ms {
        state.apply_player_hit(HitSource::Caught);
    }
    state.push_event(GameEvent::PlayerCaught);
    if state.player.lives == 0 {
        return;
    }

    let entry = state.entry_dir;
    state.place_player(entry);

    let c = &mut state.chaser;
    c.chunk = state.current_chunk;
    c.pos = entry.opposite().spawn_pos();
    c.clear_path();
    c.grace_until_ms = now + state.tuning.chaser_grace_ms;
    c.present = false;
    c.entry = EntryPlan::Edge(entry);
    c.entry_until_ms = now + state.tuning.chaser_entry_delay_ms;
    c.caught_count += 1;
}

/// A player missile reached the chaser
pub(crate) fn take_missile_hit(state: &mut GameState, enhanced: bool) {
    let now = state.now_ms;
    let damage = if enhanced {
        state.tuning.missile_damage * state.tuning.gunpowder_damage_mult
    } else {
        state.tuning.missile_damage
    };

    if state.abilities.kill_missile_unlocked {
        state.chaser.hp -= damage;
        if state.chaser.hp <= 0.0 {
            let pos = state.chaser.pos;
            let c = &mut state.chaser;
            c.hp = 0.0;
            c.dead = true;
            c.present = false;
            c.clear_path();
            state.add_score(CHASER_KILL_SCORE);
            log::info!("Chaser killed at {pos}");
            state.push_event(GameEvent::ChaserKilled { pos });
            return;
        }
    }

    let stun = now + state.tuning.stun_ms + state.abilities.missile_stun_bonus_ms;
    let c = &mut state.chaser;
    c.stun_until_ms = c.stun_until_ms.max(stun);
    if enhanced {
        c.slow_until_ms = c.slow_until_ms.max(now + state.tuning.gunpowder_slow_ms);
    }
    let until_ms = c.stun_until_ms;
    state.push_event(GameEvent::ChaserStunned { until_ms });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FLOOR;
    use crate::sim::grid::Grid;

    /// Run started on an open chunk past the activation row, chaser hunting
    fn open_state() -> GameState {
        let tuning = Tuning {
            start_chunk: ChunkCoord::new(2, 3),
            ..Default::default()
        };
        let mut s = GameState::new(11, tuning);
        let coord = s.current_chunk;
        s.chunk_mut(coord).grid = Grid::filled(FLOOR);
        let c = &mut s.chaser;
        c.present = true;
        c.chunk = coord;
        c.entry = EntryPlan::Edge(EntryDir::South);
        c.entry_until_ms = 0.0;
        c.grace_until_ms = 0.0;
        s
    }

    #[test]
    fn test_activates_on_random_open_cell() {
        let tuning = Tuning {
            start_chunk: ChunkCoord::new(1, 2),
            ..Default::default()
        };
        let mut s = GameState::new(3, tuning);
        assert!(s.chaser.active);
        assert!(!s.chaser.present);
        let EntryPlan::At(pos) = s.chaser.entry else {
            panic!("expected a fixed entry");
        };
        let tile = TilePos::containing(pos);
        assert!(s.current().unwrap().grid.is_open(tile));
        assert!(!tile.in_border(2));

        s.now_ms = 999.0;
        update(&mut s, 16.0);
        assert!(!s.chaser.present);
        s.now_ms = 1000.0;
        update(&mut s, 16.0);
        assert!(s.chaser.present);
        assert_eq!(s.chaser.pos, pos);
    }

    #[test]
    fn test_stays_dormant_below_start_row() {
        let s = GameState::new(3, Tuning::default());
        assert_eq!(s.chaser.phase(0.0), ChaserPhase::Inactive);
    }

    #[test]
    fn test_walks_toward_player() {
        let mut s = open_state();
        s.player.pos = Vec2::new(12.5, 8.5);
        s.chaser.pos = Vec2::new(3.5, 8.5);
        for _ in 0..100 {
            s.now_ms += 16.0;
            update(&mut s, 16.0);
        }
        // 2 cells/s for 1.6 s
        assert!((s.chaser.pos.x - 6.7).abs() < 1e-3, "x = {}", s.chaser.pos.x);
        assert!((s.chaser.pos.y - 8.5).abs() < 1e-5);
    }

    #[test]
    fn test_stun_freezes_movement() {
        let mut s = open_state();
        s.player.pos = Vec2::new(12.5, 8.5);
        s.chaser.pos = Vec2::new(3.5, 8.5);
        take_missile_hit(&mut s, false);
        assert_eq!(s.chaser.stun_until_ms, 1200.0);
        assert_eq!(s.chaser.phase(s.now_ms), ChaserPhase::Stunned);
        s.now_ms = 500.0;
        update(&mut s, 16.0);
        assert_eq!(s.chaser.pos, Vec2::new(3.5, 8.5));
    }

    #[test]
    fn test_caught_once_per_grace_window() {
        let mut s = open_state();
        let player = Vec2::new(8.5, 8.5);
        let near = Vec2::new(8.5, 9.2);
        s.player.pos = player;
        s.chaser.pos = near;

        update(&mut s, 16.0);
        assert_eq!(s.chaser.caught_count, 1);
        assert_eq!(s.player.lives, 2);
        assert_eq!(s.player.pos, EntryDir::South.spawn_pos());

        // force it back next to the player inside the grace window
        for _ in 0..40 {
            s.now_ms += 16.0;
            s.chaser.present = true;
            s.player.pos = player;
            s.chaser.pos = near;
            update(&mut s, 16.0);
        }
        assert_eq!(s.chaser.caught_count, 1);
        assert_eq!(s.player.lives, 2);

        s.now_ms = 700.0;
        s.chaser.present = true;
        s.player.pos = player;
        s.chaser.pos = near;
        update(&mut s, 16.0);
        assert_eq!(s.chaser.caught_count, 2);
        // still invincible from the first catch
        assert_eq!(s.player.lives, 2);
    }

    #[test]
    fn test_scheduled_entry_uses_computed_delay() {
        let mut s = open_state();
        s.entry_dir = EntryDir::South;
        s.chaser.next_entry_delay_ms = 3000.0;
        schedule_entry(&mut s);
        assert_eq!(s.chaser.entry_until_ms, 3000.0);
        assert_eq!(s.chaser.next_entry_delay_ms, 1000.0);

        s.now_ms = 3000.0;
        update(&mut s, 16.0);
        assert!(s.chaser.present);
        assert!(s.chaser.pos.distance(Vec2::new(8.5, 15.85)) < 1e-5);
        assert!(s.chaser.grace_until_ms >= 3250.0);
    }

    #[test]
    fn test_entry_delay_is_clamped() {
        let mut s = open_state();
        s.chaser.next_entry_delay_ms = 60_000.0;
        schedule_entry(&mut s);
        assert_eq!(s.chaser.entry_until_ms, 5000.0);
    }

    #[test]
    fn test_exit_delay_scales_with_distance() {
        let mut s = open_state();
        s.chaser.pos = EntryDir::North.spawn_pos();
        assert_eq!(exit_delay_ms(&s, EntryDir::North), 1200.0);
        // 15 rows away from the south exit
        assert_eq!(exit_delay_ms(&s, EntryDir::South), 4000.0);
        s.chaser.present = false;
        assert_eq!(exit_delay_ms(&s, EntryDir::North), 5000.0);
    }

    #[test]
    fn test_kill_missile_kills_after_enough_damage() {
        let mut s = open_state();
        s.abilities.kill_missile_unlocked = true;
        for _ in 0..4 {
            take_missile_hit(&mut s, false);
            assert!(!s.chaser.dead);
        }
        take_missile_hit(&mut s, false);
        assert!(s.chaser.dead);
        assert!(!s.chaser.present);
        assert_eq!(s.score, 500.0);
        assert!(s.drain_events().iter().any(|e| matches!(e, GameEvent::ChaserKilled { .. })));
    }

    #[test]
    fn test_enhanced_hit_slows() {
        let mut s = open_state();
        take_missile_hit(&mut s, true);
        assert_eq!(s.chaser.slow_until_ms, 10_000.0);
    }

    #[test]
    fn test_dead_chaser_respawns_on_next_chunk() {
        let mut s = open_state();
        s.chaser.dead = true;
        s.chaser.present = false;
        on_player_entered(&mut s);
        assert!(!s.chaser.dead);
        assert!(matches!(s.chaser.entry, EntryPlan::At(_)));
        assert_eq!(s.chaser.entry_until_ms, 2000.0);

        s.now_ms = 2000.0;
        update(&mut s, 1000.0);
        assert!(!s.chaser.present);
        s.now_ms = 3000.0;
        update(&mut s, 1000.0);
        update(&mut s, 1000.0);
        assert!(s.chaser.present);
    }

    #[test]
    fn test_suspended_while_boss_active() {
        let mut s = open_state();
        s.boss.active = true;
        s.player.pos = Vec2::new(12.5, 8.5);
        s.chaser.pos = Vec2::new(3.5, 8.5);
        s.now_ms = 100.0;
        update(&mut s, 16.0);
        assert_eq!(s.chaser.pos, Vec2::new(3.5, 8.5));
    }
}
