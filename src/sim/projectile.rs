//! Player missiles and enemy projectiles
//!
//! Missiles home on one target per tick: the boss while it is fighting,
//! otherwise whichever of the chaser and the enemy projectiles (with the
//! intercept upgrade) is nearest the player. With nothing to chase they fly
//! straight.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::boss;
use super::chaser;
use super::grid::{ChunkCoord, TilePos};
use super::pickups;
use super::state::{GameEvent, GameState, HitSource, Mode};
use super::walls::{self, is_breakable_value};
use crate::consts::{BOSS_CENTER, BOSS_HIT_RADIUS, MAZE_SIZE};

/// Hit radius against an enemy projectile
const INTERCEPT_RADIUS: f32 = 0.28;
/// Added to the chaser's radius for missile hits
const CHASER_HIT_PAD: f32 = 0.18;
/// Added to the player's radius for enemy projectile hits
const PLAYER_HIT_PAD: f32 = 0.1;
/// Projectiles are discarded this far outside the grid
const OUT_OF_BOUNDS_PAD: f32 = 2.0;

/// What a missile is steering toward this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissileTarget {
    Boss,
    Projectile(u32),
    Chaser,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Missile {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Gunpowder shot: extra damage and a slow
    pub enhanced: bool,
    pub target: MissileTarget,
    /// Last wall tile rolled for the wall-break upgrade
    #[serde(skip)]
    pub last_wall_tile: Option<TilePos>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyProjectile {
    pub id: u32,
    pub chunk: ChunkCoord,
    pub pos: Vec2,
    pub vel: Vec2,
}

fn in_flight_bounds(pos: Vec2) -> bool {
    let lo = -OUT_OF_BOUNDS_PAD;
    let hi = MAZE_SIZE as f32 + OUT_OF_BOUNDS_PAD;
    (lo..=hi).contains(&pos.x) && (lo..=hi).contains(&pos.y)
}

/// Spend one missile item on a volley of `missile_count` staggered shots.
///
/// Returns false when nothing was fired.
pub fn fire(state: &mut GameState) -> bool {
    if state.mode != Mode::Playing || state.inventory.missiles == 0 || !state.chaser.active {
        return false;
    }
    state.inventory.missiles -= 1;
    let now = state.now_ms;
    let stagger = state.tuning.missile_stagger_ms;
    let count = state.abilities.missile_count.max(1);
    state
        .pending_shots
        .extend((0..count).map(|i| now + f64::from(i) * stagger));
    true
}

/// Launch queued shots whose time has come
pub fn process_pending_shots(state: &mut GameState) {
    let now = state.now_ms;
    let due = state.pending_shots.iter().filter(|&&t| t <= now).count();
    state.pending_shots.retain(|&t| t > now);
    for _ in 0..due {
        launch_missile(state);
    }
}

fn launch_missile(state: &mut GameState) {
    let enhanced = state.inventory.gunpowder > 0;
    if enhanced {
        state.inventory.gunpowder -= 1;
    }
    let pos = state.player.pos;
    let (target, aim) = resolve_target(state);
    let dir = aim
        .map(|a| (a - pos).normalize_or_zero())
        .filter(|d| *d != Vec2::ZERO)
        .unwrap_or(Vec2::NEG_Y);

    let id = state.next_entity_id();
    state.missiles.push(Missile {
        id,
        pos,
        vel: dir * state.tuning.missile_speed,
        enhanced,
        target,
        last_wall_tile: None,
    });
    state.push_event(GameEvent::MissileFired { pos, enhanced });
}

/// Current target and its position
fn resolve_target(state: &GameState) -> (MissileTarget, Option<Vec2>) {
    if state.boss.active {
        return (MissileTarget::Boss, Some(BOSS_CENTER));
    }
    let player = state.player.pos;
    let c = &state.chaser;
    let chaser = (c.active && c.present && !c.dead && c.chunk == state.current_chunk)
        .then_some((MissileTarget::Chaser, c.pos));

    let shots = state
        .enemy_projectiles
        .iter()
        .filter(|p| state.abilities.intercept_missile_unlocked && p.chunk == state.current_chunk)
        .map(|p| (MissileTarget::Projectile(p.id), p.pos));

    // Nearest to the player wins; the chaser wins ties
    chaser
        .into_iter()
        .chain(shots)
        .min_by(|a, b| {
            a.1.distance_squared(player)
                .total_cmp(&b.1.distance_squared(player))
        })
        .map_or((MissileTarget::None, None), |(target, pos)| (target, Some(pos)))
}

/// Steer, move and resolve hits for every missile
pub fn update_missiles(state: &mut GameState, dt_ms: f64) {
    let dt_s = (dt_ms.min(50.0) / 1000.0) as f32;
    let mut missiles = std::mem::take(&mut state.missiles);
    missiles.retain_mut(|m| step_missile(state, m, dt_s));
    missiles.append(&mut state.missiles);
    state.missiles = missiles;
}

/// Returns false once the missile is spent
fn step_missile(state: &mut GameState, m: &mut Missile, dt_s: f32) -> bool {
    let speed = state.tuning.missile_speed;
    let (target, aim) = resolve_target(state);
    m.target = target;

    if let Some(aim) = aim {
        let desired = (aim - m.pos).normalize_or_zero() * speed;
        let blend = 1.0 - (-state.tuning.missile_turn_rate * dt_s).exp();
        let steered = m.vel.lerp(desired, blend);
        if steered != Vec2::ZERO {
            m.vel = steered.normalize() * speed;
        }
    }
    m.pos += m.vel * dt_s;

    if state.abilities.missile_wall_break_unlocked {
        crack_wall(state, m);
    }

    match target {
        MissileTarget::Boss if m.pos.distance(BOSS_CENTER) < BOSS_HIT_RADIUS => {
            let damage = missile_damage(state, m.enhanced);
            boss::take_damage(state, damage);
            return false;
        }
        MissileTarget::Projectile(id) => {
            let hit = state
                .enemy_projectiles
                .iter()
                .position(|p| p.id == id && p.pos.distance(m.pos) < INTERCEPT_RADIUS);
            if let Some(i) = hit {
                let p = state.enemy_projectiles.remove(i);
                intercept_blast(state, p.pos);
                return false;
            }
        }
        MissileTarget::Chaser => {
            let reach = state.tuning.chaser_radius + CHASER_HIT_PAD;
            if m.pos.distance(state.chaser.pos) < reach {
                chaser::take_missile_hit(state, m.enhanced);
                return false;
            }
        }
        _ => {}
    }

    in_flight_bounds(m.pos)
}

fn missile_damage(state: &GameState, enhanced: bool) -> f32 {
    if enhanced {
        state.tuning.missile_damage * state.tuning.gunpowder_damage_mult
    } else {
        state.tuning.missile_damage
    }
}

/// Wall-break upgrade: one roll per wall tile the missile enters
fn crack_wall(state: &mut GameState, m: &mut Missile) {
    let tile = TilePos::containing(m.pos);
    if m.last_wall_tile == Some(tile) {
        return;
    }
    let coord = state.current_chunk;
    let breakable = state
        .chunks
        .get(coord)
        .and_then(|c| c.grid.get(tile))
        .is_some_and(is_breakable_value);
    if !breakable {
        return;
    }
    m.last_wall_tile = Some(tile);
    if !state.rng.random_bool(state.abilities.missile_wall_break_prob.clamp(0.0, 1.0)) {
        return;
    }
    let now = state.now_ms;
    let Some(chunk) = state.chunks.get_mut(coord) else {
        return;
    };
    if let Some(brk) = walls::break_wall(chunk, tile, now, &state.tuning, &state.abilities) {
        pickups::apply_wall_break(state, coord, brk);
    }
}

/// Intercepting a shot blows open the 3x3 block around it
fn intercept_blast(state: &mut GameState, pos: Vec2) {
    state.push_event(GameEvent::ProjectileIntercepted { pos });
    let coord = state.current_chunk;
    let now = state.now_ms;
    let center = TilePos::containing(pos);
    for dy in -1..=1 {
        for dx in -1..=1 {
            let Some(chunk) = state.chunks.get_mut(coord) else {
                return;
            };
            let tile = center.offset(dx, dy);
            if let Some(brk) = walls::break_wall(chunk, tile, now, &state.tuning, &state.abilities) {
                pickups::apply_wall_break(state, coord, brk);
            }
        }
    }
}

/// Straight shot at half missile speed from `from` toward `target`
pub(crate) fn spawn_enemy_shot(state: &mut GameState, from: Vec2, target: Vec2) {
    let dir = (target - from).normalize_or_zero();
    if dir == Vec2::ZERO {
        return;
    }
    let id = state.next_entity_id();
    let vel = dir * state.tuning.missile_speed * 0.5;
    state.enemy_projectiles.push(EnemyProjectile {
        id,
        chunk: state.chaser.chunk,
        pos: from,
        vel,
    });
}

/// Move enemy shots; a shot reaching the player in its chunk hurts
pub fn update_enemy_projectiles(state: &mut GameState, dt_ms: f64) {
    let dt_s = (dt_ms.min(80.0) / 1000.0) as f32;
    let current = state.current_chunk;
    let player = state.player.pos;
    let reach = state.tuning.player_radius + PLAYER_HIT_PAD;
    let chunks = &state.chunks;
    let mut hit = false;

    state.enemy_projectiles.retain_mut(|p| {
        if !chunks.contains(p.chunk) {
            return false;
        }
        p.pos += p.vel * dt_s;
        if p.chunk == current && p.pos.distance(player) < reach {
            hit = true;
            return false;
        }
        in_flight_bounds(p.pos)
    });

    if hit {
        state.apply_player_hit(HitSource::Projectile);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::test_support::{hunting_chaser, open_run};

    fn run() -> GameState {
        let mut s = open_run(ChunkCoord::new(2, 3));
        s.player.pos = Vec2::new(2.5, 8.5);
        hunting_chaser(&mut s, Vec2::new(14.5, 8.5));
        s
    }

    #[test]
    fn test_fire_needs_missiles_and_active_chaser() {
        let mut s = run();
        assert!(!fire(&mut s));
        s.inventory.missiles = 1;
        s.chaser.active = false;
        assert!(!fire(&mut s));
        s.chaser.active = true;
        assert!(fire(&mut s));
        assert_eq!(s.inventory.missiles, 0);
        assert_eq!(s.pending_shots, vec![0.0]);
    }

    #[test]
    fn test_volley_is_staggered_and_spends_gunpowder() {
        let mut s = run();
        s.inventory.missiles = 1;
        s.inventory.gunpowder = 1;
        s.abilities.missile_count = 3;
        fire(&mut s);
        assert_eq!(s.pending_shots, vec![0.0, 200.0, 400.0]);

        process_pending_shots(&mut s);
        assert_eq!(s.missiles.len(), 1);
        assert!(s.missiles[0].enhanced);
        s.now_ms = 450.0;
        process_pending_shots(&mut s);
        assert_eq!(s.missiles.len(), 3);
        assert!(!s.missiles[1].enhanced);
        assert!(s.pending_shots.is_empty());
    }

    #[test]
    fn test_homing_converges_without_exceeding_speed() {
        let mut s = run();
        s.chaser.stun_until_ms = f64::MAX;
        s.missiles.push(Missile {
            id: 99,
            pos: s.player.pos,
            vel: Vec2::new(0.0, -9.0),
            enhanced: false,
            target: MissileTarget::None,
            last_wall_tile: None,
        });

        let mut ticks = 0;
        while !s.missiles.is_empty() {
            update_missiles(&mut s, 16.0);
            for m in &s.missiles {
                assert!(m.vel.length() <= 9.0 + 1e-3);
            }
            ticks += 1;
            assert!(ticks < 200, "missile never arrived");
        }
        assert!(s.drain_events().iter().any(|e| matches!(e, GameEvent::ChaserStunned { .. })));
    }

    #[test]
    fn test_missile_without_target_flies_straight_and_leaves() {
        let mut s = run();
        s.chaser.present = false;
        s.missiles.push(Missile {
            id: 1,
            pos: Vec2::new(8.5, 8.5),
            vel: Vec2::new(9.0, 0.0),
            enhanced: false,
            target: MissileTarget::None,
            last_wall_tile: None,
        });
        update_missiles(&mut s, 16.0);
        assert_eq!(s.missiles[0].vel, Vec2::new(9.0, 0.0));
        for _ in 0..100 {
            update_missiles(&mut s, 16.0);
        }
        assert!(s.missiles.is_empty());
    }

    #[test]
    fn test_intercept_removes_shot_and_blasts_walls() {
        let mut s = run();
        s.abilities.intercept_missile_unlocked = true;
        let coord = s.current_chunk;
        s.chunk_mut(coord).grid.set(TilePos::new(11, 8), 1);
        s.chunk_mut(coord).grid.set(TilePos::new(10, 9), 1);
        s.enemy_projectiles.push(EnemyProjectile {
            id: 500,
            chunk: coord,
            pos: Vec2::new(10.5, 8.5),
            vel: Vec2::ZERO,
        });
        s.missiles.push(Missile {
            id: 1,
            pos: Vec2::new(9.5, 8.5),
            vel: Vec2::new(9.0, 0.0),
            enhanced: false,
            target: MissileTarget::None,
            last_wall_tile: None,
        });
        for _ in 0..20 {
            update_missiles(&mut s, 16.0);
        }
        assert!(s.enemy_projectiles.is_empty());
        let chunk = s.current().unwrap();
        assert!(chunk.grid.is_open(TilePos::new(11, 8)));
        assert!(chunk.grid.is_open(TilePos::new(10, 9)));
        assert_eq!(chunk.broken_walls.len(), 2);
        assert_eq!(s.score, 20.0);
    }

    #[test]
    fn test_intercept_prefers_whichever_is_nearer() {
        let mut s = run();
        s.abilities.intercept_missile_unlocked = true;
        s.chaser.stun_until_ms = f64::MAX;
        s.chaser.pos = Vec2::new(3.5, 8.5);
        let coord = s.current_chunk;
        s.enemy_projectiles.push(EnemyProjectile {
            id: 77,
            chunk: coord,
            pos: Vec2::new(12.5, 8.5),
            vel: Vec2::ZERO,
        });
        s.missiles.push(Missile {
            id: 1,
            pos: s.player.pos,
            vel: Vec2::new(0.0, -9.0),
            enhanced: false,
            target: MissileTarget::None,
            last_wall_tile: None,
        });

        update_missiles(&mut s, 16.0);
        assert_eq!(s.missiles[0].target, MissileTarget::Chaser);

        // Move the chaser out of the way: the shot is now closer
        s.chaser.pos = Vec2::new(2.5, 1.5);
        s.enemy_projectiles[0].pos = Vec2::new(2.5, 12.5);
        update_missiles(&mut s, 16.0);
        assert_eq!(s.missiles[0].target, MissileTarget::Projectile(77));
    }

    #[test]
    fn test_boss_outranks_nearer_targets() {
        let mut s = run();
        s.abilities.intercept_missile_unlocked = true;
        s.boss.active = true;
        s.chaser.pos = Vec2::new(3.0, 8.5);
        assert_eq!(resolve_target(&s), (MissileTarget::Boss, Some(BOSS_CENTER)));
    }

    #[test]
    fn test_wall_break_upgrade_opens_crossed_wall() {
        let mut s = run();
        s.chaser.present = false;
        s.abilities.missile_wall_break_unlocked = true;
        s.abilities.missile_wall_break_prob = 1.0;
        let coord = s.current_chunk;
        s.chunk_mut(coord).grid.set(TilePos::new(6, 8), 3);
        s.missiles.push(Missile {
            id: 1,
            pos: Vec2::new(4.5, 8.5),
            vel: Vec2::new(9.0, 0.0),
            enhanced: false,
            target: MissileTarget::None,
            last_wall_tile: None,
        });
        for _ in 0..20 {
            update_missiles(&mut s, 16.0);
        }
        let chunk = s.current().unwrap();
        assert!(chunk.grid.is_open(TilePos::new(6, 8)));
        assert!(chunk.broken_walls.contains_key(&TilePos::new(6, 8)));
    }

    #[test]
    fn test_enemy_shot_hits_player_once() {
        let mut s = run();
        let coord = s.current_chunk;
        for id in 0..2 {
            s.enemy_projectiles.push(EnemyProjectile {
                id,
                chunk: coord,
                pos: s.player.pos,
                vel: Vec2::ZERO,
            });
        }
        update_enemy_projectiles(&mut s, 16.0);
        assert!(s.enemy_projectiles.is_empty());
        assert_eq!(s.player.lives, 2);
    }

    #[test]
    fn test_shots_from_missing_chunks_are_dropped() {
        let mut s = run();
        s.enemy_projectiles.push(EnemyProjectile {
            id: 1,
            chunk: ChunkCoord::new(0, 400),
            pos: Vec2::new(8.5, 8.5),
            vel: Vec2::ZERO,
        });
        update_enemy_projectiles(&mut s, 16.0);
        assert!(s.enemy_projectiles.is_empty());
    }

    #[test]
    fn test_enemy_shot_travels_at_half_missile_speed() {
        let mut s = run();
        spawn_enemy_shot(&mut s, Vec2::new(8.5, 8.5), Vec2::new(8.5, 2.5));
        assert_eq!(s.enemy_projectiles[0].vel, Vec2::new(0.0, -4.5));
    }
}
