//! Player movement
//!
//! Steering is a direction plus an intensity in 0..=1. Speed follows a curve of
//! the intensity so small offsets give fine control. Motion is split into short
//! substeps so a long frame never tunnels through a wall corner.

use std::collections::BTreeSet;

use glam::Vec2;

use super::collision::{rub_contacts, slide};
use super::grid::TilePos;
use super::pickups;
use super::state::GameState;
use super::walls;

/// Longest single substep, in cells
const MAX_SUBSTEP: f32 = 0.25;
/// Exponent of the intensity-to-speed curve
const INTENSITY_CURVE: f32 = 2.2;
/// Below this intensity pushing against a wall does not wear it
const RUB_MIN_INTENSITY: f32 = 0.06;

/// Rub time credited for one frame of pushing at `intensity`
pub fn rub_ms(dt_ms: f64, intensity: f32) -> f64 {
    dt_ms.min(80.0) * (0.2 + 1.8 * f64::from(intensity))
}

/// Move the player and wear down the walls it pushes against
pub fn move_player(state: &mut GameState, steer: Vec2, intensity: f32, dt_ms: f64) {
    let dir = steer.normalize_or_zero();
    let intensity = intensity.clamp(0.0, 1.0);
    if dir == Vec2::ZERO || intensity <= 0.0 {
        return;
    }

    let coord = state.current_chunk;
    let Some(chunk) = state.chunks.get(coord) else {
        return;
    };
    let grid = &chunk.grid;
    let radius = state.tuning.player_radius;
    let margin = state.tuning.wall_unbreakable_margin;

    let dt_s = (dt_ms.min(50.0) / 1000.0) as f32;
    let speed = state.tuning.move_speed * state.abilities.move_speed_mult * intensity.powf(INTENSITY_CURVE);
    let travel = dir * speed * dt_s;
    let steps = ((travel.length() / MAX_SUBSTEP).ceil() as usize).max(1);
    let step = travel / steps as f32;

    let rubbing = intensity > RUB_MIN_INTENSITY;
    let mut touched = BTreeSet::new();
    let mut pos = state.player.pos;
    for _ in 0..steps {
        let from = pos;
        let result = slide(grid, pos, step, radius);
        pos = result.pos;
        if rubbing {
            for attempted in [result.blocked_x, result.blocked_y].into_iter().flatten() {
                touched.extend(rub_contacts(grid, from, attempted, radius, margin));
            }
        }
    }
    state.player.pos = pos;

    if touched.is_empty() {
        return;
    }
    rub_tiles(state, touched, rub_ms(dt_ms, intensity));
}

fn rub_tiles(state: &mut GameState, tiles: BTreeSet<TilePos>, add_ms: f64) {
    let coord = state.current_chunk;
    let now = state.now_ms;
    let Some(chunk) = state.chunks.get_mut(coord) else {
        return;
    };
    let breaks: Vec<_> = tiles
        .into_iter()
        .filter_map(|tile| walls::rub_wall(chunk, tile, add_ms, now, &state.tuning, &state.abilities))
        .collect();

    for brk in breaks {
        log::debug!("Wall at {} broken by rubbing", brk.tile);
        pickups::apply_wall_break(state, coord, brk);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::grid::ChunkCoord;
    use crate::sim::test_support::open_run;

    fn run_with_wall() -> GameState {
        let mut s = open_run(ChunkCoord::new(2, 1));
        let coord = s.current_chunk;
        for y in 2..15 {
            s.chunk_mut(coord).grid.set(TilePos::new(10, y), 1);
        }
        s.player.pos = Vec2::new(9.5, 8.5);
        s
    }

    #[test]
    fn test_full_intensity_speed() {
        let mut s = open_run(ChunkCoord::new(2, 1));
        s.player.pos = Vec2::new(4.5, 8.5);
        move_player(&mut s, Vec2::X, 1.0, 16.0);
        assert!((s.player.pos.x - 4.692).abs() < 1e-4);
    }

    #[test]
    fn test_intensity_curve_slows_small_inputs() {
        let mut s = open_run(ChunkCoord::new(2, 1));
        s.player.pos = Vec2::new(4.5, 8.5);
        move_player(&mut s, Vec2::X, 0.5, 16.0);
        let expected = 12.0 * 0.5f32.powf(2.2) * 0.016;
        assert!((s.player.pos.x - 4.5 - expected).abs() < 1e-5);
    }

    #[test]
    fn test_long_frame_is_substepped_and_clamped() {
        let mut s = run_with_wall();
        s.player.pos = Vec2::new(4.5, 8.5);
        // 50 ms cap: 0.6 cells, never through the wall
        move_player(&mut s, Vec2::X, 1.0, 500.0);
        assert!((s.player.pos.x - 5.1).abs() < 1e-4);
    }

    #[test]
    fn test_wall_blocks_and_slides() {
        let mut s = run_with_wall();
        for _ in 0..20 {
            move_player(&mut s, Vec2::new(1.0, 1.0), 1.0, 16.0);
        }
        assert!(s.player.pos.x <= 9.7 + 1e-5);
        assert!(s.player.pos.y > 9.5);
    }

    #[test]
    fn test_no_rub_without_unlock() {
        let mut s = run_with_wall();
        for _ in 0..10 {
            move_player(&mut s, Vec2::X, 1.0, 16.0);
        }
        assert!(s.current().unwrap().wall_heat.is_empty());
    }

    #[test]
    fn test_pushing_wears_wall_down() {
        let mut s = run_with_wall();
        s.abilities.wall_break_unlocked = true;
        let wall = TilePos::new(10, 8);
        move_player(&mut s, Vec2::X, 1.0, 16.0);
        move_player(&mut s, Vec2::X, 1.0, 16.0);
        assert_eq!(s.current().unwrap().wall_heat[&wall].heat_ms, 32.0);

        // 32 ms of rub per frame against a 5000 ms wall
        for _ in 0..160 {
            s.now_ms += 16.0;
            move_player(&mut s, Vec2::X, 1.0, 16.0);
        }
        assert!(s.current().unwrap().grid.is_open(wall));
        assert_eq!(s.score, 10.0);
    }

    #[test]
    fn test_feather_touch_does_not_rub() {
        let mut s = run_with_wall();
        s.abilities.wall_break_unlocked = true;
        s.player.pos = Vec2::new(9.7, 8.5);
        move_player(&mut s, Vec2::X, 0.05, 16.0);
        assert!(s.current().unwrap().wall_heat.is_empty());
    }
}
