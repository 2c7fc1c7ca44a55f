//! Per-frame simulation step
//!
//! Advances every subsystem by the same clamped `dt` in a fixed order:
//! movement, exits, wall heat, chaser, boss, wall regen, projectiles.

use glam::Vec2;

use super::boss;
use super::chaser;
use super::grid::ChunkCoord;
use super::movement;
use super::pickups;
use super::projectile;
use super::state::{GameEvent, GameState, Mode};
use super::travel;
use super::walls::{self, Clearance};
use crate::consts::BOSS_CENTER;

/// Keep-out half extents for wall regrowth
const PLAYER_CLEARANCE: f32 = 1.5;
const CHASER_CLEARANCE: f32 = 1.5;
const BOSS_CLEARANCE: f32 = 2.5;
/// Score decay only counts this much of a long frame
const DECAY_FRAME_CAP_MS: f64 = 80.0;

/// Input commands for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Desired direction; only its angle matters
    pub steer: Vec2,
    /// Steering strength in 0..=1
    pub intensity: f32,
    /// Fire a missile volley
    pub fire: bool,
    /// Pause toggle
    pub pause: bool,
}

/// Advance the game state by `dt_ms` of wall-clock time
pub fn tick(state: &mut GameState, input: &TickInput, dt_ms: f64) {
    if input.pause {
        let paused = state.mode == Mode::Paused;
        state.set_paused(!paused);
    }

    match state.mode {
        Mode::Paused | Mode::GameOver | Mode::AwaitingReward => return,
        Mode::Playing | Mode::Transition => {}
    }

    let dt = if dt_ms.is_finite() {
        dt_ms.clamp(0.0, state.tuning.max_frame_ms)
    } else {
        0.0
    };
    state.now_ms += dt;
    state.abilities = state.abilities.clamped();

    if state.mode == Mode::Transition {
        travel::update_transition(state);
    } else {
        play(state, input, dt);
    }
    state.ensure_chunks();
}

/// One frame of live play. Stops early once the mode leaves `Playing`.
fn play(state: &mut GameState, input: &TickInput, dt: f64) {
    if input.fire {
        projectile::fire(state);
    }

    state.sub_score(dt.min(DECAY_FRAME_CAP_MS) / 1000.0);

    movement::move_player(state, input.steer, input.intensity, dt);
    if let Some((dx, dy)) = travel::check_exit(state) {
        travel::exit_chunk(state, dx, dy);
        if state.mode != Mode::Playing {
            return;
        }
    }

    let now = state.now_ms;
    if let Some(chunk) = state.chunks.get_mut(state.current_chunk) {
        walls::decay_heat(chunk, dt, now, &state.tuning);
    }

    chaser::update(state, dt);
    if state.mode != Mode::Playing {
        return;
    }
    boss::update(state);
    if state.mode != Mode::Playing {
        return;
    }

    regen_walls(state);

    projectile::process_pending_shots(state);
    pickups::collect(state);
    projectile::update_missiles(state, dt);
    if state.mode != Mode::Playing {
        return;
    }
    projectile::update_enemy_projectiles(state, dt);
}

/// Regrow broken walls in every resident chunk
fn regen_walls(state: &mut GameState) {
    let now = state.now_ms;
    let due: Vec<ChunkCoord> = state
        .chunks
        .iter()
        .filter(|c| !c.broken_walls.is_empty())
        .map(|c| c.coord)
        .collect();

    for coord in due {
        let occupants = occupants_in(state, coord);
        let Some(chunk) = state.chunks.get_mut(coord) else {
            continue;
        };
        let closed = walls::regen_walls(chunk, now, &state.tuning, &occupants);
        for tile in closed {
            state.push_event(GameEvent::WallRegenerated { chunk: coord, tile });
        }
    }
}

fn occupants_in(state: &GameState, coord: ChunkCoord) -> Vec<Clearance> {
    let mut out = Vec::new();
    if coord == state.current_chunk {
        out.push(Clearance {
            pos: state.player.pos,
            radius: PLAYER_CLEARANCE,
        });
    }
    let c = &state.chaser;
    if c.active && c.present && c.chunk == coord {
        out.push(Clearance {
            pos: c.pos,
            radius: CHASER_CLEARANCE,
        });
    }
    if state.boss.active && state.boss.chunk == Some(coord) {
        out.push(Clearance {
            pos: BOSS_CENTER,
            radius: BOSS_CLEARANCE,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::grid::TilePos;
    use crate::sim::state::HitSource;
    use crate::sim::test_support::{hunting_chaser, open_run};
    use proptest::prelude::*;

    const FRAME: f64 = 16.0;

    fn idle() -> TickInput {
        TickInput::default()
    }

    #[test]
    fn test_time_advances_with_clamped_dt() {
        let mut s = open_run(ChunkCoord::new(2, 1));
        tick(&mut s, &idle(), FRAME);
        assert_eq!(s.now_ms, 16.0);
        tick(&mut s, &idle(), 5000.0);
        assert_eq!(s.now_ms, 116.0);
        tick(&mut s, &idle(), f64::NAN);
        assert_eq!(s.now_ms, 116.0);
    }

    #[test]
    fn test_pause_freezes_time() {
        let mut s = open_run(ChunkCoord::new(2, 1));
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut s, &pause, FRAME);
        assert_eq!(s.mode, Mode::Paused);
        for _ in 0..10 {
            tick(&mut s, &idle(), FRAME);
        }
        assert_eq!(s.now_ms, 0.0);

        tick(&mut s, &pause, FRAME);
        assert_eq!(s.mode, Mode::Playing);
        assert_eq!(s.now_ms, 16.0);
    }

    #[test]
    fn test_contact_costs_two_lives_in_three_seconds() {
        let mut s = open_run(ChunkCoord::new(2, 3));
        let pos = Vec2::new(8.5, 8.5);
        s.player.pos = pos;
        hunting_chaser(&mut s, pos);
        s.drain_events();

        while s.now_ms < 3000.0 {
            s.player.pos = pos;
            s.chaser.pos = pos;
            tick(&mut s, &idle(), FRAME);
        }

        let hits = s
            .drain_events()
            .into_iter()
            .filter(|e| {
                matches!(
                    e,
                    GameEvent::PlayerHit {
                        source: HitSource::ChaserContact,
                        shielded: false
                    }
                )
            })
            .count();
        assert_eq!(hits, 2);
        assert_eq!(s.player.lives, 1);
        assert_eq!(s.mode, Mode::Playing);
    }

    #[test]
    fn test_walking_off_the_north_edge_changes_chunk() {
        let mut s = open_run(ChunkCoord::new(2, 1));
        s.player.pos = Vec2::new(8.5, 0.4);
        let north = TickInput {
            steer: Vec2::NEG_Y,
            intensity: 1.0,
            ..Default::default()
        };
        tick(&mut s, &north, FRAME);
        tick(&mut s, &north, FRAME);
        tick(&mut s, &north, FRAME);
        assert_eq!(s.mode, Mode::Transition);

        let frozen = s.player.pos;
        tick(&mut s, &north, 100.0);
        assert_eq!(s.player.pos, frozen);

        for _ in 0..3 {
            tick(&mut s, &idle(), 100.0);
        }
        assert_eq!(s.mode, Mode::Playing);
        assert_eq!(s.current_chunk, ChunkCoord::new(2, 2));
    }

    #[test]
    fn test_broken_wall_regrows_after_player_leaves() {
        let mut s = open_run(ChunkCoord::new(2, 1));
        let coord = s.current_chunk;
        let tile = TilePos::new(5, 5);
        s.chunk_mut(coord).grid.set(tile, 1);
        s.abilities.wall_break_unlocked = true;
        {
            let chunk = s.chunks.get_mut(coord).unwrap();
            assert!(walls::break_wall(chunk, tile, 0.0, &s.tuning, &s.abilities).is_some());
        }

        s.player.pos = Vec2::new(5.5, 5.5);
        s.now_ms = 10_100.0;
        tick(&mut s, &idle(), FRAME);
        assert!(s.current().unwrap().grid.is_open(tile));

        s.player.pos = Vec2::new(12.5, 12.5);
        tick(&mut s, &idle(), FRAME);
        assert!(!s.current().unwrap().grid.is_open(tile));
        assert!(
            s.drain_events()
                .contains(&GameEvent::WallRegenerated { chunk: coord, tile })
        );
    }

    #[test]
    fn test_nothing_runs_after_game_over() {
        let mut s = open_run(ChunkCoord::new(2, 3));
        s.player.lives = 1;
        let pos = Vec2::new(8.5, 8.5);
        s.player.pos = pos;
        hunting_chaser(&mut s, pos);
        tick(&mut s, &idle(), FRAME);
        assert_eq!(s.mode, Mode::GameOver);

        let now = s.now_ms;
        tick(&mut s, &idle(), FRAME);
        assert_eq!(s.now_ms, now);
    }

    proptest! {
        #[test]
        fn prop_player_stays_in_walkable_space(
            seed in 0u64..500,
            moves in prop::collection::vec((-1.0f32..1.0, -1.0f32..1.0, 0.0f32..1.0), 1..120),
        ) {
            let mut s = GameState::new(seed, Default::default());
            for (x, y, intensity) in moves {
                let input = TickInput {
                    steer: Vec2::new(x, y),
                    intensity,
                    ..Default::default()
                };
                tick(&mut s, &input, FRAME);
                if s.mode != Mode::Playing {
                    continue;
                }
                let tile = TilePos::containing(s.player.pos);
                let open = s.current().is_some_and(|c| c.grid.is_open(tile));
                prop_assert!(open || !tile.in_bounds());
                prop_assert!(s.score >= 0.0);
            }
        }
    }
}
