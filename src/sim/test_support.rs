//! Shared fixtures for simulation tests

use glam::Vec2;

use super::chaser::EntryPlan;
use super::grid::{ChunkCoord, EntryDir, Grid};
use super::state::GameState;
use crate::consts::FLOOR;
use crate::tuning::Tuning;

/// Run started in `coord` with its grid replaced by open floor
pub fn open_run(coord: ChunkCoord) -> GameState {
    let tuning = Tuning {
        start_chunk: coord,
        ..Default::default()
    };
    let mut s = GameState::new(11, tuning);
    s.chunk_mut(coord).grid = Grid::filled(FLOOR);
    s.items.clear();
    s.hearts.clear();
    s.chunk_mut(coord).coins.clear();
    s.drain_events();
    s
}

/// Put an active chaser in the player's chunk at `pos`, ready to hunt
pub fn hunting_chaser(s: &mut GameState, pos: Vec2) {
    let chunk = s.current_chunk;
    let c = &mut s.chaser;
    c.active = true;
    c.present = true;
    c.dead = false;
    c.chunk = chunk;
    c.pos = pos;
    c.entry = EntryPlan::Edge(EntryDir::South);
    c.entry_until_ms = 0.0;
    c.grace_until_ms = 0.0;
}
