//! Chunk exits, transitions and entry
//!
//! Crossing an edge parks the move in a short transition (or behind a reward
//! offer on every tenth floor). The new chunk is entered once that resolves.

use super::chaser;
use super::grid::{ChunkCoord, EntryDir};
use super::pickups;
use super::state::{GameEvent, GameState, Mode, PendingEnter, Transition};
use crate::consts::{MAZE_SIZE, REWARD_FLOOR_INTERVAL};
use crate::floor_score_multiplier;

const FLOOR_ADVANCE_SCORE: f64 = 100.0;
/// Wall breaking unlocks on its own from this floor on
const WALL_BREAK_AUTO_FLOOR: u32 = 10;

/// Put the player into `coord` through `entry` and reset per-chunk state
pub(crate) fn enter_chunk(state: &mut GameState, coord: ChunkCoord, entry: EntryDir) {
    state.chunk_mut(coord);
    state.current_chunk = coord;
    state.entry_dir = entry;
    state.place_player(entry);

    let floor = coord.floor();
    if floor > state.max_floor {
        state.max_floor = floor;
        log::info!("Reached floor {floor}");
        state.push_event(GameEvent::FloorReached { floor });
    }

    state.enemy_projectiles.clear();
    state.missiles.clear();
    state.pending_shots.clear();
    state.boss.clear_attacks();

    chaser::on_player_entered(state);

    state.items.clear();
    state.hearts.clear();
    pickups::spawn_missile_items(state);

    state.player.shield_charges = state.abilities.shield_max;

    state.ensure_chunks();
    log::debug!("Entered chunk {coord} from the {entry:?}");
    state.push_event(GameEvent::ChunkEntered { chunk: coord, floor });
}

/// Edge the player has crossed this frame, as (dx, dy) with dy = +1 north
pub fn check_exit(state: &GameState) -> Option<(i32, i32)> {
    let p = state.player.pos;
    let size = MAZE_SIZE as f32;
    if p.y < 0.0 {
        Some((0, 1))
    } else if p.y > size {
        Some((0, -1))
    } else if p.x < 0.0 {
        Some((-1, 0))
    } else if p.x > size {
        Some((1, 0))
    } else {
        None
    }
}

fn pull_inside(state: &mut GameState) {
    let hi = MAZE_SIZE as f32 - 0.5;
    let p = &mut state.player.pos;
    p.x = p.x.clamp(0.5, hi);
    p.y = p.y.clamp(0.5, hi);
}

/// Leave the current chunk in direction (dx, dy).
///
/// Returns `false` when the exit is refused and the player was pulled back.
pub fn exit_chunk(state: &mut GameState, dx: i32, dy: i32) -> bool {
    if state.mode != Mode::Playing || state.transition.is_some() || state.pending_enter.is_some() {
        return false;
    }
    if state.boss.active {
        pull_inside(state);
        return false;
    }

    let from = state.current_chunk;
    let to = from.offset(dx, dy);
    if to.x < 0 || to.x >= state.tuning.chunk_cols || to.y < 0 {
        log::debug!("Refused exit from {from} towards {to}");
        pull_inside(state);
        return false;
    }

    if let Some(chunk) = state.chunks.get_mut(from) {
        chunk.cleared = true;
    }

    let entry = EntryDir::after_exit(dx, dy);
    state.chaser.next_entry_delay_ms = chaser::exit_delay_ms(state, entry.opposite());
    chaser::speed_up(state);

    let floor = to.floor();
    if dy > 0 {
        state.score += FLOOR_ADVANCE_SCORE * floor_score_multiplier(floor);
    }

    state.chunk_mut(to);
    if floor >= WALL_BREAK_AUTO_FLOOR && !state.abilities.wall_break_unlocked {
        state.abilities.wall_break_unlocked = true;
        log::info!("Wall breaking unlocked on floor {floor}");
        state.push_event(GameEvent::WallBreakUnlocked);
    }

    if floor % REWARD_FLOOR_INTERVAL == 0 && state.reward_floors_shown.insert(floor) {
        state.pending_enter = Some(PendingEnter { chunk: to, entry });
        state.mode = Mode::AwaitingReward;
        log::info!("Reward offered on floor {floor}");
        state.push_event(GameEvent::RewardOffered { floor });
    } else {
        state.transition = Some(Transition {
            from,
            to,
            entry,
            started_ms: state.now_ms,
        });
        state.mode = Mode::Transition;
    }
    true
}

/// Finish the running transition once its time is up
pub fn update_transition(state: &mut GameState) {
    if state.mode != Mode::Transition {
        return;
    }
    let Some(t) = state.transition else {
        state.mode = Mode::Playing;
        return;
    };
    if state.now_ms - t.started_ms < state.tuning.transition_ms {
        return;
    }
    state.transition = None;
    state.mode = Mode::Playing;
    enter_chunk(state, t.to, t.entry);
}

/// Resume a move parked behind a reward offer.
///
/// Returns `false` if nothing was waiting.
pub fn commit_pending_enter(state: &mut GameState) -> bool {
    if state.mode != Mode::AwaitingReward {
        return false;
    }
    let Some(pending) = state.pending_enter.take() else {
        state.mode = Mode::Playing;
        return false;
    };
    state.mode = Mode::Playing;
    enter_chunk(state, pending.chunk, pending.entry);
    true
}
