//! Collectibles and wall-break rewards

use glam::Vec2;
use rand::Rng;

use super::abilities::MAX_HEART_DROP_CHANCE;
use super::grid::{ChunkCoord, TilePos};
use super::state::{GameEvent, GameState};
use super::walls::WallBreak;
use crate::consts::MAZE_SIZE;

const COIN_PICKUP_PAD: f32 = 0.22;
const ITEM_PICKUP_PAD: f32 = 0.25;
const HEART_PICKUP_PAD: f32 = 0.28;
const COIN_SCORE: f64 = 5.0;
const WALL_BREAK_SCORE: f64 = 10.0;

const ITEM_SPAWN_CHANCE_CAP: f32 = 0.95;
const ITEM_ATTEMPTS: usize = 200;
const HEART_ATTEMPTS: usize = 250;
/// Minimum gap between any two pickups
const PICKUP_SPACING: f32 = 0.9;
/// Hearts never drop right under the player
const HEART_PLAYER_GAP: f32 = 1.0;
const MAX_HEARTS: usize = 5;

/// Rewards for a wall that just opened in `chunk`
pub(crate) fn apply_wall_break(state: &mut GameState, chunk: ChunkCoord, brk: WallBreak) {
    state.add_score(WALL_BREAK_SCORE);
    if brk.gold {
        state.coins += u64::from(state.abilities.coin_wall_coin_amount);
    }
    if brk.gunpowder {
        state.inventory.gunpowder += 1;
    }
    state.push_event(GameEvent::WallBroken {
        chunk,
        tile: brk.tile,
        gold: brk.gold,
        gunpowder: brk.gunpowder,
    });
    if chunk == state.current_chunk {
        try_drop_heart(state);
    }
}

/// Random open cell of the current chunk, clear of the exit band and of
/// other pickups
fn find_free_cell(state: &mut GameState, attempts: usize, player_gap: f32) -> Option<Vec2> {
    let grid = &state.chunks.get(state.current_chunk)?.grid;
    let rng = &mut state.rng;
    let size = MAZE_SIZE as i32;
    let player = state.player.pos;
    let items = &state.items;
    let hearts = &state.hearts;

    (0..attempts).find_map(|_| {
        let tile = TilePos::new(rng.random_range(0..size), rng.random_range(0..size));
        if !grid.is_open(tile) || tile.in_border(2) {
            return None;
        }
        let pos = tile.center();
        let clear = items
            .iter()
            .chain(hearts.iter())
            .all(|o| o.distance(pos) >= PICKUP_SPACING);
        (clear && pos.distance(player) >= player_gap).then_some(pos)
    })
}

/// Scatter missile pickups over a freshly entered chunk
pub(crate) fn spawn_missile_items(state: &mut GameState) {
    if !state.missiles.is_empty() || !state.pending_shots.is_empty() {
        return;
    }
    let a = &state.abilities;
    let bonus = 1.0 + a.missile_field_spawn_bonus.clamp(0.0, 1.0);
    let chance = (state.tuning.item_spawn_chance * a.missile_spawn_chance_mult * bonus)
        .clamp(0.0, ITEM_SPAWN_CHANCE_CAP);
    let rolls = a.max_field_missile_items.max(1);

    for _ in 0..rolls {
        if state.rng.random::<f32>() >= chance {
            continue;
        }
        if let Some(pos) = find_free_cell(state, ITEM_ATTEMPTS, 0.0) {
            state.items.push(pos);
        }
    }
}

fn try_drop_heart(state: &mut GameState) {
    let chance = state
        .abilities
        .heart_drop_chance
        .clamp(0.0, MAX_HEART_DROP_CHANCE);
    if chance <= 0.0 || state.hearts.len() >= MAX_HEARTS {
        return;
    }
    if !state.rng.random_bool(chance) {
        return;
    }
    if let Some(pos) = find_free_cell(state, HEART_ATTEMPTS, HEART_PLAYER_GAP) {
        state.hearts.push(pos);
        state.push_event(GameEvent::HeartDropped { pos });
    }
}

/// Pick up everything the player is touching
pub fn collect(state: &mut GameState) {
    let player = state.player.pos;
    let r = state.tuning.player_radius;

    let mut coins = Vec::new();
    if let Some(chunk) = state.chunks.get_mut(state.current_chunk) {
        for coin in chunk.coins.iter_mut().filter(|c| !c.picked) {
            if coin.pos.distance(player) < r + COIN_PICKUP_PAD {
                coin.picked = true;
                coins.push(coin.pos);
            }
        }
    }
    for pos in coins {
        state.coins += 1 + u64::from(state.abilities.coin_gain_bonus);
        state.add_score(COIN_SCORE);
        state.push_event(GameEvent::CoinCollected { pos });
    }

    let (taken, kept): (Vec<Vec2>, Vec<Vec2>) = state
        .items
        .iter()
        .partition(|p| p.distance(player) < r + ITEM_PICKUP_PAD);
    state.items = kept;
    for pos in taken {
        state.inventory.missiles += 1;
        state.push_event(GameEvent::MissileItemCollected { pos });
    }

    let (taken, kept): (Vec<Vec2>, Vec<Vec2>) = state
        .hearts
        .iter()
        .partition(|p| p.distance(player) < r + HEART_PICKUP_PAD);
    state.hearts = kept;
    for pos in taken {
        state.player.lives = state.abilities.max_lives.max(1);
        state.push_event(GameEvent::HeartCollected { pos });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::chunk::Coin;
    use crate::sim::test_support::open_run;

    fn run() -> GameState {
        let mut s = open_run(ChunkCoord::new(2, 1));
        s.player.pos = Vec2::new(8.5, 8.5);
        s
    }

    #[test]
    fn test_coin_collected_once_with_bonus() {
        let mut s = run();
        s.abilities.coin_gain_bonus = 2;
        let coord = s.current_chunk;
        s.chunk_mut(coord).coins.push(Coin {
            pos: Vec2::new(8.6, 8.5),
            picked: false,
        });
        collect(&mut s);
        collect(&mut s);
        assert_eq!(s.coins, 3);
        assert_eq!(s.score, 5.0);
        assert!(s.current().unwrap().coins[0].picked);
    }

    #[test]
    fn test_missile_item_and_heart_pickup() {
        let mut s = run();
        s.items = vec![Vec2::new(8.5, 8.8), Vec2::new(3.5, 3.5)];
        s.hearts = vec![Vec2::new(8.2, 8.5)];
        s.player.lives = 1;
        collect(&mut s);
        assert_eq!(s.inventory.missiles, 1);
        assert_eq!(s.items, vec![Vec2::new(3.5, 3.5)]);
        assert_eq!(s.player.lives, 3);
        assert!(s.hearts.is_empty());
    }

    #[test]
    fn test_missile_items_spawn_on_open_interior_cells() {
        let mut s = run();
        s.abilities.max_field_missile_items = 5;
        s.abilities.missile_spawn_chance_mult = 10.0;
        spawn_missile_items(&mut s);
        assert!(!s.items.is_empty());
        for (i, a) in s.items.iter().enumerate() {
            assert!(!TilePos::containing(*a).in_border(2));
            for b in &s.items[i + 1..] {
                assert!(a.distance(*b) >= PICKUP_SPACING);
            }
        }
    }

    #[test]
    fn test_no_items_while_missiles_in_flight() {
        let mut s = run();
        s.abilities.missile_spawn_chance_mult = 10.0;
        s.pending_shots.push(100.0);
        spawn_missile_items(&mut s);
        assert!(s.items.is_empty());
    }

    #[test]
    fn test_heart_drops_are_capped() {
        let mut s = run();
        s.abilities.heart_drop_chance = 0.10;
        for _ in 0..400 {
            try_drop_heart(&mut s);
        }
        assert_eq!(s.hearts.len(), MAX_HEARTS);
        assert!(s.hearts.iter().all(|h| h.distance(s.player.pos) >= HEART_PLAYER_GAP));
    }

    #[test]
    fn test_wall_break_rewards() {
        let mut s = run();
        let coord = s.current_chunk;
        apply_wall_break(
            &mut s,
            coord,
            WallBreak {
                tile: TilePos::new(5, 5),
                old_value: 100,
                gold: true,
                gunpowder: true,
            },
        );
        assert_eq!(s.coins, 5);
        assert_eq!(s.inventory.gunpowder, 1);
        assert_eq!(s.score, 10.0);
    }
}
