//! Breadth-first search over open maze tiles
//!
//! Movement between tiles is 4-directional. Every query fails soft: bad
//! endpoints or unreachable goals produce an empty path, never an error.

use std::collections::{HashSet, VecDeque};

use rand::Rng;

use super::grid::{Grid, TilePos};
use crate::consts::{MAZE_MID, MAZE_SIZE};

/// Attempts made when sampling a random open cell
const RANDOM_CELL_ATTEMPTS: usize = 500;

/// Row-major index for an in-bounds tile
fn index(tile: TilePos) -> Option<usize> {
    tile.in_bounds()
        .then(|| tile.y as usize * MAZE_SIZE + tile.x as usize)
}

/// Shortest 4-connected path from `start` to `goal`, both ends included.
///
/// Empty when either end is outside the grid, not open, or unreachable.
pub fn bfs_path(grid: &Grid, start: TilePos, goal: TilePos) -> Vec<TilePos> {
    if !grid.is_open(start) || !grid.is_open(goal) {
        return Vec::new();
    }

    let mut prev: Vec<Option<TilePos>> = vec![None; MAZE_SIZE * MAZE_SIZE];
    let mut seen = vec![false; MAZE_SIZE * MAZE_SIZE];
    let mut queue = VecDeque::from([start]);
    if let Some(i) = index(start) {
        seen[i] = true;
    }

    while let Some(cell) = queue.pop_front() {
        if cell == goal {
            break;
        }
        for next in cell.neighbors() {
            let Some(i) = index(next) else {
                continue;
            };
            if seen[i] || !grid.is_open(next) {
                continue;
            }
            seen[i] = true;
            prev[i] = Some(cell);
            queue.push_back(next);
        }
    }

    if !index(goal).is_some_and(|i| seen[i]) {
        return Vec::new();
    }

    let mut path = vec![goal];
    let mut cur = goal;
    while let Some(p) = index(cur).and_then(|i| prev[i]) {
        path.push(p);
        cur = p;
    }
    path.reverse();
    path
}

/// Number of steps between two tiles, `None` if unreachable
pub fn bfs_distance(grid: &Grid, start: TilePos, goal: TilePos) -> Option<usize> {
    let path = bfs_path(grid, start, goal);
    (!path.is_empty()).then(|| path.len() - 1)
}

/// Closest open tile by grid flood fill, walls included in the search.
///
/// Out-of-grid starts search from the centre.
pub fn find_nearest_open_cell(grid: &Grid, start: TilePos) -> Option<TilePos> {
    if grid.is_open(start) {
        return Some(start);
    }
    let origin = if start.in_bounds() {
        start
    } else {
        TilePos::new(MAZE_MID, MAZE_MID)
    };

    let mut seen = vec![false; MAZE_SIZE * MAZE_SIZE];
    let mut queue = VecDeque::from([origin]);
    if let Some(i) = index(origin) {
        seen[i] = true;
    }

    while let Some(cell) = queue.pop_front() {
        if grid.is_open(cell) {
            return Some(cell);
        }
        for next in cell.neighbors() {
            let Some(i) = index(next) else {
                continue;
            };
            if !seen[i] {
                seen[i] = true;
                queue.push_back(next);
            }
        }
    }
    None
}

/// Random open tile away from the exit band (two cells from the edge)
pub fn random_open_cell(grid: &Grid, rng: &mut impl Rng) -> Option<TilePos> {
    let size = MAZE_SIZE as i32;
    (0..RANDOM_CELL_ATTEMPTS).find_map(|_| {
        let tile = TilePos::new(rng.random_range(0..size), rng.random_range(0..size));
        (grid.is_open(tile) && !tile.in_border(2)).then_some(tile)
    })
}

/// Every open tile connected to `start`
pub fn reachable_from(grid: &Grid, start: TilePos) -> HashSet<TilePos> {
    let mut seen = HashSet::new();
    if !grid.is_open(start) {
        return seen;
    }
    let mut queue = VecDeque::from([start]);
    seen.insert(start);
    while let Some(cell) = queue.pop_front() {
        for next in cell.neighbors() {
            if grid.is_open(next) && seen.insert(next) {
                queue.push_back(next);
            }
        }
    }
    seen
}
