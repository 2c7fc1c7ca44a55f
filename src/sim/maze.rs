//! Maze generation for one chunk
//!
//! Ordinary floors carve a perfect maze by backtracking from the centre in
//! 2-cell steps. Boss floors use a fixed arena layout. Remaining walls are then
//! tiered by the floor's level distribution and the edge exits are opened.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::grid::{ChunkCoord, EntryDir, Grid, TilePos};
use super::rng;
use crate::consts::{BOUNDARY_WALL, FLOOR, GOLD_WALL, MAZE_MID, MAZE_SIZE};
use crate::tuning::WallLevel;

/// Raw wall marker used while carving, before tiers are assigned
const RAW_WALL: u16 = 1;

/// Which wall tiers appear on a floor and how often
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelDistribution {
    /// Tier every wall has unless rolled up
    pub base_level: usize,
    /// Tier being phased in
    pub next_level: usize,
    /// Chance a wall uses `next_level`
    pub next_prob: f64,
}

/// Tier mix for a floor.
///
/// Tier 1 starts appearing on floor 21. Each later tier starts 10 floors after
/// the previous one reached certainty, and its share grows by its step every
/// 10 floors.
pub fn wall_level_distribution(floor: u32, levels: &[WallLevel]) -> LevelDistribution {
    let floor = floor as i64;
    let mut base_level = 0;
    let mut threshold: i64 = 1;

    for (i, level) in levels.iter().enumerate().skip(1) {
        let start = threshold + if i == 1 { 20 } else { 10 };
        if floor < start {
            return LevelDistribution {
                base_level,
                next_level: base_level,
                next_prob: 0.0,
            };
        }

        let steps = (floor - start) / 10 + 1;
        let prob = steps as f64 * level.start_prob;
        if prob < 1.0 {
            return LevelDistribution {
                base_level,
                next_level: i,
                next_prob: prob,
            };
        }

        base_level = i;
        let steps_to_full = (1.0 / level.start_prob).ceil() as i64;
        threshold = start + (steps_to_full - 1) * 10;
        if floor <= threshold {
            return LevelDistribution {
                base_level,
                next_level: i,
                next_prob: 0.0,
            };
        }
    }

    let last = levels.len().saturating_sub(1);
    LevelDistribution {
        base_level: last,
        next_level: last,
        next_prob: 0.0,
    }
}

/// Inputs that shape generation besides the chunk coordinate
#[derive(Debug, Clone, Copy)]
pub struct MazeParams<'a> {
    pub levels: &'a [WallLevel],
    /// Gold wall chance when that upgrade is unlocked
    pub gold_prob: Option<f64>,
    pub chunk_cols: i32,
    pub start_chunk: ChunkCoord,
}

/// Build the wall grid of a chunk. Same coordinate and params, same grid.
pub fn generate(chunk: ChunkCoord, params: &MazeParams) -> Grid {
    let boss = chunk.is_boss_floor();
    let mut grid = Grid::filled(RAW_WALL);

    if boss {
        build_boss_arena(&mut grid);
    } else {
        carve(&mut grid, &mut rng::carve_rng(chunk));
    }

    assign_levels(&mut grid, chunk, params);

    for dir in exits(chunk, params) {
        let edge = dir.exit_tile();
        let (dx, dy) = dir.inward();
        grid.set(edge, FLOOR);
        grid.set(edge.offset(dx, dy), FLOOR);
    }

    grid
}

/// Exit edges opened in a chunk
pub fn exits(chunk: ChunkCoord, params: &MazeParams) -> Vec<EntryDir> {
    let boss = chunk.is_boss_floor();
    [EntryDir::North, EntryDir::South, EntryDir::West, EntryDir::East]
        .into_iter()
        .filter(|dir| match dir {
            EntryDir::West => !boss && chunk.x != 0,
            EntryDir::East => !boss && chunk.x != params.chunk_cols - 1,
            EntryDir::South => chunk.y != 0 || chunk == params.start_chunk,
            EntryDir::North => true,
        })
        .collect()
}

/// Iterative recursive backtracker from the centre
fn carve(grid: &mut Grid, rng: &mut impl Rng) {
    let size = MAZE_SIZE as i32;
    let start = TilePos::new(MAZE_MID, MAZE_MID);
    grid.set(start, FLOOR);

    let mut stack = vec![(start, shuffled(rng), 0usize)];
    while let Some((cell, dirs, next)) = stack.last_mut() {
        let Some(&(dx, dy)) = dirs.get(*next) else {
            stack.pop();
            continue;
        };
        *next += 1;
        let cell = *cell;

        let target = cell.offset(dx, dy);
        let inside = target.x > 0 && target.x < size - 1 && target.y > 0 && target.y < size - 1;
        if inside && grid.get(target) == Some(RAW_WALL) {
            grid.set(cell.offset(dx / 2, dy / 2), FLOOR);
            grid.set(target, FLOOR);
            stack.push((target, shuffled(rng), 0));
        }
    }
}

fn shuffled(rng: &mut impl Rng) -> [(i32, i32); 4] {
    let mut dirs = [(0, 2), (0, -2), (2, 0), (-2, 0)];
    dirs.shuffle(rng);
    dirs
}

/// Open arena: central pillar, northern spine, side arms and two corner
/// blocks, with the southern band left clear for the entry.
fn build_boss_arena(grid: &mut Grid) {
    let size = MAZE_SIZE as i32;
    let mid = MAZE_MID;

    for tile in grid.tiles() {
        let (x, y) = (tile.x, tile.y);
        let mut value = FLOOR;
        if x == 0 || y == 0 || x == size - 1 || y == size - 1 {
            value = RAW_WALL;
        }
        if (x - mid).abs() >= 2 || (y - mid).abs() >= 2 {
            let spine = (mid - 1..=mid + 1).contains(&x) && y < 4;
            let arms = (mid - 1..=mid + 1).contains(&y) && (x < 4 || x > size - 5);
            let corner = (x == 4 || x == size - 5) && y == 4;
            if spine || arms || corner {
                value = RAW_WALL;
            }
        }
        grid.set(tile, value);
    }

    for y in (size - 4).max(1)..=size - 2 {
        for x in 1..=size - 2 {
            grid.set(TilePos::new(x, y), FLOOR);
        }
    }
}

fn assign_levels(grid: &mut Grid, chunk: ChunkCoord, params: &MazeParams) {
    let dist = wall_level_distribution(chunk.floor(), params.levels);
    let mut rng = rng::level_rng(chunk);

    for tile in grid.tiles() {
        if grid.get(tile) != Some(RAW_WALL) {
            continue;
        }
        let value = if tile.in_border(1) {
            BOUNDARY_WALL
        } else if params.gold_prob.is_some_and(|p| rng.random::<f64>() < p) {
            GOLD_WALL
        } else {
            let level = if rng.random::<f64>() < dist.next_prob {
                dist.next_level
            } else {
                dist.base_level
            };
            level as u16 + 1
        };
        grid.set(tile, value);
    }
}
