//! Chunks and the resident chunk set
//!
//! A chunk's layout is a pure function of its coordinate, so evicting one far
//! from play and rebuilding it later loses only its runtime state (heat,
//! broken walls, picked coins, cleared flag).

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::grid::{ChunkCoord, Grid, TilePos};
use super::maze::{self, MazeParams};
use super::rng;
use super::walls::{BrokenWall, WallHeat};
use crate::consts::MAZE_SIZE;

/// Attempts per coin when looking for a free cell
const COIN_PLACEMENT_ATTEMPTS: usize = 250;
/// Minimum spacing between coins
const COIN_SPACING: f32 = 0.8;

/// A collectible coin; picked coins stay picked for the chunk's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coin {
    pub pos: Vec2,
    pub picked: bool,
}

/// One maze screen of the world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub coord: ChunkCoord,
    pub grid: Grid,
    pub wall_heat: BTreeMap<TilePos, WallHeat>,
    pub broken_walls: BTreeMap<TilePos, BrokenWall>,
    /// Tiles whose gunpowder has already been collected
    pub gunpowder_spent: BTreeSet<TilePos>,
    pub coins: Vec<Coin>,
    /// Set once the player has left through any edge
    pub cleared: bool,
}

impl Chunk {
    /// Generate a fresh chunk
    pub fn generate(coord: ChunkCoord, params: &MazeParams, coin_bonus: f64) -> Self {
        let grid = maze::generate(coord, params);
        let coins = generate_coins(coord, &grid, coin_bonus);
        Self {
            coins,
            ..Self::from_grid(coord, grid)
        }
    }

    /// Wrap an existing grid with empty runtime state
    pub fn from_grid(coord: ChunkCoord, grid: Grid) -> Self {
        Self {
            coord,
            grid,
            wall_heat: BTreeMap::new(),
            broken_walls: BTreeMap::new(),
            gunpowder_spent: BTreeSet::new(),
            coins: Vec::new(),
            cleared: false,
        }
    }
}

/// Seeded coin layout: 0-3 coins by default, more with the spawn bonus
pub fn generate_coins(coord: ChunkCoord, grid: &Grid, coin_bonus: f64) -> Vec<Coin> {
    let mut rng = rng::coin_rng(coord);
    let mult = 1.0 + coin_bonus.clamp(0.0, 3.0);
    let max_coins = ((3.0 * mult).floor() as usize).max(3);
    let count = ((rng.random::<f64>() * 4.0 * mult).floor() as usize).min(max_coins);
    let size = MAZE_SIZE as i32;

    let mut coins: Vec<Coin> = Vec::with_capacity(count);
    for _ in 0..count {
        for _ in 0..COIN_PLACEMENT_ATTEMPTS {
            let tile = TilePos::new(rng.random_range(0..size), rng.random_range(0..size));
            if !grid.is_open(tile) || tile.in_border(2) {
                continue;
            }
            let pos = tile.center();
            if coins.iter().any(|c| c.pos.distance_squared(pos) < COIN_SPACING * COIN_SPACING) {
                continue;
            }
            coins.push(Coin { pos, picked: false });
            break;
        }
    }
    coins
}

/// Resident chunks keyed by coordinate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkStore {
    chunks: BTreeMap<ChunkCoord, Chunk>,
}

impl ChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    pub fn get(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    pub fn get_mut(&mut self, coord: ChunkCoord) -> Option<&mut Chunk> {
        self.chunks.get_mut(&coord)
    }

    /// Existing chunk, or a freshly generated one
    pub fn get_or_create(&mut self, coord: ChunkCoord, params: &MazeParams, coin_bonus: f64) -> &mut Chunk {
        self.chunks
            .entry(coord)
            .or_insert_with(|| Chunk::generate(coord, params, coin_bonus))
    }

    /// Generate every chunk within `view_radius` rows of `center`, all columns
    pub fn ensure_visible(&mut self, center: ChunkCoord, view_radius: i32, params: &MazeParams, coin_bonus: f64) {
        let lo = (center.y - view_radius).max(0);
        for y in lo..=center.y + view_radius {
            for x in 0..params.chunk_cols {
                self.get_or_create(ChunkCoord::new(x, y), params, coin_bonus);
            }
        }
    }

    /// Once more than `threshold` chunks are resident, drop rows farther than
    /// `keep_radius` from `center`. Returns the number evicted.
    pub fn evict_far(&mut self, center: ChunkCoord, keep_radius: i32, threshold: usize) -> usize {
        if self.chunks.len() <= threshold {
            return 0;
        }
        let before = self.chunks.len();
        self.chunks
            .retain(|coord, _| (coord.y - center.y).abs() <= keep_radius);
        let evicted = before - self.chunks.len();
        if evicted > 0 {
            log::debug!("Evicted {evicted} chunks around {center}");
        }
        evicted
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }
}
