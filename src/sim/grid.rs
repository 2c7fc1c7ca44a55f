//! Grid primitives shared by generation, collision and pathfinding
//!
//! Maze-local coordinates are continuous tile units: tile (i, j) spans
//! `[i, i+1) x [j, j+1)` and its centre is `(i + 0.5, j + 0.5)`. Row 0 is the
//! north edge of a chunk.

use std::fmt;
use std::str::FromStr;

use glam::Vec2;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::consts::{BOSS_FLOOR_INTERVAL, FLOOR, MAZE_MID, MAZE_SIZE};

/// Implements the `"x,y"` string key form used for map keys and snapshots
macro_rules! xy_key {
    ($ty:ident) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{},{}", self.x, self.y)
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let (x, y) = s
                    .split_once(',')
                    .ok_or_else(|| format!("expected \"x,y\", got {s:?}"))?;
                let x = x.trim().parse::<i32>().map_err(|e| e.to_string())?;
                let y = y.trim().parse::<i32>().map_err(|e| e.to_string())?;
                Ok(Self { x, y })
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

/// Integer tile coordinate inside one chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
}

xy_key!(TilePos);

impl TilePos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Tile containing a continuous position
    pub fn containing(pos: Vec2) -> Self {
        Self::new(pos.x.floor() as i32, pos.y.floor() as i32)
    }

    pub fn center(self) -> Vec2 {
        Vec2::new(self.x as f32 + 0.5, self.y as f32 + 0.5)
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// 4-connected neighbours (E, W, S, N)
    pub fn neighbors(self) -> [TilePos; 4] {
        [
            self.offset(1, 0),
            self.offset(-1, 0),
            self.offset(0, 1),
            self.offset(0, -1),
        ]
    }

    pub fn in_bounds(self) -> bool {
        let size = MAZE_SIZE as i32;
        (0..size).contains(&self.x) && (0..size).contains(&self.y)
    }

    /// True inside the unbreakable border band of the given thickness
    pub fn in_border(self, margin: i32) -> bool {
        let size = MAZE_SIZE as i32;
        self.x < margin || self.y < margin || self.x >= size - margin || self.y >= size - margin
    }
}

/// World chunk coordinate; y grows northward, floor number is `y + 1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
}

xy_key!(ChunkCoord);

impl ChunkCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Map key, `"x,y"`
    pub fn key(self) -> String {
        self.to_string()
    }

    /// 1-based floor number
    pub fn floor(self) -> u32 {
        (self.y + 1).max(1) as u32
    }

    pub fn is_boss_floor(self) -> bool {
        is_boss_floor(self.floor())
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Every 20th floor is a boss arena
pub fn is_boss_floor(floor: u32) -> bool {
    floor > 0 && floor % BOSS_FLOOR_INTERVAL == 0
}

/// Which edge an entity entered a chunk through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryDir {
    North,
    South,
    West,
    East,
}

impl EntryDir {
    pub fn opposite(self) -> Self {
        match self {
            EntryDir::North => EntryDir::South,
            EntryDir::South => EntryDir::North,
            EntryDir::West => EntryDir::East,
            EntryDir::East => EntryDir::West,
        }
    }

    /// Entry edge of the next chunk after leaving in direction (dx, dy),
    /// where dy = +1 is north
    pub fn after_exit(dx: i32, dy: i32) -> Self {
        match (dx, dy) {
            (-1, 0) => EntryDir::East,
            (1, 0) => EntryDir::West,
            (0, -1) => EntryDir::North,
            _ => EntryDir::South,
        }
    }

    /// Spawn point one cell inside this entry
    pub fn spawn_pos(self) -> Vec2 {
        let mid = MAZE_MID as f32 + 0.5;
        let inner = 1.5;
        let inner_from_end = MAZE_SIZE as f32 - 1.5;
        match self {
            EntryDir::North => Vec2::new(mid, inner),
            EntryDir::South => Vec2::new(mid, inner_from_end),
            EntryDir::West => Vec2::new(inner, mid),
            EntryDir::East => Vec2::new(inner_from_end, mid),
        }
    }

    /// Edge tile carved open for this exit
    pub fn exit_tile(self) -> TilePos {
        let last = MAZE_SIZE as i32 - 1;
        match self {
            EntryDir::North => TilePos::new(MAZE_MID, 0),
            EntryDir::South => TilePos::new(MAZE_MID, last),
            EntryDir::West => TilePos::new(0, MAZE_MID),
            EntryDir::East => TilePos::new(last, MAZE_MID),
        }
    }

    /// Unit step pointing from the edge into the chunk
    pub fn inward(self) -> (i32, i32) {
        match self {
            EntryDir::North => (0, 1),
            EntryDir::South => (0, -1),
            EntryDir::West => (1, 0),
            EntryDir::East => (-1, 0),
        }
    }
}

/// Square maze grid of wall values: 0 open, 1..=10 tiers, 100 gold, 200 boundary.
///
/// Serialised row-major (`cells[y * size + x]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    size: usize,
    cells: Vec<u16>,
}

impl Grid {
    pub fn filled(value: u16) -> Self {
        Self {
            size: MAZE_SIZE,
            cells: vec![value; MAZE_SIZE * MAZE_SIZE],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn index(&self, tile: TilePos) -> Option<usize> {
        tile.in_bounds()
            .then(|| tile.y as usize * self.size + tile.x as usize)
    }

    /// Cell value, `None` outside the grid
    pub fn get(&self, tile: TilePos) -> Option<u16> {
        self.index(tile).map(|i| self.cells[i])
    }

    /// Write a cell; out-of-range writes are ignored
    pub fn set(&mut self, tile: TilePos, value: u16) -> bool {
        match self.index(tile) {
            Some(i) => {
                self.cells[i] = value;
                true
            }
            None => false,
        }
    }

    pub fn is_open(&self, tile: TilePos) -> bool {
        self.get(tile) == Some(FLOOR)
    }

    pub fn is_wall(&self, tile: TilePos) -> bool {
        self.get(tile).is_some_and(|v| v > FLOOR)
    }

    /// All tiles in row-major order
    pub fn tiles(&self) -> impl Iterator<Item = TilePos> + use<> {
        let size = self.size as i32;
        (0..size).flat_map(move |y| (0..size).map(move |x| TilePos::new(x, y)))
    }

    pub fn open_tiles(&self) -> impl Iterator<Item = TilePos> + '_ {
        self.tiles().filter(|&t| self.is_open(t))
    }
}
