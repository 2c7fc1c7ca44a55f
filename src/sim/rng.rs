//! String-keyed deterministic RNG
//!
//! Per-chunk content is never stored: it is regenerated from an RNG seeded by
//! hashing a key such as `chunk:2,5`. Two generators built from the same key
//! yield the same stream.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::grid::{ChunkCoord, TilePos};

const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// FNV-1a 32-bit hash
pub fn hash_str(key: &str) -> u32 {
    key.bytes()
        .fold(FNV_OFFSET, |h, b| (h ^ b as u32).wrapping_mul(FNV_PRIME))
}

/// RNG seeded from a string key
pub fn seeded(key: &str) -> Pcg32 {
    Pcg32::seed_from_u64(hash_str(key) as u64)
}

/// Maze carving stream for a chunk
pub fn carve_rng(chunk: ChunkCoord) -> Pcg32 {
    seeded(&format!("chunk:{chunk}"))
}

/// Wall-level assignment stream for a chunk
pub fn level_rng(chunk: ChunkCoord) -> Pcg32 {
    seeded(&format!("mazeProb:{chunk}"))
}

pub fn coin_rng(chunk: ChunkCoord) -> Pcg32 {
    seeded(&format!("coins:{chunk}"))
}

/// Stream that picks the ordinary value a gold wall regenerates as
pub fn regen_wall_rng(chunk: ChunkCoord, tile: TilePos) -> Pcg32 {
    seeded(&format!("regenWall:{chunk},{tile}"))
}

/// Stream that decides whether a wall hides gunpowder
pub fn gunpowder_rng(chunk: ChunkCoord, tile: TilePos) -> Pcg32 {
    seeded(&format!("gunpowder:{chunk},{tile}"))
}

pub fn chaser_start_rng(chunk: ChunkCoord) -> Pcg32 {
    seeded(&format!("chaserStart:{chunk}"))
}

pub fn chaser_respawn_rng(chunk: ChunkCoord, now_ms: f64) -> Pcg32 {
    seeded(&format!("chaserRespawn:{chunk},{}", now_ms.floor() as i64))
}
