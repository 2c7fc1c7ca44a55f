//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay deterministic:
//! - Time only advances through `tick`
//! - Seeded RNG only (per-chunk string keys, one run stream)
//! - Stable iteration order (ordered maps, entity IDs)
//! - No rendering or platform dependencies

pub mod abilities;
pub mod boss;
pub mod chaser;
pub mod chunk;
pub mod collision;
pub mod grid;
pub mod maze;
pub mod movement;
pub mod pathfind;
pub mod pickups;
pub mod projectile;
pub mod rng;
pub mod state;
pub mod tick;
pub mod travel;
pub mod walls;

#[cfg(test)]
mod test_support;

pub use abilities::Abilities;
pub use boss::{Boss, BossPattern};
pub use chaser::{Chaser, ChaserPhase};
pub use chunk::{Chunk, ChunkStore};
pub use grid::{ChunkCoord, EntryDir, Grid, TilePos};
pub use state::{GameEvent, GameState, HitOutcome, HitSource, Mode, RunSummary};
pub use tick::{TickInput, tick};
pub use travel::commit_pending_enter;
