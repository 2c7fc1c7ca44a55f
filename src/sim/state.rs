//! Game state and core simulation types
//!
//! Everything the renderer needs to draw a frame lives here and serialises to
//! JSON. The run RNG and the event queue are skipped.

use std::collections::BTreeSet;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::abilities::Abilities;
use super::boss::Boss;
use super::chaser::Chaser;
use super::chunk::{Chunk, ChunkStore};
use super::grid::{ChunkCoord, EntryDir, TilePos};
use super::maze::MazeParams;
use super::projectile::{EnemyProjectile, Missile};
use super::travel;
use crate::floor_score_multiplier;
use crate::tuning::Tuning;

/// Current phase of play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Playing,
    /// Swipe between chunks; only the transition clock advances
    Transition,
    /// Parked move waiting for the reward collaborator to commit it
    AwaitingReward,
    Paused,
    GameOver,
}

/// What hurt the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitSource {
    ChaserContact,
    Caught,
    Projectile,
    Laser,
    TileBlast,
}

/// Result of [`GameState::apply_player_hit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    Ignored,
    Shielded,
    LifeLost,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub lives: u32,
    pub shield_charges: u32,
    pub invincible_until_ms: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Inventory {
    pub missiles: u32,
    /// Charges that enhance the next shots
    pub gunpowder: u32,
}

/// A chunk change waiting on the reward screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEnter {
    pub chunk: ChunkCoord,
    pub entry: EntryDir,
}

/// In-flight swipe to the next chunk
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub from: ChunkCoord,
    pub to: ChunkCoord,
    pub entry: EntryDir,
    pub started_ms: f64,
}

/// Final numbers of a finished run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub seed: u64,
    pub score: u64,
    pub max_floor: u32,
    pub boss_kills: u32,
    pub coins: u64,
    pub elapsed_ms: f64,
}

/// Discrete happenings for the presentation layer (effects, sounds, HUD).
/// The simulation never depends on whether they are drained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    ChunkEntered { chunk: ChunkCoord, floor: u32 },
    FloorReached { floor: u32 },
    WallBroken { chunk: ChunkCoord, tile: TilePos, gold: bool, gunpowder: bool },
    WallRegenerated { chunk: ChunkCoord, tile: TilePos },
    WallBreakUnlocked,
    CoinCollected { pos: Vec2 },
    MissileItemCollected { pos: Vec2 },
    HeartCollected { pos: Vec2 },
    HeartDropped { pos: Vec2 },
    MissileFired { pos: Vec2, enhanced: bool },
    ChaserActivated { chunk: ChunkCoord },
    ChaserMaterialized { pos: Vec2 },
    ChaserStunned { until_ms: f64 },
    ChaserKilled { pos: Vec2 },
    ChaserShot { pos: Vec2 },
    PlayerCaught,
    PlayerHit { source: HitSource, shielded: bool },
    ProjectileIntercepted { pos: Vec2 },
    BossStarted { chunk: ChunkCoord },
    BossHit { hp: f32 },
    BossDefeated { chunk: ChunkCoord },
    RewardOffered { floor: u32 },
    GameOver(RunSummary),
}

fn maze_params<'a>(tuning: &'a Tuning, abilities: &Abilities) -> MazeParams<'a> {
    MazeParams {
        levels: &tuning.wall_levels,
        gold_prob: abilities
            .gold_wall_unlocked
            .then_some(abilities.gold_wall_prob),
        chunk_cols: tuning.chunk_cols,
        start_chunk: tuning.start_chunk,
    }
}

/// Complete game state
#[derive(Debug, Clone, Serialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub now_ms: f64,
    pub mode: Mode,
    #[serde(skip)]
    pub tuning: Tuning,
    /// Collaborator-owned upgrades, re-read every tick
    pub abilities: Abilities,
    pub chunks: ChunkStore,
    pub current_chunk: ChunkCoord,
    pub entry_dir: EntryDir,
    pub player: Player,
    pub chaser: Chaser,
    pub boss: Boss,
    pub missiles: Vec<Missile>,
    /// Launch times of queued multi-shot missiles
    pub pending_shots: Vec<f64>,
    pub enemy_projectiles: Vec<EnemyProjectile>,
    /// Missile pickups in the current chunk
    pub items: Vec<Vec2>,
    pub hearts: Vec<Vec2>,
    pub inventory: Inventory,
    pub score: f64,
    pub coins: u64,
    pub max_floor: u32,
    pub boss_kills: u32,
    pub reward_floors_shown: BTreeSet<u32>,
    pub pending_enter: Option<PendingEnter>,
    pub transition: Option<Transition>,
    /// Mode to restore when unpausing
    paused_from: Option<Mode>,
    next_id: u32,
    #[serde(skip)]
    pub rng: Pcg32,
    #[serde(skip)]
    events: Vec<GameEvent>,
}

impl GameState {
    /// Start a run in the configured start chunk
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        Self::with_abilities(seed, tuning, Abilities::default())
    }

    pub fn with_abilities(seed: u64, tuning: Tuning, abilities: Abilities) -> Self {
        let tuning = tuning.sanitized();
        let abilities = abilities.clamped();
        let start = tuning.start_chunk;
        let lives = tuning.start_lives.clamp(1, abilities.max_lives.max(1));
        let mut state = Self {
            seed,
            now_ms: 0.0,
            mode: Mode::Playing,
            abilities,
            chunks: ChunkStore::new(),
            current_chunk: start,
            entry_dir: EntryDir::South,
            player: Player {
                pos: EntryDir::South.spawn_pos(),
                lives,
                shield_charges: 0,
                invincible_until_ms: 0.0,
            },
            chaser: Chaser::new(start, &tuning),
            boss: Boss::default(),
            missiles: Vec::new(),
            pending_shots: Vec::new(),
            enemy_projectiles: Vec::new(),
            items: Vec::new(),
            hearts: Vec::new(),
            inventory: Inventory::default(),
            score: 0.0,
            coins: 0,
            max_floor: start.floor(),
            boss_kills: 0,
            reward_floors_shown: BTreeSet::new(),
            pending_enter: None,
            transition: None,
            paused_from: None,
            next_id: 1,
            rng: Pcg32::seed_from_u64(seed),
            events: Vec::new(),
            tuning,
        };

        log::info!("Starting run with seed {seed} at chunk {start}");
        travel::enter_chunk(&mut state, start, EntryDir::South);
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn floor(&self) -> u32 {
        self.current_chunk.floor()
    }

    pub fn maze_params(&self) -> MazeParams<'_> {
        maze_params(&self.tuning, &self.abilities)
    }

    /// Resident chunk, generating it if needed
    pub fn chunk_mut(&mut self, coord: ChunkCoord) -> &mut Chunk {
        let params = maze_params(&self.tuning, &self.abilities);
        self.chunks
            .get_or_create(coord, &params, self.abilities.coin_field_spawn_bonus)
    }

    pub fn current(&self) -> Option<&Chunk> {
        self.chunks.get(self.current_chunk)
    }

    /// Generate the visible rows around the player and evict far ones
    pub fn ensure_chunks(&mut self) {
        let params = maze_params(&self.tuning, &self.abilities);
        let bonus = self.abilities.coin_field_spawn_bonus;
        self.chunks
            .ensure_visible(self.current_chunk, self.tuning.view_radius, &params, bonus);
        self.chunks.evict_far(
            self.current_chunk,
            self.tuning.keep_radius,
            self.tuning.chunk_evict_threshold,
        );
    }

    /// Add `base` points scaled by the current floor multiplier
    pub fn add_score(&mut self, base: f64) {
        self.score = (self.score + base * floor_score_multiplier(self.floor())).max(0.0);
    }

    pub fn sub_score(&mut self, base: f64) {
        self.add_score(-base);
    }

    pub fn is_invincible(&self) -> bool {
        self.now_ms < self.player.invincible_until_ms
    }

    /// Route damage through invincibility and shields. A life reaching zero
    /// ends the run.
    pub fn apply_player_hit(&mut self, source: HitSource) -> HitOutcome {
        if self.mode == Mode::GameOver || self.is_invincible() {
            return HitOutcome::Ignored;
        }
        let until = self.now_ms + self.tuning.hit_invincible_ms;

        if self.abilities.shield_max > 0 && self.player.shield_charges > 0 {
            self.player.shield_charges -= 1;
            self.player.invincible_until_ms = until;
            self.push_event(GameEvent::PlayerHit {
                source,
                shielded: true,
            });
            return HitOutcome::Shielded;
        }

        self.player.lives = self.player.lives.saturating_sub(1);
        self.player.invincible_until_ms = until;
        self.push_event(GameEvent::PlayerHit {
            source,
            shielded: false,
        });
        if self.player.lives == 0 {
            self.game_over();
        }
        HitOutcome::LifeLost
    }

    fn game_over(&mut self) {
        self.mode = Mode::GameOver;
        self.transition = None;
        self.pending_enter = None;
        let summary = self.summary();
        log::info!(
            "Game over: score {} floor {} bosses {}",
            summary.score,
            summary.max_floor,
            summary.boss_kills
        );
        self.push_event(GameEvent::GameOver(summary));
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            seed: self.seed,
            score: self.score.floor() as u64,
            max_floor: self.max_floor,
            boss_kills: self.boss_kills,
            coins: self.coins,
            elapsed_ms: self.now_ms,
        }
    }

    /// Toggle pause; only live modes can be paused
    pub fn set_paused(&mut self, paused: bool) {
        match (paused, self.mode) {
            (true, Mode::Playing | Mode::Transition) => {
                self.paused_from = Some(self.mode);
                self.mode = Mode::Paused;
            }
            (false, Mode::Paused) => {
                self.mode = self.paused_from.take().unwrap_or(Mode::Playing);
            }
            _ => {}
        }
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take every event queued since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Move the player to the spawn point of an entry edge
    pub fn place_player(&mut self, entry: EntryDir) {
        self.player.pos = entry.spawn_pos();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> GameState {
        GameState::new(7, Tuning::default())
    }

    #[test]
    fn test_new_run_starts_at_south_spawn() {
        let s = state();
        assert_eq!(s.mode, Mode::Playing);
        assert_eq!(s.current_chunk, ChunkCoord::new(2, 0));
        assert_eq!(s.player.pos, EntryDir::South.spawn_pos());
        assert_eq!(s.player.lives, 3);
        assert!(s.current().is_some());
        assert!(!s.chaser.active);
    }

    #[test]
    fn test_hit_then_invincible() {
        let mut s = state();
        assert_eq!(s.apply_player_hit(HitSource::Projectile), HitOutcome::LifeLost);
        assert_eq!(s.player.lives, 2);
        assert_eq!(s.apply_player_hit(HitSource::Projectile), HitOutcome::Ignored);
        s.now_ms = 1000.0;
        assert_eq!(s.apply_player_hit(HitSource::Projectile), HitOutcome::LifeLost);
        assert_eq!(s.player.lives, 1);
    }

    #[test]
    fn test_shield_absorbs_before_lives() {
        let mut s = state();
        s.abilities.shield_max = 1;
        s.player.shield_charges = 1;
        assert_eq!(s.apply_player_hit(HitSource::Laser), HitOutcome::Shielded);
        assert_eq!(s.player.lives, 3);
        assert_eq!(s.player.shield_charges, 0);
        assert!(s.is_invincible());
    }

    #[test]
    fn test_last_life_ends_run() {
        let mut s = state();
        s.player.lives = 1;
        s.drain_events();
        s.apply_player_hit(HitSource::TileBlast);
        assert_eq!(s.mode, Mode::GameOver);
        let events = s.drain_events();
        assert!(matches!(events.last(), Some(GameEvent::GameOver(_))));
        assert_eq!(s.apply_player_hit(HitSource::TileBlast), HitOutcome::Ignored);
    }

    #[test]
    fn test_score_uses_floor_multiplier_and_never_negative() {
        let mut s = state();
        s.add_score(10.0);
        assert_eq!(s.score, 10.0);
        s.current_chunk = ChunkCoord::new(2, 9);
        s.add_score(10.0);
        assert_eq!(s.score, 30.0);
        s.sub_score(1000.0);
        assert_eq!(s.score, 0.0);
    }

    #[test]
    fn test_pause_restores_previous_mode() {
        let mut s = state();
        s.set_paused(true);
        assert_eq!(s.mode, Mode::Paused);
        s.set_paused(true);
        assert_eq!(s.mode, Mode::Paused);
        s.set_paused(false);
        assert_eq!(s.mode, Mode::Playing);

        s.mode = Mode::GameOver;
        s.set_paused(true);
        assert_eq!(s.mode, Mode::GameOver);
    }

    #[test]
    fn test_snapshot_serialises_with_string_keys() {
        let s = state();
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["current_chunk"], "2,0");
        assert!(json["chunks"]["chunks"].get("2,0").is_some());
    }
}
