//! Level state: generation parameters, world construction, validation
//!
//! `LevelState` owns every entity collection. Generation consumes a
//! caller-seeded RNG so that identical parameters and seed always build the
//! identical level.

use std::collections::BTreeMap;

use glam::I64Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entity::{Block, BlockFlags, BlockSpecial, Explosion, Monster, MonsterFlags, MonsterId};
use super::geometry;
use crate::consts::FRAMES_BETWEEN_MONSTERS;

/// Configuration errors: malformed generation parameters or level files.
/// Raised by generation, validation, and the level loader; meant to be
/// caught once at level-load time and surfaced as a blocking "this level is
/// broken" state, never stepped past.
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("block map size {actual} doesn't match level dimensions ({expected} cells)")]
    BlockMapSizeMismatch { expected: usize, actual: usize },
    #[error("grid pitch is zero")]
    ZeroGridPitch,
    #[error("one or both of the level dimensions is zero")]
    ZeroDimension,
    #[error("level dimension is not a multiple of the grid pitch")]
    MisalignedDimensions,
    #[error("block at ({x}, {y}) is outside of the boundary")]
    BlockOutOfBounds { x: i64, y: i64 },
    #[error("block at ({x1}, {y1}) overlaps with block at ({x2}, {y2})")]
    BlocksOverlap { x1: i64, y1: i64, x2: i64, y2: i64 },
    #[error("monster at ({x}, {y}) is outside of the boundary")]
    MonsterOutOfBounds { x: i64, y: i64 },
    #[error("move speed {speed} does not divide grid pitch {pitch}")]
    InvalidMoveSpeed { speed: i64, pitch: i64 },
    #[error("monster at ({x}, {y}) can push blocks but has no push speed")]
    NoPushSpeed { x: i64, y: i64 },
    #[error("push speed {speed} does not divide grid pitch {pitch}")]
    InvalidPushSpeed { speed: i64, pitch: i64 },
    #[error("maze dimensions must be odd integers")]
    EvenMazeDimensions,
    #[error("level file defines no levels")]
    EmptyLevelSet,
    #[error("failed to read level file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse level file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Population count for a special kind: either exact or sampled uniformly
/// from an inclusive range at generation time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpecialCountRange {
    Exact(i64),
    Range(i64, i64),
}

impl SpecialCountRange {
    pub fn sample(self, rng: &mut Pcg32) -> i64 {
        match self {
            SpecialCountRange::Exact(n) => n,
            SpecialCountRange::Range(low, high) => sample_inclusive(rng, (low, high)),
        }
    }

    /// Inclusive `(low, high)` bounds of this range.
    pub fn bounds(self) -> (i64, i64) {
        match self {
            SpecialCountRange::Exact(n) => (n, n),
            SpecialCountRange::Range(low, high) => (low, high),
        }
    }
}

fn sample_inclusive(rng: &mut Pcg32, bounds: (i64, i64)) -> i64 {
    let (low, high) = bounds;
    if high <= low { low } else { rng.random_range(low..=high) }
}

/// Declarative description of a level. Widths, heights, and the player
/// spawn are in world units here (the level loader multiplies
/// cell-denominated values by `grid_pitch` before handing this over).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationParameters {
    #[serde(default)]
    pub name: String,

    pub grid_pitch: i64,
    pub w: i64,
    pub h: i64,
    pub player_x: i64,
    pub player_y: i64,
    pub player_squishable: bool,

    /// One entry per grid cell, row-major; `true` places a block
    pub block_map: Vec<bool>,
    /// Special kind -> how many plain blocks to convert
    pub special_counts: BTreeMap<BlockSpecial, SpecialCountRange>,

    /// Inclusive `[low, high]` population ranges, sampled once per
    /// generation
    pub basic_monster_count: (i64, i64),
    pub power_monster_count: (i64, i64),
    pub power_monsters_can_push: bool,

    pub player_move_speed: i64,
    pub basic_monster_move_speed: i64,
    pub power_monster_move_speed: i64,
    pub push_speed: i64,
    pub bomb_speed: i64,
    pub bounce_speed_absorption: i64,
    pub block_destroy_rate: f32,
}

/// The whole world: one player (also a member of the monster set), the
/// monsters, the blocks, the explosion effects, and the parameters that
/// built them.
#[derive(Debug, Clone)]
pub struct LevelState {
    pub(crate) params: GenerationParameters,

    pub(crate) player: MonsterId,
    pub(crate) monsters: Vec<Monster>,
    pub(crate) blocks: Vec<Block>,
    pub(crate) explosions: Vec<Explosion>,

    pub(crate) frames_executed: i64,
    pub(crate) frames_between_monsters: i64,
}

impl LevelState {
    /// Build a level from generation parameters.
    ///
    /// Fails only if the block map does not cover the grid exactly; every
    /// other malformation is left for `validate` so a caller can inspect a
    /// broken level instead of never receiving it.
    pub fn generate(
        params: &GenerationParameters,
        rng: &mut Pcg32,
    ) -> Result<LevelState, LevelError> {
        let pitch = params.grid_pitch.max(1);
        let w_cells = (params.w / pitch) as usize;
        let h_cells = (params.h / pitch) as usize;
        if params.block_map.len() != w_cells * h_cells {
            return Err(LevelError::BlockMapSizeMismatch {
                expected: w_cells * h_cells,
                actual: params.block_map.len(),
            });
        }

        let mut level = LevelState {
            params: params.clone(),
            player: MonsterId(0),
            monsters: Vec::new(),
            blocks: Vec::new(),
            explosions: Vec::new(),
            frames_executed: 0,
            frames_between_monsters: FRAMES_BETWEEN_MONSTERS,
        };

        // the player is a monster, technically
        let mut player_flags = MonsterFlags::IS_PLAYER
            | MonsterFlags::CAN_PUSH_BLOCKS
            | MonsterFlags::CAN_DESTROY_BLOCKS;
        if params.player_squishable {
            player_flags |= MonsterFlags::SQUISHABLE;
        }
        let mut player = Monster::new(
            I64Vec2::new(params.player_x, params.player_y),
            player_flags,
        );
        player.move_speed = params.player_move_speed;
        player.push_speed = params.push_speed;
        player.block_destroy_rate = params.block_destroy_rate;
        level.monsters.push(player);

        // materialize one block per occupied cell
        for row in 0..h_cells {
            for col in 0..w_cells {
                if params.block_map[row * w_cells + col] {
                    let mut block =
                        Block::new(I64Vec2::new(col as i64 * pitch, row as i64 * pitch));
                    block.bounce_speed_absorption = params.bounce_speed_absorption;
                    block.bomb_speed = params.bomb_speed;
                    level.blocks.push(block);
                }
            }
        }

        // replace random blocks with monsters until there are enough of
        // them (the +1 accounts for the player already being in the set)
        let basic_count = sample_inclusive(rng, params.basic_monster_count);
        let power_count = sample_inclusive(rng, params.power_monster_count);
        while (level.monsters.len() as i64) < basic_count + power_count + 1 {
            if level.blocks.is_empty() {
                log::warn!("ran out of blocks while placing monsters");
                break;
            }
            let index = rng.random_range(0..level.blocks.len());
            let is_power = level.monsters.len() as i64 >= basic_count + 1;

            let mut flags = MonsterFlags::SQUISHABLE | MonsterFlags::KILLS_PLAYERS;
            if is_power {
                flags |= MonsterFlags::IS_POWER;
                if params.power_monsters_can_push {
                    flags |= MonsterFlags::CAN_PUSH_BLOCKS;
                }
            }
            let mut monster = Monster::new(level.blocks[index].pos, flags);
            monster.move_speed = if is_power {
                params.power_monster_move_speed
            } else {
                params.basic_monster_move_speed
            };
            monster.push_speed = params.push_speed;
            monster.block_destroy_rate = params.block_destroy_rate;
            level.monsters.push(monster);
            let _ = level.blocks.swap_remove(index);
        }

        level.assign_specials(rng);
        Ok(level)
    }

    /// Convert a random subset of the remaining plain blocks into specials.
    /// Exhausting the pool silently truncates further assignment.
    fn assign_specials(&mut self, rng: &mut Pcg32) {
        let mut remaining: Vec<usize> = (0..self.blocks.len()).collect();
        let special_counts = self.params.special_counts.clone();
        for (&special, &range) in &special_counts {
            let count = range.sample(rng);
            for _ in 0..count {
                if remaining.is_empty() {
                    return; // all blocks have specials already
                }
                let pick = rng.random_range(0..remaining.len());
                let block_index = remaining.swap_remove(pick);
                let block = &mut self.blocks[block_index];
                block.special = special;

                match special {
                    BlockSpecial::None
                    | BlockSpecial::Points
                    | BlockSpecial::ExtraLife
                    | BlockSpecial::SkipLevels
                    | BlockSpecial::Invincibility
                    | BlockSpecial::Speed
                    | BlockSpecial::TimeStop
                    | BlockSpecial::ThrowBombs
                    | BlockSpecial::KillsMonsters => {
                        // run-time handling only
                    }
                    BlockSpecial::Indestructible => {
                        block.flags.remove(BlockFlags::DESTRUCTIBLE);
                    }
                    BlockSpecial::Immovable => {
                        block.flags.remove(BlockFlags::PUSHABLE);
                    }
                    BlockSpecial::IndestructibleAndImmovable => {
                        block
                            .flags
                            .remove(BlockFlags::DESTRUCTIBLE | BlockFlags::PUSHABLE);
                    }
                    BlockSpecial::Brittle => {
                        block.flags.insert(BlockFlags::BRITTLE);
                    }
                    BlockSpecial::Bouncy => {
                        block.flags.insert(BlockFlags::BOUNCY);
                    }
                    BlockSpecial::Bomb => {
                        block.flags.insert(BlockFlags::IS_BOMB);
                    }
                    BlockSpecial::BouncyBomb => {
                        block.flags.insert(BlockFlags::IS_BOMB | BlockFlags::BOUNCY);
                    }
                    BlockSpecial::CreatesMonsters => {
                        block.frames_until_action = self.frames_between_monsters;
                        // spawned-monster kills are credited to the player
                        block.owner = Some(self.player);
                    }
                }
            }
        }
    }

    /// Check that the level will behave properly when `exec_frame` is
    /// called. Never mutates state; may be invoked at any time.
    pub fn validate(&self) -> Result<(), LevelError> {
        let pitch = self.params.grid_pitch;
        if pitch == 0 {
            return Err(LevelError::ZeroGridPitch);
        }
        if self.params.w == 0 || self.params.h == 0 {
            return Err(LevelError::ZeroDimension);
        }
        if self.params.w % pitch != 0 || self.params.h % pitch != 0 {
            return Err(LevelError::MisalignedDimensions);
        }

        // no blocks may overlap or sit outside the boundaries
        for (i, block) in self.blocks.iter().enumerate() {
            if !self.is_within_bounds(block.pos) {
                return Err(LevelError::BlockOutOfBounds {
                    x: block.pos.x,
                    y: block.pos.y,
                });
            }
            for other in &self.blocks[i + 1..] {
                if geometry::check_stationary_collision(block.pos, other.pos, pitch) {
                    return Err(LevelError::BlocksOverlap {
                        x1: block.pos.x,
                        y1: block.pos.y,
                        x2: other.pos.x,
                        y2: other.pos.y,
                    });
                }
            }
        }

        // monsters may overlap each other but must stay in bounds, and
        // their speeds must evenly divide the grid pitch
        for monster in &self.monsters {
            if !self.is_within_bounds(monster.pos) {
                return Err(LevelError::MonsterOutOfBounds {
                    x: monster.pos.x,
                    y: monster.pos.y,
                });
            }
            if monster.move_speed == 0 || pitch % monster.move_speed != 0 {
                return Err(LevelError::InvalidMoveSpeed {
                    speed: monster.move_speed,
                    pitch,
                });
            }
            let can_push = monster.flags.contains(MonsterFlags::CAN_PUSH_BLOCKS);
            if monster.push_speed == 0 && can_push {
                return Err(LevelError::NoPushSpeed {
                    x: monster.pos.x,
                    y: monster.pos.y,
                });
            }
            if monster.push_speed != 0 && pitch % monster.push_speed != 0 {
                return Err(LevelError::InvalidPushSpeed {
                    speed: monster.push_speed,
                    pitch,
                });
            }
        }

        Ok(())
    }

    // --- read-only accessors (the renderer contract) ---

    pub fn params(&self) -> &GenerationParameters {
        &self.params
    }

    pub fn player_id(&self) -> MonsterId {
        self.player
    }

    pub fn player(&self) -> &Monster {
        &self.monsters[self.player.0 as usize]
    }

    pub fn monster(&self, id: MonsterId) -> &Monster {
        &self.monsters[id.0 as usize]
    }

    pub fn monsters(&self) -> &[Monster] {
        &self.monsters
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn explosions(&self) -> &[Explosion] {
        &self.explosions
    }

    pub fn updates_per_second(&self) -> f32 {
        crate::consts::UPDATES_PER_SECOND
    }

    pub fn frames_executed(&self) -> i64 {
        self.frames_executed
    }

    pub fn frames_between_monsters(&self) -> i64 {
        self.frames_between_monsters
    }

    /// Count living monsters whose flags, masked by `mask`, equal `flags`.
    /// The caller's level-completion check counts non-player monsters with
    /// `count_monsters_with_flags(MonsterFlags::empty(), MonsterFlags::IS_PLAYER)`.
    pub fn count_monsters_with_flags(&self, flags: MonsterFlags, mask: MonsterFlags) -> i64 {
        self.monsters
            .iter()
            .filter(|m| m.is_alive() && m.flags & mask == flags)
            .count() as i64
    }

    /// Count blocks carrying a given special kind.
    pub fn count_blocks_with_special(&self, special: BlockSpecial) -> i64 {
        self.blocks.iter().filter(|b| b.special == special).count() as i64
    }

    // --- grid queries shared with the frame engine ---

    pub(crate) fn is_aligned(&self, z: i64) -> bool {
        geometry::is_aligned(z, self.params.grid_pitch)
    }

    pub(crate) fn is_fully_aligned(&self, pos: I64Vec2) -> bool {
        self.is_aligned(pos.x) && self.is_aligned(pos.y)
    }

    pub(crate) fn is_within_bounds(&self, pos: I64Vec2) -> bool {
        let pitch = self.params.grid_pitch;
        pos.x >= 0
            && pos.x <= self.params.w - pitch
            && pos.y >= 0
            && pos.y <= self.params.h - pitch
    }

    /// Find the block at the given exact position.
    pub(crate) fn find_block(&self, pos: I64Vec2) -> Option<usize> {
        self.blocks.iter().position(|b| b.pos == pos)
    }

    /// Can an entire square fit at the given position without leaving the
    /// level or intersecting a block? Monsters are not considered.
    pub(crate) fn space_is_empty(&self, pos: I64Vec2) -> bool {
        let pitch = self.params.grid_pitch;
        if pos.x < 0 || pos.y < 0 || pos.x >= self.params.w || pos.y >= self.params.h {
            return false;
        }
        !self
            .blocks
            .iter()
            .any(|b| geometry::check_stationary_collision(b.pos, pos, pitch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    pub(crate) fn empty_params(w_cells: i64, h_cells: i64) -> GenerationParameters {
        GenerationParameters {
            name: String::new(),
            grid_pitch: 16,
            w: w_cells * 16,
            h: h_cells * 16,
            player_x: 0,
            player_y: 0,
            player_squishable: true,
            block_map: vec![false; (w_cells * h_cells) as usize],
            special_counts: BTreeMap::new(),
            basic_monster_count: (0, 0),
            power_monster_count: (0, 0),
            power_monsters_can_push: false,
            player_move_speed: 4,
            basic_monster_move_speed: 2,
            power_monster_move_speed: 4,
            push_speed: 8,
            bomb_speed: 8,
            bounce_speed_absorption: 8,
            block_destroy_rate: 0.02,
        }
    }

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(7)
    }

    #[test]
    fn test_generate_places_blocks_from_map() {
        let mut params = empty_params(4, 3);
        params.block_map[1] = true; // cell (1, 0)
        params.block_map[4 + 2] = true; // cell (2, 1)
        let level = LevelState::generate(&params, &mut rng()).unwrap();
        assert_eq!(level.blocks().len(), 2);
        assert!(level.find_block(I64Vec2::new(16, 0)).is_some());
        assert!(level.find_block(I64Vec2::new(32, 16)).is_some());
        level.validate().unwrap();
    }

    #[test]
    fn test_generate_rejects_bad_block_map() {
        let mut params = empty_params(4, 3);
        params.block_map.pop();
        assert!(matches!(
            LevelState::generate(&params, &mut rng()),
            Err(LevelError::BlockMapSizeMismatch { .. })
        ));
    }

    #[test]
    fn test_monsters_replace_blocks() {
        let mut params = empty_params(4, 4);
        for cell in params.block_map.iter_mut().skip(4) {
            *cell = true; // rows 1..4 full
        }
        params.basic_monster_count = (2, 2);
        params.power_monster_count = (1, 1);
        params.power_monsters_can_push = true;
        let level = LevelState::generate(&params, &mut rng()).unwrap();

        assert_eq!(level.monsters().len(), 4); // player + 2 basic + 1 power
        assert_eq!(level.blocks().len(), 12 - 3);
        assert_eq!(
            level.count_monsters_with_flags(MonsterFlags::IS_POWER, MonsterFlags::IS_POWER),
            1
        );
        let power = level
            .monsters()
            .iter()
            .find(|m| m.flags.contains(MonsterFlags::IS_POWER))
            .unwrap();
        assert!(power.flags.contains(MonsterFlags::CAN_PUSH_BLOCKS));
        assert_eq!(power.move_speed, params.power_monster_move_speed);
        // non-player monsters start locked out by their spawn animation
        assert_eq!(power.integrity, 0.0);
        assert_eq!(level.player().integrity, 1.0);
        level.validate().unwrap();
    }

    #[test]
    fn test_special_assignment_truncates_when_pool_empty() {
        let mut params = empty_params(3, 3);
        params.block_map[4] = true; // a single block
        params
            .special_counts
            .insert(BlockSpecial::Points, SpecialCountRange::Exact(5));
        let level = LevelState::generate(&params, &mut rng()).unwrap();
        assert_eq!(level.count_blocks_with_special(BlockSpecial::Points), 1);
    }

    #[test]
    fn test_generator_blocks_are_armed_and_owned() {
        let mut params = empty_params(3, 3);
        params.block_map[4] = true;
        params
            .special_counts
            .insert(BlockSpecial::CreatesMonsters, SpecialCountRange::Exact(1));
        let level = LevelState::generate(&params, &mut rng()).unwrap();
        let block = &level.blocks()[0];
        assert_eq!(block.special, BlockSpecial::CreatesMonsters);
        assert_eq!(block.frames_until_action, level.frames_between_monsters());
        assert_eq!(block.owner, Some(level.player_id()));
    }

    #[test]
    fn test_validate_rejects_overlapping_blocks() {
        let mut params = empty_params(4, 3);
        params.block_map[1] = true;
        let mut level = LevelState::generate(&params, &mut rng()).unwrap();
        let mut overlapping = Block::new(I64Vec2::new(24, 8));
        overlapping.bounce_speed_absorption = 8;
        level.blocks.push(overlapping);
        assert!(matches!(
            level.validate(),
            Err(LevelError::BlocksOverlap { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_speeds() {
        let mut params = empty_params(4, 3);
        params.player_move_speed = 5; // does not divide 16
        let level = LevelState::generate(&params, &mut rng()).unwrap();
        assert!(matches!(
            level.validate(),
            Err(LevelError::InvalidMoveSpeed { speed: 5, pitch: 16 })
        ));
    }

    #[test]
    fn test_space_is_empty_respects_bounds_and_blocks() {
        let mut params = empty_params(4, 3);
        params.block_map[1] = true;
        let level = LevelState::generate(&params, &mut rng()).unwrap();
        assert!(level.space_is_empty(I64Vec2::new(0, 16)));
        assert!(!level.space_is_empty(I64Vec2::new(16, 0))); // block there
        assert!(!level.space_is_empty(I64Vec2::new(8, 0))); // overlaps it
        assert!(!level.space_is_empty(I64Vec2::new(-16, 0))); // out of bounds
    }
}
