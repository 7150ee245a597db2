//! Treads - a grid-based block-pushing arcade game engine
//!
//! Core modules:
//! - `sim`: Deterministic simulation (grid physics, game rules, scoring)
//! - `maze`: DFS block-map generator for random levels
//! - `levels`: Level-definition JSON loading

pub mod levels;
pub mod maze;
pub mod sim;

pub use levels::load_level_set;
pub use sim::{
    Block, BlockFlags, BlockSpecial, Direction, EventMask, Explosion, FrameEvents,
    GenerationParameters, Impulse, LevelError, LevelState, Monster, MonsterFlags, MonsterId,
    ScoreInfo,
};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation rate (frames per second)
    pub const UPDATES_PER_SECOND: f32 = 30.0;

    /// Integrity gained per frame while a monster is still spawning
    pub const INTEGRITY_REGEN: f32 = 0.01;

    /// Duration of every timed special, in frames (10 seconds)
    pub const SPECIAL_DURATION_FRAMES: i64 = 300;

    /// Frames between spawns from a monster-generator block
    pub const FRAMES_BETWEEN_MONSTERS: i64 = 300;

    /// Decay rate applied when a block is destroyed with no monster to
    /// attribute it to (e.g. an explosion from an ownerless bomb)
    pub const DEFAULT_BLOCK_DESTROY_RATE: f32 = 0.02;

    /// Explosion effects lose this much integrity on their first frame...
    pub const EXPLOSION_FIRST_FRAME_DROP: f32 = 0.5;
    /// ...and this much on every frame after
    pub const EXPLOSION_DECAY_RATE: f32 = 0.05;

    /// Dead-monster sentinel for `Monster::death_frame`
    pub const ALIVE: i64 = -1;
}

/// Sign of an integer as -1, 0, or 1
#[inline]
pub fn sgn(x: i64) -> i64 {
    (x > 0) as i64 - (x < 0) as i64
}
