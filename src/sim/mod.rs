//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only (one `exec_frame` call per tick)
//! - Seeded RNG only, threaded in explicitly by the caller
//! - No rendering, audio, or platform dependencies

pub mod entity;
pub mod geometry;
pub mod state;
pub mod tick;

pub use entity::{
    Block, BlockFlags, BlockSpecial, Direction, Explosion, Impulse, Monster, MonsterFlags,
    MonsterId,
};
pub use geometry::{check_moving_collision, check_stationary_collision, is_aligned};
pub use state::{GenerationParameters, LevelError, LevelState, SpecialCountRange};
pub use tick::{EventMask, FrameEvents, ScoreInfo};
