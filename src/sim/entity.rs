//! Entity model: monsters, blocks, explosions
//!
//! Behavioral variation (player vs. basic vs. power monster, plain vs.
//! bouncy vs. brittle block) is expressed entirely through flag bitsets.
//! There is no entity hierarchy; the simulation loop branches on flag tests
//! over homogeneous collections.

use std::collections::BTreeMap;

use bitflags::bitflags;
use glam::I64Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{ALIVE, DEFAULT_BLOCK_DESTROY_RATE};

bitflags! {
    /// One directional/action intent bit per frame, aggregated from held
    /// keys by the caller for the player and computed by the engine for
    /// autonomous monsters.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct Impulse: u64 {
        const UP    = 0x01;
        const DOWN  = 0x02;
        const LEFT  = 0x04;
        const RIGHT = 0x08;
        const PUSH  = 0x10;
    }
}

impl Impulse {
    /// Collapse a multi-bit impulse to a single direction. Enumeration
    /// order is Left, Right, Up, Down.
    pub fn collapse(self) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|d| self.contains(d.impulse()))
    }
}

/// The four grid directions. Unlike an impulse mask, a `Direction` is
/// always concrete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Canonical enumeration order (also the impulse collapse order).
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    /// Unit cell offset for this direction. Y grows downward.
    pub fn offsets(self) -> I64Vec2 {
        match self {
            Direction::Left => I64Vec2::new(-1, 0),
            Direction::Right => I64Vec2::new(1, 0),
            Direction::Up => I64Vec2::new(0, -1),
            Direction::Down => I64Vec2::new(0, 1),
        }
    }

    pub fn impulse(self) -> Impulse {
        match self {
            Direction::Left => Impulse::LEFT,
            Direction::Right => Impulse::RIGHT,
            Direction::Up => Impulse::UP,
            Direction::Down => Impulse::DOWN,
        }
    }
}

/// Bonus/hazard tag on a block. Some kinds convert to permanent block flags
/// at generation time; the rest convert to score records or timed monster
/// power-ups when the block is destroyed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum BlockSpecial {
    #[default]
    None,
    Points,
    ExtraLife,
    SkipLevels,
    Indestructible,
    IndestructibleAndImmovable,
    Immovable,
    Brittle,
    Bomb,
    Bouncy,
    BouncyBomb,
    CreatesMonsters,
    Invincibility,
    Speed,
    TimeStop,
    ThrowBombs,
    KillsMonsters,
}

impl BlockSpecial {
    /// Human-readable name for on-screen annotations.
    pub fn display_name(self) -> &'static str {
        match self {
            BlockSpecial::None => "None",
            BlockSpecial::Points => "Points",
            BlockSpecial::ExtraLife => "Extra Life",
            BlockSpecial::SkipLevels => "Level Skip",
            BlockSpecial::Indestructible => "Indestructible",
            BlockSpecial::IndestructibleAndImmovable => "Indestructible",
            BlockSpecial::Immovable => "Immovable",
            BlockSpecial::Brittle => "Brittle",
            BlockSpecial::Bomb => "Bomb",
            BlockSpecial::Bouncy => "Bouncy",
            BlockSpecial::BouncyBomb => "Bouncy Bomb",
            BlockSpecial::CreatesMonsters => "Monster Generator",
            BlockSpecial::Invincibility => "Invincibility",
            BlockSpecial::Speed => "Speed",
            BlockSpecial::TimeStop => "Time Stop",
            BlockSpecial::ThrowBombs => "Bombs",
            BlockSpecial::KillsMonsters => "Rampage",
        }
    }
}

bitflags! {
    /// Monster capability set. The sole polymorphism mechanism for
    /// player/basic-monster/power-monster behavior.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct MonsterFlags: u64 {
        const IS_PLAYER          = 0x0001;
        const IS_POWER           = 0x0002;
        const CAN_PUSH_BLOCKS    = 0x0004;
        const CAN_DESTROY_BLOCKS = 0x0008;
        const BLOCKS_PLAYERS     = 0x0010;
        const BLOCKS_MONSTERS    = 0x0020;
        const SQUISHABLE         = 0x0040;
        const KILLS_PLAYERS      = 0x0080;
        const KILLS_MONSTERS     = 0x0100;
        const INVINCIBLE         = 0x0200;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct BlockFlags: u64 {
        const PUSHABLE       = 0x01;
        const DESTRUCTIBLE   = 0x02;
        const BOUNCY         = 0x04;
        const KILLS_PLAYERS  = 0x08;
        const KILLS_MONSTERS = 0x10;
        const IS_BOMB        = 0x20;
        const BRITTLE        = 0x40;
        /// Only explodes once it has fully stopped moving
        const DELAYED_BOMB   = 0x80;
    }
}

impl BlockFlags {
    /// Flags for a plain generated block.
    pub fn plain() -> BlockFlags {
        BlockFlags::PUSHABLE
            | BlockFlags::DESTRUCTIBLE
            | BlockFlags::KILLS_PLAYERS
            | BlockFlags::KILLS_MONSTERS
    }
}

/// Stable handle into the world's monster collection. Monsters are never
/// physically removed, so an id stays valid for the lifetime of the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonsterId(pub u32);

/// A monster (the player included). Created once, mutated in place,
/// logically deleted by setting `death_frame`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Monster {
    pub pos: I64Vec2,
    /// Axis-exclusive: at most one component is ever non-zero
    pub vel: I64Vec2,

    // these speeds must evenly divide the level's grid pitch or movement
    // and collisions won't work properly; validate() enforces this
    pub move_speed: i64,
    pub push_speed: i64,
    pub block_destroy_rate: f32,

    /// Starts at 0 and rises to 1; the monster cannot act until it gets
    /// there (its spawn animation). Players start at 1.
    pub integrity: f32,

    /// Frame index at which this monster died, or `ALIVE` (-1)
    pub death_frame: i64,

    pub facing: Direction,

    /// What this monster wants to do next. For the player this is supplied
    /// to `exec_frame` every tick; for autonomous monsters the engine
    /// computes it.
    pub control_impulse: Impulse,

    pub flags: MonsterFlags,

    /// Active timed power-up -> frames remaining
    pub specials: BTreeMap<BlockSpecial, i64>,
}

impl Monster {
    pub fn new(pos: I64Vec2, flags: MonsterFlags) -> Monster {
        let is_player = flags.contains(MonsterFlags::IS_PLAYER);
        Monster {
            pos,
            vel: I64Vec2::ZERO,
            move_speed: 4,
            push_speed: 8,
            block_destroy_rate: DEFAULT_BLOCK_DESTROY_RATE,
            // the player gets full integrity immediately so it can move on
            // frame 0
            integrity: if is_player { 1.0 } else { 0.0 },
            death_frame: ALIVE,
            facing: Direction::Up,
            control_impulse: Impulse::empty(),
            flags,
            specials: BTreeMap::new(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.death_frame == ALIVE
    }

    pub fn is_player(&self) -> bool {
        self.flags.contains(MonsterFlags::IS_PLAYER)
    }

    /// Does this monster currently hold the given timed special? Presence
    /// of the timer entry is the test, so every kind must write one.
    pub fn has_special(&self, special: BlockSpecial) -> bool {
        self.specials.contains_key(&special)
    }

    /// Grant a timed special for `frames` frames.
    ///
    /// Any special kind not listed here reaching this path is an engine
    /// defect, not something level data can trigger.
    pub fn add_special(&mut self, special: BlockSpecial, frames: i64) {
        match special {
            BlockSpecial::TimeStop | BlockSpecial::ThrowBombs => {
                // no flag or stat changes; only the timer entry matters
            }
            BlockSpecial::Invincibility => {
                self.flags.insert(MonsterFlags::INVINCIBLE);
            }
            BlockSpecial::Speed => {
                if !self.has_special(BlockSpecial::Speed) {
                    self.move_speed *= 2;
                    self.push_speed *= 2;
                    self.block_destroy_rate *= 2.0;
                }
                // reacquisition only refreshes the timer below
            }
            BlockSpecial::KillsMonsters => {
                // if the monster kills monsters as a base capability, the
                // bonus does nothing; if it only kills via the timed
                // version, re-arm it
                if !self.flags.contains(MonsterFlags::KILLS_MONSTERS)
                    || self.has_special(BlockSpecial::KillsMonsters)
                {
                    self.flags.insert(MonsterFlags::KILLS_MONSTERS);
                }
            }
            other => panic!("unimplemented special addition action: {other:?}"),
        }

        // every kind gets a timer entry, including TimeStop/ThrowBombs;
        // has_special depends on this
        self.specials.insert(special, frames);
    }

    /// Tick down every active special; reverse and remove the ones that
    /// reach zero. Called once per monster per frame.
    pub fn attenuate_and_delete_specials(&mut self) {
        let mut expired = Vec::new();
        for (special, frames) in self.specials.iter_mut() {
            *frames -= 1;
            if *frames == 0 {
                expired.push(*special);
            }
        }
        for special in expired {
            self.specials.remove(&special);
            match special {
                BlockSpecial::KillsMonsters => {
                    self.flags.remove(MonsterFlags::KILLS_MONSTERS);
                }
                BlockSpecial::Invincibility => {
                    self.flags.remove(MonsterFlags::INVINCIBLE);
                }
                BlockSpecial::Speed => {
                    self.move_speed /= 2;
                    self.push_speed /= 2;
                    self.block_destroy_rate /= 2.0;
                }
                BlockSpecial::TimeStop | BlockSpecial::ThrowBombs => {}
                other => panic!("unimplemented special removal action: {other:?}"),
            }
        }
    }
}

/// A grid-cell obstacle. Physically removed from the world once its
/// integrity reaches zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub pos: I64Vec2,
    /// Axis-exclusive, like monster velocity
    pub vel: I64Vec2,

    /// The monster that set this block in motion, for score attribution
    pub owner: Option<MonsterId>,
    /// Reset whenever a new push begins; scales the per-kill score
    pub monsters_killed_this_push: i64,

    pub bounce_speed_absorption: i64,
    pub bomb_speed: i64,

    /// 0 until a destructive interaction starts the block decaying
    pub decay_rate: f32,
    /// 1 = intact; the block is deleted when this reaches 0
    pub integrity: f32,

    pub special: BlockSpecial,
    pub flags: BlockFlags,

    /// Spawn countdown for CreatesMonsters blocks
    pub frames_until_action: i64,
}

impl Block {
    pub fn new(pos: I64Vec2) -> Block {
        Block {
            pos,
            vel: I64Vec2::ZERO,
            owner: None,
            monsters_killed_this_push: 0,
            bounce_speed_absorption: 0,
            bomb_speed: 0,
            decay_rate: 0.0,
            integrity: 1.0,
            special: BlockSpecial::None,
            flags: BlockFlags::plain(),
            frames_until_action: 0,
        }
    }

    pub fn is_moving(&self) -> bool {
        self.vel != I64Vec2::ZERO
    }
}

/// Transient visual effect left behind by a detonation. No gameplay effect;
/// integrity starts at 1.0 but drops to 0.5 after the first frame (the
/// extra-bright flash), then decays at its own rate until deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explosion {
    pub pos: I64Vec2,
    pub decay_rate: f32,
    pub integrity: f32,
}

impl Explosion {
    pub fn new(pos: I64Vec2, decay_rate: f32) -> Explosion {
        Explosion {
            pos,
            decay_rate,
            integrity: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monster() -> Monster {
        Monster::new(I64Vec2::ZERO, MonsterFlags::SQUISHABLE | MonsterFlags::KILLS_PLAYERS)
    }

    #[test]
    fn test_collapse_order() {
        let all = Impulse::LEFT | Impulse::RIGHT | Impulse::UP | Impulse::DOWN;
        assert_eq!(all.collapse(), Some(Direction::Left));
        assert_eq!((Impulse::UP | Impulse::DOWN).collapse(), Some(Direction::Up));
        assert_eq!(Impulse::PUSH.collapse(), None);
        assert_eq!(Impulse::empty().collapse(), None);
    }

    #[test]
    fn test_speed_special_doubles_then_restores() {
        let mut m = monster();
        m.add_special(BlockSpecial::Speed, 300);
        assert_eq!(m.move_speed, 8);
        assert_eq!(m.push_speed, 16);
        assert!((m.block_destroy_rate - 0.04).abs() < 1e-6);

        for _ in 0..300 {
            m.attenuate_and_delete_specials();
        }
        assert_eq!(m.move_speed, 4);
        assert_eq!(m.push_speed, 8);
        assert!((m.block_destroy_rate - 0.02).abs() < 1e-6);
        assert!(!m.has_special(BlockSpecial::Speed));
    }

    #[test]
    fn test_speed_reacquisition_only_refreshes_timer() {
        let mut m = monster();
        m.add_special(BlockSpecial::Speed, 300);
        for _ in 0..100 {
            m.attenuate_and_delete_specials();
        }
        m.add_special(BlockSpecial::Speed, 300);
        // stats are not doubled again
        assert_eq!(m.move_speed, 8);
        assert_eq!(m.specials[&BlockSpecial::Speed], 300);
    }

    #[test]
    fn test_time_stop_still_writes_a_timer() {
        let mut m = monster();
        m.add_special(BlockSpecial::TimeStop, 300);
        assert!(m.has_special(BlockSpecial::TimeStop));
        for _ in 0..300 {
            m.attenuate_and_delete_specials();
        }
        assert!(!m.has_special(BlockSpecial::TimeStop));
    }

    #[test]
    fn test_kills_monsters_writes_timer_even_with_base_capability() {
        let mut m = monster();
        m.flags.insert(MonsterFlags::KILLS_MONSTERS);
        m.add_special(BlockSpecial::KillsMonsters, 300);
        // the flag was already set; only the timer entry is new
        assert!(m.has_special(BlockSpecial::KillsMonsters));
        assert!(m.flags.contains(MonsterFlags::KILLS_MONSTERS));
    }

    #[test]
    fn test_invincibility_flag_round_trip() {
        let mut m = monster();
        m.add_special(BlockSpecial::Invincibility, 2);
        assert!(m.flags.contains(MonsterFlags::INVINCIBLE));
        m.attenuate_and_delete_specials();
        assert!(m.flags.contains(MonsterFlags::INVINCIBLE));
        m.attenuate_and_delete_specials();
        assert!(!m.flags.contains(MonsterFlags::INVINCIBLE));
    }
}
