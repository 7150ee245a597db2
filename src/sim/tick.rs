//! Frame simulation engine
//!
//! `exec_frame` advances the whole world by one fixed tick. The order of
//! actions within a tick is load-bearing:
//! 1. everyone decides what they want to do (control impulses); aligned
//!    monsters and players also update facing/velocity
//! 2. push/destroy/bomb-throw impulses are applied to blocks
//! 3. blocks decay according to their decay rates
//! 4. monster specials attenuate and eventually disappear
//! 5. blocks move (and may squish monsters or detonate)
//! 6. monsters and players move
//! 7. monster-generator blocks count down and spawn
//! 8. explosion effects fade out
//!
//! This order means we never have to find out where a block/monster used to
//! be before this frame: everything that depends on alignment (especially
//! step 2) happens before any motion is applied.

use bitflags::bitflags;
use glam::I64Vec2;
use rand::seq::SliceRandom;
use rand::Rng;
use rand_pcg::Pcg32;

use super::entity::{
    Block, BlockFlags, BlockSpecial, Direction, Explosion, Impulse, Monster, MonsterFlags,
    MonsterId,
};
use super::geometry;
use super::state::LevelState;
use crate::consts::{
    DEFAULT_BLOCK_DESTROY_RATE, EXPLOSION_DECAY_RATE, EXPLOSION_FIRST_FRAME_DROP, INTEGRITY_REGEN,
    SPECIAL_DURATION_FRAMES,
};
use crate::sgn;

bitflags! {
    /// Everything noteworthy that happened during one frame. One bit per
    /// event kind so the caller can trigger each sound at most once per
    /// frame; bit values are stable for the audio lookup table.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EventMask: u64 {
        const BLOCK_PUSHED     = 0x0001;
        const MONSTER_SQUISHED = 0x0002;
        const MONSTER_KILLED   = 0x0004;
        const PLAYER_KILLED    = 0x0008;
        const BONUS_COLLECTED  = 0x0010;
        const BLOCK_DESTROYED  = 0x0020;
        const BLOCK_BOUNCED    = 0x0040;
        const EXPLOSION        = 0x0080;
        const BLOCK_STOPPED    = 0x0100;
        const PLAYER_SQUISHED  = 0x0200;
        const LIFE_COLLECTED   = 0x0400;
        const MONSTER_CREATED  = 0x0800;
    }
}

/// One score/bonus record. The caller should only apply the point/life/skip
/// deltas when the credited monster is the player, but may annotate the
/// position visually regardless of who earned it.
#[derive(Debug, Clone, Default)]
pub struct ScoreInfo {
    /// The monster credited with the score (a block's owner for squishes)
    pub monster: Option<MonsterId>,
    /// The monster that died, if any. Absent means the score came from a
    /// destroyed bonus block, in which case `block_pos` is set instead.
    pub killed: Option<MonsterId>,
    pub points: i64,
    pub lives: i64,
    pub skip_levels: i64,
    /// Timed special granted by the destroyed block, if any
    pub bonus: Option<BlockSpecial>,
    /// Last position of the destroyed bonus block, for annotation placement
    pub block_pos: Option<I64Vec2>,
}

/// Report returned by `exec_frame`: the event bits plus the score records
/// accumulated during the frame, in the order they occurred.
#[derive(Debug, Clone, Default)]
pub struct FrameEvents {
    pub events: EventMask,
    pub scores: Vec<ScoreInfo>,
}

impl LevelState {
    /// Execute a single frame. `impulses` is the player's aggregated input
    /// for this tick; autonomous monsters compute their own.
    pub fn exec_frame(&mut self, impulses: Impulse, rng: &mut Pcg32) -> FrameEvents {
        let mut ret = FrameEvents::default();
        let pitch = self.params.grid_pitch;

        // (step 0) figure out which monsters are allowed to move. while
        // anyone holds an active TimeStop, everyone else is frozen.
        let time_stop_holders: Vec<bool> = self
            .monsters
            .iter()
            .map(|m| m.has_special(BlockSpecial::TimeStop))
            .collect();
        let time_stopped = time_stop_holders.iter().any(|&h| h);
        let frozen = |i: usize| time_stopped && !time_stop_holders[i];

        // (step 1) monsters update their impulses if their integrity is 1.0;
        // if it's not, their integrity increases a little instead
        for i in 0..self.monsters.len() {
            if !self.monsters[i].is_alive() {
                continue; // dead monsters tell no tales
            }
            if self.monsters[i].integrity < 1.0 {
                self.monsters[i].integrity =
                    (self.monsters[i].integrity + INTEGRITY_REGEN).min(1.0);
                continue; // can't move yet
            }
            if frozen(i) {
                continue; // held by someone else's time stop
            }

            let is_player = self.monsters[i].is_player();
            if is_player {
                self.monsters[i].control_impulse = impulses;
            } else {
                // if the monster isn't aligned, don't bother - it can't
                // change course anyway
                let pos = self.monsters[i].pos;
                if !self.is_fully_aligned(pos) {
                    continue;
                }

                let available: Vec<Direction> = Direction::ALL
                    .into_iter()
                    .filter(|d| self.space_is_empty(pos + d.offsets() * pitch))
                    .collect();

                match available.len() {
                    // boxed in; do nothing this frame
                    0 => continue,
                    1 => self.monsters[i].control_impulse = available[0].impulse(),
                    _ => {
                        // forbid the direction the monster just came from,
                        // then choose at random among the rest
                        let forbidden = self.monsters[i].facing.opposite();
                        let mut order = Direction::ALL;
                        order.shuffle(rng);
                        if let Some(d) = order
                            .into_iter()
                            .find(|d| *d != forbidden && available.contains(d))
                        {
                            self.monsters[i].control_impulse = d.impulse();
                        }
                    }
                }
            }

            // make the monster face in the impulse direction and update its
            // velocity. monsters may only do this when fully aligned;
            // players may redirect along an axis whenever the perpendicular
            // axis is aligned, which lets them reverse mid-cell.
            let monster = &mut self.monsters[i];
            match monster.control_impulse.collapse() {
                None => {
                    if geometry::is_aligned(monster.pos.x, pitch)
                        && geometry::is_aligned(monster.pos.y, pitch)
                    {
                        monster.vel = I64Vec2::ZERO;
                    }
                }
                Some(dir) => {
                    let perpendicular_aligned = match dir {
                        Direction::Left | Direction::Right => {
                            geometry::is_aligned(monster.pos.y, pitch)
                        }
                        Direction::Up | Direction::Down => {
                            geometry::is_aligned(monster.pos.x, pitch)
                        }
                    };
                    let may_redirect = if is_player {
                        perpendicular_aligned
                    } else {
                        geometry::is_aligned(monster.pos.x, pitch)
                            && geometry::is_aligned(monster.pos.y, pitch)
                    };
                    if may_redirect {
                        monster.facing = dir;
                        monster.vel = dir.offsets() * monster.move_speed;
                    }
                }
            }
        }

        // (step 2) apply push/destroy/bomb-throw impulses. the block lookup
        // deliberately happens before the alignment check: pushing requires
        // an aligned monster, but throwing a bomb (a ranged action) doesn't.
        for i in 0..self.monsters.len() {
            if !self.monsters[i].is_alive() || frozen(i) {
                continue;
            }
            if !self.monsters[i]
                .control_impulse
                .contains(Impulse::PUSH)
            {
                continue;
            }

            let monster_pos = self.monsters[i].pos;
            let facing = self.monsters[i].facing;
            let offset = facing.offsets() * pitch;

            if let Some(block_index) = self.find_block(monster_pos + offset) {
                // a block can only be pushed or destroyed by an aligned
                // monster, and only if it isn't already moving
                if !self.is_fully_aligned(monster_pos) {
                    continue;
                }
                if self.blocks[block_index].is_moving() {
                    continue;
                }
                let push_speed = self.monsters[i].push_speed;
                self.apply_push_impulse(
                    block_index,
                    Some(MonsterId(i as u32)),
                    facing,
                    push_speed,
                    &mut ret,
                );
            } else if self.monsters[i].has_special(BlockSpecial::ThrowBombs)
                && self.space_is_empty(monster_pos + offset)
                && self.space_is_empty(monster_pos + offset * 2)
            {
                // no block to push; lob a bomb into the open space instead.
                // it spawns just past the adjacent cell, already moving.
                let push_speed = self.monsters[i].push_speed;
                let mut bomb =
                    Block::new(monster_pos + facing.offsets() * (pitch + push_speed));
                bomb.vel = facing.offsets() * push_speed;
                bomb.owner = Some(MonsterId(i as u32));
                bomb.special = BlockSpecial::Bomb;
                bomb.flags = BlockFlags::plain() | BlockFlags::IS_BOMB | BlockFlags::DELAYED_BOMB;
                bomb.bounce_speed_absorption = self.params.bounce_speed_absorption;
                bomb.bomb_speed = self.params.bomb_speed;
                self.blocks.push(bomb);
            }
        }

        // (step 3) update decaying blocks; fully-decayed blocks are deleted
        self.blocks.retain_mut(|block| {
            block.integrity -= block.decay_rate;
            block.integrity > 0.0
        });

        // (step 4) update monster specials
        for monster in &mut self.monsters {
            monster.attenuate_and_delete_specials();
        }

        // (step 5) moving blocks slide until they hit something that blocks
        // them, squishing things that get in their way and are squishable
        for i in 0..self.blocks.len() {
            let block = &self.blocks[i];
            if !block.is_moving() {
                continue;
            }
            let mut pos = block.pos;
            let mut vel = block.vel;
            let absorption = block.bounce_speed_absorption;
            let owner = block.owner;
            let mut kills_this_push = block.monsters_killed_this_push;
            let mut collision = false;

            // (5.1) collisions with the level edges, modeled as phantom
            // squares just outside the boundary
            for (edge_pos, clamp_x, clamp_y) in [
                (I64Vec2::new(-pitch, pos.y), Some(0), None),
                (I64Vec2::new(self.params.w, pos.y), Some(self.params.w - pitch), None),
                (I64Vec2::new(pos.x, -pitch), None, Some(0)),
                (I64Vec2::new(pos.x, self.params.h), None, Some(self.params.h - pitch)),
            ] {
                if geometry::check_moving_collision(pos, vel, edge_pos, pitch) {
                    if let Some(x) = clamp_x {
                        pos.x = x;
                        vel.x = -vel.x + absorption * sgn(vel.x);
                        ret.events |= bounce_event(vel.x);
                    }
                    if let Some(y) = clamp_y {
                        pos.y = y;
                        vel.y = -vel.y + absorption * sgn(vel.y);
                        ret.events |= bounce_event(vel.y);
                    }
                    collision = true;
                }
            }

            // (5.2) collisions with other blocks: snap flush against the
            // obstacle and bounce away, giving up some speed. blocks can't
            // rest misaligned, so a misaligned (or bouncy) obstacle always
            // produces a fully elastic bounce.
            for j in 0..self.blocks.len() {
                if j == i {
                    continue;
                }
                let other = &self.blocks[j];
                if !geometry::check_moving_collision(pos, vel, other.pos, pitch) {
                    continue;
                }
                let bouncy = other.flags.contains(BlockFlags::BOUNCY);
                if vel.x != 0 {
                    let give_back = if bouncy || !self.is_aligned(other.pos.x) {
                        0
                    } else {
                        absorption
                    };
                    pos.x = other.pos.x - sgn(vel.x) * pitch;
                    vel.x = -vel.x + give_back * sgn(vel.x);
                    ret.events |= bounce_event(vel.x);
                } else {
                    let give_back = if bouncy || !self.is_aligned(other.pos.y) {
                        0
                    } else {
                        absorption
                    };
                    pos.y = other.pos.y - sgn(vel.y) * pitch;
                    vel.y = -vel.y + give_back * sgn(vel.y);
                    ret.events |= bounce_event(vel.y);
                }
                collision = true;
            }

            // (5.3) collisions with monsters: squishable ones die without
            // slowing the block down; anything else is treated like a block
            for k in 0..self.monsters.len() {
                let other = &self.monsters[k];
                if !other.is_alive() {
                    continue;
                }
                if !geometry::check_moving_collision(pos, vel, other.pos, pitch) {
                    continue;
                }

                if other.flags.contains(MonsterFlags::SQUISHABLE)
                    && !other.flags.contains(MonsterFlags::INVINCIBLE)
                {
                    let is_player = other.is_player();
                    kills_this_push += 1;
                    self.monsters[k].death_frame = self.frames_executed;
                    ret.events |= if is_player {
                        EventMask::PLAYER_SQUISHED
                    } else {
                        EventMask::MONSTER_SQUISHED
                    };
                    // each kill in the same push is worth more than the last
                    ret.scores.push(ScoreInfo {
                        monster: owner,
                        killed: Some(MonsterId(k as u32)),
                        points: kills_this_push * 100,
                        ..Default::default()
                    });
                } else {
                    if vel.x != 0 {
                        let give_back = if self.is_aligned(other.pos.x) { absorption } else { 0 };
                        pos.x = other.pos.x - sgn(vel.x) * pitch;
                        vel.x = -vel.x + give_back * sgn(vel.x);
                        ret.events |= bounce_event(vel.x);
                    } else {
                        let give_back = if self.is_aligned(other.pos.y) { absorption } else { 0 };
                        pos.y = other.pos.y - sgn(vel.y) * pitch;
                        vel.y = -vel.y + give_back * sgn(vel.y);
                        ret.events |= bounce_event(vel.y);
                    }
                    collision = true;
                }
            }

            // (5.4) if a collision happened, the position was already
            // clamped; otherwise move incrementally
            if !collision {
                pos += vel;
            }
            let block = &mut self.blocks[i];
            block.pos = pos;
            block.vel = vel;
            block.monsters_killed_this_push = kills_this_push;

            // (5.5) bombs go off once they hit something. delayed bombs
            // (thrown ones) keep bouncing until they've fully stopped.
            let flags = block.flags;
            if collision
                && flags.contains(BlockFlags::IS_BOMB)
                && self.is_fully_aligned(pos)
                && (!flags.contains(BlockFlags::DELAYED_BOMB) || vel == I64Vec2::ZERO)
            {
                self.apply_explosion(i, &mut ret);
            }
        }

        // (step 6) monsters and players move according to their speeds; on
        // block collisions they clamp and slow down, on monster collisions
        // they may stop, die, or continue depending on flags.
        //
        // we can't skip stationary monsters like we do for blocks: a
        // stationary monster can still be run over by one that kills it, and
        // only the current monster may die during its own iteration.
        for i in 0..self.monsters.len() {
            if !self.monsters[i].is_alive() {
                continue;
            }
            let mut pos = self.monsters[i].pos;
            let mut vel = self.monsters[i].vel;
            let is_player = self.monsters[i].is_player();
            let mut collision = false;

            // (6.1) level edges: clamp and stop, never bounce
            for (edge_pos, clamp_x, clamp_y) in [
                (I64Vec2::new(-pitch, pos.y), Some(0), None),
                (I64Vec2::new(self.params.w, pos.y), Some(self.params.w - pitch), None),
                (I64Vec2::new(pos.x, -pitch), None, Some(0)),
                (I64Vec2::new(pos.x, self.params.h), None, Some(self.params.h - pitch)),
            ] {
                if geometry::check_moving_collision(pos, vel, edge_pos, pitch) {
                    if let Some(x) = clamp_x {
                        pos.x = x;
                        vel.x = 0;
                    }
                    if let Some(y) = clamp_y {
                        pos.y = y;
                        vel.y = 0;
                    }
                    collision = true;
                }
            }

            // (6.2) blocks: clamp flush and inherit the slower of the two
            // velocities. we can't just stop, because monsters can't rest on
            // misaligned positions; and the speed may never increase or
            // change sign, or the block would fling the monster.
            for block in &self.blocks {
                if !geometry::check_moving_collision(pos, vel, block.pos, pitch) {
                    continue;
                }
                if vel.x != 0 {
                    pos.x = block.pos.x - sgn(vel.x) * pitch;
                    if block.vel.x.abs() < vel.x.abs() {
                        vel.x = sgn(vel.x) * block.vel.x.abs();
                    }
                } else {
                    pos.y = block.pos.y - sgn(vel.y) * pitch;
                    if block.vel.y.abs() < vel.y.abs() {
                        vel.y = sgn(vel.y) * block.vel.y.abs();
                    }
                }
                collision = true;
            }

            // (6.3) other monsters: a lethal one in stationary contact kills
            // us; a blocking one clamps us like a block does
            let mut killer: Option<usize> = None;
            for k in 0..self.monsters.len() {
                if k == i || !self.monsters[k].is_alive() {
                    continue;
                }
                let other = &self.monsters[k];

                // the player can't be killed while invincible or rampaging,
                // even by monsters that kill players
                let other_kills_us = other.flags.contains(if is_player {
                    MonsterFlags::KILLS_PLAYERS
                } else {
                    MonsterFlags::KILLS_MONSTERS
                });
                let immune = is_player
                    && self.monsters[i]
                        .flags
                        .intersects(MonsterFlags::KILLS_MONSTERS | MonsterFlags::INVINCIBLE);
                if other_kills_us && !immune {
                    if geometry::check_stationary_collision(pos, other.pos, pitch) {
                        killer = Some(k);
                        break;
                    }
                } else if other.flags.contains(if is_player {
                    MonsterFlags::BLOCKS_PLAYERS
                } else {
                    MonsterFlags::BLOCKS_MONSTERS
                }) && geometry::check_moving_collision(pos, vel, other.pos, pitch)
                {
                    if vel.x != 0 {
                        pos.x = other.pos.x - sgn(vel.x) * pitch;
                        vel.x = other.vel.x;
                    } else {
                        pos.y = other.pos.y - sgn(vel.y) * pitch;
                        vel.y = other.vel.y;
                    }
                    collision = true;
                }
            }

            if let Some(k) = killer {
                ret.events |= if is_player {
                    EventMask::PLAYER_KILLED
                } else {
                    EventMask::MONSTER_KILLED
                };
                self.monsters[i].death_frame = self.frames_executed;
                ret.scores.push(ScoreInfo {
                    monster: Some(MonsterId(k as u32)),
                    killed: Some(MonsterId(i as u32)),
                    points: 100,
                    ..Default::default()
                });
                continue;
            }

            // (6.4) the position was already clamped on collision; otherwise
            // move incrementally, unless caught in someone's time stop
            if !collision && !frozen(i) {
                pos += vel;
            }
            self.monsters[i].pos = pos;
            self.monsters[i].vel = vel;
        }

        // (step 7) intact monster-generator blocks count down and spawn
        for i in 0..self.blocks.len() {
            let block = &self.blocks[i];
            if block.special != BlockSpecial::CreatesMonsters || block.integrity < 1.0 {
                continue;
            }
            if block.frames_until_action > 0 {
                self.blocks[i].frames_until_action -= 1;
                continue;
            }

            // never spawn into the cell the generator is itself heading for
            let heading = [
                (block.vel.x < 0, Direction::Left),
                (block.vel.x > 0, Direction::Right),
                (block.vel.y < 0, Direction::Up),
                (block.vel.y > 0, Direction::Down),
            ]
            .into_iter()
            .find_map(|(moving, d)| moving.then_some(d));
            let pos = block.pos;
            let candidates: Vec<Direction> = Direction::ALL
                .into_iter()
                .filter(|d| Some(*d) != heading && self.space_is_empty(pos + d.offsets() * pitch))
                .collect();

            if candidates.is_empty() {
                // completely walled in; the generator destroys itself
                self.apply_explosion(i, &mut ret);
                continue;
            }

            let dir = candidates[rng.random_range(0..candidates.len())];
            let mut monster = Monster::new(
                pos + dir.offsets() * pitch,
                MonsterFlags::SQUISHABLE | MonsterFlags::KILLS_PLAYERS,
            );
            monster.move_speed = self.params.basic_monster_move_speed;
            monster.push_speed = self.params.push_speed;
            monster.block_destroy_rate = self.params.block_destroy_rate;
            monster.facing = dir;
            // already moving outward, even while its spawn animation runs
            monster.vel = dir.offsets() * monster.move_speed;
            self.monsters.push(monster);

            self.blocks[i].frames_until_action = self.frames_between_monsters;
            ret.events |= EventMask::MONSTER_CREATED;
        }

        // (step 8) explosion effects flash bright for one frame, then fade
        self.explosions.retain_mut(|explosion| {
            if explosion.integrity >= 1.0 {
                explosion.integrity -= EXPLOSION_FIRST_FRAME_DROP;
            } else {
                explosion.integrity -= explosion.decay_rate;
            }
            explosion.integrity > 0.0
        });

        self.frames_executed += 1;
        ret
    }

    /// Push or destroy a block on behalf of `monster` (None when the push
    /// comes from an ownerless explosion).
    ///
    /// If the block is pushable and has room behind it, it starts moving;
    /// otherwise, if it's destructible, it starts decaying and its special
    /// takes effect.
    pub(crate) fn apply_push_impulse(
        &mut self,
        block_index: usize,
        monster: Option<MonsterId>,
        direction: Direction,
        speed: i64,
        ret: &mut FrameEvents,
    ) {
        let pitch = self.params.grid_pitch;
        let destroy_rate = monster
            .map(|id| self.monsters[id.0 as usize].block_destroy_rate)
            .unwrap_or(DEFAULT_BLOCK_DESTROY_RATE);

        let space_beyond_empty =
            self.space_is_empty(self.blocks[block_index].pos + direction.offsets() * pitch);
        let block = &mut self.blocks[block_index];
        block.owner = monster;

        if block.flags.contains(BlockFlags::PUSHABLE) && space_beyond_empty {
            block.vel = direction.offsets() * speed;
            block.monsters_killed_this_push = 0;
            ret.events |= EventMask::BLOCK_PUSHED;

            // brittle blocks shatter from the push itself, but still slide
            if block.flags.contains(BlockFlags::BRITTLE) && block.decay_rate == 0.0 {
                block.decay_rate = destroy_rate;
                ret.events |= EventMask::BLOCK_DESTROYED;
            }
        } else if block.flags.contains(BlockFlags::DESTRUCTIBLE) && block.decay_rate == 0.0 {
            block.decay_rate = destroy_rate;
            let special = block.special;
            let block_pos = block.pos;
            match special {
                BlockSpecial::Indestructible | BlockSpecial::IndestructibleAndImmovable => {
                    panic!("indestructible block was destroyed")
                }

                // bombs don't decay gradually; they go off right away
                BlockSpecial::Bomb | BlockSpecial::BouncyBomb => {
                    self.apply_explosion(block_index, ret);
                }

                BlockSpecial::Points => {
                    ret.scores.push(ScoreInfo {
                        monster,
                        points: 100,
                        block_pos: Some(block_pos),
                        ..Default::default()
                    });
                    ret.events |= EventMask::BLOCK_DESTROYED;
                }
                BlockSpecial::None
                | BlockSpecial::Immovable
                | BlockSpecial::Brittle
                | BlockSpecial::Bouncy => {
                    ret.events |= EventMask::BLOCK_DESTROYED;
                }

                BlockSpecial::ExtraLife => {
                    ret.scores.push(ScoreInfo {
                        monster,
                        lives: 1,
                        block_pos: Some(block_pos),
                        ..Default::default()
                    });
                    ret.events |= EventMask::LIFE_COLLECTED;
                }
                BlockSpecial::SkipLevels => {
                    ret.scores.push(ScoreInfo {
                        monster,
                        skip_levels: 1,
                        block_pos: Some(block_pos),
                        ..Default::default()
                    });
                    ret.events |= EventMask::BONUS_COLLECTED;
                }

                BlockSpecial::Invincibility
                | BlockSpecial::Speed
                | BlockSpecial::TimeStop
                | BlockSpecial::ThrowBombs
                | BlockSpecial::KillsMonsters => {
                    if let Some(id) = monster {
                        self.monsters[id.0 as usize].add_special(special, SPECIAL_DURATION_FRAMES);
                    }
                    ret.scores.push(ScoreInfo {
                        monster,
                        bonus: Some(special),
                        block_pos: Some(block_pos),
                        ..Default::default()
                    });
                    ret.events |= EventMask::BONUS_COLLECTED;
                }
                BlockSpecial::CreatesMonsters => {
                    ret.events |= EventMask::BONUS_COLLECTED;
                }
            }
        }
    }

    /// Detonate a bomb block: mark it fully decayed, spawn explosion effects
    /// at its cell and every in-bounds neighbor, push neighboring blocks
    /// outward (possibly chaining into more detonations), and kill exposed
    /// monsters next to it.
    pub(crate) fn apply_explosion(&mut self, block_index: usize, ret: &mut FrameEvents) {
        if self.blocks[block_index].integrity <= 0.0 {
            return; // already going away; this also breaks detonation cycles
        }
        let pitch = self.params.grid_pitch;
        self.blocks[block_index].integrity = 0.0;
        let pos = self.blocks[block_index].pos;
        let owner = self.blocks[block_index].owner;
        let bomb_speed = self.blocks[block_index].bomb_speed;

        ret.events |= EventMask::EXPLOSION;
        self.explosions.push(Explosion::new(pos, EXPLOSION_DECAY_RATE));

        for dir in Direction::ALL {
            let target = pos + dir.offsets() * pitch;
            if !self.is_within_bounds(target) {
                continue;
            }
            self.explosions
                .push(Explosion::new(target, EXPLOSION_DECAY_RATE));

            if let Some(neighbor) = self.find_block(target) {
                // blast the neighbor away from the bomb; blocks already in
                // flight are left alone
                if !self.blocks[neighbor].is_moving() {
                    self.apply_push_impulse(neighbor, owner, dir, bomb_speed, ret);
                }
            } else {
                for k in 0..self.monsters.len() {
                    let monster = &self.monsters[k];
                    if !monster.is_alive()
                        || monster.flags.contains(MonsterFlags::INVINCIBLE)
                        || !geometry::check_stationary_collision(monster.pos, target, pitch)
                    {
                        continue;
                    }
                    let is_player = monster.is_player();
                    self.monsters[k].death_frame = self.frames_executed;
                    ret.events |= if is_player {
                        EventMask::PLAYER_KILLED
                    } else {
                        EventMask::MONSTER_KILLED
                    };
                    ret.scores.push(ScoreInfo {
                        monster: owner,
                        killed: Some(MonsterId(k as u32)),
                        points: 100,
                        ..Default::default()
                    });
                }
            }
        }
    }
}

#[inline]
fn bounce_event(remaining_speed: i64) -> EventMask {
    if remaining_speed != 0 {
        EventMask::BLOCK_BOUNCED
    } else {
        EventMask::BLOCK_STOPPED
    }
}
