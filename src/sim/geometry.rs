//! Grid alignment and collision tests
//!
//! All entities occupy one `pitch x pitch` axis-aligned square whose origin
//! is their position. Velocities are axis-exclusive, so the swept test only
//! ever has to consider motion along a single axis.

use glam::I64Vec2;

/// A coordinate is aligned iff it is an exact multiple of the grid pitch.
#[inline]
pub fn is_aligned(z: i64, pitch: i64) -> bool {
    z % pitch == 0
}

/// Do two stationary squares overlap?
#[inline]
pub fn check_stationary_collision(a: I64Vec2, b: I64Vec2, pitch: i64) -> bool {
    (a.x - b.x).abs() < pitch && (a.y - b.y).abs() < pitch
}

/// Would a moving square's one-step displacement penetrate a stationary one?
///
/// Strict inequalities throughout: exact edge contact is not a collision, so
/// objects can sit flush against each other (and the level edges) without
/// re-colliding every frame. An object with zero velocity never collides via
/// this test.
pub fn check_moving_collision(pos: I64Vec2, vel: I64Vec2, other: I64Vec2, pitch: i64) -> bool {
    if vel.x != 0 {
        // no collision if the spans don't overlap on the perpendicular axis
        if other.y >= pos.y + pitch || other.y + pitch <= pos.y {
            return false;
        }

        // moving left checks the leading (left) edge against the other
        // square; moving right checks the right edge
        let new_x = pos.x + vel.x;
        if vel.x < 0 {
            new_x < other.x + pitch && new_x > other.x
        } else {
            new_x + pitch < other.x + pitch && new_x + pitch > other.x
        }
    } else if vel.y != 0 {
        if other.x >= pos.x + pitch || other.x + pitch <= pos.x {
            return false;
        }

        let new_y = pos.y + vel.y;
        if vel.y < 0 {
            new_y < other.y + pitch && new_y > other.y
        } else {
            new_y + pitch < other.y + pitch && new_y + pitch > other.y
        }
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PITCH: i64 = 16;

    #[test]
    fn test_alignment() {
        assert!(is_aligned(0, PITCH));
        assert!(is_aligned(48, PITCH));
        assert!(is_aligned(-16, PITCH));
        assert!(!is_aligned(7, PITCH));
    }

    #[test]
    fn test_stationary_overlap() {
        let a = I64Vec2::new(0, 0);
        assert!(check_stationary_collision(a, I64Vec2::new(8, 0), PITCH));
        assert!(check_stationary_collision(a, I64Vec2::new(15, 15), PITCH));
        // flush contact is not an overlap
        assert!(!check_stationary_collision(a, I64Vec2::new(16, 0), PITCH));
        assert!(!check_stationary_collision(a, I64Vec2::new(0, 16), PITCH));
    }

    #[test]
    fn test_moving_hits_block_ahead() {
        // mover at x=0 heading right at 8, obstacle at x=16: leading edge
        // moves from 16 to 24, penetrating the obstacle
        let pos = I64Vec2::new(0, 0);
        let vel = I64Vec2::new(8, 0);
        assert!(check_moving_collision(pos, vel, I64Vec2::new(16, 0), PITCH));
    }

    #[test]
    fn test_moving_misses_offset_row() {
        // obstacle one full row below: perpendicular spans don't overlap
        let pos = I64Vec2::new(0, 0);
        let vel = I64Vec2::new(8, 0);
        assert!(!check_moving_collision(pos, vel, I64Vec2::new(16, 16), PITCH));
        // partially overlapping row does collide
        assert!(check_moving_collision(pos, vel, I64Vec2::new(16, 8), PITCH));
    }

    #[test]
    fn test_flush_contact_is_not_collision() {
        // mover flush against obstacle, moving away
        let pos = I64Vec2::new(16, 0);
        assert!(!check_moving_collision(
            pos,
            I64Vec2::new(8, 0),
            I64Vec2::new(0, 0),
            PITCH
        ));
        // mover exactly one step away: lands flush, does not penetrate
        let pos = I64Vec2::new(32, 0);
        assert!(!check_moving_collision(
            pos,
            I64Vec2::new(-16, 0),
            I64Vec2::new(0, 0),
            PITCH
        ));
    }

    #[test]
    fn test_vertical_symmetry() {
        let pos = I64Vec2::new(0, 0);
        let vel = I64Vec2::new(0, 4);
        assert!(check_moving_collision(pos, vel, I64Vec2::new(0, 16), PITCH));
        assert!(!check_moving_collision(pos, vel, I64Vec2::new(16, 16), PITCH));
    }

    #[test]
    fn test_stationary_object_never_collides() {
        let pos = I64Vec2::new(0, 0);
        assert!(!check_moving_collision(
            pos,
            I64Vec2::ZERO,
            I64Vec2::new(8, 0),
            PITCH
        ));
    }
}
