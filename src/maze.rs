//! DFS block-map generator
//!
//! Produces a boolean occupancy grid for `GenerationParameters::block_map`
//! by carving corridors out of a solid grid with a recursive backtracker.
//! Nodes live at even/even coordinates, so both dimensions must be odd for
//! the outermost cells to be walls.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::sim::{Direction, LevelError};

struct Map2D {
    w: i64,
    data: Vec<bool>,
}

impl Map2D {
    fn new(w: i64, h: i64, v: bool) -> Map2D {
        Map2D {
            w,
            data: vec![v; (w * h) as usize],
        }
    }

    fn get(&self, x: i64, y: i64) -> bool {
        self.data[(y * self.w + x) as usize]
    }

    fn put(&mut self, x: i64, y: i64, v: bool) {
        self.data[(y * self.w + x) as usize] = v;
    }
}

struct DfsStep {
    x: i64,
    y: i64,
    directions_remaining: Vec<Direction>,
}

fn directions_from(x: i64, y: i64, w: i64, h: i64) -> Vec<Direction> {
    let mut directions = Vec::with_capacity(4);
    if x != 0 {
        directions.push(Direction::Left);
    }
    if x != w - 1 {
        directions.push(Direction::Right);
    }
    if y != 0 {
        directions.push(Direction::Up);
    }
    if y != h - 1 {
        directions.push(Direction::Down);
    }
    directions
}

/// Generate a `w x h` maze occupancy grid (`true` = block). Dimensions must
/// be odd.
pub fn generate_maze(w: i64, h: i64, rng: &mut impl Rng) -> Result<Vec<bool>, LevelError> {
    if w % 2 == 0 || h % 2 == 0 {
        return Err(LevelError::EvenMazeDimensions);
    }

    let mut map = Map2D::new(w, h, true);
    let mut nodes_visited = Map2D::new(w, h, false);

    // choose a random node and start DFSing from it. each step carries its
    // unexplored directions pre-shuffled, so popping one is a uniform pick.
    let mut steps: Vec<DfsStep> = Vec::new();
    {
        let start_x = rng.random_range(0..(w + 1) / 2) * 2;
        let start_y = rng.random_range(0..(h + 1) / 2) * 2;
        let mut directions = directions_from(start_x, start_y, w, h);
        directions.shuffle(rng);
        steps.push(DfsStep {
            x: start_x,
            y: start_y,
            directions_remaining: directions,
        });
        nodes_visited.put(start_x, start_y, true);
        map.put(start_x, start_y, false);
    }

    while let Some(current) = steps.last() {
        let (cur_x, cur_y) = (current.x, current.y);

        // pick a direction we haven't already gone from this node; if there
        // are none left, backtrack
        let direction = match steps.last_mut().and_then(|s| s.directions_remaining.pop()) {
            Some(d) => d,
            None => {
                steps.pop();
                continue;
            }
        };

        // nodes are two cells apart; the cell between becomes the path
        let offset = direction.offsets();
        let dest_x = cur_x + 2 * offset.x;
        let dest_y = cur_y + 2 * offset.y;
        if nodes_visited.get(dest_x, dest_y) {
            continue;
        }

        nodes_visited.put(dest_x, dest_y, true);
        map.put(cur_x + offset.x, cur_y + offset.y, false);
        map.put(dest_x, dest_y, false);

        let mut directions = directions_from(dest_x, dest_y, w, h);
        directions.shuffle(rng);
        steps.push(DfsStep {
            x: dest_x,
            y: dest_y,
            directions_remaining: directions,
        });
    }

    Ok(map.data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(42)
    }

    #[test]
    fn test_rejects_even_dimensions() {
        assert!(matches!(
            generate_maze(10, 11, &mut rng()),
            Err(LevelError::EvenMazeDimensions)
        ));
        assert!(matches!(
            generate_maze(11, 10, &mut rng()),
            Err(LevelError::EvenMazeDimensions)
        ));
    }

    #[test]
    fn test_every_node_is_carved() {
        let (w, h) = (11i64, 9i64);
        let map = generate_maze(w, h, &mut rng()).unwrap();
        assert_eq!(map.len(), (w * h) as usize);
        // the backtracker visits every even/even node
        for y in (0..h).step_by(2) {
            for x in (0..w).step_by(2) {
                assert!(!map[(y * w + x) as usize], "node ({x}, {y}) not carved");
            }
        }
    }

    #[test]
    fn test_odd_odd_cells_stay_walls() {
        let (w, h) = (11i64, 9i64);
        let map = generate_maze(w, h, &mut rng()).unwrap();
        // cells with both coordinates odd are never on a path
        for y in (1..h).step_by(2) {
            for x in (1..w).step_by(2) {
                assert!(map[(y * w + x) as usize]);
            }
        }
    }

    #[test]
    fn test_deterministic_for_a_given_seed() {
        let a = generate_maze(15, 13, &mut rng()).unwrap();
        let b = generate_maze(15, 13, &mut rng()).unwrap();
        assert_eq!(a, b);
    }
}
