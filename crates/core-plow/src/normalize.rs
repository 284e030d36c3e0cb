//! Orientation normalization: the propagation loop is written once, for
//! eastward motion. A caller-requested direction is handled by rotating
//! the yanked copy so that direction becomes east; the same rotation's
//! inverse is applied at write-back.

use core_cell::{Orientation, Transform2D};
use core_tile::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    fn orientation(self) -> Orientation {
        match self {
            Direction::East => Orientation::R0,
            Direction::North => Orientation::R270,
            Direction::West => Orientation::R180,
            Direction::South => Orientation::R90,
        }
    }

    /// The transform that rotates this direction's forward axis onto
    /// +x. Translation is always identity: the yank buffer keeps the
    /// source's absolute coordinates, just reoriented.
    pub fn normalize(self) -> Transform2D {
        Transform2D {
            orientation: self.orientation(),
            translate: Point::new(0, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn north_forward_axis_maps_to_east() {
        let t = Direction::North.normalize();
        assert_eq!(t.apply_point(Point::new(0, 1)), Point::new(1, 0));
    }

    #[test]
    fn south_forward_axis_maps_to_east() {
        let t = Direction::South.normalize();
        assert_eq!(t.apply_point(Point::new(0, -1)), Point::new(1, 0));
    }

    #[test]
    fn normalize_then_inverse_round_trips_a_point() {
        let t = Direction::West.normalize();
        let p = Point::new(3, -4);
        assert_eq!(t.inverse().apply_point(t.apply_point(p)), p);
    }
}
