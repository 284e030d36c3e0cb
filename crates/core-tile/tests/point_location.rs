//! S1: point location against a single tile in a space universe.

use core_tile::{Plane, PlaneId, Point, Rect, TileBody, TileType};

#[test]
fn locates_tile_and_its_space_neighbors() {
    let mut plane = Plane::new(PlaneId(0));
    let t = TileType(1);
    plane.paint(Rect::new(0, 0, 10, 10), TileBody::Rectangular(t)).unwrap();

    let inside = plane.point_locate(Point::new(5, 5)).unwrap();
    assert_eq!(plane.body_of(inside).as_rectangular(), Some(t));

    let right = plane.point_locate(Point::new(10, 5)).unwrap();
    assert!(plane.body_of(right).is_space());

    let left = plane.point_locate(Point::new(-1, 5)).unwrap();
    assert!(plane.body_of(left).is_space());

    plane.check_invariants().unwrap();
}
