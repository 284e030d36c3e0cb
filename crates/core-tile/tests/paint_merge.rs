//! S2 (paint merges adjacent same-type tiles into one maximal strip) and
//! properties 5 (paint is idempotent) and 6 (erase/paint/erase restores
//! the plane up to tile identity).

use core_tile::{Plane, PlaneId, Point, Rect, TileBody, TileType};

#[test]
fn adjacent_paints_merge_into_one_strip() {
    let mut plane = Plane::new(PlaneId(0));
    let t = TileType(1);
    plane.paint(Rect::new(0, 0, 10, 10), TileBody::Rectangular(t)).unwrap();
    plane.paint(Rect::new(10, 0, 20, 10), TileBody::Rectangular(t)).unwrap();

    let merged = plane.point_locate(Point::new(10, 5)).unwrap();
    assert_eq!(plane.rect_of(merged), Rect::new(0, 0, 20, 10));
    assert_eq!(plane.body_of(merged).as_rectangular(), Some(t));

    plane.check_invariants().unwrap();
}

#[test]
fn repainting_the_same_type_is_idempotent() {
    let mut plane = Plane::new(PlaneId(0));
    let t = TileType(1);
    plane.paint(Rect::new(0, 0, 10, 10), TileBody::Rectangular(t)).unwrap();
    let before = plane.tile_count();
    plane.paint(Rect::new(0, 0, 10, 10), TileBody::Rectangular(t)).unwrap();
    assert_eq!(plane.tile_count(), before);
    let id = plane.point_locate(Point::new(5, 5)).unwrap();
    assert_eq!(plane.rect_of(id), Rect::new(0, 0, 10, 10));
}

#[test]
fn erase_paint_erase_restores_a_fresh_plane() {
    let mut plane = Plane::new(PlaneId(0));
    let t = TileType(1);
    let universe = Rect::new(-core_tile::INFINITY, -core_tile::INFINITY, core_tile::INFINITY, core_tile::INFINITY);

    plane.erase(universe).unwrap();
    plane.paint(Rect::new(0, 0, 10, 10), TileBody::Rectangular(t)).unwrap();
    plane.erase(universe).unwrap();

    assert_eq!(plane.tile_count(), 1);
    let id = plane.point_locate(Point::new(5, 5)).unwrap();
    assert!(plane.body_of(id).is_space());
}
