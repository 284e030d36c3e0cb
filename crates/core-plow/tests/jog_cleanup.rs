//! S6: jog cleanup squares off a Z-shaped jog by extending the more
//! recessed of two vertically-adjacent same-type tiles out to match the
//! other's right face, unless a foreign tile sits in the notch that
//! would need to be painted over.

use core_cell::CellDef;
use core_plow::jog::straighten_jogs;
use core_plow::Yank;
use core_tile::{PlaneId, Point, Rect, TileBody, TileType};

fn z_jog_def() -> CellDef {
    let mut def = CellDef::new("top");
    let t = TileType(1);
    def.paint(PlaneId(0), Rect::new(0, 0, 10, 10), TileBody::Rectangular(t)).unwrap();
    def.paint(PlaneId(0), Rect::new(8, 10, 18, 20), TileBody::Rectangular(t)).unwrap();
    def
}

#[test]
fn straightens_a_z_jog_by_squaring_off_the_recessed_tile() {
    let def = z_jog_def();
    let norm = core_plow::Direction::East.normalize();
    let window = Rect::new(-10, -10, 25, 30);
    let mut yank = Yank::build(&def, PlaneId(0), norm, window).unwrap();

    straighten_jogs(&mut yank, PlaneId(0), window, 8).unwrap();

    let plane = yank.def.plane_mut(PlaneId(0));
    let lower = plane.point_locate(Point::new(5, 5)).unwrap();
    assert_eq!(plane.rect_of(lower), Rect::new(0, 0, 18, 10));
    let upper = plane.point_locate(Point::new(12, 15)).unwrap();
    assert_eq!(plane.rect_of(upper), Rect::new(8, 10, 18, 20));
    let gap = plane.point_locate(Point::new(2, 15)).unwrap();
    assert!(plane.body_of(gap).is_space());

    plane.check_invariants().unwrap();
}

#[test]
fn leaves_a_z_jog_alone_when_a_foreign_tile_occupies_the_notch() {
    let mut def = z_jog_def();
    let foreign = TileType(90);
    def.paint(PlaneId(0), Rect::new(12, 2, 14, 8), TileBody::Rectangular(foreign)).unwrap();
    let norm = core_plow::Direction::East.normalize();
    let window = Rect::new(-10, -10, 25, 30);
    let mut yank = Yank::build(&def, PlaneId(0), norm, window).unwrap();

    straighten_jogs(&mut yank, PlaneId(0), window, 8).unwrap();

    let plane = yank.def.plane_mut(PlaneId(0));
    let lower = plane.point_locate(Point::new(5, 5)).unwrap();
    let upper = plane.point_locate(Point::new(15, 15)).unwrap();
    assert_eq!(plane.rect_of(lower), Rect::new(0, 0, 10, 10));
    assert_eq!(plane.rect_of(upper), Rect::new(8, 10, 18, 20));

    let foreign_id = plane.point_locate(Point::new(13, 5)).unwrap();
    assert_eq!(plane.body_of(foreign_id).as_rectangular(), Some(foreign));
}
