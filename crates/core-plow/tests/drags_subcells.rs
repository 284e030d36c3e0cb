//! S5: plowing material toward a placed subcell pushes the subcell out
//! by the technology's halo distance rather than letting it overlap.

use core_cell::{CellDef, CellLibrary, Orientation, Transform2D};
use core_plow::{plow, Direction};
use core_tile::{PlaneId, Point, Rect, TileBody};

fn sample_tech() -> core_tech::Technology {
    core_tech::load_str(
        r#"
        [[types]]
        name = "t"
        plane = "metal"
    "#,
    )
    .unwrap()
}

#[test]
fn plow_pushes_a_subcell_to_keep_the_halo_clearance() {
    let tech = sample_tech();
    let t = tech.type_named("t").unwrap();

    let mut lib = CellLibrary::new();
    let mut sub = CellDef::new("sub");
    sub.paint(PlaneId(0), Rect::new(0, 0, 5, 10), TileBody::Rectangular(t)).unwrap();
    let sub_id = lib.define(sub);

    let mut top = CellDef::new("top");
    top.paint(PlaneId(0), Rect::new(0, 0, 10, 10), TileBody::Rectangular(t)).unwrap();
    let top_id = lib.define(top);

    let transform = Transform2D {
        orientation: Orientation::R0,
        translate: Point::new(15, 0),
    };
    let use_id = lib.place(top_id, sub_id, transform, None).unwrap();

    let outcome = plow(&mut lib, top_id, PlaneId(0), &tech, Direction::East, Rect::new(0, 0, 10, 10), 5).unwrap();

    // The plowed material grows to fill the swept region.
    let plane = lib.def_mut(top_id).plane_mut(PlaneId(0));
    let id = plane.point_locate(Point::new(14, 5)).unwrap();
    assert_eq!(plane.body_of(id).as_rectangular(), Some(t));

    // The subcell was pushed out by exactly the halo clearance (1, with no
    // DRC rules registered), never left in place to overlap the new edge.
    assert_eq!(outcome.cells_moved, vec![(use_id, 1, 0)]);
    assert_eq!(lib.cell_use(use_id).transform.translate, Point::new(16, 0));
}
