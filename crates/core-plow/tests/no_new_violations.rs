//! Property 9: plowing a tile into open space never creates a DRC
//! violation where none existed before.

use core_cell::CellDef;
use core_drc::basic::basic_check;
use core_plow::{plow, Direction};
use core_tile::{PlaneId, Rect, TileBody};

fn sample_tech() -> core_tech::Technology {
    core_tech::load_str(
        r#"
        [[types]]
        name = "m1"
        plane = "metal"

        [[drc.rule]]
        left = "m1"
        right = "m1"
        distance = 3
        why = "m1.spacing"
    "#,
    )
    .unwrap()
}

#[test]
fn plowing_into_open_space_stays_clean() {
    let tech = sample_tech();
    let m1 = tech.type_named("m1").unwrap();
    let mut lib = core_cell::CellLibrary::new();
    let mut def = CellDef::new("top");
    def.paint(PlaneId(0), Rect::new(0, 0, 10, 10), TileBody::Rectangular(m1)).unwrap();
    let cell = lib.define(def);

    let before = basic_check(lib.def_mut(cell), PlaneId(0), &tech, Rect::new(-20, -20, 40, 40)).unwrap();
    assert!(before.is_clean());

    plow(&mut lib, cell, PlaneId(0), &tech, Direction::East, Rect::new(0, 0, 10, 10), 5).unwrap();

    let after = basic_check(lib.def_mut(cell), PlaneId(0), &tech, Rect::new(-20, -20, 40, 40)).unwrap();
    assert!(after.is_clean());
}
