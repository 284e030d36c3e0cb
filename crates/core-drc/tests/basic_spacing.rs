//! S3: two same-type tiles closer than the rule distance produce one
//! violation covering the gap between them.

use core_cell::CellDef;
use core_drc::basic::basic_check;
use core_tile::{PlaneId, Rect, TileBody};

fn sample_tech() -> core_tech::Technology {
    core_tech::load_str(
        r#"
        [[types]]
        name = "a"
        plane = "metal"

        [[drc.rule]]
        left = "a"
        right = "a"
        distance = 3
        why = "a.spacing"
    "#,
    )
    .unwrap()
}

#[test]
fn flags_the_gap_between_two_close_tiles() {
    let tech = sample_tech();
    let a = tech.type_named("a").unwrap();
    let mut def = CellDef::new("top");
    def.paint(PlaneId(0), Rect::new(0, 0, 5, 5), TileBody::Rectangular(a)).unwrap();
    def.paint(PlaneId(0), Rect::new(7, 0, 12, 5), TileBody::Rectangular(a)).unwrap();

    let report = basic_check(&mut def, PlaneId(0), &tech, Rect::new(-5, -5, 20, 10)).unwrap();

    assert!(!report.is_clean());
    let v = &report.all()[0];
    assert_eq!(v.why, "a.spacing");
    assert_eq!(v.rect, Rect::new(0, 0, 12, 5));
}
