//! Property 7: the violations DRC reports on a rectangle equal the
//! violations reported on a partition of that rectangle into
//! sub-rectangles, once both are deduplicated by `(why, plane)`.

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
fn whole_and_partitioned_checks_agree_on_why_summary() {
    let tech = sample_tech();
    let a = tech.type_named("a").unwrap();
    let mut def = CellDef::new("top");
    def.paint(PlaneId(0), Rect::new(0, 0, 5, 5), TileBody::Rectangular(a)).unwrap();
    def.paint(PlaneId(0), Rect::new(7, 0, 12, 5), TileBody::Rectangular(a)).unwrap();

    let whole = basic_check(&mut def.clone(), PlaneId(0), &tech, Rect::new(-5, -5, 20, 10)).unwrap();

    let left_half = basic_check(&mut def.clone(), PlaneId(0), &tech, Rect::new(-5, -5, 8, 10)).unwrap();
    let right_half = basic_check(&mut def.clone(), PlaneId(0), &tech, Rect::new(8, -5, 20, 10)).unwrap();
    let mut partitioned = left_half;
    partitioned.extend(right_half.all().iter().cloned());

    let whole_summary: Vec<_> = whole.why_summary().into_iter().map(|v| (v.why.clone(), v.plane)).collect();
    let partitioned_summary: Vec<_> = partitioned.why_summary().into_iter().map(|v| (v.why.clone(), v.plane)).collect();

    assert_eq!(whole_summary, partitioned_summary);
}
