//! Array interaction check: rather than flattening every repeated
//! element of an arrayed placement, windows the check down to the four
//! canonical neighbor-pair interactions a regular array can produce: the
//! element at the east edge of the overlapping range against its east
//! neighbor, the element at the north edge against its north neighbor,
//! the northeast corner element against its diagonal neighbor, and one
//! representative interior pair standing in for every interior element
//! (which, by periodicity, sees the same neighbor on every side as any
//! other interior element at the same pitch).

use crate::basic::basic_check;
use crate::interaction::{flatten_def_into, seed_scratch};
use crate::{DrcReport, Result};
use core_cell::{CellDef, CellLibrary, CellUseId, Transform2D};
use core_tech::Technology;
use core_tile::types::PlaneId;
use core_tile::{Point, Rect};

fn element_transform(base: Transform2D, xsep: i64, ysep: i64, xi: u32, yi: u32) -> Transform2D {
    Transform2D {
        orientation: base.orientation,
        translate: Point::new(base.translate.x + xi as i64 * xsep, base.translate.y + yi as i64 * ysep),
    }
}

/// The four canonical interaction windows for the overlapping index
/// range `(xr, yr)` of an `nx` by `ny` array: each entry is a pair of
/// element indices whose geometry must be checked against each other.
fn interaction_windows(xr: (u32, u32), yr: (u32, u32), nx: u32, ny: u32) -> Vec<((u32, u32), (u32, u32))> {
    let mut windows = Vec::new();
    let east_xi = xr.1;
    let north_yi = yr.1;

    // East: the range's rightmost column against its east neighbor.
    if east_xi + 1 < nx {
        for yi in yr.0..=yr.1 {
            windows.push(((east_xi, yi), (east_xi + 1, yi)));
        }
    }
    // North: the range's topmost row against its north neighbor.
    if north_yi + 1 < ny {
        for xi in xr.0..=xr.1 {
            windows.push(((xi, north_yi), (xi, north_yi + 1)));
        }
    }
    // Northeast: the range's top-right element against its diagonal neighbor.
    if east_xi + 1 < nx && north_yi + 1 < ny {
        windows.push(((east_xi, north_yi), (east_xi + 1, north_yi + 1)));
    }
    // Interior strip: one representative pair deep inside the range. Every
    // other interior pair repeats this same interaction at the array pitch.
    if xr.1 > xr.0 && xr.0 + 1 < nx {
        windows.push(((xr.0, yr.0), (xr.0 + 1, yr.0)));
    } else if yr.1 > yr.0 && yr.0 + 1 < ny {
        windows.push(((xr.0, yr.0), (xr.0, yr.0 + 1)));
    }

    windows.sort_unstable();
    windows.dedup();
    windows
}

/// Checks `array_use` (which must be arrayed) against `parent`'s own
/// geometry and against itself, windowed to the four canonical
/// interaction pairs rather than every repetition. Each window flattens
/// both participating elements into scratch through the paint-merge
/// transition table, so a pitch small enough to make neighboring
/// elements overlap illegally shows up as `TT_ERROR_S` before the basic
/// edge walk runs over it.
pub fn array_interaction_check(
    lib: &CellLibrary,
    parent: &CellDef,
    array_use: CellUseId,
    plane_id: PlaneId,
    tech: &Technology,
    rect: Rect,
) -> Result<DrcReport> {
    let cu = lib.cell_use(array_use);
    let mut report = DrcReport::new();
    let Some(array) = cu.array else {
        return Ok(report);
    };
    let def_bbox = lib.def(cu.def).bbox;
    let Some((xr, yr)) = cu.array_search(def_bbox, rect) else {
        return Ok(report);
    };

    let margin = tech.rules.max_drc_distance().max(1);
    for (a, b) in interaction_windows(xr, yr, array.nx, array.ny) {
        let ta = element_transform(cu.transform, array.xsep, array.ysep, a.0, a.1);
        let tb = element_transform(cu.transform, array.xsep, array.ysep, b.0, b.1);
        let ra = ta.apply_rect(def_bbox);
        let rb = tb.apply_rect(def_bbox);
        let window = Rect::new(
            ra.ll.x.min(rb.ll.x) - margin,
            ra.ll.y.min(rb.ll.y) - margin,
            ra.ur.x.max(rb.ur.x) + margin,
            ra.ur.y.max(rb.ur.y) + margin,
        );
        let probe = window.intersection(&rect).unwrap_or(window);
        let mut scratch = seed_scratch(parent, plane_id, probe, &tech.types)?;
        flatten_def_into(lib, cu.def, ta, plane_id, &tech.types, &mut scratch)?;
        flatten_def_into(lib, cu.def, tb, plane_id, &tech.types, &mut scratch)?;
        let r = basic_check(&mut scratch, plane_id, tech, probe)?;
        report.extend(r.all().iter().cloned());
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_cell::{ArrayParams, Orientation};
    use core_tile::TileBody;

    fn sample_tech() -> Technology {
        core_tech::load_str(
            r#"
            [[types]]
            name = "metal1"
            plane = "metal"

            [[drc.rule]]
            left = "metal1"
            right = "metal1"
            distance = 3
            why = "metal1.spacing"
        "#,
        )
        .unwrap()
    }

    #[test]
    fn array_corner_elements_are_windowed_individually() {
        let tech = sample_tech();
        let m1 = tech.type_named("metal1").unwrap();
        let mut lib = CellLibrary::new();
        let mut child = CellDef::new("cell");
        child.paint(PlaneId(0), Rect::new(0, 0, 4, 4), TileBody::Rectangular(m1)).unwrap();
        let child_id = lib.define(child);
        let parent_id = lib.define(CellDef::new("top"));
        let transform = Transform2D {
            orientation: Orientation::R0,
            translate: Point::new(0, 0),
        };
        let array = ArrayParams { nx: 20, ny: 1, xsep: 10, ysep: 0 };
        let use_id = lib.place(parent_id, child_id, transform, Some(array)).unwrap();
        let parent_ref = lib.def(parent_id).clone();
        let report = array_interaction_check(&lib, &parent_ref, use_id, PlaneId(0), &tech, Rect::new(0, 0, 50, 4)).unwrap();
        assert!(report.is_clean());
    }
}
