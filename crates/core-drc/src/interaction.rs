//! Subcell interaction check: flattens the relevant child placements
//! into a scratch cell alongside the parent's own geometry at the
//! placement transform, then reuses the ordinary basic edge walk across
//! the union. Split tiles only ever arise where a subcell boundary cuts
//! a parent rectangle, so this is also where split-tile spacing is
//! actually exercised; [`crate::basic`] skips them.

use crate::basic::basic_check;
use crate::{DrcReport, Result};
use core_cell::{CellDef, CellDefId, CellLibrary, CellUseId, Transform2D};
use core_tech::Technology;
use core_tile::types::{PlaneId, TypeTable};
use core_tile::Rect;

/// Copies every non-space, non-split tile of `def_id`'s `plane_id` plane
/// into `scratch`, transformed by `transform`. Painting goes through the
/// technology's transition table rather than a raw overwrite, so two
/// elements that legitimately overlap (e.g. a contact stacking on a
/// residue) merge cleanly while an illegal cross-element overlap comes
/// out as `TT_ERROR_S` instead of silently replacing what was flattened
/// in first. Nested splits are not themselves re-split by flattening;
/// they fall out of scope for the one level of hierarchy this check
/// covers.
pub(crate) fn flatten_def_into(
    lib: &CellLibrary,
    def_id: CellDefId,
    transform: Transform2D,
    plane_id: PlaneId,
    types: &TypeTable,
    scratch: &mut CellDef,
) -> Result<()> {
    let child_def = lib.def(def_id);
    let Some(plane) = child_def.plane(plane_id) else {
        return Ok(());
    };
    let mut plane = plane.clone();
    let universe = Rect::new(-core_tile::INFINITY, -core_tile::INFINITY, core_tile::INFINITY, core_tile::INFINITY);
    for id in plane.area_enum(universe)? {
        let body = plane.body_of(id);
        if body.is_space() {
            continue;
        }
        let Some(ttype) = body.as_rectangular() else {
            continue;
        };
        let placed = transform.apply_rect(plane.rect_of(id));
        scratch.paint_checked(plane_id, placed, ttype, types)?;
    }
    Ok(())
}

/// Seeds a scratch cell with `parent`'s own tiles within `rect`, as the
/// base onto which child placements are flattened.
pub(crate) fn seed_scratch(parent: &CellDef, plane_id: PlaneId, rect: Rect, types: &TypeTable) -> Result<CellDef> {
    let mut scratch = CellDef::new("interaction-scratch");
    if let Some(parent_plane) = parent.plane(plane_id) {
        let mut parent_plane = parent_plane.clone();
        for id in parent_plane.area_enum(rect)? {
            let body = parent_plane.body_of(id);
            if body.is_space() {
                continue;
            }
            let Some(ttype) = body.as_rectangular() else {
                continue;
            };
            scratch.paint_checked(plane_id, parent_plane.rect_of(id), ttype, types)?;
        }
    }
    Ok(scratch)
}

/// Checks `children` against the parent's own geometry (and each other)
/// within `rect`, by flattening one level of hierarchy into a scratch
/// cell and running the basic edge walk over the union.
pub fn interaction_check(
    lib: &CellLibrary,
    parent: &CellDef,
    children: &[CellUseId],
    plane_id: PlaneId,
    tech: &Technology,
    rect: Rect,
) -> Result<DrcReport> {
    let mut scratch = seed_scratch(parent, plane_id, rect, &tech.types)?;
    for &child_use in children {
        let cu = lib.cell_use(child_use);
        flatten_def_into(lib, cu.def, cu.transform, plane_id, &tech.types, &mut scratch)?;
    }
    basic_check(&mut scratch, plane_id, tech, rect)
}
