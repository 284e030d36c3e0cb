//! The twelve search rules: each enumerates tiles or child uses in a
//! geometric zone relative to an edge and queues further edges with
//! their own demanded final position. None of them move anything
//! themselves — that's [`crate::move_edge`]'s job, once the queue is
//! drained for a given position.

use crate::edge::{Edge, EdgeFlags};
use crate::yank::Yank;
use core_cell::{CellDefId, CellLibrary, CellUseId};
use core_tech::Technology;
use core_tile::types::PlaneId;
use core_tile::{Coord, Rect, TileType};
use std::collections::HashMap;

/// No two edges may swap order: anything still west of `e` may not be
/// demanded past `e`'s own final position.
fn clear_umbra(e: &Edge, queue: &mut [Edge]) {
    for other in queue.iter_mut() {
        if other.x < e.x && other.y_overlaps(e) && other.final_x > e.final_x {
            other.final_x = e.final_x;
        }
    }
}

/// Every width/spacing rule between `e.right` and whatever it would
/// newly neighbor, applied across the swept band plus the rule's own
/// distance as a halo to the east.
fn umbra(yank: &mut Yank, tech: &Technology, e: &Edge, queue: &mut Vec<Edge>) -> core_tile::Result<()> {
    let d = tech.rules.plow_spacing_for(e.right, e.left).max(tech.rules.plow_width_for(e.right));
    if d == 0 {
        return Ok(());
    }
    let probe = Rect::new(e.x, e.y_bot, e.final_x + d, e.y_top);
    let plane = yank.def.plane_mut(e.plane);
    for id in plane.area_enum(probe)? {
        let Some(ttype) = plane.body_of(id).as_rectangular() else {
            continue;
        };
        if ttype == e.right || ttype.is_space() {
            continue;
        }
        let r = plane.rect_of(id);
        if r.ll.x < e.final_x {
            continue;
        }
        let required = e.final_x + d;
        if r.ll.x < required {
            queue.push(Edge {
                x: r.ll.x,
                y_bot: r.ll.y.max(e.y_bot),
                y_top: r.ur.y.min(e.y_top),
                left: e.right,
                right: ttype,
                final_x: required,
                cell_use: None,
                plane: e.plane,
                flags: EdgeFlags::empty(),
            });
        }
    }
    Ok(())
}

/// Traces the outline of material touching `e`'s top (or bottom) face
/// and applies spacing along each vertical segment found there, exactly
/// as `umbra` does along `e` itself.
fn penumbra(yank: &mut Yank, tech: &Technology, e: &Edge, queue: &mut Vec<Edge>, top: bool) -> core_tile::Result<()> {
    let d = tech.rules.plow_spacing_for(e.right, e.left);
    if d == 0 {
        return Ok(());
    }
    let y = if top { e.y_top } else { (e.y_bot - 1).max(-core_tile::INFINITY) };
    let probe = Rect::new(e.x, y, e.final_x + d, y + 1);
    let plane = yank.def.plane_mut(e.plane);
    for id in plane.area_enum(probe)? {
        let Some(ttype) = plane.body_of(id).as_rectangular() else {
            continue;
        };
        if ttype == e.right || ttype.is_space() {
            continue;
        }
        let r = plane.rect_of(id);
        let required = e.final_x + d;
        if r.ll.x >= e.final_x && r.ll.x < required {
            queue.push(Edge {
                x: r.ll.x,
                y_bot: r.ll.y,
                y_top: r.ur.y,
                left: e.right,
                right: ttype,
                final_x: required,
                cell_use: None,
                plane: e.plane,
                flags: EdgeFlags::empty(),
            });
        }
    }
    Ok(())
}

/// A fixed-width type on `e`'s left can't be deformed: its own west
/// edge must move by the same delta `e` is being pushed.
fn fixed_lhs(yank: &mut Yank, tech: &Technology, e: &Edge, queue: &mut Vec<Edge>) -> core_tile::Result<()> {
    if !tech.types.is_fixed(e.left) {
        return Ok(());
    }
    let delta = e.final_x - e.x;
    let probe = Rect::new((e.x - 1).max(-core_tile::INFINITY), e.y_bot, e.x, e.y_top);
    let plane = yank.def.plane_mut(e.plane);
    for id in plane.area_enum(probe)? {
        if plane.body_of(id).as_rectangular() != Some(e.left) {
            continue;
        }
        let r = plane.rect_of(id);
        queue.push(Edge {
            x: r.ll.x,
            y_bot: r.ll.y.max(e.y_bot),
            y_top: r.ur.y.min(e.y_top),
            left: TileType::SPACE,
            right: e.left,
            final_x: r.ll.x + delta,
            cell_use: None,
            plane: e.plane,
            flags: EdgeFlags::FIXED,
        });
    }
    Ok(())
}

/// Symmetric to [`fixed_lhs`]: a fixed-width type on `e`'s right must
/// keep its own extent, so its east edge rides along by the same delta.
fn fixed_rhs(yank: &mut Yank, tech: &Technology, e: &Edge, queue: &mut Vec<Edge>) -> core_tile::Result<()> {
    if !tech.types.is_fixed(e.right) {
        return Ok(());
    }
    let delta = e.final_x - e.x;
    let probe = Rect::new(e.x, e.y_bot, e.x + 1, e.y_top);
    let plane = yank.def.plane_mut(e.plane);
    for id in plane.area_enum(probe)? {
        if plane.body_of(id).as_rectangular() != Some(e.right) {
            continue;
        }
        let r = plane.rect_of(id);
        queue.push(Edge {
            x: r.ur.x,
            y_bot: r.ll.y.max(e.y_bot),
            y_top: r.ur.y.min(e.y_top),
            left: e.right,
            right: TileType::SPACE,
            final_x: r.ur.x + delta,
            cell_use: None,
            plane: e.plane,
            flags: EdgeFlags::FIXED,
        });
    }
    Ok(())
}

/// A contact belongs to every plane its residues occupy; queue a
/// matching edge on each so the contact moves as one unit everywhere.
fn contact_lhs(tech: &Technology, e: &Edge, queue: &mut Vec<Edge>) {
    contact_side(tech, e.left, e, queue);
}

fn contact_rhs(tech: &Technology, e: &Edge, queue: &mut Vec<Edge>) {
    contact_side(tech, e.right, e, queue);
}

fn contact_side(tech: &Technology, side: TileType, e: &Edge, queue: &mut Vec<Edge>) {
    if !tech.types.is_contact(side) {
        return;
    }
    for &residue in tech.types.residues(side) {
        let Some(plane_id) = tech.types.plane_of(residue) else {
            continue;
        };
        if plane_id == e.plane {
            continue;
        }
        queue.push(Edge {
            x: e.x,
            y_bot: e.y_bot,
            y_top: e.y_top,
            left: residue,
            right: TileType::SPACE,
            final_x: e.final_x,
            cell_use: None,
            plane: plane_id,
            flags: EdgeFlags::empty(),
        });
    }
}

/// If `e.right` must stay covered, material on every other plane
/// overlapping the swept band is dragged along by the same delta.
fn cover(yank: &mut Yank, tech: &Technology, e: &Edge, queue: &mut Vec<Edge>) -> core_tile::Result<()> {
    if !tech.types.is_covered(e.right) {
        return Ok(());
    }
    let delta = e.final_x - e.x;
    let probe = Rect::new(e.x, e.y_bot, e.final_x, e.y_top);
    let other_planes: Vec<PlaneId> = yank.def.planes.keys().copied().filter(|&p| p != e.plane).collect();
    for plane_id in other_planes {
        let plane = yank.def.plane_mut(plane_id);
        for id in plane.area_enum(probe)? {
            let Some(ttype) = plane.body_of(id).as_rectangular() else {
                continue;
            };
            if ttype.is_space() {
                continue;
            }
            let r = plane.rect_of(id);
            queue.push(Edge {
                x: r.ur.x,
                y_bot: r.ll.y.max(e.y_bot),
                y_top: r.ur.y.min(e.y_top),
                left: ttype,
                right: TileType::SPACE,
                final_x: r.ur.x + delta,
                cell_use: None,
                plane: plane_id,
                flags: EdgeFlags::COVERED,
            });
        }
    }
    Ok(())
}

/// Walks just past `e`'s tentative final position looking for a type
/// that may never legally touch `e.right`; if found, pushes it one
/// further unit east rather than letting the move create the touch.
fn illegal(yank: &mut Yank, tech: &Technology, e: &Edge, queue: &mut Vec<Edge>) -> core_tile::Result<()> {
    let probe = Rect::new(e.final_x, e.y_bot, e.final_x + 1, e.y_top);
    let plane = yank.def.plane_mut(e.plane);
    for id in plane.area_enum(probe)? {
        let Some(ttype) = plane.body_of(id).as_rectangular() else {
            continue;
        };
        if ttype == e.right || ttype.is_space() {
            continue;
        }
        let forbidden_touch = tech.rules.drc_cookies(e.right, ttype).iter().any(|c| c.distance > 0);
        if !forbidden_touch {
            continue;
        }
        let r = plane.rect_of(id);
        queue.push(Edge {
            x: r.ll.x,
            y_bot: r.ll.y.max(e.y_bot),
            y_top: r.ur.y.min(e.y_top),
            left: e.right,
            right: ttype,
            final_x: e.final_x + 1,
            cell_use: None,
            plane: e.plane,
            flags: EdgeFlags::empty(),
        });
    }
    Ok(())
}

/// Proves no interior rectangle of the freshly swept band falls below
/// `e.right`'s minimum width rule, using the same maximal-rectangle
/// decomposition the DRC wide-metal scanners use.
fn sliver(yank: &mut Yank, tech: &Technology, e: &Edge, queue: &mut Vec<Edge>) -> core_tile::Result<()> {
    let min_width = tech.rules.plow_width_for(e.right);
    if min_width == 0 {
        return Ok(());
    }
    let probe = Rect::new(e.x, e.y_bot, e.final_x, e.y_top);
    let plane = yank.def.plane_mut(e.plane);
    let rects: Vec<Rect> = plane
        .area_enum(probe)?
        .into_iter()
        .filter(|&id| plane.body_of(id).as_rectangular() == Some(e.right))
        .map(|id| plane.rect_of(id))
        .collect();
    if rects.is_empty() {
        return Ok(());
    }
    if let Some(max_rect) = core_drc::maxrect::find_max_rectangle(&rects) {
        let narrow = max_rect.width().min(max_rect.height());
        if narrow < min_width {
            queue.push(Edge {
                x: e.x,
                y_bot: e.y_bot,
                y_top: e.y_top,
                left: e.left,
                right: e.right,
                final_x: e.final_x + (min_width - narrow),
                cell_use: None,
                plane: e.plane,
                flags: EdgeFlags::empty(),
            });
        }
    }
    Ok(())
}

/// For every `CellUse` whose bbox overlaps `e`'s band, records either a
/// drag (the use sits west of `e`, so it moves by the same delta) or a
/// push (the use sits east of `e` and must keep at least the technology's
/// DRC halo distance of clearance). Uses have no internal edges to
/// enumerate, so the result lands directly in `cell_moves` rather than
/// the edge queue.
fn cells(lib: &CellLibrary, cell: CellDefId, tech: &Technology, e: &Edge, cell_moves: &mut HashMap<CellUseId, Coord>) {
    let def = lib.def(cell);
    for &use_id in &def.children {
        let cu = lib.cell_use(use_id);
        let child_bbox = lib.def(cu.def).bbox;
        let placed = cu.transform.apply_rect(child_bbox);
        if !(placed.ll.y < e.y_top && e.y_bot < placed.ur.y) {
            continue;
        }
        let demand = if placed.ll.x < e.x {
            e.final_x - e.x
        } else {
            let clearance = tech.rules.max_drc_distance().max(1);
            e.final_x + clearance - placed.ll.x
        };
        if demand > 0 {
            cell_moves
                .entry(use_id)
                .and_modify(|d| *d = (*d).max(demand))
                .or_insert(demand);
        }
    }
}

/// Minimum-width material of a drag type trailing a fixed-width type
/// must move with it, or a stub is left behind the transistor it was
/// attached to.
fn drag_stubs(yank: &mut Yank, tech: &Technology, e: &Edge, queue: &mut Vec<Edge>) -> core_tile::Result<()> {
    if !tech.types.is_drag(e.left) {
        return Ok(());
    }
    let delta = e.final_x - e.x;
    let east_probe = Rect::new(e.x, e.y_bot, e.x + 1, e.y_top);
    let plane = yank.def.plane_mut(e.plane);
    let touches_fixed = plane
        .area_enum(east_probe)?
        .into_iter()
        .any(|id| plane.body_of(id).as_rectangular().is_some_and(|t| tech.types.is_fixed(t)));
    if !touches_fixed {
        return Ok(());
    }
    let west_probe = Rect::new((e.x - 1).max(-core_tile::INFINITY), e.y_bot, e.x, e.y_top);
    for id in plane.area_enum(west_probe)? {
        if plane.body_of(id).as_rectangular() != Some(e.left) {
            continue;
        }
        let r = plane.rect_of(id);
        queue.push(Edge {
            x: r.ll.x,
            y_bot: r.ll.y.max(e.y_bot),
            y_top: r.ur.y.min(e.y_top),
            left: TileType::SPACE,
            right: e.left,
            final_x: r.ll.x + delta,
            cell_use: None,
            plane: e.plane,
            flags: EdgeFlags::empty(),
        });
    }
    Ok(())
}

/// When the plow itself is thinner than the halo distance, a tile just
/// east of the move that is narrower than the halo would form a sliver
/// invisible to `sliver` (which only looks inside the swept band).
fn in_sliver(yank: &mut Yank, tech: &Technology, e: &Edge, queue: &mut Vec<Edge>) -> core_tile::Result<()> {
    let halo = tech.rules.max_drc_distance();
    if halo == 0 || e.y_top - e.y_bot >= halo {
        return Ok(());
    }
    let probe = Rect::new(e.final_x, e.y_bot, e.final_x + halo, e.y_top);
    let plane = yank.def.plane_mut(e.plane);
    for id in plane.area_enum(probe)? {
        let Some(ttype) = plane.body_of(id).as_rectangular() else {
            continue;
        };
        if ttype.is_space() {
            continue;
        }
        let r = plane.rect_of(id);
        if r.width() < halo {
            queue.push(Edge {
                x: r.ur.x,
                y_bot: r.ll.y.max(e.y_bot),
                y_top: r.ur.y.min(e.y_top),
                left: ttype,
                right: TileType::SPACE,
                final_x: r.ur.x + (halo - r.width()),
                cell_use: None,
                plane: e.plane,
                flags: EdgeFlags::empty(),
            });
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn apply_search_rules(
    yank: &mut Yank,
    lib: &CellLibrary,
    cell: CellDefId,
    tech: &Technology,
    e: &Edge,
    queue: &mut Vec<Edge>,
    cell_moves: &mut HashMap<CellUseId, Coord>,
) -> core_tile::Result<()> {
    clear_umbra(e, queue);
    umbra(yank, tech, e, queue)?;
    penumbra(yank, tech, e, queue, true)?;
    penumbra(yank, tech, e, queue, false)?;
    fixed_lhs(yank, tech, e, queue)?;
    fixed_rhs(yank, tech, e, queue)?;
    contact_lhs(tech, e, queue);
    contact_rhs(tech, e, queue);
    cover(yank, tech, e, queue)?;
    illegal(yank, tech, e, queue)?;
    sliver(yank, tech, e, queue)?;
    cells(lib, cell, tech, e, cell_moves);
    drag_stubs(yank, tech, e, queue)?;
    in_sliver(yank, tech, e, queue)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::Direction;
    use core_cell::CellDef;
    use core_tile::TileBody;

    fn sample_tech() -> Technology {
        core_tech::load_str(
            r#"
            [[types]]
            name = "metal1"
            plane = "metal"
            fixed = false

            [[types]]
            name = "poly"
            plane = "metal"
            fixed = true

            [[drc.rule]]
            left = "metal1"
            right = "metal1"
            distance = 3
            why = "metal1.spacing"

            [[plow.width]]
            types = ["metal1"]
            distance = 4
        "#,
        )
        .unwrap()
    }

    #[test]
    fn umbra_demands_minimum_spacing_east_of_the_move() {
        let tech = sample_tech();
        let m1 = tech.type_named("metal1").unwrap();
        let mut def = CellDef::new("top");
        def.paint(PlaneId(0), Rect::new(0, 0, 10, 10), TileBody::Rectangular(m1)).unwrap();
        def.paint(PlaneId(0), Rect::new(12, 0, 20, 10), TileBody::Rectangular(m1)).unwrap();
        let norm = Direction::East.normalize();
        let mut yank = Yank::build(&def, PlaneId(0), norm, Rect::new(-5, -5, 25, 15)).unwrap();
        let e = Edge {
            x: 10,
            y_bot: 0,
            y_top: 10,
            left: m1,
            right: TileType::SPACE,
            final_x: 11,
            cell_use: None,
            plane: PlaneId(0),
            flags: EdgeFlags::empty(),
        };
        let mut queue = Vec::new();
        umbra(&mut yank, &tech, &e, &mut queue).unwrap();
        assert!(!queue.is_empty());
        assert_eq!(queue[0].final_x, 11 + 3);
    }

    #[test]
    fn fixed_lhs_only_fires_for_fixed_types() {
        let tech = sample_tech();
        let m1 = tech.type_named("metal1").unwrap();
        let mut def = CellDef::new("top");
        def.paint(PlaneId(0), Rect::new(0, 0, 10, 10), TileBody::Rectangular(m1)).unwrap();
        let norm = Direction::East.normalize();
        let mut yank = Yank::build(&def, PlaneId(0), norm, Rect::new(-5, -5, 20, 15)).unwrap();
        let e = Edge {
            x: 10,
            y_bot: 0,
            y_top: 10,
            left: m1,
            right: TileType::SPACE,
            final_x: 12,
            cell_use: None,
            plane: PlaneId(0),
            flags: EdgeFlags::empty(),
        };
        let mut queue = Vec::new();
        fixed_lhs(&mut yank, &tech, &e, &mut queue).unwrap();
        assert!(queue.is_empty());
    }
}
