//! `PlowEngine`: constraint-propagation compaction. Pushes material in
//! front of a virtual plow blade some distance along one of the four
//! axis directions, dragging and pushing whatever spacing, fixed-width,
//! contact, covering, and cell-use relationships the technology demands,
//! then straightens any jog the independent edge moves left behind.
//!
//! The propagation loop itself is written once, for eastward motion; a
//! caller-requested direction is handled by [`normalize`] rotating a
//! scratch copy of the affected region so that direction becomes east,
//! then rotating the result back on write-back.

pub mod edge;
pub mod jog;
pub mod normalize;
pub mod rules;
pub mod yank;

use core_cell::{CellDefId, CellLibrary, CellUseId, Transform2D};
use core_tech::Technology;
use core_tile::types::PlaneId;
use core_tile::{Coord, Point, Rect, TileBody, TileType};
use std::collections::HashMap;
use thiserror::Error;

pub use edge::{Edge, EdgeFlags};
pub use normalize::Direction;
pub use yank::Yank;

#[derive(Debug, Error)]
pub enum PlowError {
    #[error(transparent)]
    Tile(#[from] core_tile::TileError),
}

pub type Result<T> = std::result::Result<T, PlowError>;

/// What a `plow` call actually changed, beyond the geometry written
/// back into the cell's planes: every `CellUse` that was dragged or
/// pushed, and by how much in the cell's own (un-normalized) coordinates.
#[derive(Debug, Default)]
pub struct PlowOutcome {
    pub swept: Rect,
    pub cells_moved: Vec<(CellUseId, Coord, Coord)>,
}

/// Pushes everything at or east of `span`'s leading face `distance`
/// units further in `direction`, on `plane_id` of `cell`, propagating
/// the move through whatever the technology's plow width/spacing rules
/// and fixed/covered/contact/drag relationships require to stay legal.
///
/// `span` is given in the cell's own coordinates; its face in the
/// direction of motion is where the blade starts.
pub fn plow(
    lib: &mut CellLibrary,
    cell: CellDefId,
    plane_id: PlaneId,
    tech: &Technology,
    direction: Direction,
    span: Rect,
    distance: Coord,
) -> Result<PlowOutcome> {
    let norm = direction.normalize();
    let inv = norm.inverse();
    let margin = tech.rules.max_drc_distance().max(1) * 4 + distance.abs() + 4;

    let mut working = lib.def(cell).clone();

    let seed_n = norm.apply_rect(span);
    let mut halo_n = Rect::new(
        seed_n.ll.x - margin,
        seed_n.ll.y - margin,
        seed_n.ur.x + distance.max(0) + margin,
        seed_n.ur.y + margin,
    );
    let mut halo_source = inv.apply_rect(halo_n);
    let mut yank = Yank::build(&working, plane_id, norm, halo_source)?;

    let mut queue = vec![Edge::virtual_edge(seed_n.ur.x, seed_n.ll.y, seed_n.ur.y, seed_n.ur.x + distance, plane_id)];
    queue.extend(seed_material_edge(&mut yank, plane_id, seed_n.ur.x, seed_n.ll.y, seed_n.ur.y, seed_n.ur.x + distance)?);

    let mut cell_moves: HashMap<CellUseId, Coord> = HashMap::new();

    while let Some(e) = edge::pop_leftmost_ready(&mut queue) {
        if e.final_x > halo_n.ur.x - margin {
            yank.write_back(&mut working, halo_source)?;
            halo_n = Rect::new(halo_n.ll.x, halo_n.ll.y, e.final_x + margin, halo_n.ur.y);
            halo_source = inv.apply_rect(halo_n);
            yank.grow(&working, halo_source)?;
        }
        move_edge(&mut yank, &e)?;
        rules::apply_search_rules(&mut yank, lib, cell, tech, &e, &mut queue, &mut cell_moves)?;
    }

    let jog_window = Rect::new(seed_n.ll.x, halo_n.ll.y, halo_n.ur.x, halo_n.ur.y);
    jog::straighten_jogs(&mut yank, plane_id, jog_window, margin.min(4).max(1))?;

    yank.write_back(&mut working, halo_source)?;
    *lib.def_mut(cell) = working;

    let pure_rotation = Transform2D { orientation: norm.orientation, translate: Point::new(0, 0) }.inverse();
    let mut cells_moved = Vec::new();
    for (use_id, delta) in cell_moves {
        let d = pure_rotation.apply_point(Point::new(delta, 0));
        lib.translate_use(cell, use_id, d.x, d.y)?;
        cells_moved.push((use_id, d.x, d.y));
    }

    Ok(PlowOutcome {
        swept: inv.apply_rect(halo_n),
        cells_moved,
    })
}

/// Performs the actual geometry change an edge's move represents:
/// material of `e.left` now extends from its old position out to
/// `e.final_x`. The virtual seed edge carries no material and is
/// skipped; it exists only to demand a position, never to paint one.
fn move_edge(yank: &mut Yank, e: &Edge) -> core_tile::Result<()> {
    if e.flags.contains(EdgeFlags::VIRTUAL) || e.final_x <= e.x {
        return Ok(());
    }
    let rect = Rect::new(e.x, e.y_bot, e.final_x, e.y_top);
    let plane = yank.def.plane_mut(e.plane);
    if e.left.is_space() {
        plane.erase(rect)?;
    } else {
        plane.paint(rect, TileBody::Rectangular(e.left))?;
    }
    Ok(())
}

/// Finds whatever real material the blade is directly touching at `x`
/// and turns it into a proper edge demanding `final_x`, so the search
/// rules have a starting point beyond the purely notional virtual seed.
fn seed_material_edge(
    yank: &mut Yank,
    plane_id: PlaneId,
    x: Coord,
    y_bot: Coord,
    y_top: Coord,
    final_x: Coord,
) -> core_tile::Result<Vec<Edge>> {
    let mut out = Vec::new();
    let probe = Rect::new((x - 1).max(-core_tile::INFINITY), y_bot, x, y_top);
    let plane = yank.def.plane_mut(plane_id);
    for id in plane.area_enum(probe)? {
        let Some(ttype) = plane.body_of(id).as_rectangular() else {
            continue;
        };
        if ttype.is_space() {
            continue;
        }
        let r = plane.rect_of(id);
        out.push(Edge {
            x: r.ur.x,
            y_bot: r.ll.y.max(y_bot),
            y_top: r.ur.y.min(y_top),
            left: ttype,
            right: TileType::SPACE,
            final_x,
            cell_use: None,
            plane: plane_id,
            flags: EdgeFlags::empty(),
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_cell::CellDef;

    fn sample_tech() -> Technology {
        core_tech::load_str(
            r#"
            [[types]]
            name = "metal1"
            plane = "metal"
        "#,
        )
        .unwrap()
    }

    #[test]
    fn plowing_east_pushes_a_tile_forward() {
        let tech = sample_tech();
        let m1 = tech.type_named("metal1").unwrap();
        let mut lib = CellLibrary::new();
        let mut def = CellDef::new("top");
        def.paint(PlaneId(0), Rect::new(0, 0, 10, 10), TileBody::Rectangular(m1)).unwrap();
        let cell = lib.define(def);

        let outcome = plow(&mut lib, cell, PlaneId(0), &tech, Direction::East, Rect::new(0, 0, 10, 10), 5).unwrap();

        let plane = lib.def_mut(cell).plane_mut(PlaneId(0));
        let id = plane.point_locate(core_tile::Point::new(14, 5)).unwrap();
        assert_eq!(plane.body_of(id).as_rectangular(), Some(m1));
        assert!(outcome.cells_moved.is_empty());
    }

    #[test]
    fn plowing_north_reuses_the_same_loop_by_normalizing_orientation() {
        let tech = sample_tech();
        let m1 = tech.type_named("metal1").unwrap();
        let mut lib = CellLibrary::new();
        let mut def = CellDef::new("top");
        def.paint(PlaneId(0), Rect::new(0, 0, 10, 10), TileBody::Rectangular(m1)).unwrap();
        let cell = lib.define(def);

        plow(&mut lib, cell, PlaneId(0), &tech, Direction::North, Rect::new(0, 0, 10, 10), 5).unwrap();

        let plane = lib.def_mut(cell).plane_mut(PlaneId(0));
        let id = plane.point_locate(core_tile::Point::new(5, 14)).unwrap();
        assert_eq!(plane.body_of(id).as_rectangular(), Some(m1));
    }
}
