//! Jog cleanup: once propagation settles, independently moved vertical
//! edges can leave a short Z-shaped jog where a single straight edge
//! used to run. This pass looks for two vertically-adjacent runs of the
//! same material whose right faces differ by no more than `max_jog` and
//! squares them off by painting the recessed run's notch out to the
//! more advanced face.

use core_tile::types::PlaneId;
use core_tile::{Coord, Rect, TileBody};

use crate::yank::Yank;

#[derive(Debug, Clone, Copy)]
struct JogSite {
    x_lo: Coord,
    x_hi: Coord,
    y_bot: Coord,
    y_top: Coord,
    fill: core_tile::TileType,
}

/// Repeatedly finds and squares off jogs in `plane_id` within `window`
/// until none remain.
pub fn straighten_jogs(yank: &mut Yank, plane_id: PlaneId, window: Rect, max_jog: Coord) -> core_tile::Result<()> {
    while let Some(site) = find_jog(yank, plane_id, window, max_jog)? {
        let plane = yank.def.plane_mut(plane_id);
        plane.paint(Rect::new(site.x_lo, site.y_bot, site.x_hi, site.y_top), TileBody::Rectangular(site.fill))?;
    }
    Ok(())
}

/// Collects the right face of every non-space rectangular tile in
/// `window`, then looks for two faces of the same type that are
/// vertically adjacent (one's top is the other's bottom) and no more
/// than `max_jog` apart in x.
fn find_jog(yank: &mut Yank, plane_id: PlaneId, window: Rect, max_jog: Coord) -> core_tile::Result<Option<JogSite>> {
    let plane = yank.def.plane_mut(plane_id);
    let mut faces: Vec<(core_tile::TileType, Coord, Coord, Coord)> = Vec::new(); // (type, right-face x, y_bot, y_top)
    for id in plane.area_enum(window)? {
        let Some(ttype) = plane.body_of(id).as_rectangular() else {
            continue;
        };
        if ttype.is_space() {
            continue;
        }
        let r = plane.rect_of(id);
        faces.push((ttype, r.ur.x, r.ll.y, r.ur.y));
    }
    for i in 0..faces.len() {
        for j in 0..faces.len() {
            if i == j {
                continue;
            }
            let (t_a, x_a, y_bot_a, y_top_a) = faces[i];
            let (t_b, x_b, y_bot_b, y_top_b) = faces[j];
            if t_a != t_b || y_top_a != y_bot_b {
                continue;
            }
            let jog = x_b - x_a;
            if jog <= 0 || jog > max_jog {
                continue;
            }
            let notch = Rect::new(x_a, y_bot_a, x_b, y_top_a);
            if notch_has_foreign_material(plane, notch, t_a)? {
                continue;
            }
            return Ok(Some(JogSite {
                x_lo: x_a,
                x_hi: x_b,
                y_bot: y_bot_a,
                y_top: y_top_a,
                fill: t_a,
            }));
        }
    }
    Ok(None)
}

/// True if `notch` is not entirely space or `fill` already: a foreign
/// tile sitting in the notch means squaring it off would paint over
/// material that belongs to something else, so the jog must be left
/// alone.
fn notch_has_foreign_material(
    plane: &mut core_tile::Plane,
    notch: Rect,
    fill: core_tile::TileType,
) -> core_tile::Result<bool> {
    for id in plane.area_enum(notch)? {
        let Some(ttype) = plane.body_of(id).as_rectangular() else {
            return Ok(true); // a split tile in the notch is foreign by definition
        };
        if !ttype.is_space() && ttype != fill {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::Direction;
    use core_cell::CellDef;
    use core_tile::TileType;

    #[test]
    fn straightens_a_single_unit_jog() {
        let mut def = CellDef::new("top");
        let t = TileType(1);
        def.paint(PlaneId(0), Rect::new(0, 0, 10, 5), TileBody::Rectangular(t)).unwrap();
        def.paint(PlaneId(0), Rect::new(0, 5, 11, 10), TileBody::Rectangular(t)).unwrap();
        let norm = Direction::East.normalize();
        let mut yank = Yank::build(&def, PlaneId(0), norm, Rect::new(-5, -5, 20, 15)).unwrap();
        straighten_jogs(&mut yank, PlaneId(0), Rect::new(-5, -5, 20, 15), 2).unwrap();
        let plane = yank.def.plane_mut(PlaneId(0));
        let id = plane.point_locate(core_tile::Point::new(10, 2)).unwrap();
        assert_eq!(plane.body_of(id).as_rectangular(), Some(t));
    }

    #[test]
    fn leaves_jog_alone_when_a_foreign_tile_occupies_the_notch() {
        let mut def = CellDef::new("top");
        let t = TileType(1);
        let foreign = TileType(2);
        def.paint(PlaneId(0), Rect::new(0, 0, 10, 5), TileBody::Rectangular(t)).unwrap();
        def.paint(PlaneId(0), Rect::new(0, 5, 11, 10), TileBody::Rectangular(t)).unwrap();
        def.paint(PlaneId(0), Rect::new(10, 0, 11, 5), TileBody::Rectangular(foreign)).unwrap();
        let norm = Direction::East.normalize();
        let mut yank = Yank::build(&def, PlaneId(0), norm, Rect::new(-5, -5, 20, 15)).unwrap();
        straighten_jogs(&mut yank, PlaneId(0), Rect::new(-5, -5, 20, 15), 2).unwrap();
        let plane = yank.def.plane_mut(PlaneId(0));
        let notch_id = plane.point_locate(core_tile::Point::new(10, 2)).unwrap();
        assert_eq!(plane.body_of(notch_id).as_rectangular(), Some(foreign));
    }
}
