//! Specialized whole-region scanners: area, maxwidth (with and without
//! permitted bends), rectangle-size, and angle validation. Each reduces
//! to a connected-component flood fill followed by a shape test, rather
//! than the pairwise edge walk [`crate::basic`] performs.

use crate::maxrect::{find_max_rectangle, find_max_rects};
use crate::{DrcReport, Result, Violation};
use core_cell::CellDef;
use core_tech::Technology;
use core_tech::rules::CookieFlags;
use core_tile::types::{PlaneId, TileType};
use core_tile::{Rect, TileId};
use std::collections::HashSet;

/// Every tile of `ttype` reachable from `seed` by edge adjacency,
/// visited via an explicit stack (never recursion, so depth is bounded
/// only by available memory).
pub fn connected_region(def: &mut CellDef, plane_id: PlaneId, ttype: TileType, seed: TileId) -> crate::Result<Vec<TileId>> {
    let plane = def.plane_mut(plane_id);
    let mut visited = std::collections::HashSet::new();
    let mut stack = vec![seed];
    let mut out = Vec::new();
    visited.insert(seed);
    while let Some(id) = stack.pop() {
        if plane.body_of(id).as_rectangular() != Some(ttype) {
            continue;
        }
        out.push(id);
        for n in plane.edge_neighbors(id)? {
            if visited.insert(n) {
                stack.push(n);
            }
        }
    }
    Ok(out)
}

fn region_rects(def: &mut CellDef, plane_id: PlaneId, region: &[TileId]) -> Vec<Rect> {
    let plane = def.plane_mut(plane_id);
    region.iter().map(|&id| plane.rect_of(id)).collect()
}

fn region_bbox(rects: &[Rect]) -> Rect {
    rects.iter().fold(rects[0], |acc, r| {
        Rect::new(
            acc.ll.x.min(r.ll.x),
            acc.ll.y.min(r.ll.y),
            acc.ur.x.max(r.ur.x),
            acc.ur.y.max(r.ur.y),
        )
    })
}

/// Flags a connected region whose total painted area exceeds `max_area`.
pub fn area_check(
    def: &mut CellDef,
    plane_id: PlaneId,
    ttype: TileType,
    seed: TileId,
    max_area: i64,
    why: &str,
) -> Result<DrcReport> {
    let region = connected_region(def, plane_id, ttype, seed)?;
    let rects = region_rects(def, plane_id, &region);
    let total: i64 = rects.iter().map(Rect::area).sum();
    let mut report = DrcReport::new();
    if total > max_area {
        report.push(Violation {
            plane: plane_id,
            rect: region_bbox(&rects),
            why: why.to_string(),
        });
    }
    Ok(report)
}

/// A region is in violation if its largest contained rectangle exceeds
/// `max_width` in its narrow dimension *and* the region is not a single
/// straight run (i.e. it bends) — wide metal is required to stay
/// straight past `max_width`.
pub fn maxwidth_bends_illegal_check(
    def: &mut CellDef,
    plane_id: PlaneId,
    ttype: TileType,
    seed: TileId,
    max_width: i64,
    why: &str,
) -> Result<DrcReport> {
    let region = connected_region(def, plane_id, ttype, seed)?;
    let rects = region_rects(def, plane_id, &region);
    let mut report = DrcReport::new();
    let Some(max_rect) = find_max_rectangle(&rects) else {
        return Ok(report);
    };
    let narrow = max_rect.width().min(max_rect.height());
    let straight = rects.iter().all(|r| r.ll.x == rects[0].ll.x && r.ur.x == rects[0].ur.x)
        || rects.iter().all(|r| r.ll.y == rects[0].ll.y && r.ur.y == rects[0].ur.y);
    if narrow > max_width && !straight {
        report.push(Violation {
            plane: plane_id,
            rect: region_bbox(&rects),
            why: why.to_string(),
        });
    }
    Ok(report)
}

/// The permissive counterpart: bends are fine as long as every maximal
/// sub-rectangle composing the region stays within `max_width` in both
/// dimensions (a genuinely wide blob, not just a bent narrow strip, is
/// what's being flagged).
pub fn maxwidth_with_bends_check(
    def: &mut CellDef,
    plane_id: PlaneId,
    ttype: TileType,
    seed: TileId,
    max_width: i64,
    why: &str,
) -> Result<DrcReport> {
    let region = connected_region(def, plane_id, ttype, seed)?;
    let rects = region_rects(def, plane_id, &region);
    let mut report = DrcReport::new();
    for piece in find_max_rects(&rects, 8) {
        if piece.width() > max_width && piece.height() > max_width {
            report.push(Violation {
                plane: plane_id,
                rect: piece,
                why: why.to_string(),
            });
        }
    }
    Ok(report)
}

/// The region's overall bounding box must fall within `[min, max]` on
/// both axes.
pub fn rectsize_check(
    def: &mut CellDef,
    plane_id: PlaneId,
    ttype: TileType,
    seed: TileId,
    min_size: (i64, i64),
    max_size: (i64, i64),
    why: &str,
) -> Result<DrcReport> {
    let region = connected_region(def, plane_id, ttype, seed)?;
    let rects = region_rects(def, plane_id, &region);
    let bbox = region_bbox(&rects);
    let mut report = DrcReport::new();
    let (w, h) = (bbox.width(), bbox.height());
    if w < min_size.0 || h < min_size.1 || w > max_size.0 || h > max_size.1 {
        report.push(Violation {
            plane: plane_id,
            rect: bbox,
            why: why.to_string(),
        });
    }
    Ok(report)
}

/// Validates split-tile diagonals against the Manhattan/45-degree
/// constraint: the cut must run corner to corner of the tile cell, i.e.
/// the cell's x-extent must equal its y-extent. A split tile stretched
/// into a non-square cell represents an angle no 45-degree technology
/// allows.
pub fn angles_check(def: &mut CellDef, plane_id: PlaneId, rect: Rect) -> Result<DrcReport> {
    let plane = def.plane_mut(plane_id);
    let mut report = DrcReport::new();
    for id in plane.area_enum(rect)? {
        if matches!(plane.body_of(id), core_tile::TileBody::Split { .. }) {
            let r = plane.rect_of(id);
            if r.width() != r.height() {
                report.push(Violation {
                    plane: plane_id,
                    rect: r,
                    why: "split tile is not a true 45 degree cut".to_string(),
                });
            }
        }
    }
    Ok(report)
}

/// Runs every region scanner a technology's cookies ask for, once per
/// connected component, then validates split-tile angles unconditionally
/// (a structural invariant, not a per-type rule). This is what wires the
/// scanners above into the DRC pipeline: [`crate::basic::basic_check`]
/// calls this after its pairwise edge walk.
pub fn region_scans(def: &mut CellDef, plane_id: PlaneId, tech: &Technology, rect: Rect) -> Result<DrcReport> {
    let mut report = DrcReport::new();
    let mut scanned: HashSet<TileId> = HashSet::new();

    let seeds: Vec<(TileId, TileType)> = {
        let plane = def.plane_mut(plane_id);
        plane
            .area_enum(rect)?
            .into_iter()
            .filter_map(|id| plane.body_of(id).as_rectangular().map(|t| (id, t)))
            .collect()
    };

    for (seed, ttype) in seeds {
        if ttype.is_space() || ttype.is_error() || scanned.contains(&seed) {
            continue;
        }
        let cookies = tech.rules.drc_cookies(ttype, ttype);
        if cookies.is_empty() {
            continue;
        }
        let region = connected_region(def, plane_id, ttype, seed)?;
        scanned.extend(region.iter().copied());

        for cookie in cookies {
            if cookie.flags.contains(CookieFlags::AREA) {
                let r = area_check(def, plane_id, ttype, seed, cookie.region_limit, &cookie.why)?;
                report.extend(r.all().iter().cloned());
            }
            if cookie.flags.contains(CookieFlags::MAXWIDTH) {
                let r = if cookie.flags.contains(CookieFlags::BENDS_ILLEGAL) {
                    maxwidth_bends_illegal_check(def, plane_id, ttype, seed, cookie.region_limit, &cookie.why)?
                } else {
                    maxwidth_with_bends_check(def, plane_id, ttype, seed, cookie.region_limit, &cookie.why)?
                };
                report.extend(r.all().iter().cloned());
            }
            if cookie.flags.contains(CookieFlags::RECT_SIZE) {
                let r = rectsize_check(def, plane_id, ttype, seed, cookie.min_size, cookie.max_size, &cookie.why)?;
                report.extend(r.all().iter().cloned());
            }
        }
    }

    report.extend(angles_check(def, plane_id, rect)?.all().iter().cloned());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_tile::TileBody;

    #[test]
    fn area_check_flags_oversized_region() {
        let mut def = CellDef::new("top");
        let t = TileType(1);
        def.paint(PlaneId(0), Rect::new(0, 0, 20, 20), TileBody::Rectangular(t)).unwrap();
        let seed = def.plane_mut(PlaneId(0)).point_locate(core_tile::Point::new(5, 5)).unwrap();
        let report = area_check(&mut def, PlaneId(0), t, seed, 100, "area.max").unwrap();
        assert!(!report.is_clean());
    }

    #[test]
    fn area_check_allows_small_region() {
        let mut def = CellDef::new("top");
        let t = TileType(1);
        def.paint(PlaneId(0), Rect::new(0, 0, 5, 5), TileBody::Rectangular(t)).unwrap();
        let seed = def.plane_mut(PlaneId(0)).point_locate(core_tile::Point::new(1, 1)).unwrap();
        let report = area_check(&mut def, PlaneId(0), t, seed, 100, "area.max").unwrap();
        assert!(report.is_clean());
    }

    #[test]
    fn rectsize_flags_region_below_minimum() {
        let mut def = CellDef::new("top");
        let t = TileType(1);
        def.paint(PlaneId(0), Rect::new(0, 0, 2, 2), TileBody::Rectangular(t)).unwrap();
        let seed = def.plane_mut(PlaneId(0)).point_locate(core_tile::Point::new(0, 0)).unwrap();
        let report = rectsize_check(&mut def, PlaneId(0), t, seed, (4, 4), (1000, 1000), "rectsize.min").unwrap();
        assert!(!report.is_clean());
    }
}
