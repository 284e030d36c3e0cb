//! The basic edge-walk check: for every tile, look at everything within
//! the farthest rule distance for its type and flag whatever violates a
//! registered cookie.
//!
//! Resolves the corner-measurement Open Question: ordinary rules use the
//! rectilinear (axis-aligned) gap, since that is what "distance between
//! two edges" means for anything but a diagonal corner. Only cookies
//! flagged `BOTH_CORNERS` fall back to the true Euclidean corner
//! distance, matching the "corner extension" look-ahead the edge walker
//! performs at tile corners.

use crate::{DrcReport, Result, Violation};
use core_cell::CellDef;
use core_tech::Technology;
use core_tech::rules::CookieFlags;
use core_tile::types::PlaneId;
use core_tile::{Rect, TileId};
use std::collections::HashSet;

pub fn basic_check(def: &mut CellDef, plane_id: PlaneId, tech: &Technology, rect: Rect) -> Result<DrcReport> {
    let mut report = DrcReport::new();
    let margin = tech.rules.max_drc_distance();

    if margin > 0 {
        let plane = def.plane_mut(plane_id);
        let search_rect = rect.grown(margin);
        let mut checked_pairs: HashSet<(TileId, TileId)> = HashSet::new();

        for id in plane.area_enum(rect)? {
            let Some(left_type) = plane.body_of(id).as_rectangular() else {
                continue; // split-tile DRC is handled by the subcell/array interaction path, not here
            };
            let tile_rect = plane.rect_of(id);

            if left_type.is_error() {
                report.push(Violation {
                    plane: plane_id,
                    rect: tile_rect,
                    why: "illegal overlap".to_string(),
                });
                continue;
            }

            let probe = Rect::new(
                (tile_rect.ll.x - margin).max(search_rect.ll.x),
                (tile_rect.ll.y - margin).max(search_rect.ll.y),
                (tile_rect.ur.x + margin).min(search_rect.ur.x),
                (tile_rect.ur.y + margin).min(search_rect.ur.y),
            );
            for n in plane.area_enum(probe)? {
                if n == id {
                    continue;
                }
                let key = if id < n { (id, n) } else { (n, id) };
                if !checked_pairs.insert(key) {
                    continue;
                }
                let Some(right_type) = plane.body_of(n).as_rectangular() else {
                    continue;
                };
                let neighbor_rect = plane.rect_of(n);
                for cookie in tech.rules.drc_cookies(left_type, right_type) {
                    // Region scans (area/maxwidth/rect-size) own these; the
                    // edge walk only evaluates plain spacing cookies.
                    if cookie
                        .flags
                        .intersects(CookieFlags::AREA | CookieFlags::MAXWIDTH | CookieFlags::RECT_SIZE)
                    {
                        continue;
                    }
                    let (dx, dy) = tile_rect.axis_gaps(&neighbor_rect);
                    let is_corner = dx > 0 && dy > 0;

                    if is_corner && cookie.flags.contains(CookieFlags::OUTSIDE) {
                        continue;
                    }

                    let violates = if is_corner {
                        if !cookie.flags.contains(CookieFlags::BOTH_CORNERS) {
                            continue;
                        }
                        if cookie.corner_mask.contains(right_type) {
                            continue;
                        }
                        let dist = ((dx * dx + dy * dy) as f64).sqrt();
                        dist < cookie.corner_distance as f64
                    } else {
                        if cookie.ok_mask.contains(right_type) {
                            continue;
                        }
                        dx.max(dy) < cookie.distance
                    };

                    if !violates {
                        continue;
                    }

                    if let Some(trigger) = &cookie.trigger_of {
                        let triggered = if is_corner {
                            let dist = ((dx * dx + dy * dy) as f64).sqrt();
                            dist < trigger.corner_distance as f64
                        } else {
                            dx.max(dy) < trigger.distance
                        };
                        if !triggered {
                            continue;
                        }
                    }

                    let report_rect = Rect::new(
                        tile_rect.ll.x.min(neighbor_rect.ll.x),
                        tile_rect.ll.y.min(neighbor_rect.ll.y),
                        tile_rect.ur.x.max(neighbor_rect.ur.x),
                        tile_rect.ur.y.max(neighbor_rect.ur.y),
                    );
                    report.push(Violation {
                        plane: cookie.check_plane,
                        rect: report_rect,
                        why: cookie.why.clone(),
                    });
                }
            }
        }
    }

    report.extend(crate::scanners::region_scans(def, plane_id, tech, rect)?.all().iter().cloned());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_tile::{TileBody, TileType};

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
    fn flags_too_close_same_type_tiles() {
        let tech = sample_tech();
        let m1 = tech.type_named("metal1").unwrap();
        let mut def = CellDef::new("top");
        def.paint(PlaneId(0), Rect::new(0, 0, 10, 10), TileBody::Rectangular(m1)).unwrap();
        def.paint(PlaneId(0), Rect::new(12, 0, 20, 10), TileBody::Rectangular(m1)).unwrap();
        let report = basic_check(&mut def, PlaneId(0), &tech, Rect::new(-5, -5, 25, 15)).unwrap();
        assert!(!report.is_clean());
        assert_eq!(report.all()[0].why, "metal1.spacing");
    }

    #[test]
    fn sufficiently_spaced_tiles_are_clean() {
        let tech = sample_tech();
        let m1 = tech.type_named("metal1").unwrap();
        let mut def = CellDef::new("top");
        def.paint(PlaneId(0), Rect::new(0, 0, 10, 10), TileBody::Rectangular(m1)).unwrap();
        def.paint(PlaneId(0), Rect::new(13, 0, 20, 10), TileBody::Rectangular(m1)).unwrap();
        let report = basic_check(&mut def, PlaneId(0), &tech, Rect::new(-5, -5, 25, 15)).unwrap();
        assert!(report.is_clean());
    }
}
