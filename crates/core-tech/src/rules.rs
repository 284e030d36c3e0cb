//! The design-rule table: per-type-pair DRC cookie chains, plus the
//! separate width/spacing buckets plowing consults.

use bitflags::bitflags;
use core_tile::types::{PlaneId, TileType, TypeMask};
use core_tile::Coord;
use std::collections::HashMap;

bitflags! {
    /// Behavior flags on a [`DrcCookie`]. Named after the original
    /// per-rule flag bits; combinable because a single edge check can be
    /// e.g. both a `MAXWIDTH` rule and `BOTH_CORNERS`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CookieFlags: u16 {
        const DIRECTION_HORIZONTAL = 1 << 0;
        const DIRECTION_VERTICAL   = 1 << 1;
        const BOTH_CORNERS         = 1 << 2;
        const OUTSIDE              = 1 << 3;
        const TRIGGER              = 1 << 4;
        const BENDS_ILLEGAL        = 1 << 5;
        const MAXWIDTH             = 1 << 6;
        const AREA                 = 1 << 7;
        const RECT_SIZE            = 1 << 8;
        const ANGLES               = 1 << 9;
    }
}

/// One design-rule check triggered by an edge between a left type and a
/// right type. `ok_mask`/`corner_mask` are the type sets that satisfy the
/// rule on the near side / at the extended corner, per spec's edge-walk
/// model.
#[derive(Debug, Clone)]
pub struct DrcCookie {
    pub distance: Coord,
    pub corner_distance: Coord,
    pub ok_mask: TypeMask,
    pub corner_mask: TypeMask,
    pub edge_plane: PlaneId,
    pub check_plane: PlaneId,
    pub flags: CookieFlags,
    /// Threshold for a region scan: the max area for `AREA`, or the max
    /// narrow-dimension width for `MAXWIDTH` (with or without
    /// `BENDS_ILLEGAL`). Unused by a plain spacing cookie.
    pub region_limit: Coord,
    /// Bounding-box bounds a `RECT_SIZE` region must fall within.
    /// Unused otherwise.
    pub min_size: (Coord, Coord),
    pub max_size: (Coord, Coord),
    pub why: String,
    /// Set when this cookie only fires after a prior trigger cookie
    /// matched (`CookieFlags::TRIGGER` two-step rules).
    pub trigger_of: Option<Box<DrcCookie>>,
}

/// A plowing width or spacing requirement: `types` must keep `distance`
/// clearance from `other` (spacing) or maintain `distance` minimum extent
/// along the plow direction (width, `other` is `None`).
#[derive(Debug, Clone)]
pub struct PlowRule {
    pub types: TypeMask,
    pub other: Option<TypeMask>,
    pub distance: Coord,
}

#[derive(Debug, Default)]
pub struct RuleTable {
    drc: HashMap<(TileType, TileType), Vec<DrcCookie>>,
    plow_width: Vec<PlowRule>,
    plow_spacing: Vec<PlowRule>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_drc_cookie(&mut self, left: TileType, right: TileType, cookie: DrcCookie) {
        self.drc.entry((left, right)).or_default().push(cookie);
    }

    pub fn drc_cookies(&self, left: TileType, right: TileType) -> &[DrcCookie] {
        self.drc.get(&(left, right)).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn add_plow_width(&mut self, rule: PlowRule) {
        self.plow_width.push(rule);
    }

    pub fn add_plow_spacing(&mut self, rule: PlowRule) {
        self.plow_spacing.push(rule);
    }

    pub fn plow_width_for(&self, t: TileType) -> Coord {
        self.plow_width
            .iter()
            .filter(|r| r.types.contains(t))
            .map(|r| r.distance)
            .max()
            .unwrap_or(0)
    }

    /// Largest distance named by any registered DRC cookie; used to size
    /// the look-ahead search window around a tile under the basic check.
    pub fn max_drc_distance(&self) -> Coord {
        self.drc
            .values()
            .flat_map(|cookies| cookies.iter())
            .map(|c| c.distance.max(c.corner_distance))
            .max()
            .unwrap_or(0)
    }

    pub fn plow_spacing_for(&self, t: TileType, other: TileType) -> Coord {
        self.plow_spacing
            .iter()
            .filter(|r| r.types.contains(t) && r.other.as_ref().is_none_or(|m| m.contains(other)))
            .map(|r| r.distance)
            .max()
            .unwrap_or(0)
    }

    /// Drop any width/spacing rule whose requirement is implied by a
    /// stricter rule covering the same or a superset of types: a rule is
    /// dominated when another rule in the same bucket covers every type
    /// it covers (or more) and demands at least as much distance.
    pub fn optimize(&mut self) {
        Self::dedup_dominated(&mut self.plow_width);
        Self::dedup_dominated(&mut self.plow_spacing);
    }

    fn dedup_dominated(rules: &mut Vec<PlowRule>) {
        let mut kept: Vec<PlowRule> = Vec::new();
        'outer: for candidate in rules.drain(..) {
            for existing in &kept {
                if dominates(existing, &candidate) {
                    continue 'outer;
                }
            }
            kept.retain(|existing| !dominates(&candidate, existing));
            kept.push(candidate);
        }
        *rules = kept;
    }
}

fn covers(a: &TypeMask, b: &TypeMask) -> bool {
    // a covers b if every type in b is also in a: equivalent to union(a,b) == a.
    &a.union(b) == a
}

fn dominates(a: &PlowRule, b: &PlowRule) -> bool {
    if a.distance < b.distance {
        return false;
    }
    if !covers(&a.types, &b.types) {
        return false;
    }
    match (&a.other, &b.other) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(ao), Some(bo)) => covers(ao, bo),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask(ids: &[u16]) -> TypeMask {
        ids.iter().map(|&n| TileType(n)).collect()
    }

    #[test]
    fn optimize_drops_dominated_width_rule() {
        let mut table = RuleTable::new();
        table.add_plow_width(PlowRule { types: mask(&[1, 2]), other: None, distance: 10 });
        table.add_plow_width(PlowRule { types: mask(&[1]), other: None, distance: 5 });
        table.optimize();
        assert_eq!(table.plow_width_for(TileType(1)), 10);
    }

    #[test]
    fn plow_spacing_for_picks_max_applicable() {
        let mut table = RuleTable::new();
        table.add_plow_spacing(PlowRule {
            types: mask(&[1]),
            other: Some(mask(&[2])),
            distance: 3,
        });
        table.add_plow_spacing(PlowRule {
            types: mask(&[1]),
            other: Some(mask(&[2, 3])),
            distance: 6,
        });
        assert_eq!(table.plow_spacing_for(TileType(1), TileType(2)), 6);
        assert_eq!(table.plow_spacing_for(TileType(1), TileType(9)), 0);
    }
}
