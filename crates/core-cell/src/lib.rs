//! Named designs (`CellDef`) and their oriented placements (`CellUse`).
//!
//! A `CellDef` owns one [`core_tile::Plane`] per technology plane plus a
//! dedicated cell plane used to locate child `CellUse`s spatially, a
//! label list, and a bounding box. A `CellUse` places a `CellDef` inside
//! another (or stands alone as the edit cell) under one of the eight
//! orthogonal orientations, optionally repeated as a rectangular array.

use core_tile::types::PlaneId;
use core_tile::{Plane, Point, Rect};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellDefId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellUseId(pub u32);

/// One of the eight orthogonal orientations: the four rotations, each
/// optionally mirrored. Represented as an integer 2x2 matrix so
/// composition and point transforms are exact, never floating point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    R0,
    R90,
    R180,
    R270,
    MirrorX,
    MirrorX90,
    MirrorY,
    MirrorY90,
}

impl Orientation {
    fn matrix(self) -> (i64, i64, i64, i64) {
        // (a b; c d) applied as (x', y') = (a*x + b*y, c*x + d*y)
        match self {
            Orientation::R0 => (1, 0, 0, 1),
            Orientation::R90 => (0, -1, 1, 0),
            Orientation::R180 => (-1, 0, 0, -1),
            Orientation::R270 => (0, 1, -1, 0),
            Orientation::MirrorX => (1, 0, 0, -1),
            Orientation::MirrorX90 => (0, -1, -1, 0),
            Orientation::MirrorY => (-1, 0, 0, 1),
            Orientation::MirrorY90 => (0, 1, 1, 0),
        }
    }

    fn apply(self, p: Point) -> Point {
        let (a, b, c, d) = self.matrix();
        Point::new(a * p.x + b * p.y, c * p.x + d * p.y)
    }

    pub fn inverse(self) -> Orientation {
        // every one of the 8 is its own inverse except the two 90-degree
        // pure rotations, which invert to their 270-degree counterpart.
        match self {
            Orientation::R90 => Orientation::R270,
            Orientation::R270 => Orientation::R90,
            other => other,
        }
    }
}

/// Placement transform: orient, then translate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transform2D {
    pub orientation: Orientation,
    pub translate: Point,
}

impl Transform2D {
    pub fn identity() -> Self {
        Self {
            orientation: Orientation::R0,
            translate: Point::new(0, 0),
        }
    }

    pub fn apply_point(&self, p: Point) -> Point {
        let r = self.orientation.apply(p);
        Point::new(r.x + self.translate.x, r.y + self.translate.y)
    }

    pub fn apply_rect(&self, r: Rect) -> Rect {
        let corners = [
            self.apply_point(r.ll),
            self.apply_point(Point::new(r.ur.x, r.ll.y)),
            self.apply_point(Point::new(r.ll.x, r.ur.y)),
            self.apply_point(r.ur),
        ];
        let min_x = corners.iter().map(|p| p.x).min().unwrap();
        let max_x = corners.iter().map(|p| p.x).max().unwrap();
        let min_y = corners.iter().map(|p| p.y).min().unwrap();
        let max_y = corners.iter().map(|p| p.y).max().unwrap();
        Rect::new(min_x, min_y, max_x, max_y)
    }

    /// The inverse transform: undoing translate then the inverse
    /// orientation.
    pub fn inverse(&self) -> Transform2D {
        let inv_orient = self.orientation.inverse();
        let neg_translate = inv_orient.apply(Point::new(-self.translate.x, -self.translate.y));
        Transform2D {
            orientation: inv_orient,
            translate: neg_translate,
        }
    }
}

/// Repetition parameters for an arrayed `CellUse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayParams {
    pub nx: u32,
    pub ny: u32,
    pub xsep: i64,
    pub ysep: i64,
}

/// A placement of one `CellDef` inside another (or as the top-level edit
/// cell, which has no parent).
#[derive(Debug, Clone)]
pub struct CellUse {
    pub id: CellUseId,
    pub def: CellDefId,
    pub transform: Transform2D,
    pub array: Option<ArrayParams>,
    /// Per-child-plane expansion bits: which planes of `def` are drawn
    /// "expanded" (full detail) versus abstracted, mirroring the
    /// original's expansion bitmask.
    pub expand_mask: u32,
    pub locked: bool,
}

impl CellUse {
    /// Bounding box of one array element in the parent's coordinate
    /// system, given the unarrayed `def` bbox.
    pub fn element_bbox(&self, def_bbox: Rect) -> Rect {
        self.transform.apply_rect(def_bbox)
    }

    /// Index ranges `(x0..=x1, y0..=y1)` of array elements whose bbox
    /// overlaps `query`, or `None` if this use is not arrayed or nothing
    /// overlaps. Indices follow the `(xsep, ysep)` stride starting at
    /// element `(0, 0)` which sits at `element_bbox`.
    pub fn array_search(&self, def_bbox: Rect, query: Rect) -> Option<((u32, u32), (u32, u32))> {
        let array = self.array?;
        let base = self.element_bbox(def_bbox);
        if array.xsep == 0 && array.ny <= 1 {
            // degenerate but still must overlap in y below
        }
        let index_range = |base_lo: i64, base_hi: i64, sep: i64, count: u32, q_lo: i64, q_hi: i64| -> Option<(u32, u32)> {
            if count == 0 {
                return None;
            }
            if sep == 0 {
                return if base_lo < q_hi && q_lo < base_hi {
                    Some((0, count - 1))
                } else {
                    None
                };
            }
            // element i spans [base_lo + i*sep, base_hi + i*sep)
            let lo = ((q_lo - base_hi) as f64 / sep as f64).floor() as i64 + 1;
            let hi = ((q_hi - 1 - base_lo) as f64 / sep as f64).floor() as i64;
            let lo = lo.max(0) as u32;
            let hi = (hi.max(-1)) ;
            if hi < 0 {
                return None;
            }
            let hi = (hi as u32).min(count - 1);
            if lo > hi {
                None
            } else {
                Some((lo, hi))
            }
        };
        let xr = index_range(base.ll.x, base.ur.x, array.xsep, array.nx, query.ll.x, query.ur.x)?;
        let yr = index_range(base.ll.y, base.ur.y, array.ysep, array.ny, query.ll.y, query.ur.y)?;
        Some((xr, yr))
    }
}

/// Justification anchor for a label's text relative to its rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Justify {
    Center,
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

#[derive(Debug, Clone)]
pub struct Label {
    pub rect: Rect,
    pub plane: PlaneId,
    pub text: String,
    pub font_size: u16,
    pub justify: Justify,
    pub rotation: Orientation,
    /// A sticky label keeps its absolute position across edits to the
    /// geometry it annotates rather than tracking the nearest tile.
    pub sticky: bool,
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CellFlags: u8 {
        const MODIFIED  = 1 << 0;
        const AVAILABLE = 1 << 1;
        const LOCKED    = 1 << 2;
    }
}

/// A named design: one tile plane per technology plane, a dedicated cell
/// plane recording where child `CellUse`s sit, labels, and a bounding
/// box kept up to date as geometry is painted or instances placed.
#[derive(Clone)]
pub struct CellDef {
    pub name: String,
    pub planes: HashMap<PlaneId, Plane>,
    pub cell_plane: Plane,
    pub labels: Vec<Label>,
    pub bbox: Rect,
    pub flags: CellFlags,
    pub client: Option<u32>,
    pub children: Vec<CellUseId>,
    /// Back-links: every `CellUse` elsewhere that places this def,
    /// replacing the original's reference-counted `Rc` cycle with an
    /// explicit list the owning library maintains.
    pub parents: Vec<CellUseId>,
}

const CELL_PLANE: PlaneId = PlaneId(u16::MAX);

impl CellDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            planes: HashMap::new(),
            cell_plane: Plane::new(CELL_PLANE),
            labels: Vec::new(),
            bbox: Rect::new(0, 0, 0, 0),
            flags: CellFlags::AVAILABLE,
            client: None,
            children: Vec::new(),
            parents: Vec::new(),
        }
    }

    pub fn plane_mut(&mut self, id: PlaneId) -> &mut Plane {
        self.planes.entry(id).or_insert_with(|| Plane::new(id))
    }

    pub fn plane(&self, id: PlaneId) -> Option<&Plane> {
        self.planes.get(&id)
    }

    fn recompute_bbox(&mut self) {
        let mut bbox: Option<Rect> = None;
        for plane in self.planes.values_mut() {
            if let Ok(tiles) = plane.area_enum(Rect::new(
                -core_tile::INFINITY,
                -core_tile::INFINITY,
                core_tile::INFINITY,
                core_tile::INFINITY,
            )) {
                for id in tiles {
                    if plane.body_of(id).is_space() {
                        continue;
                    }
                    let r = plane.rect_of(id);
                    bbox = Some(match bbox {
                        Some(b) => Rect::new(
                            b.ll.x.min(r.ll.x),
                            b.ll.y.min(r.ll.y),
                            b.ur.x.max(r.ur.x),
                            b.ur.y.max(r.ur.y),
                        ),
                        None => r,
                    });
                }
            }
        }
        self.bbox = bbox.unwrap_or(Rect::new(0, 0, 0, 0));
        self.flags |= CellFlags::MODIFIED;
    }

    /// Paint `rect` with `body` on `plane`, keeping the bounding box and
    /// modified flag in sync. Mirrors the paint/erase post-hook contract:
    /// callers still need to enqueue the painted area for incremental
    /// DRC themselves.
    pub fn paint(&mut self, plane: PlaneId, rect: Rect, body: core_tile::TileBody) -> core_tile::Result<()> {
        self.plane_mut(plane).paint(rect, body)?;
        self.recompute_bbox();
        Ok(())
    }

    pub fn erase(&mut self, plane: PlaneId, rect: Rect) -> core_tile::Result<()> {
        self.plane_mut(plane).erase(rect)?;
        self.recompute_bbox();
        Ok(())
    }

    /// Paint `rect` with `ttype` on `plane` through the technology's paint
    /// transition table, so an illegal overlap comes out as `TT_ERROR_S`
    /// instead of silently clobbering what was there. This is what a
    /// design-facing paint command should call; [`CellDef::paint`] stays
    /// the raw overwrite used internally (yank scratch copies, instance
    /// markers) where there's no transition to apply.
    pub fn paint_checked(
        &mut self,
        plane: PlaneId,
        rect: Rect,
        ttype: core_tile::TileType,
        table: &core_tile::TypeTable,
    ) -> core_tile::Result<()> {
        self.plane_mut(plane).paint_checked(rect, ttype, table)?;
        self.recompute_bbox();
        Ok(())
    }

    /// Calls `visitor` with every non-space tile on `plane` overlapping
    /// `rect`, for a file writer to serialize. No GDS/CIF interpretation
    /// happens here; the writer decides what a `(rect, TileType)` means
    /// on the wire.
    pub fn enumerate_tiles(
        &mut self,
        plane: PlaneId,
        rect: Rect,
        mut visitor: impl FnMut(Rect, core_tile::TileType),
    ) -> core_tile::Result<()> {
        let Some(plane) = self.planes.get_mut(&plane) else {
            return Ok(());
        };
        for id in plane.area_enum(rect)? {
            if let Some(ttype) = plane.body_of(id).as_rectangular() {
                if !ttype.is_space() {
                    visitor(plane.rect_of(id), ttype);
                }
            }
        }
        Ok(())
    }

    /// Calls `visitor` with every label overlapping `rect`, for a file
    /// writer to serialize alongside `enumerate_tiles`.
    pub fn enumerate_labels(&self, rect: Rect, mut visitor: impl FnMut(&Label)) {
        for label in &self.labels {
            if label.rect.intersects(&rect) {
                visitor(label);
            }
        }
    }
}

/// Current selection: a set of child instances plus raw tile regions,
/// the sole input to Selection Stretch (built atop `core-plow`). Not a
/// general interactive selection tool.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub cells: Vec<CellUseId>,
    pub tiles: Vec<(PlaneId, Rect)>,
}

#[derive(Debug, Error)]
pub enum CellError {
    #[error("cell definition {0:?} not found")]
    UnresolvedReference(String),
    #[error("cell {0:?} is locked against this edit")]
    LockedCell(String),
}

/// Owns every `CellDef` and `CellUse` in a design, the symbol table the
/// spec calls "entity lifecycle" scope for both.
#[derive(Default)]
pub struct CellLibrary {
    defs: Vec<CellDef>,
    by_name: HashMap<String, CellDefId>,
    uses: Vec<CellUse>,
}

impl CellLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, def: CellDef) -> CellDefId {
        let id = CellDefId(self.defs.len() as u32);
        self.by_name.insert(def.name.clone(), id);
        self.defs.push(def);
        id
    }

    pub fn by_name(&self, name: &str) -> Option<CellDefId> {
        self.by_name.get(name).copied()
    }

    pub fn def(&self, id: CellDefId) -> &CellDef {
        &self.defs[id.0 as usize]
    }

    pub fn def_mut(&mut self, id: CellDefId) -> &mut CellDef {
        &mut self.defs[id.0 as usize]
    }

    /// Place `child` inside `parent` under `transform`, recording the
    /// back-link on the child def and registering the instance on the
    /// parent's cell plane so point-location finds it.
    pub fn place(
        &mut self,
        parent: CellDefId,
        child: CellDefId,
        transform: Transform2D,
        array: Option<ArrayParams>,
    ) -> Result<CellUseId, CellError> {
        if self.defs[child.0 as usize].flags.contains(CellFlags::LOCKED) {
            return Err(CellError::LockedCell(self.defs[child.0 as usize].name.clone()));
        }
        let use_id = CellUseId(self.uses.len() as u32);
        let bbox = self.defs[child.0 as usize].bbox;
        let placement_bbox = transform.apply_rect(bbox);
        self.uses.push(CellUse {
            id: use_id,
            def: child,
            transform,
            array,
            expand_mask: 0,
            locked: false,
        });
        self.defs[child.0 as usize].parents.push(use_id);
        let parent_def = &mut self.defs[parent.0 as usize];
        parent_def.children.push(use_id);
        if !placement_bbox.is_empty() {
            parent_def
                .cell_plane
                .paint(placement_bbox, core_tile::TileBody::Rectangular(core_tile::TileType(1)))
                .ok();
            parent_def.cell_plane.set_client(
                parent_def.cell_plane.point_locate(placement_bbox.ll).unwrap(),
                Some(use_id.0),
            );
        }
        Ok(use_id)
    }

    pub fn cell_use(&self, id: CellUseId) -> &CellUse {
        &self.uses[id.0 as usize]
    }

    /// Reposition an already-placed `CellUse` by `(dx, dy)`, updating the
    /// parent's cell-plane registration to match. Used by plowing and
    /// selection-stretch to carry a dragged or pushed instance along with
    /// the geometry around it, without going through `place` again.
    pub fn translate_use(&mut self, parent: CellDefId, id: CellUseId, dx: i64, dy: i64) -> core_tile::Result<()> {
        let def_bbox = self.defs[self.uses[id.0 as usize].def.0 as usize].bbox;
        let old_bbox = self.uses[id.0 as usize].transform.apply_rect(def_bbox);
        self.uses[id.0 as usize].transform.translate.x += dx;
        self.uses[id.0 as usize].transform.translate.y += dy;
        let new_bbox = self.uses[id.0 as usize].transform.apply_rect(def_bbox);

        let parent_def = &mut self.defs[parent.0 as usize];
        if !old_bbox.is_empty() {
            parent_def.cell_plane.erase(old_bbox)?;
        }
        if !new_bbox.is_empty() {
            parent_def
                .cell_plane
                .paint(new_bbox, core_tile::TileBody::Rectangular(core_tile::TileType(1)))?;
            let tid = parent_def.cell_plane.point_locate(new_bbox.ll)?;
            parent_def.cell_plane.set_client(tid, Some(id.0));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_tile::{TileBody, TileType};

    #[test]
    fn r90_rotates_a_point_counterclockwise() {
        let t = Transform2D {
            orientation: Orientation::R90,
            translate: Point::new(0, 0),
        };
        assert_eq!(t.apply_point(Point::new(1, 0)), Point::new(0, 1));
    }

    #[test]
    fn inverse_transform_round_trips() {
        let t = Transform2D {
            orientation: Orientation::MirrorX90,
            translate: Point::new(5, -3),
        };
        let p = Point::new(7, 2);
        let back = t.inverse().apply_point(t.apply_point(p));
        assert_eq!(back, p);
    }

    #[test]
    fn paint_updates_bbox() {
        let mut def = CellDef::new("inv");
        def.paint(PlaneId(0), Rect::new(0, 0, 10, 20), TileBody::Rectangular(TileType(1)))
            .unwrap();
        assert_eq!(def.bbox, Rect::new(0, 0, 10, 20));
        assert!(def.flags.contains(CellFlags::MODIFIED));
    }

    #[test]
    fn array_search_finds_overlapping_indices() {
        let cu = CellUse {
            id: CellUseId(0),
            def: CellDefId(0),
            transform: Transform2D::identity(),
            array: Some(ArrayParams { nx: 5, ny: 1, xsep: 10, ysep: 0 }),
            expand_mask: 0,
            locked: false,
        };
        let def_bbox = Rect::new(0, 0, 4, 4);
        let (xr, _yr) = cu.array_search(def_bbox, Rect::new(22, 0, 28, 4)).unwrap();
        assert_eq!(xr, (2, 2));
    }

    #[test]
    fn place_registers_parent_and_child_links() {
        let mut lib = CellLibrary::new();
        let mut child = CellDef::new("nand2");
        child.paint(PlaneId(0), Rect::new(0, 0, 10, 10), TileBody::Rectangular(TileType(1))).unwrap();
        let child_id = lib.define(child);
        let parent_id = lib.define(CellDef::new("top"));
        let use_id = lib
            .place(parent_id, child_id, Transform2D::identity(), None)
            .unwrap();
        assert_eq!(lib.def(parent_id).children, vec![use_id]);
        assert_eq!(lib.def(child_id).parents, vec![use_id]);
    }
}
