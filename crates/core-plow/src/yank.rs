//! Yank buffer: a scratch `CellDef` holding a normalized (eastward-motion)
//! copy of the halo region around the plow. Growth is geometric: an
//! escape re-yanks from the original source at a larger halo rather than
//! patching the existing buffer tile by tile.

use core_cell::{CellDef, Transform2D};
use core_tile::types::PlaneId;
use core_tile::{Rect, TileBody};

pub struct Yank {
    pub def: CellDef,
    pub plane: PlaneId,
    pub norm: Transform2D,
    /// Bounding rect of the yanked region, in normalized coordinates.
    /// Propagation escaping this rect is the signal to grow.
    pub extent: Rect,
}

impl Yank {
    /// `halo_rect` is given in the *source's* original coordinates; it is
    /// normalized on the way in.
    pub fn build(source: &CellDef, plane_id: PlaneId, norm: Transform2D, halo_rect: Rect) -> core_tile::Result<Self> {
        let mut def = CellDef::new("plow-yank");
        if let Some(plane) = source.plane(plane_id) {
            let mut plane = plane.clone();
            for id in plane.area_enum(halo_rect)? {
                let body = plane.body_of(id);
                if body.is_space() {
                    continue;
                }
                let Some(ttype) = body.as_rectangular() else {
                    continue;
                };
                let placed = norm.apply_rect(plane.rect_of(id));
                def.paint(plane_id, placed, TileBody::Rectangular(ttype))?;
            }
        }
        Ok(Yank {
            def,
            plane: plane_id,
            norm,
            extent: norm.apply_rect(halo_rect),
        })
    }

    /// Re-yank at a larger halo when propagation's demanded final-x
    /// would fall outside the current extent.
    pub fn grow(&mut self, source: &CellDef, new_halo_rect_source: Rect) -> core_tile::Result<()> {
        *self = Yank::build(source, self.plane, self.norm, new_halo_rect_source)?;
        Ok(())
    }

    /// Copy the yank's current contents back into `target`, after first
    /// erasing the footprint the yank was originally drawn from (in
    /// `target`'s own coordinates) so material that moved away doesn't
    /// leave a stale copy behind.
    pub fn write_back(&mut self, target: &mut CellDef, original_halo_source: Rect) -> core_tile::Result<()> {
        target.erase(self.plane, original_halo_source)?;
        let inverse = self.norm.inverse();
        let universe = Rect::new(-core_tile::INFINITY, -core_tile::INFINITY, core_tile::INFINITY, core_tile::INFINITY);
        let plane = self.def.plane_mut(self.plane);
        let mut placements = Vec::new();
        for id in plane.area_enum(universe)? {
            let body = plane.body_of(id);
            if body.is_space() {
                continue;
            }
            let Some(ttype) = body.as_rectangular() else {
                continue;
            };
            placements.push((plane.rect_of(id), ttype));
        }
        for (r, ttype) in placements {
            target.paint(self.plane, inverse.apply_rect(r), TileBody::Rectangular(ttype))?;
        }
        Ok(())
    }
}
