//! Corner-stitched tile planes.
//!
//! A [`Plane`] tiles an infinite integer coordinate space with
//! non-overlapping rectangles (tiles), each carrying a [`TileBody`].
//! Horizontally-adjacent tiles of the same body are always merged into
//! one maximal strip; this is the plane's central invariant and every
//! mutator restores it before returning.
//!
//! Tiles are arena-allocated (`Vec<Slot>` indexed by [`TileId`]) rather
//! than linked through raw pointers: the four corner-stitch neighbor
//! fields (`lb`, `bl`, `tr`, `rt`) are themselves `Option<TileId>`, so the
//! whole structure is safe-Rust and trivially droppable, at the cost of
//! not being bit-identical to a hand-rolled pointer graph.

pub mod types;

use thiserror::Error;
pub use types::{PlaneId, TileType, TypeMask, TypeTable};

pub type Coord = i64;

/// Coordinate magnitude treated as "the edge of the universe". Real
/// layout data is expected to stay well inside this bound; arithmetic
/// stays in range because `INFINITY * 2` does not overflow `i64`.
pub const INFINITY: Coord = i64::MAX / 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point {
    pub x: Coord,
    pub y: Coord,
}

impl Point {
    pub fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle, lower-left inclusive, upper-right exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub ll: Point,
    pub ur: Point,
}

impl Rect {
    pub fn new(llx: Coord, lly: Coord, urx: Coord, ury: Coord) -> Self {
        Self {
            ll: Point::new(llx, lly),
            ur: Point::new(urx, ury),
        }
    }

    pub fn width(&self) -> Coord {
        self.ur.x - self.ll.x
    }

    pub fn height(&self) -> Coord {
        self.ur.y - self.ll.y
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.ll.x < other.ur.x
            && other.ll.x < self.ur.x
            && self.ll.y < other.ur.y
            && other.ll.y < self.ur.y
    }

    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let r = Rect::new(
            self.ll.x.max(other.ll.x),
            self.ll.y.max(other.ll.y),
            self.ur.x.min(other.ur.x),
            self.ur.y.min(other.ur.y),
        );
        if r.is_empty() { None } else { Some(r) }
    }

    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.ll.x && p.x < self.ur.x && p.y >= self.ll.y && p.y < self.ur.y
    }

    pub fn area(&self) -> i64 {
        self.width().max(0) * self.height().max(0)
    }

    pub fn grown(&self, by: Coord) -> Rect {
        Rect::new(self.ll.x - by, self.ll.y - by, self.ur.x + by, self.ur.y + by)
    }

    /// Rectilinear gap to `other`: 0 on the axis they overlap, positive
    /// separation on the axis they don't. `(dx, dy)`; a strictly
    /// diagonal pair (both positive) only touches at a corner.
    pub fn axis_gaps(&self, other: &Rect) -> (Coord, Coord) {
        let dx = if self.ur.x <= other.ll.x {
            other.ll.x - self.ur.x
        } else if other.ur.x <= self.ll.x {
            self.ll.x - other.ur.x
        } else {
            0
        };
        let dy = if self.ur.y <= other.ll.y {
            other.ll.y - self.ur.y
        } else if other.ur.y <= self.ll.y {
            self.ll.y - other.ur.y
        } else {
            0
        };
        (dx, dy)
    }
}

/// Orientation of a diagonal split within one tile cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitOrientation {
    /// Cut runs from lower-left to upper-right.
    Ne,
    /// Cut runs from upper-left to lower-right.
    Nw,
}

/// Which triangle of a split tile a point or fill belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitSide {
    Lower,
    Upper,
}

/// A tile's material content. Kept as a sum type (per the recommendation
/// to avoid bit-packed orientation/side/type fields) rather than folding
/// split encoding into the type id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileBody {
    Rectangular(TileType),
    Split {
        orientation: SplitOrientation,
        side: SplitSide,
        left_type: TileType,
        right_type: TileType,
    },
}

impl TileBody {
    pub const SPACE: TileBody = TileBody::Rectangular(TileType::SPACE);

    pub fn is_space(&self) -> bool {
        matches!(self, TileBody::Rectangular(t) if t.is_space())
    }

    /// For classification purposes (merge eligibility, DRC type lookup on
    /// a rectangular tile); split tiles have no single representative
    /// type and return `None`.
    pub fn as_rectangular(&self) -> Option<TileType> {
        match self {
            TileBody::Rectangular(t) => Some(*t),
            TileBody::Split { .. } => None,
        }
    }

    /// Fill of the triangle `side` names, whichever edges it happens to
    /// touch under this tile's orientation.
    fn side_type(&self, side: SplitSide) -> Option<TileType> {
        match self {
            TileBody::Split { side: s, left_type, right_type, .. } => Some(if *s == side { *left_type } else { *right_type }),
            TileBody::Rectangular(_) => None,
        }
    }

    /// Fill touching the tile's top edge. A `Ne` cut (lower-left to
    /// upper-right) and a `Nw` cut (upper-left to lower-right) both put
    /// their `Upper` triangle against the top edge.
    pub fn top_type(&self) -> Option<TileType> {
        self.side_type(SplitSide::Upper)
    }

    /// Fill touching the tile's bottom edge; see [`TileBody::top_type`].
    pub fn bottom_type(&self) -> Option<TileType> {
        self.side_type(SplitSide::Lower)
    }

    /// Fill touching the tile's left edge. Which triangle that is depends
    /// on the cut's orientation: a `Ne` cut's `Upper` triangle touches the
    /// left edge, a `Nw` cut's `Lower` triangle does.
    pub fn left_type(&self) -> Option<TileType> {
        match self {
            TileBody::Split { orientation: SplitOrientation::Ne, .. } => self.side_type(SplitSide::Upper),
            TileBody::Split { orientation: SplitOrientation::Nw, .. } => self.side_type(SplitSide::Lower),
            TileBody::Rectangular(_) => None,
        }
    }

    /// Fill touching the tile's right edge; see [`TileBody::left_type`].
    pub fn right_type(&self) -> Option<TileType> {
        match self {
            TileBody::Split { orientation: SplitOrientation::Ne, .. } => self.side_type(SplitSide::Lower),
            TileBody::Split { orientation: SplitOrientation::Nw, .. } => self.side_type(SplitSide::Upper),
            TileBody::Rectangular(_) => None,
        }
    }

    /// Exact fill at point `(x, y)` within a tile occupying `rect`: the
    /// plain type for a rectangular tile, or whichever triangle the point
    /// falls in for a split one. `point_locate` alone cannot distinguish
    /// the two halves of a split tile; this is what callers that care
    /// about the diagonal (paint, DRC) use instead.
    pub fn type_exact(&self, rect: Rect, x: Coord, y: Coord) -> Option<TileType> {
        match self {
            TileBody::Rectangular(t) => Some(*t),
            TileBody::Split { orientation, .. } => {
                let w = (rect.ur.x - rect.ll.x).max(1);
                let h = (rect.ur.y - rect.ll.y).max(1);
                let dx = x - rect.ll.x;
                let dy = y - rect.ll.y;
                let in_upper = match orientation {
                    SplitOrientation::Ne => dy * w > dx * h,
                    SplitOrientation::Nw => dy * w > (w - dx) * h,
                };
                self.side_type(if in_upper { SplitSide::Upper } else { SplitSide::Lower })
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileId(u32);

#[derive(Debug, Clone)]
struct Tile {
    ll: Point,
    ur: Point,
    body: TileBody,
    /// Opaque per-client payload (e.g. the owning `CellUse` list on a
    /// cell plane). Transient: never consulted by plane invariants.
    client: Option<u32>,
    lb: Option<TileId>,
    bl: Option<TileId>,
    tr: Option<TileId>,
    rt: Option<TileId>,
}

impl Tile {
    fn rect(&self) -> Rect {
        Rect { ll: self.ll, ur: self.ur }
    }
}

#[derive(Clone)]
enum Slot {
    Occupied(Tile),
    Free(Option<TileId>),
}

#[derive(Debug, Error)]
pub enum TileError {
    #[error("rectangle {0:?} is empty or inverted")]
    EmptyRect(Rect),
    #[error("point ({x}, {y}) lies outside the plane universe")]
    OutOfUniverse { x: Coord, y: Coord },
    #[error("internal tile plane invariant violated: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, TileError>;

/// One layer's worth of corner-stitched tiling.
#[derive(Clone)]
pub struct Plane {
    id: PlaneId,
    slots: Vec<Slot>,
    free_head: Option<TileId>,
    hint: TileId,
}

impl Plane {
    /// A fresh plane: a single space tile covering the whole universe.
    pub fn new(id: PlaneId) -> Self {
        let universe = Tile {
            ll: Point::new(-INFINITY, -INFINITY),
            ur: Point::new(INFINITY, INFINITY),
            body: TileBody::SPACE,
            client: None,
            lb: None,
            bl: None,
            tr: None,
            rt: None,
        };
        Plane {
            id,
            slots: vec![Slot::Occupied(universe)],
            free_head: None,
            hint: TileId(0),
        }
    }

    pub fn id(&self) -> PlaneId {
        self.id
    }

    fn get(&self, id: TileId) -> &Tile {
        match &self.slots[id.0 as usize] {
            Slot::Occupied(t) => t,
            Slot::Free(_) => panic!("dangling TileId {id:?}"),
        }
    }

    fn get_mut(&mut self, id: TileId) -> &mut Tile {
        match &mut self.slots[id.0 as usize] {
            Slot::Occupied(t) => t,
            Slot::Free(_) => panic!("dangling TileId {id:?}"),
        }
    }

    fn alloc(&mut self, tile: Tile) -> TileId {
        if let Some(head) = self.free_head {
            let next = match &self.slots[head.0 as usize] {
                Slot::Free(n) => *n,
                Slot::Occupied(_) => unreachable!(),
            };
            self.free_head = next;
            self.slots[head.0 as usize] = Slot::Occupied(tile);
            head
        } else {
            let id = TileId(self.slots.len() as u32);
            self.slots.push(Slot::Occupied(tile));
            id
        }
    }

    fn free(&mut self, id: TileId) {
        self.slots[id.0 as usize] = Slot::Free(self.free_head);
        self.free_head = Some(id);
    }

    pub fn body_of(&self, id: TileId) -> TileBody {
        self.get(id).body
    }

    pub fn rect_of(&self, id: TileId) -> Rect {
        self.get(id).rect()
    }

    pub fn client_of(&self, id: TileId) -> Option<u32> {
        self.get(id).client
    }

    pub fn set_client(&mut self, id: TileId, client: Option<u32>) {
        self.get_mut(id).client = client;
    }

    /// Find the tile containing `p`. The classic four-way corner-stitch
    /// walk: at each step move toward `p` along whichever edge it still
    /// lies outside of.
    pub fn point_locate(&mut self, p: Point) -> Result<TileId> {
        if p.x < -INFINITY || p.x >= INFINITY || p.y < -INFINITY || p.y >= INFINITY {
            return Err(TileError::OutOfUniverse { x: p.x, y: p.y });
        }
        let mut cur = self.hint;
        loop {
            let t = self.get(cur);
            if p.x < t.ll.x {
                cur = t.bl.ok_or_else(|| {
                    TileError::Internal("point_locate walked off the left edge".into())
                })?;
            } else if p.x >= t.ur.x {
                cur = t.tr.ok_or_else(|| {
                    TileError::Internal("point_locate walked off the right edge".into())
                })?;
            } else if p.y < t.ll.y {
                cur = t.lb.ok_or_else(|| {
                    TileError::Internal("point_locate walked off the bottom edge".into())
                })?;
            } else if p.y >= t.ur.y {
                cur = t.rt.ok_or_else(|| {
                    TileError::Internal("point_locate walked off the top edge".into())
                })?;
            } else {
                self.hint = cur;
                return Ok(cur);
            }
        }
    }

    /// All tiles whose rectangle intersects `rect`, visited at most once,
    /// via flood-fill over geometric adjacency (never recursive: an
    /// explicit stack carries the frontier).
    pub fn area_enum(&mut self, rect: Rect) -> Result<Vec<TileId>> {
        if rect.is_empty() {
            return Err(TileError::EmptyRect(rect));
        }
        let start = self.point_locate(rect.ll)?;
        let mut visited = std::collections::HashSet::new();
        let mut stack = vec![start];
        let mut out = Vec::new();
        visited.insert(start);
        while let Some(id) = stack.pop() {
            let r = self.rect_of(id);
            if !r.intersects(&rect) {
                continue;
            }
            out.push(id);
            for n in self.edge_neighbors(id)? {
                if visited.insert(n) {
                    stack.push(n);
                }
            }
        }
        Ok(out)
    }

    /// Every tile touching one of `id`'s four edges, found by probing
    /// points just outside each edge and walking them with
    /// [`Plane::point_locate`].
    pub fn edge_neighbors(&mut self, id: TileId) -> Result<Vec<TileId>> {
        let r = self.rect_of(id);
        let mut out = Vec::new();

        if r.ll.x > -INFINITY {
            let mut y = r.ll.y;
            while y < r.ur.y {
                let n = self.point_locate(Point::new(r.ll.x - 1, y))?;
                y = self.rect_of(n).ur.y;
                out.push(n);
            }
        }
        if r.ur.x < INFINITY {
            let mut y = r.ll.y;
            while y < r.ur.y {
                let n = self.point_locate(Point::new(r.ur.x, y))?;
                y = self.rect_of(n).ur.y;
                out.push(n);
            }
        }
        if r.ll.y > -INFINITY {
            let mut x = r.ll.x;
            while x < r.ur.x {
                let n = self.point_locate(Point::new(x, r.ll.y - 1))?;
                x = self.rect_of(n).ur.x;
                out.push(n);
            }
        }
        if r.ur.y < INFINITY {
            let mut x = r.ll.x;
            while x < r.ur.x {
                let n = self.point_locate(Point::new(x, r.ur.y))?;
                x = self.rect_of(n).ur.x;
                out.push(n);
            }
        }
        Ok(out)
    }

    /// Split `id` into a left part `[ll.x, x)` and right part `[x, ur.x)`,
    /// both keeping the original body. No-op (returns `id` twice) if `x`
    /// is already an edge of the tile.
    pub fn split_x(&mut self, id: TileId, x: Coord) -> Result<(TileId, TileId)> {
        let t = self.get(id).clone();
        if x <= t.ll.x || x >= t.ur.x {
            return Ok((id, id));
        }
        let mut right = t.clone();
        right.ll.x = x;
        self.get_mut(id).ur.x = x;
        let right_id = self.alloc(right);
        self.restitch_region(Rect::new(t.ll.x - 1, t.ll.y - 1, t.ur.x + 1, t.ur.y + 1))?;
        Ok((id, right_id))
    }

    /// Split `id` into a bottom part `[ll.y, y)` and top part `[y, ur.y)`.
    pub fn split_y(&mut self, id: TileId, y: Coord) -> Result<(TileId, TileId)> {
        let t = self.get(id).clone();
        if y <= t.ll.y || y >= t.ur.y {
            return Ok((id, id));
        }
        let mut top = t.clone();
        top.ll.y = y;
        self.get_mut(id).ur.y = y;
        let top_id = self.alloc(top);
        self.restitch_region(Rect::new(t.ll.x - 1, t.ll.y - 1, t.ur.x + 1, t.ur.y + 1))?;
        Ok((id, top_id))
    }

    /// Recompute corner stitches for every tile intersecting `region`.
    /// Called after any structural edit; correctness follows directly
    /// from [`Plane::point_locate`], so this never needs incremental
    /// pointer surgery at the call sites.
    fn restitch_region(&mut self, region: Rect) -> Result<()> {
        let ids = self.area_enum(region)?;
        for id in ids {
            let r = self.rect_of(id);
            let bl = if r.ll.x > -INFINITY {
                Some(self.point_locate(Point::new(r.ll.x - 1, r.ll.y))?)
            } else {
                None
            };
            let tr = if r.ur.x < INFINITY {
                Some(self.point_locate(Point::new(r.ur.x, r.ll.y))?)
            } else {
                None
            };
            let lb = if r.ll.y > -INFINITY {
                Some(self.point_locate(Point::new(r.ll.x, r.ll.y - 1))?)
            } else {
                None
            };
            let rt = if r.ur.y < INFINITY {
                Some(self.point_locate(Point::new(r.ll.x, r.ur.y))?)
            } else {
                None
            };
            let tile = self.get_mut(id);
            tile.bl = bl;
            tile.tr = tr;
            tile.lb = lb;
            tile.rt = rt;
        }
        Ok(())
    }

    /// Merge `a` and `b` into one tile, freeing `b`. Callers guarantee
    /// they are adjacent with matching bodies and opposite extents.
    fn merge_into(&mut self, a: TileId, b: TileId, new_rect: Rect) {
        self.get_mut(a).ll = new_rect.ll;
        self.get_mut(a).ur = new_rect.ur;
        self.free(b);
        if self.hint == b {
            self.hint = a;
        }
    }

    /// Restore the maximal-horizontal-strip invariant around `region` by
    /// merging same-body tiles first along y (vertical neighbors sharing
    /// an x-extent), then along x (horizontal neighbors sharing a
    /// y-extent). Runs to a fixed point since one merge can expose
    /// another.
    fn reshape_region(&mut self, region: Rect) -> Result<()> {
        loop {
            let ids = self.area_enum(region)?;
            let mut merged_any = false;
            'outer: for &id in &ids {
                let r = self.rect_of(id);
                let body = self.body_of(id);
                for n in self.edge_neighbors(id)? {
                    if n == id {
                        continue;
                    }
                    let nr = self.rect_of(n);
                    let nb = self.body_of(n);
                    if nb != body {
                        continue;
                    }
                    let same_row = r.ll.y == nr.ll.y && r.ur.y == nr.ur.y && r.ur.x == nr.ll.x;
                    let same_col = r.ll.x == nr.ll.x && r.ur.x == nr.ur.x && r.ur.y == nr.ll.y;
                    if same_row {
                        let new_rect = Rect::new(r.ll.x, r.ll.y, nr.ur.x, r.ur.y);
                        self.merge_into(id, n, new_rect);
                        self.restitch_region(Rect::new(
                            new_rect.ll.x - 1,
                            new_rect.ll.y - 1,
                            new_rect.ur.x + 1,
                            new_rect.ur.y + 1,
                        ))?;
                        merged_any = true;
                        break 'outer;
                    } else if same_col {
                        let new_rect = Rect::new(r.ll.x, r.ll.y, r.ur.x, nr.ur.y);
                        self.merge_into(id, n, new_rect);
                        self.restitch_region(Rect::new(
                            new_rect.ll.x - 1,
                            new_rect.ll.y - 1,
                            new_rect.ur.x + 1,
                            new_rect.ur.y + 1,
                        ))?;
                        merged_any = true;
                        break 'outer;
                    }
                }
            }
            if !merged_any {
                return Ok(());
            }
        }
    }

    /// Paint `rect` with `body`, clipping existing tiles to size and
    /// re-merging to restore the maximal-strip invariant. Returns the
    /// ids of tiles now exactly covering `rect` (useful for callers that
    /// want to tag the freshly painted area, e.g. the DRC pending queue).
    pub fn paint(&mut self, rect: Rect, body: TileBody) -> Result<Vec<TileId>> {
        if rect.is_empty() {
            return Err(TileError::EmptyRect(rect));
        }
        self.clip_to_rect(rect)?;
        let mut painted = Vec::new();
        for id in self.area_enum(rect)? {
            let r = self.rect_of(id);
            if r.ll.x >= rect.ll.x && r.ur.x <= rect.ur.x && r.ll.y >= rect.ll.y && r.ur.y <= rect.ur.y {
                self.get_mut(id).body = body;
                painted.push(id);
            }
        }
        self.reshape_region(Rect::new(
            rect.ll.x - 1,
            rect.ll.y - 1,
            rect.ur.x + 1,
            rect.ur.y + 1,
        ))?;
        Ok(painted)
    }

    pub fn erase(&mut self, rect: Rect) -> Result<Vec<TileId>> {
        self.paint(rect, TileBody::SPACE)
    }

    /// Paint `rect` with `ttype`, running every tile it overlaps through
    /// the technology's `[plane][existing][painting]` transition table
    /// instead of overwriting unconditionally. A tile whose existing
    /// material neither matches nor may legally stack with `ttype` comes
    /// out as [`TileType::ERROR_S`] rather than being silently replaced;
    /// the next DRC sweep is what turns that into a reported violation.
    /// Tiles the transition table accepts merge normally afterward.
    pub fn paint_checked(&mut self, rect: Rect, ttype: TileType, table: &TypeTable) -> Result<Vec<TileId>> {
        if rect.is_empty() {
            return Err(TileError::EmptyRect(rect));
        }
        self.clip_to_rect(rect)?;
        let mut painted = Vec::new();
        for id in self.area_enum(rect)? {
            let r = self.rect_of(id);
            if r.ll.x >= rect.ll.x && r.ur.x <= rect.ur.x && r.ll.y >= rect.ll.y && r.ur.y <= rect.ur.y {
                let existing = self.body_of(id).as_rectangular().unwrap_or(TileType::ERROR_S);
                let result = table.paint_transition(existing, ttype);
                self.get_mut(id).body = TileBody::Rectangular(result);
                painted.push(id);
            }
        }
        self.reshape_region(Rect::new(
            rect.ll.x - 1,
            rect.ll.y - 1,
            rect.ur.x + 1,
            rect.ur.y + 1,
        ))?;
        Ok(painted)
    }

    /// Split every tile overlapping `rect` along `rect`'s four boundary
    /// lines, so afterward every overlapping tile lies fully inside or
    /// fully outside `rect`.
    fn clip_to_rect(&mut self, rect: Rect) -> Result<()> {
        for x in [rect.ll.x, rect.ur.x] {
            for id in self.area_enum(Rect::new(x.max(-INFINITY), rect.ll.y, (x + 1).min(INFINITY), rect.ur.y))? {
                let r = self.rect_of(id);
                if r.ll.x < x && x < r.ur.x {
                    self.split_x(id, x)?;
                }
            }
        }
        for y in [rect.ll.y, rect.ur.y] {
            for id in self.area_enum(Rect::new(rect.ll.x, y.max(-INFINITY), rect.ur.x, (y + 1).min(INFINITY)))? {
                let r = self.rect_of(id);
                if r.ll.y < y && y < r.ur.y {
                    self.split_y(id, y)?;
                }
            }
        }
        Ok(())
    }

    /// Cut a rectangular tile diagonally, turning it into a
    /// [`TileBody::Split`]. `id` must currently be `Rectangular`.
    pub fn split_diagonal(
        &mut self,
        id: TileId,
        orientation: SplitOrientation,
        side: SplitSide,
        left_type: TileType,
        right_type: TileType,
    ) -> Result<()> {
        let tile = self.get_mut(id);
        if !matches!(tile.body, TileBody::Rectangular(_)) {
            return Err(TileError::Internal("split_diagonal on a non-rectangular tile".into()));
        }
        tile.body = TileBody::Split {
            orientation,
            side,
            left_type,
            right_type,
        };
        Ok(())
    }

    /// Total tile count, including the universe tile; for diagnostics and
    /// tests of the maximal-strip invariant.
    pub fn tile_count(&self) -> usize {
        self.slots.iter().filter(|s| matches!(s, Slot::Occupied(_))).count()
    }

    /// Check invariant: no two live tiles overlap, and every horizontally
    /// adjacent pair of same-body tiles with matching y-extents has been
    /// merged (would violate maximality).
    pub fn check_invariants(&self) -> Result<()> {
        let live: Vec<&Tile> = self
            .slots
            .iter()
            .filter_map(|s| match s {
                Slot::Occupied(t) => Some(t),
                Slot::Free(_) => None,
            })
            .collect();
        for (i, a) in live.iter().enumerate() {
            for b in &live[i + 1..] {
                if a.rect().intersects(&b.rect()) {
                    return Err(TileError::Internal(format!(
                        "tiles overlap: {:?} vs {:?}",
                        a.rect(),
                        b.rect()
                    )));
                }
                let same_row = a.ll.y == b.ll.y && a.ur.y == b.ur.y;
                if same_row && a.body == b.body && (a.ur.x == b.ll.x || b.ur.x == a.ll.x) {
                    return Err(TileError::Internal(format!(
                        "adjacent same-body tiles not merged: {:?} and {:?}",
                        a.rect(),
                        b.rect()
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metal(n: u16) -> TileBody {
        TileBody::Rectangular(TileType(n))
    }

    #[test]
    fn fresh_plane_is_one_space_tile() {
        let mut plane = Plane::new(PlaneId(0));
        assert_eq!(plane.tile_count(), 1);
        let t = plane.point_locate(Point::new(0, 0)).unwrap();
        assert!(plane.body_of(t).is_space());
    }

    #[test]
    fn paint_then_point_locate_finds_it() {
        let mut plane = Plane::new(PlaneId(0));
        plane.paint(Rect::new(0, 0, 10, 10), metal(1)).unwrap();
        let t = plane.point_locate(Point::new(5, 5)).unwrap();
        assert_eq!(plane.body_of(t), metal(1));
        let outside = plane.point_locate(Point::new(20, 20)).unwrap();
        assert!(plane.body_of(outside).is_space());
        plane.check_invariants().unwrap();
    }

    #[test]
    fn adjacent_same_type_paints_merge_into_one_strip() {
        let mut plane = Plane::new(PlaneId(0));
        plane.paint(Rect::new(0, 0, 10, 10), metal(1)).unwrap();
        plane.paint(Rect::new(10, 0, 20, 10), metal(1)).unwrap();
        let ids = plane.area_enum(Rect::new(0, 0, 20, 10)).unwrap();
        let painted: Vec<_> = ids.iter().filter(|&&id| plane.body_of(id) == metal(1)).collect();
        assert_eq!(painted.len(), 1);
        assert_eq!(plane.rect_of(*painted[0]), Rect::new(0, 0, 20, 10));
        plane.check_invariants().unwrap();
    }

    #[test]
    fn erase_restores_space_and_remerges_with_neighbors() {
        let mut plane = Plane::new(PlaneId(0));
        plane.paint(Rect::new(0, 0, 30, 10), metal(1)).unwrap();
        plane.erase(Rect::new(10, 0, 20, 10)).unwrap();
        let left = plane.point_locate(Point::new(5, 5)).unwrap();
        let right = plane.point_locate(Point::new(25, 5)).unwrap();
        let middle = plane.point_locate(Point::new(15, 5)).unwrap();
        assert_eq!(plane.body_of(left), metal(1));
        assert_eq!(plane.body_of(right), metal(1));
        assert!(plane.body_of(middle).is_space());
        plane.check_invariants().unwrap();
    }

    #[test]
    fn paint_partial_overlap_clips_existing_tile() {
        let mut plane = Plane::new(PlaneId(0));
        plane.paint(Rect::new(0, 0, 10, 10), metal(1)).unwrap();
        plane.paint(Rect::new(5, 0, 15, 10), metal(2)).unwrap();
        let a = plane.point_locate(Point::new(2, 5)).unwrap();
        let b = plane.point_locate(Point::new(10, 5)).unwrap();
        assert_eq!(plane.body_of(a), metal(1));
        assert_eq!(plane.rect_of(a), Rect::new(0, 0, 5, 10));
        assert_eq!(plane.body_of(b), metal(2));
        assert_eq!(plane.rect_of(b), Rect::new(5, 0, 15, 10));
        plane.check_invariants().unwrap();
    }

    #[test]
    fn area_enum_visits_each_tile_exactly_once() {
        let mut plane = Plane::new(PlaneId(0));
        plane.paint(Rect::new(0, 0, 10, 10), metal(1)).unwrap();
        plane.paint(Rect::new(0, 10, 10, 20), metal(2)).unwrap();
        plane.paint(Rect::new(10, 0, 20, 20), metal(3)).unwrap();
        let ids = plane.area_enum(Rect::new(-5, -5, 25, 25)).unwrap();
        let mut sorted = ids.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), ids.len());
    }

    #[test]
    fn out_of_universe_point_is_an_error() {
        let mut plane = Plane::new(PlaneId(0));
        assert!(plane.point_locate(Point::new(INFINITY, 0)).is_err());
    }
}
