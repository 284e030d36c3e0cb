//! Undo log for a single `CellDef`: coarse whole-definition snapshots,
//! the same "clone the whole state, worry about efficiency later"
//! strategy the editor's own undo engine starts from.

use core_cell::CellDef;
use tracing::trace;

pub const UNDO_HISTORY_MAX: usize = 200;

struct Snapshot {
    def: CellDef,
    label: &'static str,
}

#[derive(Default)]
pub struct UndoLog {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
}

impl UndoLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Record `def`'s current state before `label` (e.g. "paint",
    /// "plow") is applied. Call before mutating, not after.
    pub fn push(&mut self, def: &CellDef, label: &'static str) {
        self.undo_stack.push(Snapshot {
            def: def.clone(),
            label,
        });
        if self.undo_stack.len() > UNDO_HISTORY_MAX {
            self.undo_stack.remove(0);
            trace!(target: "session.undo", "undo_stack_trimmed");
        }
        self.redo_stack.clear();
        trace!(target: "session.undo", label, depth = self.undo_stack.len(), "push_snapshot");
    }

    /// Restore the most recent snapshot into `def`, pushing the current
    /// state onto the redo stack first. This is the atomic write-back
    /// point: either the whole `def` rolls back, or nothing does.
    pub fn undo(&mut self, def: &mut CellDef) -> bool {
        let Some(snap) = self.undo_stack.pop() else {
            return false;
        };
        trace!(target: "session.undo", label = snap.label, "undo");
        self.redo_stack.push(Snapshot {
            def: def.clone(),
            label: snap.label,
        });
        *def = snap.def;
        true
    }

    pub fn redo(&mut self, def: &mut CellDef) -> bool {
        let Some(snap) = self.redo_stack.pop() else {
            return false;
        };
        trace!(target: "session.undo", label = snap.label, "redo");
        self.undo_stack.push(Snapshot {
            def: def.clone(),
            label: snap.label,
        });
        *def = snap.def;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_tile::{PlaneId, Rect, TileBody, TileType};

    #[test]
    fn undo_restores_prior_geometry() {
        let mut def = CellDef::new("inv");
        let mut log = UndoLog::new();
        log.push(&def, "paint");
        def.paint(PlaneId(0), Rect::new(0, 0, 10, 10), TileBody::Rectangular(TileType(1)))
            .unwrap();
        assert_eq!(def.bbox, Rect::new(0, 0, 10, 10));
        assert!(log.undo(&mut def));
        assert_eq!(def.bbox, Rect::new(0, 0, 0, 0));
        assert!(log.redo(&mut def));
        assert_eq!(def.bbox, Rect::new(0, 0, 10, 10));
    }
}
