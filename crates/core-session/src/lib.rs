//! Session state: the currently loaded technology, the cell library, the
//! pending incremental-DRC queue, the undo log, and the cooperative
//! cancellation flag every long-running engine checks.

pub mod undo;

use core_cell::{CellDefId, CellLibrary};
use core_tech::Technology;
use core_tile::Rect;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use undo::UndoLog;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no technology loaded")]
    NoTechnology,
    #[error("operation was cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// A cooperative cancellation signal, cloned and handed to whichever
/// engine (`core-drc`, `core-plow`) is running. Checked between squares
/// or edges, never preemptively; raising it only takes effect the next
/// time the running engine looks.
#[derive(Clone, Default)]
pub struct InterruptFlag(Arc<AtomicBool>);

impl InterruptFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<()> {
        if self.is_set() { Err(SessionError::Cancelled) } else { Ok(()) }
    }
}

/// One unchecked rectangle queued for the idle DRC sweep.
#[derive(Debug, Clone, Copy)]
pub struct PendingCheck {
    pub cell: CellDefId,
    pub rect: Rect,
}

/// Running counters surfaced to the CLI/report sink; mirrors the
/// editor's own operator-metrics struct.
#[derive(Debug, Default, Clone, Copy)]
pub struct SessionMetrics {
    pub paints: u64,
    pub erases: u64,
    pub drc_sweeps: u64,
    pub plow_runs: u64,
}

pub struct Session {
    pub technology: Option<Technology>,
    pub library: CellLibrary,
    pub edit_cell: Option<CellDefId>,
    pending: VecDeque<PendingCheck>,
    undo: UndoLog,
    pub interrupt: InterruptFlag,
    metrics: SessionMetrics,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            technology: None,
            library: CellLibrary::new(),
            edit_cell: None,
            pending: VecDeque::new(),
            undo: UndoLog::new(),
            interrupt: InterruptFlag::new(),
            metrics: SessionMetrics::default(),
        }
    }

    /// Replace the technology, discarding any unchecked-area queue built
    /// under the old one. Rules and type catalogs never mix across a
    /// reload, so stale pending work would check against meaningless
    /// cookies.
    pub fn load_technology(&mut self, tech: Technology) {
        tracing::info!(target: "session", pending_discarded = self.pending.len(), "technology reload");
        self.pending.clear();
        self.technology = Some(tech);
    }

    pub fn technology(&self) -> Result<&Technology> {
        self.technology.as_ref().ok_or(SessionError::NoTechnology)
    }

    pub fn set_edit_cell(&mut self, id: CellDefId) {
        self.edit_cell = Some(id);
    }

    pub fn enqueue_check(&mut self, cell: CellDefId, rect: Rect) {
        tracing::trace!(target: "session", ?cell, ?rect, "enqueue_drc_check");
        self.pending.push_back(PendingCheck { cell, rect });
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Pop one pending rectangle and hand it to `run_check`. Returns
    /// `Ok(false)` when the queue is empty (the idle scheduler has
    /// nothing left to do this tick).
    pub fn idle_step<F>(&mut self, mut run_check: F) -> Result<bool>
    where
        F: FnMut(&mut core_cell::CellDef, Rect) -> Result<()>,
    {
        self.interrupt.check()?;
        let Some(check) = self.pending.pop_front() else {
            return Ok(false);
        };
        let _span = tracing::debug_span!(target: "session", "idle_step", cell = check.cell.0).entered();
        let def = self.library.def_mut(check.cell);
        run_check(def, check.rect)?;
        self.metrics.drc_sweeps += 1;
        Ok(true)
    }

    pub fn note_paint(&mut self) {
        self.metrics.paints += 1;
    }
    pub fn note_erase(&mut self) {
        self.metrics.erases += 1;
    }
    pub fn note_plow(&mut self) {
        self.metrics.plow_runs += 1;
    }

    pub fn metrics(&self) -> SessionMetrics {
        self.metrics
    }

    pub fn snapshot_for_undo(&mut self, cell: CellDefId, label: &'static str) {
        let def = self.library.def(cell);
        self.undo.push(def, label);
    }

    pub fn undo(&mut self, cell: CellDefId) -> bool {
        let def = self.library.def_mut(cell);
        self.undo.undo(def)
    }

    pub fn redo(&mut self, cell: CellDefId) -> bool {
        let def = self.library.def_mut(cell);
        self.undo.redo(def)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_cell::CellDef;

    #[test]
    fn idle_step_returns_false_when_queue_empty() {
        let mut session = Session::new();
        let def = session.library.define(CellDef::new("top"));
        session.set_edit_cell(def);
        assert!(!session.idle_step(|_, _| Ok(())).unwrap());
    }

    #[test]
    fn interrupt_short_circuits_idle_step() {
        let mut session = Session::new();
        let def = session.library.define(CellDef::new("top"));
        session.enqueue_check(def, Rect::new(0, 0, 10, 10));
        session.interrupt.raise();
        assert!(matches!(session.idle_step(|_, _| Ok(())), Err(SessionError::Cancelled)));
    }

    #[test]
    fn reload_discards_pending_queue() {
        let mut session = Session::new();
        let def = session.library.define(CellDef::new("top"));
        session.enqueue_check(def, Rect::new(0, 0, 10, 10));
        assert_eq!(session.pending_len(), 1);
        let tech = core_tech::load_str("").unwrap();
        session.load_technology(tech);
        assert_eq!(session.pending_len(), 0);
    }
}
