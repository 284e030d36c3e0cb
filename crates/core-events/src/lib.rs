//! Event and channel types tying the editing session's side effects
//! together: a paint or erase on a plane, a DRC report produced either
//! by an explicit check or by the idle scheduler's incremental sweep.
//!
//! Nothing here drives the scheduler itself; that loop lives in
//! `core_session::Session::idle_step`, called synchronously by whatever
//! owns the session. This crate only shapes the events that step
//! produces and gives a caller a cheap way to collect them without
//! busy-polling, via [`IdleTickChannel`].

use core_cell::CellDefId;
use core_drc::{DrcReport, Violation};
use core_tile::types::PlaneId;
use core_tile::Rect;

/// A paint applied to `plane` of `cell` over `rect`. Carries no tile
/// type: by the time this event exists the plane already reflects it,
/// and consumers that care about legality read it back off the plane
/// rather than trust a copy here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaintEvent {
    pub cell: CellDefId,
    pub plane: PlaneId,
    pub rect: Rect,
}

/// An erase applied to `plane` of `cell` over `rect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EraseEvent {
    pub cell: CellDefId,
    pub plane: PlaneId,
    pub rect: Rect,
}

/// The result of a DRC sweep over `rect` of `cell`, carrying both the
/// full violation list and the deduplicated "why" summary a status
/// line or overlay would actually show.
#[derive(Debug, Clone, Default)]
pub struct DrcReportEvent {
    pub cell: CellDefId,
    pub rect: Rect,
    pub all: Vec<Violation>,
    pub why_summary: Vec<Violation>,
}

impl DrcReportEvent {
    pub fn from_report(cell: CellDefId, rect: Rect, report: &DrcReport) -> Self {
        Self {
            cell,
            rect,
            all: report.all().to_vec(),
            why_summary: report.why_summary().into_iter().cloned().collect(),
        }
    }
}

/// The outcome of a single `Session::idle_step` call: either it found
/// pending work and ran a check, or the pending queue was empty.
#[derive(Debug, Clone)]
pub enum IdleTick {
    Ran(DrcReportEvent),
    Empty,
}

/// A bounded channel a driving loop can poll for idle-step results
/// without busy-waiting between steps. `core_session::Session` itself
/// never touches this; a caller wraps its own `idle_step` loop and
/// forwards each tick's outcome onto the sender this hands out.
pub struct IdleTickChannel {
    tx: crossbeam_channel::Sender<IdleTick>,
    rx: crossbeam_channel::Receiver<IdleTick>,
}

impl IdleTickChannel {
    pub fn bounded(cap: usize) -> Self {
        let (tx, rx) = crossbeam_channel::bounded(cap);
        Self { tx, rx }
    }

    pub fn sender(&self) -> crossbeam_channel::Sender<IdleTick> {
        self.tx.clone()
    }

    /// Drains the next available tick, if any, without blocking.
    pub fn try_recv(&self) -> Option<IdleTick> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_cell::CellLibrary;

    fn dummy_cell() -> CellDefId {
        let mut lib = CellLibrary::new();
        lib.define(core_cell::CellDef::new("top"))
    }

    #[test]
    fn from_report_carries_both_shapes() {
        let cell = dummy_cell();
        let rect = Rect::new(0, 0, 10, 10);
        let mut report = DrcReport::default();
        let v = Violation {
            plane: PlaneId(0),
            rect,
            why: "spacing".to_string(),
        };
        report.push(v.clone());
        report.push(v.clone());

        let event = DrcReportEvent::from_report(cell, rect, &report);
        assert_eq!(event.all.len(), 2);
        assert_eq!(event.why_summary.len(), 1);
    }

    #[test]
    fn idle_tick_channel_round_trips() {
        let channel = IdleTickChannel::bounded(4);
        let sender = channel.sender();
        sender.send(IdleTick::Empty).unwrap();

        match channel.try_recv() {
            Some(IdleTick::Empty) => {}
            other => panic!("unexpected tick: {other:?}"),
        }
        assert!(channel.try_recv().is_none());
    }
}
