//! `DRCEngine`: edge-based spacing checks, specialized whole-region
//! scanners, and the subcell/array interaction wrappers that apply the
//! same basic check to a flattened or windowed view of hierarchy.

pub mod array;
pub mod basic;
pub mod interaction;
pub mod maxrect;
pub mod scanners;

use core_tile::types::PlaneId;
use core_tile::Rect;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DrcError {
    #[error(transparent)]
    Tile(#[from] core_tile::TileError),
    #[error("design rule check was cancelled")]
    Cancelled,
    #[error("internal DRC invariant violated: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, DrcError>;

/// One reported spacing or shape violation.
#[derive(Debug, Clone)]
pub struct Violation {
    pub plane: PlaneId,
    pub rect: Rect,
    pub why: String,
}

/// Accumulates violations from one or more checks. Offers both the
/// "list all" sink mode and a "why summary" mode that keeps only the
/// first occurrence of each distinct `(why, plane)` pair.
#[derive(Debug, Default, Clone)]
pub struct DrcReport {
    violations: Vec<Violation>,
}

impl DrcReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, v: Violation) {
        tracing::debug!(target: "drc", why = %v.why, rect = ?v.rect, "violation");
        self.violations.push(v);
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = Violation>) {
        for v in other {
            self.push(v);
        }
    }

    pub fn all(&self) -> &[Violation] {
        &self.violations
    }

    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// One record per distinct `(why, plane)`, first occurrence kept.
    pub fn why_summary(&self) -> Vec<&Violation> {
        let mut seen = std::collections::HashSet::new();
        self.violations
            .iter()
            .filter(|v| seen.insert((v.why.clone(), v.plane)))
            .collect()
    }
}
