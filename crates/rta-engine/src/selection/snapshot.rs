use super::boundary::Boundary;
use super::marker::Marker;

/// A saved selection, waiting for its restore.
///
/// While a `Range` snapshot exists its markers live in the document. Hand
/// it to exactly one `restore` or `discard` so they are released.
#[must_use = "a saved selection must be restored or discarded to release its markers"]
#[derive(Debug, PartialEq, Eq)]
pub enum SelectionSnapshot {
    /// There was no selection to save
    Empty,
    Range { start: Boundary, end: Boundary },
}

impl SelectionSnapshot {
    pub fn is_empty(&self) -> bool {
        matches!(self, SelectionSnapshot::Empty)
    }

    /// Markers owned by the snapshot, start first.
    pub fn markers(&self) -> Vec<Marker> {
        match self {
            SelectionSnapshot::Empty => Vec::new(),
            SelectionSnapshot::Range { start, end } => vec![*start.marker(), *end.marker()],
        }
    }
}
