#![forbid(unsafe_code)]

//! Bounded undo history for table editing.
//!
//! Each committed edit (keystroke commit, paste, cut) is one
//! [`Snapshot`]: the changed cells with their previous and new values
//! plus the cursor position. A monotonically advancing snapshot id
//! divides the history into its undo and redo halves.

use super::model::CellValue;

/// One changed cell inside a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct CellChange {
    /// Row index.
    pub row: usize,
    /// Column index.
    pub col: usize,
    /// Value before the edit.
    pub old: CellValue,
    /// Value after the edit.
    pub new: CellValue,
}

/// One undoable step.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// The cells this step changed.
    pub changes: Vec<CellChange>,
    /// Current cell at commit time, restored with the step.
    pub cursor: (usize, usize),
}

/// Default history bound.
const DEFAULT_CAPACITY: usize = 100;

/// Bounded undo/redo history.
#[derive(Debug, Clone)]
pub struct UndoHistory {
    snapshots: Vec<Snapshot>,
    /// Boundary between the undo half (`..id`) and redo half (`id..`).
    id: usize,
    capacity: usize,
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl UndoHistory {
    /// Create a history holding at most `capacity` snapshots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            snapshots: Vec::new(),
            id: 0,
            capacity: capacity.max(1),
        }
    }

    /// The advancing snapshot id.
    #[must_use]
    pub const fn snapshot_id(&self) -> usize {
        self.id
    }

    /// Record a new step, discarding the redo half.
    pub fn push(&mut self, snapshot: Snapshot) {
        self.snapshots.truncate(self.id);
        self.snapshots.push(snapshot);
        if self.snapshots.len() > self.capacity {
            self.snapshots.remove(0);
        } else {
            self.id += 1;
            return;
        }
        self.id = self.snapshots.len();
    }

    /// Whether an undo step exists.
    #[must_use]
    pub const fn can_undo(&self) -> bool {
        self.id > 0
    }

    /// Whether a redo step exists.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.id < self.snapshots.len()
    }

    /// Step back; returns the snapshot whose old values to restore.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if self.id == 0 {
            return None;
        }
        self.id -= 1;
        self.snapshots.get(self.id)
    }

    /// Step forward; returns the snapshot whose new values to apply.
    pub fn redo(&mut self) -> Option<&Snapshot> {
        if self.id >= self.snapshots.len() {
            return None;
        }
        let snap = self.snapshots.get(self.id);
        self.id += 1;
        snap
    }
}
