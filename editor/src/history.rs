//! Undo/redo history over whole-tree snapshots.
//!
//! DESIGN
//! ======
//! Every committed layout tree is a candidate history point. The recorder
//! keeps a list of immutable snapshots and a cursor at the one currently
//! shown. Navigating moves the cursor and hands back the neighbor flagged as
//! `from_history`; when the store commits that tree, `record` sees the flag
//! and skips it, so undo never records itself.
//!
//! Recording after an undo drops the redo tail (a new branch). The oldest
//! snapshot is evicted once `max_depth` is exceeded.
//!
//! Keystroke-level edits are suppressed by the caller passing
//! `input_focused = true`; batching those edits into one commit is the
//! caller's job.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::debug;

use crate::consts::DEFAULT_HISTORY_DEPTH;
use crate::layout::LayoutTree;

/// A committed tree plus whether it came from history navigation.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub tree: Arc<LayoutTree>,
    pub from_history: bool,
}

impl Snapshot {
    /// A fresh edit.
    #[must_use]
    pub fn edit(tree: Arc<LayoutTree>) -> Self {
        Self { tree, from_history: false }
    }

    /// A tree produced by undo/redo.
    #[must_use]
    pub fn history_point(tree: Arc<LayoutTree>) -> Self {
        Self { tree, from_history: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Back,
    Forward,
}

/// Why `record` did or did not append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded,
    /// The snapshot came from undo/redo.
    SkippedHistoryPoint,
    /// An editable field holds focus.
    SkippedInputFocus,
    /// Identical to the snapshot at the cursor.
    SkippedUnchanged,
}

#[derive(Debug)]
pub struct HistoryRecorder {
    snapshots: VecDeque<Arc<LayoutTree>>,
    cursor: usize,
    max_depth: usize,
}

impl Default for HistoryRecorder {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_DEPTH)
    }
}

impl HistoryRecorder {
    /// `max_depth` is clamped to at least one snapshot.
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self { snapshots: VecDeque::new(), cursor: 0, max_depth: max_depth.max(1) }
    }

    pub fn record(&mut self, snapshot: &Snapshot, input_focused: bool) -> RecordOutcome {
        if snapshot.from_history {
            return RecordOutcome::SkippedHistoryPoint;
        }
        if input_focused {
            return RecordOutcome::SkippedInputFocus;
        }
        if self.current().is_some_and(|cur| *cur == *snapshot.tree) {
            return RecordOutcome::SkippedUnchanged;
        }

        if !self.snapshots.is_empty() {
            self.snapshots.truncate(self.cursor + 1);
        }
        self.snapshots.push_back(Arc::clone(&snapshot.tree));
        while self.snapshots.len() > self.max_depth {
            self.snapshots.pop_front();
        }
        self.cursor = self.snapshots.len() - 1;
        debug!(depth = self.snapshots.len(), "history point recorded");
        RecordOutcome::Recorded
    }

    /// Step the cursor and return the neighbor, or `None` at either end.
    pub fn navigate(&mut self, direction: Direction) -> Option<Snapshot> {
        let next = match direction {
            Direction::Back => self.cursor.checked_sub(1)?,
            Direction::Forward => self.cursor + 1,
        };
        let tree = self.snapshots.get(next)?;
        self.cursor = next;
        Some(Snapshot::history_point(Arc::clone(tree)))
    }

    /// The snapshot the cursor points at.
    #[must_use]
    pub fn current(&self) -> Option<&LayoutTree> {
        self.snapshots.get(self.cursor).map(|tree| &**tree)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
