//! Bounded undo/redo stacks of detached document snapshots.
//!
//! Each entry is a full copy of the document taken before an edit, with its
//! own stacks cleared so snapshots never nest. Both stacks are most-recent-first
//! and capped at [`HISTORY_CAPACITY`]; the oldest entry is evicted on overflow.

use crate::domain::document::Document;
use std::collections::VecDeque;
use std::sync::Arc;

/// Maximum number of entries kept on each stack.
pub const HISTORY_CAPACITY: usize = 50;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    undo: VecDeque<Arc<Document>>,
    redo: VecDeque<Arc<Document>>,
}

impl History {
    /// Records the pre-edit state of `before` and invalidates the redo stack.
    pub fn record(&mut self, before: &Document) {
        push_bounded(&mut self.undo, Arc::new(before.detached()));
        self.redo.clear();
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub(crate) fn pop_undo(&mut self) -> Option<Arc<Document>> {
        self.undo.pop_front()
    }

    pub(crate) fn pop_redo(&mut self) -> Option<Arc<Document>> {
        self.redo.pop_front()
    }

    pub(crate) fn push_undo(&mut self, snapshot: Arc<Document>) {
        push_bounded(&mut self.undo, snapshot);
    }

    pub(crate) fn push_redo(&mut self, snapshot: Arc<Document>) {
        push_bounded(&mut self.redo, snapshot);
    }

    /// Most recent undo entry, if any.
    pub fn peek_undo(&self) -> Option<&Document> {
        self.undo.front().map(|d| d.as_ref())
    }
}

fn push_bounded(stack: &mut VecDeque<Arc<Document>>, snapshot: Arc<Document>) {
    stack.push_front(snapshot);
    stack.truncate(HISTORY_CAPACITY);
}
