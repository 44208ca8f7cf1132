//! Read-only snapshot of the live document for observers.
//!
//! Observers NEVER mutate this; they receive new snapshots via the watch channel.

use crate::domain::{Document, Stage};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    /// The live document (shared, immutable).
    pub document: Arc<Document>,
    /// State machine sequence number of the command that produced this snapshot
    pub seq: u64,
    pub current_stage: Stage,
    pub can_undo: bool,
    pub can_redo: bool,
}

impl DocumentSnapshot {
    pub fn new(document: &Document, seq: u64) -> Self {
        Self {
            current_stage: document.current_stage,
            can_undo: document.history.can_undo(),
            can_redo: document.history.can_redo(),
            document: Arc::new(document.clone()),
            seq,
        }
    }
}
