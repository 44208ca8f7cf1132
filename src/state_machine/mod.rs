//! Centralized state machine for the authoring document.
//!
//! This module provides the ONLY place where document transitions happen.
//! [`apply`] is a pure function from `(document, command)` to a
//! [`Transition`]; [`DocumentStateMachine`] owns the live document, logs
//! commands and events, and broadcasts snapshots to observers via a watch
//! channel.

mod assets;
mod commands;
mod events;
mod slides;
mod snapshot;
mod transition;
mod workflow;

pub use commands::{CommandScope, DocumentCommand};
pub use events::StateEvent;
pub use snapshot::DocumentSnapshot;
pub use transition::{apply, Transition};
pub use workflow::MAX_EVENT_LOG;

use crate::domain::{rehydrate, Document, DocumentError, RehydrateMode, Rehydrated, TimestampUtc};
use crate::structured_logger::StructuredLogger;
use std::sync::Arc;
use tokio::sync::watch;

/// Result of dispatching one command.
#[derive(Debug, Clone, Default)]
pub struct ApplyOutcome {
    /// False when the command did not apply to the current state.
    pub changed: bool,
    pub events: Vec<StateEvent>,
}

/// Owns the live document, applies commands, emits events, broadcasts snapshots.
pub struct DocumentStateMachine {
    document: Document,
    snapshot_tx: watch::Sender<DocumentSnapshot>,
    logger: Arc<StructuredLogger>,
    seq: u64,
}

impl DocumentStateMachine {
    /// Creates a new state machine with the given initial document.
    ///
    /// Returns the state machine and a watch receiver for snapshots.
    pub fn new(
        initial: Document,
        logger: Arc<StructuredLogger>,
    ) -> (Self, watch::Receiver<DocumentSnapshot>) {
        let (snapshot_tx, snapshot_rx) = watch::channel(DocumentSnapshot::new(&initial, 0));
        let machine = Self {
            document: initial,
            snapshot_tx,
            logger,
            seq: 0,
        };
        (machine, snapshot_rx)
    }

    /// All mutations go through this single method.
    ///
    /// Commands that do not apply are logged and leave the document (and its
    /// history) untouched; no snapshot is broadcast for them.
    pub fn apply(&mut self, command: DocumentCommand) -> ApplyOutcome {
        self.seq += 1;
        self.logger.log_command(self.seq, &command);

        match transition::apply(&self.document, &command) {
            Transition::Unchanged => {
                tracing::debug!(command = command.name(), "command did not apply");
                self.logger.log_noop(self.seq, &command);
                ApplyOutcome::default()
            }
            Transition::Changed {
                mut document,
                events,
            } => {
                for event in &events {
                    self.logger.log_event(self.seq, event);
                }
                document.updated_at = TimestampUtc::now();
                self.document = document;
                self.broadcast_snapshot();
                ApplyOutcome {
                    changed: true,
                    events,
                }
            }
        }
    }

    /// Replaces the live document with an externally supplied one.
    ///
    /// On success the previous document and its history are discarded. On
    /// failure the live document is left as it was.
    pub fn load(
        &mut self,
        value: serde_json::Value,
        mode: RehydrateMode,
    ) -> Result<Rehydrated, DocumentError> {
        let rehydrated = rehydrate(value, mode)?;
        if rehydrated.degraded {
            tracing::warn!(
                issues = rehydrated.issues.len(),
                "loaded document in degraded form"
            );
        }
        self.reset(rehydrated.document.clone());
        Ok(rehydrated)
    }

    /// Replaces the live document wholesale, dropping any history.
    pub fn reset(&mut self, document: Document) {
        self.seq += 1;
        self.document = document.detached();
        self.logger.log_reset(self.seq, &self.document.id);
        self.broadcast_snapshot();
    }

    /// Returns an immutable reference to the live document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Broadcasts the current snapshot to all watchers.
    pub fn broadcast_snapshot(&self) {
        let _ = self
            .snapshot_tx
            .send(DocumentSnapshot::new(&self.document, self.seq));
    }
}
