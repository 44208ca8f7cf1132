//! The pure transition function.
//!
//! `apply` never mutates its input. Commands are routed by scope to one of
//! three handlers (workflow, assets, slides); control commands (batch, undo,
//! redo) are handled here. A handler returns `None` when the command does not
//! apply to the current state, which surfaces as [`Transition::Unchanged`] so
//! callers can skip redundant history pushes and broadcasts.

use super::commands::{CommandScope, DocumentCommand};
use super::events::StateEvent;
use super::{assets, slides, workflow};
use crate::domain::{Document, Stage, StageStatus};
use std::sync::Arc;

/// Outcome of applying one command.
#[derive(Debug, Clone)]
pub enum Transition {
    /// The command does not apply; the input document stands.
    Unchanged,
    /// A new document, plus events describing what happened.
    Changed {
        document: Document,
        events: Vec<StateEvent>,
    },
}

impl Transition {
    pub fn is_changed(&self) -> bool {
        matches!(self, Transition::Changed { .. })
    }

    /// The resulting document, falling back to `current` when unchanged.
    pub fn into_document(self, current: &Document) -> Document {
        match self {
            Transition::Unchanged => current.clone(),
            Transition::Changed { document, .. } => document,
        }
    }
}

/// A handler's result before history bookkeeping.
pub(super) struct Edit {
    pub document: Document,
    pub events: Vec<StateEvent>,
}

impl Edit {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            events: Vec::new(),
        }
    }

    pub fn with_event(mut self, event: StateEvent) -> Self {
        self.events.push(event);
        self
    }
}

/// Applies `command` to `document`.
pub fn apply(document: &Document, command: &DocumentCommand) -> Transition {
    match command {
        DocumentCommand::Undo => undo(document),
        DocumentCommand::Redo => redo(document),
        DocumentCommand::Batch { commands } => apply_batch(document, commands),
        other => match route(document, other) {
            None => Transition::Unchanged,
            Some(edit) => finish(document, !other.is_history_exempt(), edit),
        },
    }
}

fn route(document: &Document, command: &DocumentCommand) -> Option<Edit> {
    match command.scope() {
        CommandScope::Workflow => workflow::apply(document, command),
        CommandScope::Assets => assets::apply(document, command),
        CommandScope::Slides => slides::apply(document, command),
        CommandScope::Control => None,
    }
}

fn finish(before: &Document, record: bool, edit: Edit) -> Transition {
    let Edit {
        mut document,
        events,
    } = edit;
    if record {
        document.history.record(before);
        document.revision += 1;
    }
    Transition::Changed { document, events }
}

#[derive(Default)]
struct BatchTally {
    applied: usize,
    skipped: usize,
    records_history: bool,
}

/// Folds every sub-command over an accumulating document, then records a
/// single history entry for the whole batch.
///
/// Sub-commands that do not apply are skipped, not rolled back. Undo and redo
/// are not meaningful inside a batch and are skipped as well; nested batches
/// are flattened.
fn apply_batch(document: &Document, commands: &[DocumentCommand]) -> Transition {
    let mut tally = BatchTally::default();
    let mut events = Vec::new();
    let folded = fold_batch(document.clone(), commands, &mut tally, &mut events);

    if tally.applied == 0 {
        return Transition::Unchanged;
    }

    events.push(StateEvent::BatchApplied {
        applied: tally.applied,
        skipped: tally.skipped,
    });

    finish(
        document,
        tally.records_history,
        Edit {
            document: folded,
            events,
        },
    )
}

fn fold_batch(
    mut acc: Document,
    commands: &[DocumentCommand],
    tally: &mut BatchTally,
    events: &mut Vec<StateEvent>,
) -> Document {
    for command in commands {
        match command {
            DocumentCommand::Batch { commands: nested } => {
                acc = fold_batch(acc, nested, tally, events);
            }
            DocumentCommand::Undo | DocumentCommand::Redo => tally.skipped += 1,
            other => match route(&acc, other) {
                Some(edit) => {
                    tally.applied += 1;
                    tally.records_history |= !other.is_history_exempt();
                    events.extend(edit.events);
                    acc = edit.document;
                }
                None => tally.skipped += 1,
            },
        }
    }
    acc
}

fn undo(live: &Document) -> Transition {
    let mut history = live.history.clone();
    let Some(previous) = history.pop_undo() else {
        return Transition::Unchanged;
    };
    history.push_redo(Arc::new(live.detached()));

    let mut document = Document::clone(&previous);
    carry_exempt_fields(live, &mut document);
    document.history = history;
    let undo_remaining = document.history.undo_len();
    Transition::Changed {
        document,
        events: vec![StateEvent::Undone { undo_remaining }],
    }
}

fn redo(live: &Document) -> Transition {
    let mut history = live.history.clone();
    let Some(next) = history.pop_redo() else {
        return Transition::Unchanged;
    };
    history.push_undo(Arc::new(live.detached()));

    let mut document = Document::clone(&next);
    carry_exempt_fields(live, &mut document);
    document.history = history;
    let redo_remaining = document.history.redo_len();
    Transition::Changed {
        document,
        events: vec![StateEvent::Redone { redo_remaining }],
    }
}

/// Identity, settings and the event log are not governed by history: they keep
/// their live values across undo and redo.
fn carry_exempt_fields(live: &Document, target: &mut Document) {
    target.name = live.name.clone();
    target.settings = live.settings.clone();
    target.event_log = live.event_log.clone();
}

/// Records a content edit on `stage`: bumps its revision and marks every later
/// approved stage dirty.
pub(super) fn touch_stage(document: &mut Document, stage: Stage, events: &mut Vec<StateEvent>) {
    if let Some(record) = document.stage_record_mut(stage) {
        record.revision += 1;
    }
    for record in document.stages.iter_mut().filter(|r| r.stage > stage) {
        if record.status == StageStatus::Approved {
            record.status = StageStatus::Dirty;
            events.push(StateEvent::StageStatusChanged {
                stage: record.stage,
                from: StageStatus::Approved,
                to: StageStatus::Dirty,
            });
        }
    }
}

#[cfg(test)]
#[path = "tests/transition_tests.rs"]
mod tests;
