//! Events emitted by the engine after processing commands.
//!
//! These are for logging and notification purposes only. Observers get the
//! document itself through the state machine's watch channel.

use crate::domain::{AssetId, SlideId, Stage, StageStatus};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum StateEvent {
    /// A stage's gating status changed
    StageStatusChanged {
        stage: Stage,
        from: StageStatus,
        to: StageStatus,
    },
    /// The active stage pointer moved
    ActiveStageChanged { from: Stage, to: Stage },
    /// Strategy content (branding or outline) changed
    StrategyUpdated { slides: usize },
    /// Project renamed
    ProjectRenamed { name: String },
    /// Assisted feature settings changed
    SettingsChanged,
    /// A log line was appended to the document
    LogAppended,
    /// Assets were added
    AssetsAdded { ids: Vec<AssetId> },
    /// An asset was removed
    AssetRemoved { id: AssetId, zones_cleared: usize },
    /// An asset's pixels were replaced
    AssetImageReplaced { id: AssetId },
    /// A slide's zones, layout or variant changed
    SlideUpdated { slide_id: SlideId },
    /// A slide's copy changed
    CopyUpdated { slide_id: SlideId, field: String },
    /// A batch was applied as a single undo unit
    BatchApplied { applied: usize, skipped: usize },
    /// History stepped backwards
    Undone { undo_remaining: usize },
    /// History stepped forwards
    Redone { redo_remaining: usize },
}
