//! Commands that can mutate the document.
//!
//! All document changes MUST go through `apply()`. This is the only way to
//! mutate a document, ensuring a single source of truth.

use crate::domain::{
    AiSettings, Asset, AssetId, AssetImage, Branding, CutoutMethod, EventLogEntry, OutlineItem,
    SlideId, Stage, TextPlacement,
};
use serde::{Deserialize, Serialize};

/// Commands that can mutate the document.
///
/// Serialized as `{ "type": ..., "payload": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum DocumentCommand {
    // Workflow
    /// Approve a stage and open the next one
    ApproveStage { stage: Stage },
    /// Demote an approved stage back to open for editing
    UnlockStage { stage: Stage },
    /// Approve every stage and jump to the last one
    ApproveAll,
    /// Move the active stage pointer to a reachable stage
    SetActiveStage { stage: Stage },
    /// Replace branding (Strategy content)
    UpdateBranding { branding: Branding },
    /// Replace the outline and rebuild one slide per item (Strategy content)
    SetOutline { items: Vec<OutlineItem> },
    /// Rename the project (history-exempt)
    RenameProject { name: String },
    /// Toggle a named assisted feature (history-exempt)
    ToggleAiSetting { setting: String, enabled: bool },
    /// Replace all assisted feature toggles (history-exempt)
    UpdateSettings { settings: AiSettings },
    /// Append to the document's event log (history-exempt)
    AppendLog { entry: EventLogEntry },

    // Assets
    /// Append assets (Assets content)
    AddAssets { assets: Vec<Asset> },
    /// Remove an asset and clear every zone pointing at it
    RemoveAsset { asset_id: AssetId },
    /// Swap an asset's pixels, e.g. after re-running a cutout
    ReplaceAssetImage {
        asset_id: AssetId,
        image: AssetImage,
        cutout: CutoutMethod,
    },

    // Slides (active variant)
    /// Point a zone at an asset, or clear it
    UpdateZone {
        slide_id: SlideId,
        zone: String,
        asset_id: Option<AssetId>,
    },
    /// Move a zone's element
    MoveElement {
        slide_id: SlideId,
        zone: String,
        x: f32,
        y: f32,
    },
    /// Resize a zone's element
    ResizeElement {
        slide_id: SlideId,
        zone: String,
        width: f32,
        height: f32,
    },
    /// Change text block alignment and anchoring (Layout content)
    UpdateTextLayout {
        slide_id: SlideId,
        placement: TextPlacement,
    },
    /// Set one copy field (Copy content)
    UpdateTextContent {
        slide_id: SlideId,
        field: String,
        text: String,
    },
    /// Switch a slide's active variant
    SelectVariant { slide_id: SlideId, index: usize },

    // Control
    /// Apply sub-commands as one undo unit
    Batch { commands: Vec<DocumentCommand> },
    /// Restore the most recent history entry
    Undo,
    /// Re-apply the most recently undone state
    Redo,
}

/// Which sub-transition owns a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandScope {
    Workflow,
    Assets,
    Slides,
    Control,
}

impl DocumentCommand {
    pub fn scope(&self) -> CommandScope {
        use DocumentCommand::*;
        match self {
            ApproveStage { .. }
            | UnlockStage { .. }
            | ApproveAll
            | SetActiveStage { .. }
            | UpdateBranding { .. }
            | SetOutline { .. }
            | RenameProject { .. }
            | ToggleAiSetting { .. }
            | UpdateSettings { .. }
            | AppendLog { .. } => CommandScope::Workflow,
            AddAssets { .. } | RemoveAsset { .. } | ReplaceAssetImage { .. } => {
                CommandScope::Assets
            }
            UpdateZone { .. }
            | MoveElement { .. }
            | ResizeElement { .. }
            | UpdateTextLayout { .. }
            | UpdateTextContent { .. }
            | SelectVariant { .. } => CommandScope::Slides,
            Batch { .. } | Undo | Redo => CommandScope::Control,
        }
    }

    /// Commands that change the document without producing a history entry.
    pub fn is_history_exempt(&self) -> bool {
        matches!(
            self,
            DocumentCommand::RenameProject { .. }
                | DocumentCommand::ToggleAiSetting { .. }
                | DocumentCommand::UpdateSettings { .. }
                | DocumentCommand::AppendLog { .. }
        )
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        use DocumentCommand::*;
        match self {
            ApproveStage { .. } => "ApproveStage",
            UnlockStage { .. } => "UnlockStage",
            ApproveAll => "ApproveAll",
            SetActiveStage { .. } => "SetActiveStage",
            UpdateBranding { .. } => "UpdateBranding",
            SetOutline { .. } => "SetOutline",
            RenameProject { .. } => "RenameProject",
            ToggleAiSetting { .. } => "ToggleAiSetting",
            UpdateSettings { .. } => "UpdateSettings",
            AppendLog { .. } => "AppendLog",
            AddAssets { .. } => "AddAssets",
            RemoveAsset { .. } => "RemoveAsset",
            ReplaceAssetImage { .. } => "ReplaceAssetImage",
            UpdateZone { .. } => "UpdateZone",
            MoveElement { .. } => "MoveElement",
            ResizeElement { .. } => "ResizeElement",
            UpdateTextLayout { .. } => "UpdateTextLayout",
            UpdateTextContent { .. } => "UpdateTextContent",
            SelectVariant { .. } => "SelectVariant",
            Batch { .. } => "Batch",
            Undo => "Undo",
            Redo => "Redo",
        }
    }
}
