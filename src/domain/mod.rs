//! Domain model for the authoring document.
//!
//! # Architecture
//!
//! - **Types** (`types.rs`): identifiers, stages and stage statuses
//! - **Document** (`document.rs`): the root aggregate and its collections
//! - **History** (`history.rs`): bounded undo/redo snapshot stacks
//! - **Validation** (`validation.rs`): structural checks and rehydration of
//!   documents supplied from outside the engine
//!
//! The document is only changed through `state_machine::apply`.

pub mod document;
pub mod errors;
pub mod history;
pub mod types;
pub mod validation;

pub use document::{
    AiSettings, Asset, AssetImage, AssetKind, Branding, CutoutMethod, Document, EventLogEntry,
    ImageData, LogLevel, OutlineItem, Rect, Slide, StageRecord, TextAlign, TextAnchor, TextLayout,
    TextPlacement, Variant, Zone, BACKGROUND_ZONE, SCHEMA_VERSION, STAMP_ZONE,
};
pub use errors::{DocumentError, ValidationIssue};
pub use history::{History, HISTORY_CAPACITY};
pub use types::{AssetId, DocumentId, SlideId, Stage, StageStatus, TimestampUtc};
pub use validation::{check_structure, rehydrate, Rehydrated, RehydrateMode};
