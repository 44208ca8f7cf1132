//! Strongly typed domain primitives for the document aggregate.
//!
//! These newtypes give identifiers and stage values type safety and semantic
//! clarity. They are used throughout the domain model and the command protocol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    /// Creates a new random document ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a document ID from a string.
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an asset inside a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub String);

impl AssetId {
    /// Creates a fresh asset ID with an `asset-` prefix.
    pub fn generate() -> Self {
        Self(format!("asset-{}", short_uuid()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a slide inside a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlideId(pub String);

impl SlideId {
    /// Creates a fresh slide ID with a `slide-` prefix.
    pub fn generate() -> Self {
        Self(format!("slide-{}", short_uuid()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SlideId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for SlideId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn short_uuid() -> String {
    Uuid::new_v4().simple().to_string().chars().take(12).collect()
}

/// UTC timestamp wrapper for domain events and document metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimestampUtc(pub DateTime<Utc>);

impl TimestampUtc {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Returns the timestamp as an RFC3339 string.
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }
}

impl Default for TimestampUtc {
    fn default() -> Self {
        Self::now()
    }
}

/// One of the five ordered authoring stages.
///
/// Serialized as its 1-based position so stored documents stay compact and
/// range-checkable during rehydration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Stage {
    Strategy,
    Assets,
    Layout,
    Copy,
    Publish,
}

impl Stage {
    /// All stages in workflow order.
    pub const ALL: [Stage; 5] = [
        Stage::Strategy,
        Stage::Assets,
        Stage::Layout,
        Stage::Copy,
        Stage::Publish,
    ];

    pub const FIRST: Stage = Stage::Strategy;
    pub const LAST: Stage = Stage::Publish;

    /// 1-based position of the stage.
    pub fn number(self) -> u8 {
        match self {
            Stage::Strategy => 1,
            Stage::Assets => 2,
            Stage::Layout => 3,
            Stage::Copy => 4,
            Stage::Publish => 5,
        }
    }

    /// Looks up a stage by its 1-based position.
    pub fn from_number(n: u8) -> Option<Stage> {
        Stage::ALL.get(usize::from(n).checked_sub(1)?).copied()
    }

    /// The stage after this one, if any.
    pub fn next(self) -> Option<Stage> {
        Stage::from_number(self.number() + 1)
    }

    /// The stage before this one, if any.
    pub fn previous(self) -> Option<Stage> {
        Stage::from_number(self.number().checked_sub(1)?)
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::Strategy => "Strategy",
            Stage::Assets => "Assets",
            Stage::Layout => "Layout",
            Stage::Copy => "Copy",
            Stage::Publish => "Publish",
        }
    }
}

impl TryFrom<u8> for Stage {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Stage::from_number(value).ok_or_else(|| format!("stage {} out of range 1..=5", value))
    }
}

impl From<Stage> for u8 {
    fn from(stage: Stage) -> Self {
        stage.number()
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.label(), self.number())
    }
}

/// Gating status of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Editable, not yet approved.
    Open,
    /// Not reachable yet; content is read-only.
    Locked,
    /// Signed off; content is read-only until unlocked.
    Approved,
    /// Was approved, but an upstream stage changed since. Editable.
    Dirty,
}

impl StageStatus {
    /// Returns true if content commands may change this stage.
    pub fn is_editable(self) -> bool {
        matches!(self, StageStatus::Open | StageStatus::Dirty)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StageStatus::Open => "open",
            StageStatus::Locked => "locked",
            StageStatus::Approved => "approved",
            StageStatus::Dirty => "dirty",
        }
    }
}
