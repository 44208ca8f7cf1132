//! The document aggregate: the single root of all authoring state.
//!
//! A `Document` is only ever changed by applying commands through the state
//! machine. Every collection here is plain owned data so a snapshot is a
//! cheap-to-reason-about deep copy.

use crate::domain::history::History;
use crate::domain::types::{AssetId, DocumentId, SlideId, Stage, StageStatus, TimestampUtc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current document schema version. Older documents are migrated on load.
pub const SCHEMA_VERSION: u32 = 3;

/// Zone holding the shared kit background.
pub const BACKGROUND_ZONE: &str = "background";

/// Zone holding the optional decorative stamp.
pub const STAMP_ZONE: &str = "stamp";

/// Gating state for one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub status: StageStatus,
    /// Number of content edits applied while this stage was editable.
    #[serde(default)]
    pub revision: u32,
    /// Number of times this stage has been approved.
    #[serde(default)]
    pub approvals: u32,
}

impl StageRecord {
    fn new(stage: Stage, status: StageStatus) -> Self {
        Self {
            stage,
            status,
            revision: 0,
            approvals: 0,
        }
    }

    /// True if the stage has been approved at least once, now or in the past.
    pub fn ever_approved(&self) -> bool {
        self.approvals > 0 || matches!(self.status, StageStatus::Approved | StageStatus::Dirty)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Branding {
    #[serde(default)]
    pub brand_name: String,
    #[serde(default)]
    pub tone: String,
    /// Hex colors, primary first.
    #[serde(default)]
    pub palette: Vec<String>,
    #[serde(default)]
    pub font: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineItem {
    pub title: String,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Background,
    Stamp,
    Illustration,
}

/// How the asset's transparency was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutoutMethod {
    #[default]
    None,
    Neural,
    FloodFill,
    ColorKey,
}

/// Where an asset's pixels live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "storage", rename_all = "snake_case")]
pub enum ImageData {
    /// PNG bytes carried inside the document (base64 in JSON).
    Inline {
        #[serde(with = "base64_bytes")]
        png: Vec<u8>,
    },
    /// Reference to an externalised file, relative to the archive root.
    File { path: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetImage {
    pub width: u32,
    pub height: u32,
    pub data: ImageData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub kind: AssetKind,
    /// The concept description the asset was generated from.
    pub concept: String,
    #[serde(default)]
    pub image: Option<AssetImage>,
    #[serde(default)]
    pub cutout: CutoutMethod,
}

/// Placement rectangle in percent of the slide canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const FULL: Rect = Rect {
        x: 0.0,
        y: 0.0,
        width: 100.0,
        height: 100.0,
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    #[serde(default)]
    pub asset_id: Option<AssetId>,
    pub rect: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAnchor {
    #[default]
    Top,
    Middle,
    Bottom,
}

/// Where the text block sits on a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextPlacement {
    pub align: TextAlign,
    pub anchor: TextAnchor,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextLayout {
    #[serde(default)]
    pub placement: TextPlacement,
    /// Copy fields by name (`headline`, `body`, ...).
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub label: String,
    pub zones: BTreeMap<String, Zone>,
    #[serde(default)]
    pub text: TextLayout,
}

impl Variant {
    /// A variant with an empty full-bleed background zone and a corner stamp zone.
    pub fn standard(label: &str) -> Self {
        let mut zones = BTreeMap::new();
        zones.insert(
            BACKGROUND_ZONE.to_string(),
            Zone {
                asset_id: None,
                rect: Rect::FULL,
            },
        );
        zones.insert(
            STAMP_ZONE.to_string(),
            Zone {
                asset_id: None,
                rect: Rect {
                    x: 72.0,
                    y: 64.0,
                    width: 22.0,
                    height: 22.0,
                },
            },
        );
        Self {
            label: label.to_string(),
            zones,
            text: TextLayout::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    pub id: SlideId,
    pub title: String,
    #[serde(default)]
    pub active_variant: usize,
    pub variants: Vec<Variant>,
}

impl Slide {
    pub fn from_outline(item: &OutlineItem) -> Self {
        Self {
            id: SlideId::generate(),
            title: item.title.clone(),
            active_variant: 0,
            variants: vec![Variant::standard("default")],
        }
    }

    pub fn active(&self) -> Option<&Variant> {
        self.variants.get(self.active_variant)
    }

    pub fn active_mut(&mut self) -> Option<&mut Variant> {
        self.variants.get_mut(self.active_variant)
    }
}

/// Named boolean toggles for assisted features.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiSettings {
    #[serde(default)]
    pub toggles: BTreeMap<String, bool>,
}

impl AiSettings {
    pub fn is_enabled(&self, name: &str) -> bool {
        self.toggles.get(name).copied().unwrap_or(false)
    }
}

impl Default for AiSettings {
    fn default() -> Self {
        let mut toggles = BTreeMap::new();
        toggles.insert("auto_cutout".to_string(), true);
        toggles.insert("stamps".to_string(), true);
        Self { toggles }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub at: TimestampUtc,
    pub level: LogLevel,
    pub message: String,
}

impl EventLogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            at: TimestampUtc::now(),
            level,
            message: message.into(),
        }
    }
}

/// The root aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub name: String,
    #[serde(default = "legacy_schema_version")]
    pub schema_version: u32,
    pub updated_at: TimestampUtc,
    pub current_stage: Stage,
    pub stages: Vec<StageRecord>,
    /// Incremented on every history-recording change.
    #[serde(default)]
    pub revision: u64,
    #[serde(default)]
    pub branding: Branding,
    #[serde(default)]
    pub outline: Vec<OutlineItem>,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub slides: Vec<Slide>,
    #[serde(default)]
    pub settings: AiSettings,
    #[serde(default)]
    pub event_log: Vec<EventLogEntry>,
    /// Undo/redo stacks. Never persisted.
    #[serde(skip)]
    pub history: History,
}

fn legacy_schema_version() -> u32 {
    1
}

impl Document {
    /// Creates a document with the first stage open and every other stage locked.
    pub fn new(name: &str) -> Self {
        let stages = Stage::ALL
            .iter()
            .map(|&stage| {
                let status = if stage == Stage::FIRST {
                    StageStatus::Open
                } else {
                    StageStatus::Locked
                };
                StageRecord::new(stage, status)
            })
            .collect();

        Self {
            id: DocumentId::new(),
            name: name.to_string(),
            schema_version: SCHEMA_VERSION,
            updated_at: TimestampUtc::now(),
            current_stage: Stage::FIRST,
            stages,
            revision: 0,
            branding: Branding::default(),
            outline: Vec::new(),
            assets: Vec::new(),
            slides: Vec::new(),
            settings: AiSettings::default(),
            event_log: Vec::new(),
            history: History::default(),
        }
    }

    pub fn stage_record(&self, stage: Stage) -> Option<&StageRecord> {
        self.stages.iter().find(|r| r.stage == stage)
    }

    pub fn stage_record_mut(&mut self, stage: Stage) -> Option<&mut StageRecord> {
        self.stages.iter_mut().find(|r| r.stage == stage)
    }

    /// Status of a stage; a missing record reads as locked.
    pub fn stage_status(&self, stage: Stage) -> StageStatus {
        self.stage_record(stage)
            .map(|r| r.status)
            .unwrap_or(StageStatus::Locked)
    }

    pub fn is_editable(&self, stage: Stage) -> bool {
        self.stage_status(stage).is_editable()
    }

    /// A copy of this document with its own undo/redo stacks cleared.
    pub fn detached(&self) -> Document {
        Document {
            history: History::default(),
            ..self.clone()
        }
    }

    pub fn slide(&self, id: &SlideId) -> Option<&Slide> {
        self.slides.iter().find(|s| &s.id == id)
    }

    pub fn slide_mut(&mut self, id: &SlideId) -> Option<&mut Slide> {
        self.slides.iter_mut().find(|s| &s.id == id)
    }

    pub fn asset(&self, id: &AssetId) -> Option<&Asset> {
        self.assets.iter().find(|a| &a.id == id)
    }

    /// First asset of the given kind, in insertion order.
    pub fn first_asset_of(&self, kind: AssetKind) -> Option<&Asset> {
        self.assets.iter().find(|a| a.kind == kind)
    }
}

/// Serde adapter storing byte payloads as standard base64 strings.
mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
