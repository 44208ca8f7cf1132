//! Structural validation and rehydration of externally supplied documents.
//!
//! Documents read from storage or a file are checked against the shape the
//! engine relies on before they may become the live document. Strict mode
//! rejects anything with issues; lenient mode salvages every field that still
//! decodes on its own, lays it over a fresh document, and flags the result as
//! degraded.

use crate::domain::document::{
    AiSettings, Asset, Branding, Document, EventLogEntry, OutlineItem, Slide, StageRecord,
    SCHEMA_VERSION,
};
use crate::domain::errors::{DocumentError, ValidationIssue};
use crate::domain::types::{DocumentId, Stage, StageStatus};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

const ALLOWED_STATUSES: [&str; 4] = ["open", "locked", "approved", "dirty"];

const ARRAY_FIELDS: [&str; 4] = ["outline", "assets", "slides", "event_log"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RehydrateMode {
    /// Reject any document with structural issues.
    Strict,
    /// Merge recoverable fields over defaults.
    Lenient,
}

/// Result of accepting an external document.
#[derive(Debug, Clone)]
pub struct Rehydrated {
    pub document: Document,
    /// True when fields were dropped or defaulted during recovery.
    pub degraded: bool,
    pub issues: Vec<ValidationIssue>,
}

/// Checks the structural shape of a serialized document.
///
/// Returns every issue found; an empty list means the document is safe to decode.
pub fn check_structure(value: &Value) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let Some(obj) = value.as_object() else {
        issues.push(ValidationIssue::new("", "expected an object"));
        return issues;
    };

    match obj.get("id").and_then(Value::as_str) {
        Some(id) if DocumentId::from_string(id).is_ok() => {}
        Some(_) => issues.push(ValidationIssue::new("/id", "not a valid UUID")),
        None => issues.push(ValidationIssue::new("/id", "missing or not a string")),
    }

    if !obj.get("name").is_some_and(Value::is_string) {
        issues.push(ValidationIssue::new("/name", "missing or not a string"));
    }

    if obj.get("updated_at").is_none() {
        issues.push(ValidationIssue::new("/updated_at", "missing"));
    }

    if let Some(version) = obj.get("schema_version") {
        match version.as_u64() {
            Some(v) if v <= u64::from(SCHEMA_VERSION) => {}
            Some(v) => issues.push(ValidationIssue::new(
                "/schema_version",
                format!("version {} is newer than supported {}", v, SCHEMA_VERSION),
            )),
            None => issues.push(ValidationIssue::new("/schema_version", "not a number")),
        }
    }

    match obj.get("current_stage") {
        Some(v) if stage_in_range(v) => {}
        _ => issues.push(ValidationIssue::new("/current_stage", "missing or out of range 1..=5")),
    }

    check_stages(obj, &mut issues);

    for field in ARRAY_FIELDS {
        if let Some(v) = obj.get(field) {
            if !v.is_array() {
                issues.push(ValidationIssue::new(format!("/{}", field), "expected an array"));
            }
        }
    }

    if let Some(slides) = obj.get("slides").and_then(Value::as_array) {
        for (i, slide) in slides.iter().enumerate() {
            check_slide(slide, &format!("/slides/{}", i), &mut issues);
        }
    }

    issues
}

fn stage_in_range(v: &Value) -> bool {
    v.as_u64()
        .and_then(|n| u8::try_from(n).ok())
        .and_then(Stage::from_number)
        .is_some()
}

fn check_stages(obj: &Map<String, Value>, issues: &mut Vec<ValidationIssue>) {
    let Some(stages) = obj.get("stages").and_then(Value::as_array) else {
        issues.push(ValidationIssue::new("/stages", "missing or not an array"));
        return;
    };
    if stages.len() != Stage::ALL.len() {
        issues.push(ValidationIssue::new(
            "/stages",
            format!("expected {} entries, found {}", Stage::ALL.len(), stages.len()),
        ));
    }
    // Records are ordered by stage number, so gating can be checked positionally.
    let mut predecessor_approved = true;
    for (i, record) in stages.iter().enumerate() {
        let path = format!("/stages/{}", i);
        let expected = i as u64 + 1;
        match record.get("stage") {
            Some(v) if !stage_in_range(v) => {
                issues.push(ValidationIssue::new(&path, "stage out of range"));
            }
            Some(v) if v.as_u64() != Some(expected) => {
                issues.push(ValidationIssue::new(
                    &path,
                    format!("expected stage {}, found {}", expected, v),
                ));
            }
            Some(_) => {}
            None => issues.push(ValidationIssue::new(&path, "stage missing")),
        }
        let status = record.get("status").and_then(Value::as_str);
        match status {
            Some(s) if ALLOWED_STATUSES.contains(&s) => {
                if s != "locked" && !predecessor_approved {
                    issues.push(ValidationIssue::new(
                        &path,
                        "reachable before the previous stage was approved",
                    ));
                }
                let approvals = record.get("approvals").and_then(Value::as_u64).unwrap_or(0);
                predecessor_approved = approvals > 0 || s == "approved" || s == "dirty";
            }
            _ => {
                issues.push(ValidationIssue::new(
                    &path,
                    "status not one of open|locked|approved|dirty",
                ));
                predecessor_approved = false;
            }
        }
    }
}

fn check_slide(slide: &Value, path: &str, issues: &mut Vec<ValidationIssue>) {
    let variants = slide.get("variants").and_then(Value::as_array);
    match variants {
        Some(variants) if !variants.is_empty() => {
            for (j, variant) in variants.iter().enumerate() {
                if !variant.get("zones").is_some_and(Value::is_object) {
                    issues.push(ValidationIssue::new(
                        format!("{}/variants/{}/zones", path, j),
                        "missing zone map",
                    ));
                }
            }
        }
        _ => issues.push(ValidationIssue::new(
            format!("{}/variants", path),
            "slide needs at least one variant",
        )),
    }
}

/// Accepts an external document according to `mode`.
pub fn rehydrate(value: Value, mode: RehydrateMode) -> Result<Rehydrated, DocumentError> {
    if !value.is_object() {
        return Err(DocumentError::NotAnObject);
    }

    let issues = check_structure(&value);
    if issues.is_empty() {
        match serde_json::from_value::<Document>(value.clone()) {
            Ok(mut document) => {
                document.schema_version = SCHEMA_VERSION;
                return Ok(Rehydrated {
                    document,
                    degraded: false,
                    issues,
                });
            }
            Err(e) if mode == RehydrateMode::Strict => {
                return Err(DocumentError::Decode {
                    message: e.to_string(),
                });
            }
            Err(_) => {}
        }
    } else if mode == RehydrateMode::Strict {
        return Err(DocumentError::Invalid { issues });
    }

    Ok(Rehydrated {
        document: salvage(&value),
        degraded: true,
        issues,
    })
}

/// Lays every independently decodable field of `value` over a fresh document.
fn salvage(value: &Value) -> Document {
    let name = value
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("Recovered document");
    let mut doc = Document::new(name);

    if let Some(id) = value
        .get("id")
        .and_then(Value::as_str)
        .and_then(|s| DocumentId::from_string(s).ok())
    {
        doc.id = id;
    }
    if let Some(updated_at) = field(value, "updated_at") {
        doc.updated_at = updated_at;
    }
    if let Some(revision) = value.get("revision").and_then(Value::as_u64) {
        doc.revision = revision;
    }
    if let Some(branding) = field::<Branding>(value, "branding") {
        doc.branding = branding;
    }
    if let Some(settings) = field::<AiSettings>(value, "settings") {
        doc.settings = settings;
    }
    doc.outline = items::<OutlineItem>(value, "outline");
    doc.assets = items::<Asset>(value, "assets");
    doc.slides = items::<Slide>(value, "slides")
        .into_iter()
        .filter(|s| !s.variants.is_empty())
        .collect();
    doc.event_log = items::<EventLogEntry>(value, "event_log");

    for record in items::<StageRecord>(value, "stages") {
        if let Some(slot) = doc.stage_record_mut(record.stage) {
            *slot = record;
        }
    }
    if let Some(stage) = field::<Stage>(value, "current_stage") {
        doc.current_stage = stage;
    }

    normalize_gating(&mut doc);
    doc
}

fn field<T: DeserializeOwned>(value: &Value, key: &str) -> Option<T> {
    value
        .get(key)
        .and_then(|v| serde_json::from_value(v.clone()).ok())
}

/// Decodes array elements one by one, dropping the ones that fail.
fn items<T: DeserializeOwned>(value: &Value, key: &str) -> Vec<T> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|v| serde_json::from_value(v.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Re-establishes the gating invariant on a salvaged document.
///
/// A stage may only be reachable if its predecessor was approved at least once,
/// and the active pointer may not rest on a locked stage.
pub(crate) fn normalize_gating(doc: &mut Document) {
    let mut reachable = true;
    for stage in Stage::ALL {
        let Some(record) = doc.stage_record_mut(stage) else {
            continue;
        };
        if stage == Stage::FIRST && record.status == StageStatus::Locked {
            record.status = StageStatus::Open;
        }
        if !reachable {
            record.status = StageStatus::Locked;
            record.approvals = 0;
        }
        reachable = record.ever_approved();
    }

    while doc.stage_status(doc.current_stage) == StageStatus::Locked {
        match doc.current_stage.previous() {
            Some(prev) => doc.current_stage = prev,
            None => break,
        }
    }
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
