//! Zip export of a document.
//!
//! Layout:
//! - `document.json`: the document without history, event log or inline pixels
//! - `assets/<id>.png`: each inline image, referenced from `document.json`
//! - `events.json`: the most recent event log entries
//! - `manifest.json`: what was written, with SHA-256 digests

use crate::domain::{Document, EventLogEntry, ImageData};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Bumped when the archive layout changes.
pub const ARCHIVE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedFile {
    pub name: String,
    pub size: u64,
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveManifest {
    pub format_version: u32,
    /// ISO 8601 timestamp when the archive was written
    pub created_at: String,
    pub document_id: String,
    pub document_name: String,
    pub schema_version: u32,
    pub events_included: usize,
    /// Older event log entries left out of `events.json`
    pub events_dropped: usize,
    pub files: Vec<ArchivedFile>,
}

/// A document prepared for export: the JSON-safe document plus the files it
/// now refers to.
#[derive(Debug, Clone)]
pub struct ExportBundle {
    pub document: Document,
    pub images: Vec<(String, Vec<u8>)>,
    pub events: Vec<EventLogEntry>,
    pub events_dropped: usize,
}

/// Strips history and the event log, and moves inline PNGs out to
/// `assets/<id>.png` references. Keeps the last `event_tail` log entries.
pub fn prepare_export(document: &Document, event_tail: usize) -> ExportBundle {
    let mut exported = document.detached();
    let log = std::mem::take(&mut exported.event_log);
    let events_dropped = log.len().saturating_sub(event_tail);
    let events = log.into_iter().skip(events_dropped).collect();

    let mut images = Vec::new();
    let mut used = HashSet::new();
    for asset in &mut exported.assets {
        let Some(image) = asset.image.as_mut() else {
            continue;
        };
        if let ImageData::Inline { png } = &mut image.data {
            let path = format!("assets/{}.png", unique_stem(asset.id.as_str(), &mut used));
            images.push((path.clone(), std::mem::take(png)));
            image.data = ImageData::File { path };
        }
    }

    ExportBundle {
        document: exported,
        images,
        events,
        events_dropped,
    }
}

/// Writes the archive for `document` to `path`.
pub fn export_archive(document: &Document, path: &Path, event_tail: usize) -> Result<ArchiveManifest> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let bundle = prepare_export(document, event_tail);

    let file = File::create(path)
        .with_context(|| format!("Failed to create archive: {}", path.display()))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    let mut files = Vec::new();

    let document_json = serde_json::to_vec_pretty(&bundle.document)
        .context("Failed to serialize document for export")?;
    files.push(add_bytes_to_zip(&mut zip, "document.json", &document_json, options)?);

    for (name, png) in &bundle.images {
        files.push(add_bytes_to_zip(&mut zip, name, png, options)?);
    }

    let events_json =
        serde_json::to_vec_pretty(&bundle.events).context("Failed to serialize event log")?;
    files.push(add_bytes_to_zip(&mut zip, "events.json", &events_json, options)?);

    let manifest = ArchiveManifest {
        format_version: ARCHIVE_FORMAT_VERSION,
        created_at: chrono::Utc::now().to_rfc3339(),
        document_id: document.id.to_string(),
        document_name: document.name.clone(),
        schema_version: document.schema_version,
        events_included: bundle.events.len(),
        events_dropped: bundle.events_dropped,
        files,
    };
    let manifest_json = serde_json::to_string_pretty(&manifest)?;
    zip.start_file("manifest.json", options)?;
    zip.write_all(manifest_json.as_bytes())?;
    zip.finish()?;

    tracing::info!(
        path = %path.display(),
        images = bundle.images.len(),
        events = manifest.events_included,
        "archive written"
    );
    Ok(manifest)
}

/// Reads `manifest.json` back out of an archive.
pub fn read_manifest(path: &Path) -> Result<ArchiveManifest> {
    let file =
        File::open(path).with_context(|| format!("Failed to open archive: {}", path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("Not a zip archive: {}", path.display()))?;
    let mut entry = archive
        .by_name("manifest.json")
        .context("Archive has no manifest.json")?;
    let mut content = String::new();
    entry.read_to_string(&mut content)?;
    serde_json::from_str(&content).context("Failed to parse manifest.json")
}

fn add_bytes_to_zip(
    zip: &mut ZipWriter<File>,
    name: &str,
    bytes: &[u8],
    options: SimpleFileOptions,
) -> Result<ArchivedFile> {
    zip.start_file(name, options)?;
    zip.write_all(bytes)?;
    Ok(ArchivedFile {
        name: name.to_string(),
        size: bytes.len() as u64,
        sha256: format!("{:x}", Sha256::digest(bytes)),
    })
}

/// Sanitized stem for `id`, suffixed `-2`, `-3`, ... when an earlier asset
/// already took it.
fn unique_stem(id: &str, used: &mut HashSet<String>) -> String {
    let base = file_stem(id);
    let mut stem = base.clone();
    let mut n = 1;
    while !used.insert(stem.clone()) {
        n += 1;
        stem = format!("{}-{}", base, n);
    }
    stem
}

/// Asset ids come from documents we may not have written ourselves.
fn file_stem(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/archive_tests.rs"]
mod tests;
