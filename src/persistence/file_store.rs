//! File-based document store.
//!
//! One pretty-printed JSON file per key under a single directory:
//! - Atomic writes via temp file + rename
//! - A shared/exclusive lock on `.store.lock` around each read/write
//! - Lenient rehydration on read; degraded loads are logged, not rejected

use super::store::{validate_key, DocumentStore};
use crate::domain::{rehydrate, Document, RehydrateMode};
use anyhow::{Context, Result};
use async_trait::async_trait;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const LOCK_FILE: &str = ".store.lock";

#[derive(Debug, Clone)]
pub struct FileDocumentStore {
    dir: PathBuf,
}

impl FileDocumentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{}.json", key)))
    }

    fn lock(&self) -> Result<File> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create store directory: {}", self.dir.display()))?;
        let path = self.dir.join(LOCK_FILE);
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .with_context(|| format!("Failed to open lock file: {}", path.display()))
    }
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn get(&self, key: &str) -> Result<Option<Document>> {
        let path = self.path_for(key)?;
        let lock = self.lock()?;
        lock.lock_shared()
            .with_context(|| format!("Failed to lock store: {}", self.dir.display()))?;

        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read document: {}", path.display()))
            }
        };
        let value: serde_json::Value = serde_json::from_str(&content)
            .with_context(|| format!("Document is not valid JSON: {}", path.display()))?;
        let rehydrated = rehydrate(value, RehydrateMode::Lenient)
            .with_context(|| format!("Failed to load document: {}", path.display()))?;

        if rehydrated.degraded {
            tracing::warn!(
                key,
                issues = rehydrated.issues.len(),
                "stored document loaded in degraded form"
            );
            for issue in &rehydrated.issues {
                tracing::debug!(key, %issue, "document issue");
            }
        }
        Ok(Some(rehydrated.document))
    }

    async fn set(&self, key: &str, document: &Document) -> Result<()> {
        let path = self.path_for(key)?;
        let lock = self.lock()?;
        lock.lock_exclusive()
            .with_context(|| format!("Failed to lock store: {}", self.dir.display()))?;

        let content = serde_json::to_string_pretty(document)
            .context("Failed to serialize document to JSON")?;
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, &content)
            .with_context(|| format!("Failed to write temp file: {}", temp_path.display()))?;
        fs::rename(&temp_path, &path)
            .with_context(|| format!("Failed to rename temp file to: {}", path.display()))?;
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to list store: {}", self.dir.display()))
            }
        };
        let mut keys: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                let key = name.strip_suffix(".json")?;
                validate_key(key).ok().map(|_| key.to_string())
            })
            .collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
#[path = "tests/file_store_tests.rs"]
mod tests;
