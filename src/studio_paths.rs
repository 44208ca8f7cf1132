//! Home-based storage layout for slideforge.
//!
//! Everything lives under `~/.slideforge/` (or `$SLIDEFORGE_HOME`):
//! - `studio.yaml` - Optional configuration override
//! - `documents/` - One JSON file per document key
//! - `logs/` - Structured JSONL logs
//! - `exports/` - Zip archives written by `export`

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// The name of the studio directory under the home directory.
const STUDIO_DIR: &str = ".slideforge";

/// Environment variable that overrides the studio root.
pub const STUDIO_HOME_ENV: &str = "SLIDEFORGE_HOME";

/// Returns the studio root: `$SLIDEFORGE_HOME` if set, else `~/.slideforge/`.
pub fn studio_home_dir() -> Result<PathBuf> {
    if let Some(root) = std::env::var_os(STUDIO_HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(root));
    }
    let home = dirs::home_dir().context("Could not determine home directory for studio storage")?;
    Ok(home.join(STUDIO_DIR))
}

/// Paths under one studio root. Directory accessors create on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudioPaths {
    root: PathBuf,
}

impl StudioPaths {
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::at(studio_home_dir()?))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/studio.yaml`
    pub fn config_path(&self) -> PathBuf {
        self.root.join("studio.yaml")
    }

    /// `<root>/documents/`
    pub fn documents_dir(&self) -> Result<PathBuf> {
        ensure_dir(self.root.join("documents"))
    }

    /// `<root>/logs/`
    pub fn logs_dir(&self) -> Result<PathBuf> {
        ensure_dir(self.root.join("logs"))
    }

    /// `<root>/exports/`
    pub fn exports_dir(&self) -> Result<PathBuf> {
        ensure_dir(self.root.join("exports"))
    }

    /// `<root>/exports/<key>-<timestamp>.zip`
    pub fn export_path(&self, key: &str) -> Result<PathBuf> {
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        Ok(self.exports_dir()?.join(format!("{}-{}.zip", key, timestamp)))
    }
}

fn ensure_dir(dir: PathBuf) -> Result<PathBuf> {
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_dirs_are_created_under_root() {
        let temp = tempdir().unwrap();
        let paths = StudioPaths::at(temp.path().join("studio"));

        let documents = paths.documents_dir().unwrap();
        let logs = paths.logs_dir().unwrap();
        assert!(documents.is_dir());
        assert!(logs.is_dir());
        assert!(documents.starts_with(paths.root()));
        assert!(documents.ends_with("documents"));
    }

    #[test]
    fn test_config_path_is_not_created() {
        let temp = tempdir().unwrap();
        let paths = StudioPaths::at(temp.path());
        assert_eq!(paths.config_path(), temp.path().join("studio.yaml"));
        assert!(!paths.config_path().exists());
    }

    #[test]
    fn test_export_path_names_key() {
        let temp = tempdir().unwrap();
        let paths = StudioPaths::at(temp.path());
        let path = paths.export_path("launch").unwrap();

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("launch-"));
        assert!(name.ends_with(".zip"));
        assert!(path.parent().unwrap().ends_with("exports"));
    }
}
