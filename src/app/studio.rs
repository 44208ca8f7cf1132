//! Resolved storage, configuration and services for one CLI invocation.

use crate::config::{GenerationMode, StudioConfig};
use crate::domain::Document;
use crate::generation::{GenerationGateway, OfflineGenerator};
use crate::persistence::{DocumentStore, FileDocumentStore};
use crate::pipeline::{CutoutPlan, PipelineNotice};
use crate::structured_logger::StructuredLogger;
use crate::studio_paths::StudioPaths;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;

pub struct Studio {
    pub paths: StudioPaths,
    pub config: StudioConfig,
    pub store: FileDocumentStore,
}

impl Studio {
    /// Resolves the studio root and loads configuration.
    ///
    /// An explicit `config` path must exist; the default one is optional.
    pub fn open(home: Option<PathBuf>, config: Option<PathBuf>) -> Result<Self> {
        let paths = match home {
            Some(root) => StudioPaths::at(root),
            None => StudioPaths::from_env()?,
        };
        let config = match config {
            Some(path) => StudioConfig::load(&path)?,
            None => StudioConfig::load_or_default(&paths.config_path())?,
        };
        let store = FileDocumentStore::new(paths.documents_dir()?);
        tracing::debug!(root = %paths.root().display(), "studio opened");
        Ok(Self {
            paths,
            config,
            store,
        })
    }

    /// JSONL logger for commands against `key`.
    pub fn logger(&self, key: &str) -> Result<Arc<StructuredLogger>> {
        let logger = StructuredLogger::new(key, &self.paths.logs_dir()?)
            .context("Failed to open structured log")?;
        Ok(Arc::new(logger))
    }

    pub async fn load(&self, key: &str) -> Result<Document> {
        self.store
            .get(key)
            .await?
            .with_context(|| format!("No document stored under '{}'", key))
    }

    /// The offline generator always backs the gateway. No online service
    /// ships with this build, so `online` mode only logs that fact.
    pub fn gateway(&self, notices: broadcast::Sender<PipelineNotice>) -> GenerationGateway {
        let generation = &self.config.generation;
        if generation.mode == GenerationMode::Online {
            tracing::warn!("online generation requested but no service is configured; running offline");
        }
        GenerationGateway::new(
            None,
            Arc::new(OfflineGenerator::new()),
            generation.retry_policy(),
            generation.models(),
            notices,
        )
    }

    pub fn cutout_plan(&self) -> CutoutPlan {
        CutoutPlan {
            preferred: self.config.pipeline.cutout,
            neural: None,
            tolerance: self.config.segmentation.tolerance,
        }
    }
}
