use crate::domain::CutoutMethod;
use crate::generation::{ModelSelection, RetryPolicy};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct StudioConfig {
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub segmentation: SegmentationConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Use the configured online service, falling back on quota exhaustion.
    Online,
    /// Simulated generation only. No online service ships with this build.
    #[default]
    Offline,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct GenerationConfig {
    #[serde(default = "default_text_model")]
    pub text_model: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    /// Attempts per call, including the first. Only overload errors are retried.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// First retry delay; doubles per attempt.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default)]
    pub mode: GenerationMode,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            text_model: default_text_model(),
            image_model: default_image_model(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            mode: GenerationMode::default(),
        }
    }
}

impl GenerationConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
        }
    }

    pub fn models(&self) -> ModelSelection {
        ModelSelection {
            text_model: self.text_model.clone(),
            image_model: self.image_model.clone(),
        }
    }
}

fn default_text_model() -> String {
    "text-standard".to_string()
}

fn default_image_model() -> String {
    "image-standard".to_string()
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    500
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PipelineConfig {
    /// Concepts requested for the asset kit.
    #[serde(default = "default_concept_count")]
    pub concept_count: usize,
    /// Image generation is expensive; serialized by default.
    #[serde(default = "default_image_concurrency")]
    pub image_concurrency: usize,
    #[serde(default = "default_copy_concurrency")]
    pub copy_concurrency: usize,
    /// Generated image edge length in pixels.
    #[serde(default = "default_image_size")]
    pub image_size: u32,
    /// Chance that an interior slide gets the stamp.
    #[serde(default = "default_stamp_probability")]
    pub stamp_probability: f64,
    /// Seed for stamp placement, so layouts are reproducible.
    #[serde(default = "default_layout_seed")]
    pub layout_seed: u64,
    #[serde(default = "default_cutout")]
    pub cutout: CutoutMethod,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concept_count: default_concept_count(),
            image_concurrency: default_image_concurrency(),
            copy_concurrency: default_copy_concurrency(),
            image_size: default_image_size(),
            stamp_probability: default_stamp_probability(),
            layout_seed: default_layout_seed(),
            cutout: default_cutout(),
        }
    }
}

fn default_concept_count() -> usize {
    4
}

fn default_image_concurrency() -> usize {
    1
}

fn default_copy_concurrency() -> usize {
    2
}

fn default_image_size() -> u32 {
    512
}

fn default_stamp_probability() -> f64 {
    0.35
}

fn default_layout_seed() -> u64 {
    7
}

fn default_cutout() -> CutoutMethod {
    CutoutMethod::FloodFill
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SegmentationConfig {
    #[serde(default = "default_tolerance")]
    pub tolerance: u32,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
        }
    }
}

fn default_tolerance() -> u32 {
    crate::segmentation::DEFAULT_TOLERANCE
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ArchiveConfig {
    /// Event log entries kept in an export.
    #[serde(default = "default_event_tail")]
    pub event_tail: usize,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            event_tail: default_event_tail(),
        }
    }
}

fn default_event_tail() -> usize {
    100
}

impl StudioConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file as YAML: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise the embedded defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Self::default_config()
        }
    }

    pub fn default_config() -> Result<Self> {
        const DEFAULT_STUDIO_YAML: &str = include_str!("../studio.yaml");

        let config: Self = serde_yaml::from_str(DEFAULT_STUDIO_YAML)
            .context("Failed to parse embedded studio.yaml")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.generation.max_attempts == 0 {
            anyhow::bail!("generation.max_attempts must be at least 1");
        }
        if self.pipeline.image_concurrency == 0 || self.pipeline.copy_concurrency == 0 {
            anyhow::bail!("pipeline concurrency must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.pipeline.stamp_probability) {
            anyhow::bail!(
                "pipeline.stamp_probability must be within [0, 1], got {}",
                self.pipeline.stamp_probability
            );
        }
        if self.segmentation.tolerance > crate::segmentation::MAX_TOLERANCE {
            anyhow::bail!(
                "segmentation.tolerance must be at most {}, got {}",
                crate::segmentation::MAX_TOLERANCE,
                self.segmentation.tolerance
            );
        }
        if self.pipeline.image_size == 0 {
            anyhow::bail!("pipeline.image_size must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
