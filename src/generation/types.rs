//! Request and result shapes exchanged with the generation service.

use super::errors::GenerationError;
use crate::domain::AssetKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What to generate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationKind {
    /// Up to `count` visual concepts for the deck's asset kit.
    Concepts { count: usize },
    /// A single PNG image.
    Image { width: u32, height: u32 },
    /// Copy for one slide, one entry per field name.
    Copy { fields: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    #[serde(flatten)]
    pub kind: GenerationKind,
    pub prompt: String,
    pub model: String,
}

/// A visual concept proposed for the asset kit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptSpec {
    pub kind: AssetKind,
    pub description: String,
    /// Whether the generated image should go through background removal.
    #[serde(default)]
    pub cutout: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationOutput {
    Concepts { concepts: Vec<ConceptSpec> },
    Image { png: Vec<u8> },
    Copy { fields: BTreeMap<String, String> },
}

impl GenerationOutput {
    pub fn into_concepts(self) -> Result<Vec<ConceptSpec>, GenerationError> {
        match self {
            Self::Concepts { concepts } => Ok(concepts),
            other => Err(mismatch("concepts", &other)),
        }
    }

    pub fn into_image(self) -> Result<Vec<u8>, GenerationError> {
        match self {
            Self::Image { png } if !png.is_empty() => Ok(png),
            Self::Image { .. } => Err(GenerationError::invalid("empty image payload")),
            other => Err(mismatch("image", &other)),
        }
    }

    pub fn into_copy(self) -> Result<BTreeMap<String, String>, GenerationError> {
        match self {
            Self::Copy { fields } => Ok(fields),
            other => Err(mismatch("copy", &other)),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Concepts { .. } => "concepts",
            Self::Image { .. } => "image",
            Self::Copy { .. } => "copy",
        }
    }
}

fn mismatch(expected: &str, got: &GenerationOutput) -> GenerationError {
    GenerationError::invalid(format!("expected {}, got {}", expected, got.label()))
}
