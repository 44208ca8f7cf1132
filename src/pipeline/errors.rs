//! Pipeline error taxonomy.

use crate::domain::Stage;
use crate::generation::GenerationError;
use crate::segmentation::SegmentationError;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Abort was requested. Not a failure.
    Cancelled,
    /// The generation quota is spent; the run cannot continue.
    QuotaExhausted { message: String },
    /// The stage a pipeline step writes to is not editable.
    StageLocked { stage: Stage },
    Generation(GenerationError),
    Segmentation(SegmentationError),
    Internal { message: String },
}

impl PipelineError {
    /// Fatal errors end the run even when raised by a single batch item.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::QuotaExhausted { .. })
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<GenerationError> for PipelineError {
    fn from(error: GenerationError) -> Self {
        match error {
            GenerationError::QuotaExhausted { message } => Self::QuotaExhausted { message },
            other => Self::Generation(other),
        }
    }
}

impl From<SegmentationError> for PipelineError {
    fn from(error: SegmentationError) -> Self {
        Self::Segmentation(error)
    }
}

impl Display for PipelineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cancelled => write!(f, "pipeline cancelled"),
            Self::QuotaExhausted { message } => write!(f, "quota exhausted: {}", message),
            Self::StageLocked { stage } => write!(f, "stage {} is not editable", stage),
            Self::Generation(e) => write!(f, "{}", e),
            Self::Segmentation(e) => write!(f, "{}", e),
            Self::Internal { message } => write!(f, "internal error: {}", message),
        }
    }
}

impl std::error::Error for PipelineError {}
