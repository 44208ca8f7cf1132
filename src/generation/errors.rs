//! Error classification for generation calls.

use std::fmt::{Display, Formatter};

/// A classified failure from the generation service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// The account's quota is spent. Never retried; ends the run.
    QuotaExhausted { message: String },
    /// The service is overloaded. Retried with exponential backoff.
    Overloaded { message: String },
    /// The service answered with something of the wrong shape.
    InvalidResponse { message: String },
    /// Any other failure. Fatal to the current item only.
    Failed { message: String },
}

impl GenerationError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Overloaded { .. })
    }

    pub fn is_quota(&self) -> bool {
        matches!(self, Self::QuotaExhausted { .. })
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Classifies a raw service error message.
    ///
    /// Used for collaborators that only report free-form text.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        let message = message.to_string();
        if lower.contains("quota") || lower.contains("resource_exhausted") || lower.contains("429")
        {
            Self::QuotaExhausted { message }
        } else if lower.contains("overloaded") || lower.contains("503") || lower.contains("unavailable")
        {
            Self::Overloaded { message }
        } else {
            Self::Failed { message }
        }
    }
}

impl Display for GenerationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::QuotaExhausted { message } => write!(f, "quota exhausted: {}", message),
            Self::Overloaded { message } => write!(f, "service overloaded: {}", message),
            Self::InvalidResponse { message } => write!(f, "invalid response: {}", message),
            Self::Failed { message } => write!(f, "generation failed: {}", message),
        }
    }
}

impl std::error::Error for GenerationError {}
