//! Error types for the document domain.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// A single structural problem found while checking an external document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// JSON-pointer style location, e.g. `/slides/2/variants`.
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl Display for ValidationIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Errors raised when an externally supplied document cannot be accepted.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentError {
    /// The payload is not a JSON object at all; nothing is recoverable.
    NotAnObject,
    /// Structural validation failed.
    Invalid { issues: Vec<ValidationIssue> },
    /// Structurally valid but the typed decode still failed.
    Decode { message: String },
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "document is not a JSON object"),
            Self::Invalid { issues } => {
                write!(f, "document failed validation ({} issue(s))", issues.len())?;
                if let Some(first) = issues.first() {
                    write!(f, ": {}", first)?;
                }
                Ok(())
            }
            Self::Decode { message } => write!(f, "document decode failed: {}", message),
        }
    }
}

impl std::error::Error for DocumentError {}
