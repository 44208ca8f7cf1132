//! Foreground/background separation on raw RGBA buffers.
//!
//! # Algorithms
//!
//! - **Flood fill** (`flood_fill.rs`): background removal seeded from the
//!   image border, constrained by 4-connectivity, followed by an edge
//!   feathering pass.
//! - **Color key** (`color_key.rs`): global removal of every pixel close to
//!   the average of the four corners. Used when the subject touches the border.
//! - **Neural cutout** (`neural.rs`): an external collaborator returning a
//!   buffer with a learned alpha mask.
//!
//! Everything here is synchronous and pure except the neural collaborator.
//! Choosing between algorithms and degrading on failure is the caller's job.

pub mod color_key;
pub mod flood_fill;
pub mod neural;
pub mod pixels;

pub use color_key::color_key;
pub use flood_fill::flood_fill;
pub use neural::{neural_cutout, CutoutService};
pub use pixels::{decode_png, encode_png};

use image::RgbaImage;
use std::fmt::{Display, Formatter};

/// Default Euclidean RGB distance under which a pixel counts as background.
pub const DEFAULT_TOLERANCE: u32 = 60;

/// Largest distance between two RGB colors (`ceil(255 * sqrt(3))`). Any
/// tolerance above it behaves the same as this one.
pub const MAX_TOLERANCE: u32 = 442;

/// Result of a segmentation pass.
#[derive(Debug, Clone)]
pub struct Segmented {
    pub image: RgbaImage,
    /// Pixels whose alpha was set to zero.
    pub removed: usize,
}

impl Segmented {
    /// True when the pass removed something but not everything.
    pub fn is_partial(&self) -> bool {
        let total = self.image.width() as usize * self.image.height() as usize;
        self.removed > 0 && self.removed < total
    }
}

/// Errors from segmentation and the pixel codec.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentationError {
    /// Zero width or height.
    EmptyImage,
    /// A collaborator returned a buffer of the wrong size.
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
    /// The neural cutout collaborator failed.
    Cutout { message: String },
    /// PNG decode or encode failed.
    Codec { message: String },
}

impl Display for SegmentationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyImage => write!(f, "image has no pixels"),
            Self::DimensionMismatch { expected, actual } => write!(
                f,
                "cutout returned {}x{}, expected {}x{}",
                actual.0, actual.1, expected.0, expected.1
            ),
            Self::Cutout { message } => write!(f, "cutout failed: {}", message),
            Self::Codec { message } => write!(f, "image codec error: {}", message),
        }
    }
}

impl std::error::Error for SegmentationError {}

pub(crate) fn ensure_not_empty(image: &RgbaImage) -> Result<(), SegmentationError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(SegmentationError::EmptyImage);
    }
    Ok(())
}
