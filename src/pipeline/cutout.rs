//! Background removal with graceful degradation.
//!
//! The primary method is the neural collaborator when one is configured,
//! otherwise the flood fill. Either way the chain continues to the color key
//! and finally to the untouched original. A pass that removes nothing or
//! everything is treated as a failure.

use crate::domain::CutoutMethod;
use crate::segmentation::{
    color_key, flood_fill, neural_cutout, CutoutService, SegmentationError, Segmented,
};
use image::RgbaImage;
use std::sync::Arc;

/// Cutout configuration for one pipeline run.
#[derive(Clone)]
pub struct CutoutPlan {
    /// Preferred first method. `None` disables background removal.
    pub preferred: CutoutMethod,
    pub neural: Option<Arc<dyn CutoutService>>,
    pub tolerance: u32,
}

/// The image to store and the method that produced it.
#[derive(Debug, Clone)]
pub struct CutoutResult {
    pub image: RgbaImage,
    pub method: CutoutMethod,
    /// True when a preferred method failed and a weaker one was used.
    pub degraded: bool,
}

impl CutoutPlan {
    /// Methods to try in order, ending with `None` (the original image).
    pub fn chain(&self) -> Vec<CutoutMethod> {
        let first = match self.preferred {
            CutoutMethod::None => return vec![CutoutMethod::None],
            CutoutMethod::Neural if self.neural.is_none() => CutoutMethod::FloodFill,
            other => other,
        };
        let mut chain = vec![first];
        if first != CutoutMethod::ColorKey {
            chain.push(CutoutMethod::ColorKey);
        }
        chain.push(CutoutMethod::None);
        chain
    }

    pub async fn apply(&self, image: RgbaImage) -> CutoutResult {
        let chain = self.chain();
        for (step, method) in chain.iter().copied().enumerate() {
            if method == CutoutMethod::None {
                break;
            }
            match self.run(method, &image).await {
                Ok(segmented) if segmented.is_partial() => {
                    return CutoutResult {
                        image: segmented.image,
                        method,
                        degraded: step > 0,
                    };
                }
                Ok(segmented) => {
                    tracing::debug!(
                        method = ?method,
                        removed = segmented.removed,
                        "cutout removed nothing or everything"
                    );
                }
                Err(e) => {
                    tracing::warn!(method = ?method, error = %e, "cutout failed");
                }
            }
        }
        CutoutResult {
            image,
            method: CutoutMethod::None,
            degraded: self.preferred != CutoutMethod::None,
        }
    }

    async fn run(
        &self,
        method: CutoutMethod,
        image: &RgbaImage,
    ) -> Result<Segmented, SegmentationError> {
        match method {
            CutoutMethod::Neural => match &self.neural {
                Some(service) => neural_cutout(service.as_ref(), image).await,
                None => Err(SegmentationError::Cutout {
                    message: "no neural service configured".to_string(),
                }),
            },
            CutoutMethod::FloodFill => flood_fill(image, self.tolerance),
            CutoutMethod::ColorKey => color_key(image, self.tolerance),
            CutoutMethod::None => Ok(Segmented {
                image: image.clone(),
                removed: 0,
            }),
        }
    }
}
