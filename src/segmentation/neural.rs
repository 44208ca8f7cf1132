//! Neural cutout collaborator.
//!
//! The model itself lives outside this crate. Implementations receive an RGBA
//! buffer and must return one of identical dimensions carrying a learned
//! alpha mask.

use super::{ensure_not_empty, SegmentationError, Segmented};
use async_trait::async_trait;
use image::RgbaImage;

#[async_trait]
pub trait CutoutService: Send + Sync {
    async fn cutout(&self, image: &RgbaImage) -> Result<RgbaImage, SegmentationError>;
}

/// Runs `service` and checks the result against the input's dimensions.
pub async fn neural_cutout(
    service: &dyn CutoutService,
    image: &RgbaImage,
) -> Result<Segmented, SegmentationError> {
    ensure_not_empty(image)?;
    let output = service.cutout(image).await?;
    if output.dimensions() != image.dimensions() {
        return Err(SegmentationError::DimensionMismatch {
            expected: image.dimensions(),
            actual: output.dimensions(),
        });
    }
    let removed = output.pixels().filter(|p| p.0[3] == 0).count();
    Ok(Segmented {
        image: output,
        removed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    struct HalfMask;

    #[async_trait]
    impl CutoutService for HalfMask {
        async fn cutout(&self, image: &RgbaImage) -> Result<RgbaImage, SegmentationError> {
            let mut out = image.clone();
            for (x, _, pixel) in out.enumerate_pixels_mut() {
                if x < image.width() / 2 {
                    pixel.0[3] = 0;
                }
            }
            Ok(out)
        }
    }

    struct Shrinks;

    #[async_trait]
    impl CutoutService for Shrinks {
        async fn cutout(&self, _image: &RgbaImage) -> Result<RgbaImage, SegmentationError> {
            Ok(RgbaImage::new(1, 1))
        }
    }

    #[tokio::test]
    async fn test_counts_transparent_pixels() {
        let image = RgbaImage::from_pixel(4, 2, Rgba([1, 2, 3, 255]));
        let result = neural_cutout(&HalfMask, &image).await.unwrap();
        assert_eq!(result.removed, 4);
        assert!(result.is_partial());
    }

    #[tokio::test]
    async fn test_rejects_dimension_change() {
        let image = RgbaImage::from_pixel(4, 2, Rgba([1, 2, 3, 255]));
        let err = neural_cutout(&Shrinks, &image).await.unwrap_err();
        assert_eq!(
            err,
            SegmentationError::DimensionMismatch {
                expected: (4, 2),
                actual: (1, 1)
            }
        );
    }
}
