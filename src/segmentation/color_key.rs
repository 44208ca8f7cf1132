//! Global color-key removal ("green screen").
//!
//! The key color is the plain average of the four corner pixels. Every pixel
//! within tolerance of it becomes transparent, with no connectivity
//! constraint, so subjects touching the border do not break it.

use super::pixels::{mean_rgb, within};
use super::{ensure_not_empty, SegmentationError, Segmented};
use image::RgbaImage;

pub fn color_key(image: &RgbaImage, tolerance: u32) -> Result<Segmented, SegmentationError> {
    ensure_not_empty(image)?;
    let key = key_color(image);

    let mut output = image.clone();
    let mut removed = 0;
    for pixel in output.pixels_mut() {
        if within(pixel, key, tolerance) {
            pixel.0[3] = 0;
            removed += 1;
        }
    }
    Ok(Segmented {
        image: output,
        removed,
    })
}

/// Average RGB of the four corners.
pub fn key_color(image: &RgbaImage) -> [u8; 3] {
    let (right, bottom) = (image.width() - 1, image.height() - 1);
    let corners = [(0, 0), (right, 0), (0, bottom), (right, bottom)];
    mean_rgb(corners.iter().map(|&(x, y)| image.get_pixel(x, y)))
}
