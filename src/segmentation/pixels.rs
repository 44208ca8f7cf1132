//! Color distance and PNG codec helpers shared by the segmentation passes.

use super::SegmentationError;
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

/// Squared Euclidean distance between a pixel's RGB channels and `key`.
pub fn distance_sq(pixel: &Rgba<u8>, key: [u8; 3]) -> u32 {
    pixel.0[..3]
        .iter()
        .zip(key.iter())
        .map(|(&a, &b)| {
            let d = i32::from(a) - i32::from(b);
            (d * d) as u32
        })
        .sum()
}

/// True when `pixel` is strictly closer to `key` than `tolerance`.
pub fn within(pixel: &Rgba<u8>, key: [u8; 3], tolerance: u32) -> bool {
    u64::from(distance_sq(pixel, key)) < u64::from(tolerance).pow(2)
}

/// Channel-wise integer mean of the RGB channels of `pixels`.
pub fn mean_rgb<'a>(pixels: impl Iterator<Item = &'a Rgba<u8>>) -> [u8; 3] {
    let mut sum = [0u64; 3];
    let mut count = 0u64;
    for pixel in pixels {
        for (acc, &channel) in sum.iter_mut().zip(pixel.0[..3].iter()) {
            *acc += u64::from(channel);
        }
        count += 1;
    }
    if count == 0 {
        return [0, 0, 0];
    }
    sum.map(|s| (s / count) as u8)
}

pub fn decode_png(bytes: &[u8]) -> Result<RgbaImage, SegmentationError> {
    image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map(|img| img.to_rgba8())
        .map_err(|e| SegmentationError::Codec {
            message: e.to_string(),
        })
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, SegmentationError> {
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| SegmentationError::Codec {
            message: e.to_string(),
        })?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_and_tolerance() {
        let white = Rgba([255, 255, 255, 255]);
        assert_eq!(distance_sq(&white, [255, 255, 255]), 0);
        assert_eq!(distance_sq(&white, [255, 255, 195]), 3600);
        // Exactly on the tolerance is not within it
        assert!(!within(&white, [255, 255, 195], 60));
        assert!(within(&white, [255, 255, 196], 60));
    }

    #[test]
    fn test_huge_tolerance_matches_everything() {
        let black = Rgba([0, 0, 0, 255]);
        assert!(within(&black, [255, 255, 255], super::super::MAX_TOLERANCE));
        assert!(within(&black, [255, 255, 255], 70_000));
        assert!(within(&black, [255, 255, 255], u32::MAX));
    }

    #[test]
    fn test_mean_rgb() {
        let pixels = [Rgba([0, 10, 200, 255]), Rgba([10, 20, 100, 0])];
        assert_eq!(mean_rgb(pixels.iter()), [5, 15, 150]);
        assert_eq!(mean_rgb(std::iter::empty()), [0, 0, 0]);
    }

    #[test]
    fn test_png_round_trip_preserves_alpha() {
        let mut img = RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 255]));
        img.put_pixel(1, 1, Rgba([9, 9, 9, 0]));
        let decoded = decode_png(&encode_png(&img).unwrap()).unwrap();
        assert_eq!(decoded, img);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_png(b"not a png"),
            Err(SegmentationError::Codec { .. })
        ));
    }
}
