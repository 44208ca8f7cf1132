//! Edge-seeded flood fill ("magic wand").
//!
//! 1. Estimate the background from an evenly spaced sample of border pixels.
//! 2. Breadth-first fill from every border pixel within tolerance of that
//!    estimate, expanding over 4-connected neighbors under the same test.
//!    Filled pixels become fully transparent.
//! 3. Feather the cut: every surviving pixel with `n` removed neighbors has
//!    its alpha capped at `255 - 64n`.
//!
//! The fill test only looks at RGB, and feathering is a cap rather than a
//! decrement, so running the pass on its own output changes nothing.

use super::pixels::{mean_rgb, within};
use super::{ensure_not_empty, SegmentationError, Segmented};
use image::RgbaImage;
use std::collections::VecDeque;

/// Alpha removed per transparent neighbor when feathering.
const FEATHER_STEP: u32 = 64;

/// Border samples per shorter side, roughly.
const BORDER_SAMPLES: u32 = 50;

pub fn flood_fill(image: &RgbaImage, tolerance: u32) -> Result<Segmented, SegmentationError> {
    ensure_not_empty(image)?;
    let (width, height) = image.dimensions();
    let background = estimate_background(image);
    let index = |x: u32, y: u32| (y as usize) * (width as usize) + x as usize;

    let mut removed = vec![false; width as usize * height as usize];
    let mut queue = VecDeque::new();

    for (x, y) in border(width, height) {
        let i = index(x, y);
        if !removed[i] && within(image.get_pixel(x, y), background, tolerance) {
            removed[i] = true;
            queue.push_back((x, y));
        }
    }

    while let Some((x, y)) = queue.pop_front() {
        for (nx, ny) in neighbors(x, y, width, height).into_iter().flatten() {
            let i = index(nx, ny);
            if !removed[i] && within(image.get_pixel(nx, ny), background, tolerance) {
                removed[i] = true;
                queue.push_back((nx, ny));
            }
        }
    }

    let mut output = image.clone();
    let mut count = 0;
    for (x, y, pixel) in output.enumerate_pixels_mut() {
        if removed[index(x, y)] {
            pixel.0[3] = 0;
            count += 1;
        } else {
            let n = neighbors(x, y, width, height)
                .into_iter()
                .flatten()
                .filter(|&(nx, ny)| removed[index(nx, ny)])
                .count() as u32;
            if n > 0 {
                let cap = 255u32.saturating_sub(FEATHER_STEP * n) as u8;
                pixel.0[3] = pixel.0[3].min(cap);
            }
        }
    }

    Ok(Segmented {
        image: output,
        removed: count,
    })
}

/// Mean RGB of border pixels sampled every `max(1, min(w, h) / 50)` steps.
pub fn estimate_background(image: &RgbaImage) -> [u8; 3] {
    let (width, height) = image.dimensions();
    let stride = (width.min(height) / BORDER_SAMPLES).max(1) as usize;

    let horizontal = (0..width)
        .step_by(stride)
        .flat_map(|x| [(x, 0), (x, height - 1)]);
    let vertical = (0..height)
        .step_by(stride)
        .flat_map(|y| [(0, y), (width - 1, y)]);

    mean_rgb(horizontal.chain(vertical).map(|(x, y)| image.get_pixel(x, y)))
}

fn border(width: u32, height: u32) -> impl Iterator<Item = (u32, u32)> {
    let rows = (0..width).flat_map(move |x| [(x, 0), (x, height - 1)]);
    let cols = (0..height).flat_map(move |y| [(0, y), (width - 1, y)]);
    rows.chain(cols)
}

fn neighbors(x: u32, y: u32, width: u32, height: u32) -> [Option<(u32, u32)>; 4] {
    [
        y.checked_sub(1).map(|ny| (x, ny)),
        (y + 1 < height).then_some((x, y + 1)),
        x.checked_sub(1).map(|nx| (nx, y)),
        (x + 1 < width).then_some((x + 1, y)),
    ]
}

#[cfg(test)]
#[path = "tests/flood_fill_tests.rs"]
mod tests;
