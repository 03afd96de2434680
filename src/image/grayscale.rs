//! Grayscale slice conversion
//!
//! Slices are drawn transposed, with the first in-plane axis running left to
//! right and the second running bottom to top, so index (0, 0) sits in the
//! lower-left corner.

use super::normalization::{find_min_max, normalize_to_u8};
use anyhow::{Context, Result};
use image::{GrayImage, ImageBuffer};
use ndarray::ArrayView2;

/// Convert a 2D slice to an 8-bit grayscale image.
///
/// `range` fixes the intensities mapped to black and white; without it the
/// slice's own finite minimum and maximum are used.
pub fn convert_grayscale(slice: &ArrayView2<'_, f32>, range: Option<(f32, f32)>) -> Result<GrayImage> {
    let (cols, rows) = slice.dim();
    let width = u32::try_from(cols).context("Slice too wide to render")?;
    let height = u32::try_from(rows).context("Slice too tall to render")?;

    let (min_val, max_val) = range
        .or_else(|| find_min_max(slice))
        .unwrap_or((0.0, 0.0));

    // Constant slices map to black instead of dividing by zero
    let range = if max_val > min_val {
        max_val - min_val
    } else {
        1.0_f32
    };

    let pixels: Vec<u8> = (0..rows)
        .rev()
        .flat_map(|j| (0..cols).map(move |i| (i, j)))
        .map(|(i, j)| normalize_to_u8(slice[[i, j]], min_val, range))
        .collect();

    let image: GrayImage = ImageBuffer::from_raw(width, height, pixels)
        .context("Failed to create grayscale image buffer")?;

    Ok(image)
}
