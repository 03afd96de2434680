mod grayscale;
mod normalization;

pub use grayscale::convert_grayscale;
pub use normalization::{find_min_max, normalize_to_u8};

use crate::types::VoxelSpacing;
use crate::volume::{CanonicalVolume, Plane};
use crate::window::{apply_window, WindowFormula, WindowParams};
use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage};
use ndarray::ArrayView2;

/// Columns of black between panes in a multiview frame
const PANE_GAP: u32 = 2;

/// Largest vertical stretch (and, inverted, squeeze) applied for voxel shape
const MAX_ASPECT: f64 = 16.0;

/// How slices are turned into pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    /// Window and formula, or `None` to stretch each slice's own range
    pub windowing: Option<(WindowParams, WindowFormula)>,
    /// Voxel sizes of the canonical volume
    pub spacing: VoxelSpacing,
}

/// Render one slice of `plane`, windowed and aspect-corrected
pub fn render_slice(slice: &ArrayView2<'_, f32>, plane: Plane, settings: &RenderSettings) -> Result<GrayImage> {
    let image = match settings.windowing {
        Some((params, formula)) => {
            let windowed = apply_window(slice, &params, formula);
            let (lo, hi) = params.bounds();
            convert_grayscale(&windowed.view(), Some(formula.output_range(lo, hi)))?
        }
        None => convert_grayscale(slice, None)?,
    };

    Ok(correct_aspect(image, plane, &settings.spacing))
}

/// Stretch the vertical axis so voxels keep their physical proportions
fn correct_aspect(image: GrayImage, plane: Plane, spacing: &VoxelSpacing) -> GrayImage {
    let (horizontal, vertical) = plane.in_plane_axes();
    let ratio = spacing.aspect_ratio(horizontal, vertical);
    if !ratio.is_finite() || (ratio - 1.0).abs() < 1e-3 {
        return image;
    }
    let ratio = ratio.clamp(MAX_ASPECT.recip(), MAX_ASPECT);

    let height = (f64::from(image.height()) * ratio).round().max(1.0) as u32;
    imageops::resize(&image, image.width(), height, FilterType::Nearest)
}

/// Place images left to right, top-aligned, on a black canvas
#[must_use]
pub fn compose_horizontal(images: &[GrayImage]) -> GrayImage {
    let gaps = PANE_GAP * u32::try_from(images.len().saturating_sub(1)).unwrap_or(0);
    let width = images.iter().map(GrayImage::width).sum::<u32>() + gaps;
    let height = images.iter().map(GrayImage::height).max().unwrap_or(0);

    let mut canvas = GrayImage::new(width.max(1), height.max(1));
    let mut x = 0_i64;
    for image in images {
        imageops::replace(&mut canvas, image, x, 0);
        x += i64::from(image.width() + PANE_GAP);
    }
    canvas
}

/// Render the slices at `views`, one pane per (plane, index), side by side
pub fn render_view(
    volume: &CanonicalVolume,
    views: &[(Plane, usize)],
    settings: &RenderSettings,
) -> Result<DynamicImage> {
    let panes = views
        .iter()
        .map(|&(plane, index)| {
            let slice = volume
                .slice(plane, index)?
                .with_context(|| format!("Slice {index} is outside the {plane} extent"))?;
            render_slice(&slice, plane, settings)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(DynamicImage::ImageLuma8(compose_horizontal(&panes)))
}

/// Render the middle slice of each plane in `planes`
pub fn render_mid_slices(
    volume: &CanonicalVolume,
    planes: &[Plane],
    settings: &RenderSettings,
) -> Result<DynamicImage> {
    let mid = volume.mid_slices()?;
    let panes = planes
        .iter()
        .map(|&plane| render_slice(mid.get(plane), plane, settings))
        .collect::<Result<Vec<_>>>()?;

    Ok(DynamicImage::ImageLuma8(compose_horizontal(&panes)))
}
