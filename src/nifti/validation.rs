use anyhow::{bail, Result};

#[inline]
pub fn validate_dimensionality(ndim: usize) -> Result<()> {
    if !matches!(ndim, 3 | 4) {
        bail!("Unsupported dimensionality: {ndim}D (expected a 3D or 4D scan)");
    }

    Ok(())
}

#[inline]
pub fn validate_extents(dims: &[usize]) -> Result<()> {
    if let Some(axis) = dims.iter().position(|&d| d == 0) {
        bail!("Axis {axis} has zero extent (dims {dims:?})");
    }

    Ok(())
}

/// The decoded voxel array must match what the header announced
pub fn validate_volume_shape(shape: &[usize], dims: &[usize]) -> Result<()> {
    if shape != dims {
        bail!("Voxel array shape {shape:?} does not match header dims {dims:?}");
    }

    Ok(())
}
