use super::affine::{affine_from_header, AffineSource};
use super::validation;
use crate::orientation::OrientationCode;
use crate::types::{Affine, Calibration, VoxelSpacing};
use anyhow::{Context, Result};
use nifti::NiftiHeader;

/// Number of axes and their extents, from `dim`
pub fn extract_dims(header: &NiftiHeader) -> Result<(usize, Vec<usize>)> {
    let ndim = usize::from(header.dim[0]);
    validation::validate_dimensionality(ndim)?;

    let dims: Vec<usize> = header.dim[1..=ndim].iter().map(|&d| usize::from(d)).collect();
    validation::validate_extents(&dims)?;

    Ok((ndim, dims))
}

pub fn extract_datatype(header: &NiftiHeader) -> String {
    header
        .data_type()
        .map_or_else(|_| format!("unknown ({})", header.datatype), |t| format!("{t:?}"))
}

#[inline]
pub fn extract_calibration(header: &NiftiHeader) -> Calibration {
    // scl_slope == 0 means the stored values are already in real units
    Calibration::from_header(header.scl_slope, header.scl_inter)
}

#[inline]
pub fn extract_spacing(header: &NiftiHeader) -> VoxelSpacing {
    VoxelSpacing::from_pixdim(&header.pixdim)
}

pub fn extract_orientation(header: &NiftiHeader) -> Result<(Affine, AffineSource, OrientationCode)> {
    let (affine, source) = affine_from_header(header);
    let code = OrientationCode::from_affine(&affine)
        .with_context(|| format!("Failed to derive orientation from {source} affine"))?;
    Ok((affine, source, code))
}

pub fn extract_description(header: &NiftiHeader) -> Option<String> {
    let text = String::from_utf8_lossy(&header.descrip);
    let text = text.trim_end_matches('\0').trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Spatial unit from the low bits of `xyzt_units`
#[inline]
pub fn extract_spatial_unit(header: &NiftiHeader) -> Option<&'static str> {
    match header.xyzt_units & 0x07 {
        1 => Some("m"),
        2 => Some("mm"),
        3 => Some("um"),
        _ => None,
    }
}
