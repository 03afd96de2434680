//! NIfTI scan metadata structure

use super::affine::AffineSource;
use crate::orientation::OrientationCode;
use crate::types::{Affine, Calibration, VoxelSpacing};

/// Scan metadata extracted from the header
#[derive(Debug, Clone)]
pub struct ScanMetadata {
    // Array layout
    pub ndim: usize,
    pub dims: Vec<usize>,
    pub datatype: String,
    pub bitpix: i16,

    // Geometry
    pub spacing: VoxelSpacing,
    pub affine: Affine,
    pub affine_source: AffineSource,
    pub qform_code: i16,
    pub sform_code: i16,
    pub orientation: OrientationCode,

    // Intensities
    pub calibration: Calibration,
    pub intensity_range: Option<(f32, f32)>,

    // Display metadata fields
    pub description: Option<String>,
    pub spatial_unit: Option<&'static str>,
}

impl ScanMetadata {
    /// Acquisitions along the fourth axis, for 4D scans
    #[inline]
    #[must_use]
    pub fn volume_count(&self) -> Option<usize> {
        (self.ndim == 4).then(|| self.dims[3])
    }

    #[inline]
    #[must_use]
    pub fn is_multi_volume(&self) -> bool {
        self.volume_count().is_some()
    }
}
