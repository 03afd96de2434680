//! NIfTI file parsing and metadata extraction
//!
//! Opening a file and decoding its voxels are separate stages so that a scan
//! whose header parses but whose voxel data does not can still report what
//! the header says.

mod affine;
mod error;
mod metadata;
mod parser;
mod validation;

// Re-export public API
pub use affine::{affine_from_header, AffineSource};
pub use error::ProcessError;
pub use metadata::ScanMetadata;

use crate::volume::VoxelVolume;
use anyhow::{Context, Result};
use nifti::{InMemNiftiObject, IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use std::path::Path;
use tracing::debug;

/// Decoded scan: header metadata plus the voxels in storage order
#[derive(Debug, Clone)]
pub struct NiftiScan {
    pub metadata: ScanMetadata,
    pub volume: VoxelVolume,
}

/// Open and parse a NIfTI file (`.nii` or `.nii.gz`)
pub fn open_nifti_file(file_path: &Path) -> Result<InMemNiftiObject> {
    ReaderOptions::new()
        .read_file(file_path)
        .with_context(|| format!("Failed to open NIfTI file: {}", file_path.display()))
}

/// Header-only metadata; the intensity range is left unset
pub fn extract_metadata(header: &NiftiHeader) -> Result<ScanMetadata> {
    let (ndim, dims) = parser::extract_dims(header)?;
    let (affine, affine_source, orientation) = parser::extract_orientation(header)?;

    Ok(ScanMetadata {
        ndim,
        dims,
        datatype: parser::extract_datatype(header),
        bitpix: header.bitpix,
        spacing: parser::extract_spacing(header),
        affine,
        affine_source,
        qform_code: header.qform_code,
        sform_code: header.sform_code,
        orientation,
        calibration: parser::extract_calibration(header),
        intensity_range: None,
        description: parser::extract_description(header),
        spatial_unit: parser::extract_spatial_unit(header),
    })
}

/// Metadata of an opened file, for reporting when voxel extraction fails
pub fn extract_header_metadata(obj: &InMemNiftiObject) -> Result<ScanMetadata> {
    extract_metadata(obj.header())
}

/// Extract metadata and voxel data from a NIfTI object
pub fn extract_nifti_data(obj: InMemNiftiObject) -> Result<NiftiScan> {
    let mut metadata = extract_metadata(obj.header())?;

    let data = obj
        .into_volume()
        .into_ndarray::<f32>()
        .context("Failed to decode voxel data")?;
    validation::validate_volume_shape(data.shape(), &metadata.dims)?;

    // Decoding already applied scl_slope/scl_inter; keep stored values
    let calibration = metadata.calibration;
    let data = if calibration.is_identity() {
        data
    } else {
        debug!("Undoing decoder scaling {calibration}");
        data.mapv_into(|v| calibration.invert(v))
    };

    let volume = VoxelVolume::new(data)?;
    metadata.intensity_range = Some(volume.intensity_range());
    debug!(
        "Loaded {:?} {} volume, orientation {}",
        metadata.dims, metadata.datatype, metadata.orientation
    );

    Ok(NiftiScan { metadata, volume })
}
