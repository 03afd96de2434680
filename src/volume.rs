//! Voxel volumes and slice extraction

use crate::types::Calibration;
use ndarray::{ArrayD, ArrayView2, ArrayView3, Axis, Ix3};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VolumeError {
    #[error("Expected a 3D or 4D volume, got {ndim} axes")]
    UnsupportedDimensionality { ndim: usize },

    #[error("Volume has {volumes} acquisitions but none was selected")]
    MissingSelection { volumes: usize },

    #[error("Volume index {requested} is outside [0, {}]", .volumes.saturating_sub(1))]
    InvalidSelection { requested: i64, volumes: usize },

    #[error("Expected a single 3D volume, got {ndim} axes")]
    NotSpatial { ndim: usize },

    #[error("Axis {axis} has zero extent")]
    EmptyAxis { axis: usize },
}

/// Scan voxels as loaded, axes in storage order (x, y, z[, t])
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelVolume {
    data: ArrayD<f32>,
}

impl VoxelVolume {
    pub fn new(data: ArrayD<f32>) -> Result<Self, VolumeError> {
        check_shape(data.shape())?;
        Ok(Self { data })
    }

    #[inline]
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    #[inline]
    #[must_use]
    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    #[inline]
    #[must_use]
    pub fn data(&self) -> &ArrayD<f32> {
        &self.data
    }

    #[must_use]
    pub fn into_inner(self) -> ArrayD<f32> {
        self.data
    }

    /// Smallest and largest finite intensity
    #[must_use]
    pub fn intensity_range(&self) -> (f32, f32) {
        intensity_range(&self.data)
    }
}

/// A volume in RAS orientation. Axis 0 runs toward Right, axis 1 toward
/// Anterior, axis 2 toward Superior; an optional axis 3 indexes acquisitions.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalVolume {
    data: ArrayD<f32>,
}

impl CanonicalVolume {
    /// Wrap an array already reoriented to RAS
    pub(crate) fn from_reoriented(data: ArrayD<f32>) -> Self {
        Self { data }
    }

    #[inline]
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    #[inline]
    #[must_use]
    pub fn data(&self) -> &ArrayD<f32> {
        &self.data
    }

    #[must_use]
    pub fn into_inner(self) -> ArrayD<f32> {
        self.data
    }

    /// Number of acquisitions along the fourth axis, if any
    #[must_use]
    pub fn volume_count(&self) -> Option<usize> {
        (self.data.ndim() == 4).then(|| self.data.len_of(Axis(3)))
    }

    /// Reduce to one 3D volume.
    ///
    /// 3D volumes pass through and the selector is ignored. 4D volumes need
    /// a selector within `[0, n - 1]`.
    pub fn select_volume(self, index: Option<i64>) -> Result<Self, VolumeError> {
        let Some(volumes) = self.volume_count() else {
            return Ok(self);
        };
        let requested = index.ok_or(VolumeError::MissingSelection { volumes })?;
        let selected = usize::try_from(requested)
            .ok()
            .filter(|&i| i < volumes)
            .ok_or(VolumeError::InvalidSelection { requested, volumes })?;

        let data = self.data.index_axis_move(Axis(3), selected);
        Ok(Self { data })
    }

    /// Three-axis view of a selected volume
    pub fn spatial(&self) -> Result<ArrayView3<'_, f32>, VolumeError> {
        self.data
            .view()
            .into_dimensionality::<Ix3>()
            .map_err(|_| VolumeError::NotSpatial {
                ndim: self.data.ndim(),
            })
    }

    /// Apply a calibration to every voxel
    #[must_use]
    pub fn calibrated(&self, calibration: &Calibration) -> Self {
        if calibration.is_identity() {
            return self.clone();
        }
        Self {
            data: self.data.mapv(|v| calibration.apply(v)),
        }
    }

    #[must_use]
    pub fn intensity_range(&self) -> (f32, f32) {
        intensity_range(&self.data)
    }

    /// Cross-section at `index` along `plane`'s axis, or `None` when out of range
    pub fn slice(&self, plane: Plane, index: usize) -> Result<Option<ArrayView2<'_, f32>>, VolumeError> {
        let spatial = self.spatial()?;
        let axis = Axis(plane.axis());
        if index >= spatial.len_of(axis) {
            return Ok(None);
        }
        Ok(Some(spatial.index_axis_move(axis, index)))
    }

    /// Sagittal, coronal and axial slices through the middle of the volume
    pub fn mid_slices(&self) -> Result<MidSlices<'_>, VolumeError> {
        let spatial = self.spatial()?;
        let mid = |plane: Plane| {
            let axis = Axis(plane.axis());
            spatial.index_axis_move(axis, spatial.len_of(axis) / 2)
        };
        Ok(MidSlices {
            sagittal: mid(Plane::Sagittal),
            coronal: mid(Plane::Coronal),
            axial: mid(Plane::Axial),
        })
    }
}

#[derive(Debug, Clone)]
pub struct MidSlices<'a> {
    pub sagittal: ArrayView2<'a, f32>,
    pub coronal: ArrayView2<'a, f32>,
    pub axial: ArrayView2<'a, f32>,
}

impl<'a> MidSlices<'a> {
    #[must_use]
    pub fn get(&self, plane: Plane) -> &ArrayView2<'a, f32> {
        match plane {
            Plane::Sagittal => &self.sagittal,
            Plane::Coronal => &self.coronal,
            Plane::Axial => &self.axial,
        }
    }
}

/// Standard anatomical cross-section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Plane {
    Sagittal,
    Coronal,
    Axial,
}

impl Plane {
    pub const ALL: [Plane; 3] = [Plane::Sagittal, Plane::Coronal, Plane::Axial];

    /// Canonical axis the plane slices through
    #[inline]
    #[must_use]
    pub fn axis(self) -> usize {
        match self {
            Self::Sagittal => 0,
            Self::Coronal => 1,
            Self::Axial => 2,
        }
    }

    /// Remaining axes as (horizontal, vertical) once the slice is transposed
    /// for display
    #[must_use]
    pub fn in_plane_axes(self) -> (usize, usize) {
        match self {
            Self::Sagittal => (1, 2),
            Self::Coronal => (0, 2),
            Self::Axial => (0, 1),
        }
    }

    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Sagittal => Self::Coronal,
            Self::Coronal => Self::Axial,
            Self::Axial => Self::Sagittal,
        }
    }
}

impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sagittal => "Sagittal",
            Self::Coronal => "Coronal",
            Self::Axial => "Axial",
        };
        write!(f, "{name}")
    }
}

/// 3 or 4 axes, none of them empty
fn check_shape(shape: &[usize]) -> Result<(), VolumeError> {
    let ndim = shape.len();
    if !(3..=4).contains(&ndim) {
        return Err(VolumeError::UnsupportedDimensionality { ndim });
    }
    match shape.iter().position(|&n| n == 0) {
        Some(axis) => Err(VolumeError::EmptyAxis { axis }),
        None => Ok(()),
    }
}

fn intensity_range(data: &ArrayD<f32>) -> (f32, f32) {
    let (min, max) = data
        .iter()
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), &v| {
            (min.min(v), max.max(v))
        });
    if min > max { (0.0, 0.0) } else { (min, max) }
}
