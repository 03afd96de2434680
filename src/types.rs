//! Domain-specific types for NIfTI scan metadata

use crate::orientation::AxisOp;
use std::fmt;

/// Calibration pair for converting stored voxel values to real units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub slope: f32,
    pub intercept: f32,
}

impl Calibration {
    #[must_use]
    pub fn new(slope: f32, intercept: f32) -> Self {
        Self { slope, intercept }
    }

    #[must_use]
    pub const fn identity() -> Self {
        Self {
            slope: 1.0,
            intercept: 0.0,
        }
    }

    /// Build from the header's `scl_slope`/`scl_inter`.
    ///
    /// A zero or non-finite slope means the scan carries no calibration.
    #[must_use]
    pub fn from_header(scl_slope: f32, scl_inter: f32) -> Self {
        if scl_slope == 0.0 || !scl_slope.is_finite() {
            return Self::identity();
        }
        let intercept = if scl_inter.is_finite() { scl_inter } else { 0.0 };
        Self::new(scl_slope, intercept)
    }

    #[inline]
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.slope == 1.0 && self.intercept == 0.0
    }

    #[inline(always)]
    #[must_use]
    // Hot path: called for every voxel during conversion
    pub fn apply(&self, value: f32) -> f32 {
        value.mul_add(self.slope, self.intercept)
    }

    /// Undo [`Calibration::apply`]
    #[inline(always)]
    #[must_use]
    pub fn invert(&self, value: f32) -> f32 {
        (value - self.intercept) / self.slope
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Display for Calibration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "slope={slope}, intercept={intercept}",
            slope = self.slope,
            intercept = self.intercept
        )
    }
}

/// Voxel size along each of the three spatial array axes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoxelSpacing(pub [f32; 3]);

impl VoxelSpacing {
    #[must_use]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self([x, y, z])
    }

    /// Read pixdim[1..=3], treating missing or invalid sizes as 1
    #[must_use]
    pub fn from_pixdim(pixdim: &[f32; 8]) -> Self {
        let size = |v: f32| if v.is_finite() && v > 0.0 { v } else { 1.0 };
        Self([size(pixdim[1]), size(pixdim[2]), size(pixdim[3])])
    }

    #[inline]
    #[must_use]
    pub fn axis(&self, axis: usize) -> f32 {
        self.0[axis]
    }

    /// Spacing after the array axes went through `ops`.
    ///
    /// Flips keep voxel sizes, swaps exchange them.
    #[must_use]
    pub fn reoriented(&self, ops: &[AxisOp]) -> Self {
        let mut sizes = self.0;
        for op in ops {
            if let AxisOp::Swap(i, j) = *op {
                sizes.swap(i, j);
            }
        }
        Self(sizes)
    }

    /// Vertical over horizontal voxel size for an in-plane axis pair
    #[inline]
    #[must_use]
    pub fn aspect_ratio(&self, horizontal: usize, vertical: usize) -> f64 {
        f64::from(self.0[vertical]) / f64::from(self.0[horizontal])
    }
}

impl Default for VoxelSpacing {
    fn default() -> Self {
        Self([1.0; 3])
    }
}

impl fmt::Display for VoxelSpacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [x, y, z] = self.0;
        write!(f, "{x}x{y}x{z}")
    }
}

/// Voxel-to-world transform, row-major
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine(pub [[f64; 4]; 4]);

impl Affine {
    #[must_use]
    pub fn identity() -> Self {
        Self([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Diagonal scaling affine with zero translation
    #[must_use]
    pub fn from_diagonal(x: f64, y: f64, z: f64) -> Self {
        Self([
            [x, 0.0, 0.0, 0.0],
            [0.0, y, 0.0, 0.0],
            [0.0, 0.0, z, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Direction of voxel axis `column` in world space (unnormalized)
    #[inline]
    #[must_use]
    pub fn column(&self, column: usize) -> [f64; 3] {
        [self.0[0][column], self.0[1][column], self.0[2][column]]
    }
}

impl fmt::Display for Affine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(
                f,
                "[{:>10.4} {:>10.4} {:>10.4} {:>10.4}]",
                row[0], row[1], row[2], row[3]
            )?;
        }
        Ok(())
    }
}
