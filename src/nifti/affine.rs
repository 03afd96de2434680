//! Voxel-to-world affine reconstruction from the NIfTI header

use crate::types::{Affine, VoxelSpacing};
use nifti::NiftiHeader;

/// Which header fields the affine came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AffineSource {
    Sform,
    Qform,
    Pixdim,
}

impl std::fmt::Display for AffineSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Sform => "sform",
            Self::Qform => "qform",
            Self::Pixdim => "pixdim scaling",
        };
        write!(f, "{name}")
    }
}

/// Build the affine, preferring sform, then qform, then plain voxel scaling
#[must_use]
pub fn affine_from_header(header: &NiftiHeader) -> (Affine, AffineSource) {
    if header.sform_code > 0 {
        (sform_affine(header), AffineSource::Sform)
    } else if header.qform_code > 0 {
        (qform_affine(header), AffineSource::Qform)
    } else {
        let spacing = VoxelSpacing::from_pixdim(&header.pixdim);
        let size = |axis: usize| f64::from(spacing.axis(axis));
        (
            Affine::from_diagonal(size(0), size(1), size(2)),
            AffineSource::Pixdim,
        )
    }
}

fn sform_affine(header: &NiftiHeader) -> Affine {
    let row = |r: [f32; 4]| r.map(f64::from);
    Affine([
        row(header.srow_x),
        row(header.srow_y),
        row(header.srow_z),
        [0.0, 0.0, 0.0, 1.0],
    ])
}

/// Quaternion form, NIfTI-1 method 2
fn qform_affine(header: &NiftiHeader) -> Affine {
    let b = f64::from(header.quatern_b);
    let c = f64::from(header.quatern_c);
    let d = f64::from(header.quatern_d);
    let a = (1.0 - (b * b + c * c + d * d).min(1.0)).sqrt();

    let qfac = if header.pixdim[0] < 0.0 { -1.0 } else { 1.0 };
    let spacing = VoxelSpacing::from_pixdim(&header.pixdim);
    let dx = f64::from(spacing.axis(0));
    let dy = f64::from(spacing.axis(1));
    let dz = f64::from(spacing.axis(2)) * qfac;

    let r11 = a * a + b * b - c * c - d * d;
    let r12 = 2.0 * b * c - 2.0 * a * d;
    let r13 = 2.0 * b * d + 2.0 * a * c;

    let r21 = 2.0 * b * c + 2.0 * a * d;
    let r22 = a * a + c * c - b * b - d * d;
    let r23 = 2.0 * c * d - 2.0 * a * b;

    let r31 = 2.0 * b * d - 2.0 * a * c;
    let r32 = 2.0 * c * d + 2.0 * a * b;
    let r33 = a * a + d * d - c * c - b * b;

    Affine([
        [r11 * dx, r12 * dy, r13 * dz, f64::from(header.quatern_x)],
        [r21 * dx, r22 * dy, r23 * dz, f64::from(header.quatern_y)],
        [r31 * dx, r32 * dy, r33 * dz, f64::from(header.quatern_z)],
        [0.0, 0.0, 0.0, 1.0],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::OrientationCode;
    use approx::assert_relative_eq;

    fn header_with_pixdim(x: f32, y: f32, z: f32) -> NiftiHeader {
        let mut header = NiftiHeader::default();
        header.pixdim = [1.0, x, y, z, 1.0, 0.0, 0.0, 0.0];
        header.sform_code = 0;
        header.qform_code = 0;
        header
    }

    #[test]
    fn test_sform_preferred() {
        let mut header = header_with_pixdim(1.0, 1.0, 1.0);
        header.sform_code = 1;
        header.qform_code = 1;
        header.srow_x = [-2.0, 0.0, 0.0, 90.0];
        header.srow_y = [0.0, 2.0, 0.0, -126.0];
        header.srow_z = [0.0, 0.0, 2.0, -72.0];

        let (affine, source) = affine_from_header(&header);
        assert_eq!(source, AffineSource::Sform);
        assert_eq!(affine.0[0], [-2.0, 0.0, 0.0, 90.0]);
        assert_eq!(OrientationCode::from_affine(&affine).unwrap().to_string(), "LAS");
    }

    #[test]
    fn test_qform_identity_quaternion() {
        let mut header = header_with_pixdim(1.5, 1.5, 3.0);
        header.qform_code = 1;
        header.quatern_x = 10.0;

        let (affine, source) = affine_from_header(&header);
        assert_eq!(source, AffineSource::Qform);
        assert_relative_eq!(affine.0[0][0], 1.5);
        assert_relative_eq!(affine.0[1][1], 1.5);
        assert_relative_eq!(affine.0[2][2], 3.0);
        assert_relative_eq!(affine.0[0][3], 10.0);
    }

    #[test]
    fn test_qform_negative_qfac_flips_third_axis() {
        let mut header = header_with_pixdim(1.0, 1.0, 1.0);
        header.pixdim[0] = -1.0;
        header.qform_code = 1;

        let (affine, _) = affine_from_header(&header);
        assert_relative_eq!(affine.0[2][2], -1.0);
        assert_eq!(OrientationCode::from_affine(&affine).unwrap().to_string(), "RAI");
    }

    #[test]
    fn test_qform_rotation_about_z() {
        // 180 degrees about z: quaternion (0, 0, 0, 1)
        let mut header = header_with_pixdim(1.0, 1.0, 1.0);
        header.qform_code = 1;
        header.quatern_d = 1.0;

        let (affine, _) = affine_from_header(&header);
        assert_eq!(OrientationCode::from_affine(&affine).unwrap().to_string(), "LPS");
    }

    #[test]
    fn test_pixdim_fallback() {
        let header = header_with_pixdim(0.8, 0.8, 2.0);
        let (affine, source) = affine_from_header(&header);
        assert_eq!(source, AffineSource::Pixdim);
        assert_relative_eq!(affine.0[2][2], 2.0);
        assert!(OrientationCode::from_affine(&affine).unwrap().is_canonical());
    }

    #[test]
    fn test_pixdim_fallback_replaces_zero_sizes() {
        let mut header = header_with_pixdim(0.0, -1.0, f32::NAN);
        header.srow_x = [5.0, 0.0, 0.0, 0.0];
        let (affine, source) = affine_from_header(&header);
        assert_eq!(source, AffineSource::Pixdim);
        assert_eq!(affine, Affine::identity());
    }
}
