//! Anatomical orientation codes and reorientation to RAS
//!
//! An orientation code names, for each array axis, the anatomical direction
//! that increasing index moves toward. Any valid code maps to canonical RAS
//! through a short sequence of axis flips followed by axis swaps, derived
//! here from the code itself rather than looked up.

use crate::types::Affine;
use crate::volume::{CanonicalVolume, VoxelVolume};
use ndarray::{ArrayD, Axis};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrientationError {
    #[error("Invalid axis label '{0}' (expected one of R, L, A, P, S, I)")]
    InvalidLabel(char),

    #[error("Orientation code must have exactly 3 labels, got {0}")]
    InvalidLength(usize),

    #[error("Orientation code {code} does not name each of the R/L, A/P and S/I axes exactly once")]
    RepeatedAxis { code: String },

    #[error("Affine column {axis} has zero length, cannot derive orientation")]
    DegenerateAffine { axis: usize },

    #[error("Expected a 3D or 4D volume, got {ndim} axes")]
    UnsupportedDimensionality { ndim: usize },
}

/// One anatomical direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisLabel {
    R,
    L,
    A,
    P,
    S,
    I,
}

impl AxisLabel {
    /// 0 for R/L, 1 for A/P, 2 for S/I
    #[inline]
    #[must_use]
    pub fn anatomical_axis(self) -> usize {
        match self {
            Self::R | Self::L => 0,
            Self::A | Self::P => 1,
            Self::S | Self::I => 2,
        }
    }

    /// True for the RAS directions
    #[inline]
    #[must_use]
    pub fn is_positive(self) -> bool {
        matches!(self, Self::R | Self::A | Self::S)
    }

    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::R => Self::L,
            Self::L => Self::R,
            Self::A => Self::P,
            Self::P => Self::A,
            Self::S => Self::I,
            Self::I => Self::S,
        }
    }

    /// Label pointing along (or against) world axis `axis`
    #[must_use]
    pub fn from_world_axis(axis: usize, positive: bool) -> Self {
        let label = match axis {
            0 => Self::R,
            1 => Self::A,
            _ => Self::S,
        };
        if positive { label } else { label.opposite() }
    }

    pub fn from_char(c: char) -> Result<Self, OrientationError> {
        Ok(match c.to_ascii_uppercase() {
            'R' => Self::R,
            'L' => Self::L,
            'A' => Self::A,
            'P' => Self::P,
            'S' => Self::S,
            'I' => Self::I,
            other => return Err(OrientationError::InvalidLabel(other)),
        })
    }

    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            Self::R => 'R',
            Self::L => 'L',
            Self::A => 'A',
            Self::P => 'P',
            Self::S => 'S',
            Self::I => 'I',
        }
    }
}

impl fmt::Display for AxisLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Elementary array transform used during reorientation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisOp {
    /// Reverse element order along an axis
    Flip(usize),
    /// Exchange two axes (and their extents)
    Swap(usize, usize),
}

impl AxisOp {
    /// Apply to an owned array. Only strides change, no voxel is copied.
    #[must_use]
    pub fn apply<A>(self, mut array: ArrayD<A>) -> ArrayD<A> {
        match self {
            Self::Flip(axis) => array.invert_axis(Axis(axis)),
            Self::Swap(a, b) => array.swap_axes(a, b),
        }
        array
    }
}

impl fmt::Display for AxisOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flip(axis) => write!(f, "flip axis {axis}"),
            Self::Swap(a, b) => write!(f, "swap axes {a},{b}"),
        }
    }
}

/// Sequence undoing `ops`. Every op is its own inverse, so this is the
/// reversed sequence.
#[must_use]
pub fn inverse_ops(ops: &[AxisOp]) -> Vec<AxisOp> {
    ops.iter().rev().copied().collect()
}

/// Apply `ops` in order
#[must_use]
pub fn apply_ops<A>(array: ArrayD<A>, ops: &[AxisOp]) -> ArrayD<A> {
    ops.iter().fold(array, |array, op| op.apply(array))
}

/// Orientation of the three spatial array axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrientationCode([AxisLabel; 3]);

impl OrientationCode {
    pub const RAS: Self = Self([AxisLabel::R, AxisLabel::A, AxisLabel::S]);

    pub fn new(labels: [AxisLabel; 3]) -> Result<Self, OrientationError> {
        let mut seen = [false; 3];
        for label in labels {
            let axis = label.anatomical_axis();
            if seen[axis] {
                return Err(OrientationError::RepeatedAxis {
                    code: labels.iter().map(|l| l.as_char()).collect(),
                });
            }
            seen[axis] = true;
        }
        Ok(Self(labels))
    }

    #[inline]
    #[must_use]
    pub fn labels(&self) -> [AxisLabel; 3] {
        self.0
    }

    #[inline]
    #[must_use]
    pub fn is_canonical(&self) -> bool {
        *self == Self::RAS
    }

    /// Derive the code from the affine's direction cosines.
    ///
    /// The largest remaining |cosine| decides first, so each world axis is
    /// claimed by exactly one voxel axis even for oblique scans.
    pub fn from_affine(affine: &Affine) -> Result<Self, OrientationError> {
        let mut cosines = [[0.0_f64; 3]; 3];
        for (axis, cosine) in cosines.iter_mut().enumerate() {
            let column = affine.column(axis);
            let norm = column.iter().map(|v| v * v).sum::<f64>().sqrt();
            if !norm.is_finite() || norm <= f64::EPSILON {
                return Err(OrientationError::DegenerateAffine { axis });
            }
            *cosine = column.map(|v| v / norm);
        }

        let mut labels = [AxisLabel::R; 3];
        let mut voxel_done = [false; 3];
        let mut world_done = [false; 3];
        for _ in 0..3 {
            let mut best: Option<(usize, usize, f64)> = None;
            for voxel in (0..3).filter(|&v| !voxel_done[v]) {
                for world in (0..3).filter(|&w| !world_done[w]) {
                    let value = cosines[voxel][world];
                    if best.is_none_or(|(_, _, b)| value.abs() > b.abs()) {
                        best = Some((voxel, world, value));
                    }
                }
            }
            let Some((voxel, world, value)) = best else {
                break;
            };
            voxel_done[voxel] = true;
            world_done[world] = true;
            labels[voxel] = AxisLabel::from_world_axis(world, value >= 0.0);
        }

        Self::new(labels)
    }

    /// Operations taking an array in this orientation to RAS.
    ///
    /// Flips come first, in ascending axis order, then the swaps that sort
    /// the axes into R, A, S order.
    #[must_use]
    pub fn ops_to_ras(&self) -> Vec<AxisOp> {
        let mut ops: Vec<AxisOp> = self
            .0
            .iter()
            .enumerate()
            .filter(|(_, label)| !label.is_positive())
            .map(|(axis, _)| AxisOp::Flip(axis))
            .collect();

        let mut held = self.0.map(AxisLabel::anatomical_axis);
        for target in 0..3 {
            if let Some(found) = (target..3).find(|&j| held[j] == target)
                && found != target
            {
                ops.push(AxisOp::Swap(target, found));
                held.swap(target, found);
            }
        }

        ops
    }
}

impl FromStr for OrientationCode {
    type Err = OrientationError;

    /// Parse `"LIP"`, `"lip"` or `"L,I,P"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != ',')
            .collect();
        if chars.len() != 3 {
            return Err(OrientationError::InvalidLength(chars.len()));
        }
        Self::new([
            AxisLabel::from_char(chars[0])?,
            AxisLabel::from_char(chars[1])?,
            AxisLabel::from_char(chars[2])?,
        ])
    }
}

impl fmt::Display for OrientationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.0;
        write!(f, "{a}{b}{c}")
    }
}

/// Reorient `volume` from `code` to RAS.
///
/// Only the three spatial axes take part; a trailing acquisition axis stays
/// last. Returns the canonical volume together with its post-transform shape.
pub fn normalize(
    volume: VoxelVolume,
    code: OrientationCode,
) -> Result<(CanonicalVolume, Vec<usize>), OrientationError> {
    let ndim = volume.ndim();
    if !(3..=4).contains(&ndim) {
        return Err(OrientationError::UnsupportedDimensionality { ndim });
    }

    let ops = code.ops_to_ras();
    if ops.is_empty() {
        debug!("Orientation {code} is already canonical");
    }
    let mut data = volume.into_inner();
    for op in &ops {
        debug!("Orientation {code}: {op}");
        data = op.apply(data);
    }

    let canonical = CanonicalVolume::from_reoriented(data);
    let shape = canonical.shape().to_vec();
    Ok((canonical, shape))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use ndarray::{Array, IxDyn};

    use AxisLabel::{A, I, L, P, R, S};
    use AxisOp::{Flip, Swap};

    /// Codes the viewer historically handled, with their op sequences
    fn known_table() -> Vec<(OrientationCode, Vec<AxisOp>)> {
        let code = |labels| OrientationCode::new(labels).unwrap();
        vec![
            (code([R, A, S]), vec![]),
            (code([L, I, P]), vec![Flip(0), Flip(1), Flip(2), Swap(1, 2)]),
            (code([L, A, S]), vec![Flip(0)]),
            (code([L, S, A]), vec![Flip(0), Swap(1, 2)]),
            (code([A, L, S]), vec![Flip(1), Swap(0, 1)]),
            (code([R, S, P]), vec![Flip(2), Swap(1, 2)]),
            (code([L, P, S]), vec![Flip(0), Flip(1)]),
            (code([L, I, A]), vec![Flip(0), Flip(1), Swap(1, 2)]),
        ]
    }

    fn all_codes() -> Vec<OrientationCode> {
        let perms = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
        let mut codes = Vec::new();
        for perm in perms {
            for signs in 0..8u8 {
                let labels = [0, 1, 2].map(|k| {
                    AxisLabel::from_world_axis(perm[k], signs & (1 << k) == 0)
                });
                codes.push(OrientationCode::new(labels).unwrap());
            }
        }
        codes
    }

    fn distinct_volume(shape: &[usize]) -> VoxelVolume {
        let len = shape.iter().product::<usize>();
        let data = Array::from_shape_vec(IxDyn(shape), (0..len).map(|v| v as f32).collect())
            .unwrap();
        VoxelVolume::new(data).unwrap()
    }

    #[test]
    fn test_derived_ops_match_known_table() {
        for (code, ops) in known_table() {
            assert_eq!(code.ops_to_ras(), ops, "ops for {code}");
        }
    }

    #[test]
    fn test_ras_is_identity() {
        let volume = distinct_volume(&[4, 5, 6]);
        let original = volume.data().clone();
        let (canonical, shape) = normalize(volume, OrientationCode::RAS).unwrap();
        assert_eq!(shape, vec![4, 5, 6]);
        assert_eq!(canonical.data(), &original);
    }

    #[test]
    fn test_round_trip_with_hand_derived_inverse() {
        let inverses: Vec<(&str, Vec<AxisOp>)> = vec![
            ("LIP", vec![Swap(1, 2), Flip(2), Flip(1), Flip(0)]),
            ("LAS", vec![Flip(0)]),
            ("LSA", vec![Swap(1, 2), Flip(0)]),
            ("ALS", vec![Swap(0, 1), Flip(1)]),
            ("RSP", vec![Swap(1, 2), Flip(2)]),
            ("LPS", vec![Flip(1), Flip(0)]),
            ("LIA", vec![Swap(1, 2), Flip(1), Flip(0)]),
        ];

        for (code, inverse) in inverses {
            let code: OrientationCode = code.parse().unwrap();
            let volume = distinct_volume(&[3, 4, 5]);
            let original = volume.data().clone();

            let (canonical, _) = normalize(volume, code).unwrap();
            assert_ne!(canonical.data(), &original, "{code} should change the array");

            let restored = apply_ops(canonical.into_inner(), &inverse);
            assert_eq!(restored, original, "round trip for {code}");
        }
    }

    #[test]
    fn test_inverse_ops_round_trip_every_code() {
        for code in all_codes() {
            let volume = distinct_volume(&[2, 3, 4]);
            let original = volume.data().clone();
            let ops = code.ops_to_ras();
            let (canonical, _) = normalize(volume, code).unwrap();
            let restored = apply_ops(canonical.into_inner(), &inverse_ops(&ops));
            assert_eq!(restored, original, "round trip for {code}");
        }
    }

    #[test]
    fn test_shape_is_permuted_by_swaps() {
        for code in all_codes() {
            let input = [3, 4, 5];
            let mut expected = input;
            for op in code.ops_to_ras() {
                if let Swap(a, b) = op {
                    expected.swap(a, b);
                }
            }
            let (_, shape) = normalize(distinct_volume(&input), code).unwrap();
            assert_eq!(shape, expected.to_vec(), "shape for {code}");

            let mut sorted = shape.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, vec![3, 4, 5]);
        }
    }

    #[test]
    fn test_every_code_lands_on_ras() {
        // Each voxel of an anatomically labelled grid must end up where RAS puts it
        for code in all_codes() {
            let labels = code.labels();
            let ops = code.ops_to_ras();
            let mut held = labels;
            for op in &ops {
                match *op {
                    Flip(axis) => held[axis] = held[axis].opposite(),
                    Swap(a, b) => held.swap(a, b),
                }
            }
            assert_eq!(held, [R, A, S], "{code} ends at {held:?}");
        }
    }

    #[test]
    fn test_lip_voxel_mapping() {
        // LIP: axis0 L->R, axis1 I->S (becomes axis 2), axis2 P->A (becomes axis 1)
        let volume = distinct_volume(&[2, 3, 4]);
        let original = volume.data().clone();
        let (canonical, shape) = normalize(volume, "LIP".parse().unwrap()).unwrap();
        assert_eq!(shape, vec![2, 4, 3]);

        let out = canonical.data();
        for i in 0..2 {
            for j in 0..3 {
                for k in 0..4 {
                    assert_eq!(out[[1 - i, 3 - k, 2 - j]], original[[i, j, k]]);
                }
            }
        }
    }

    #[test]
    fn test_four_dimensional_keeps_last_axis() {
        let volume = distinct_volume(&[2, 3, 4, 5]);
        let original = volume.data().clone();
        let (canonical, shape) = normalize(volume, "ALS".parse().unwrap()).unwrap();
        assert_eq!(shape, vec![3, 2, 4, 5]);

        let out = canonical.data();
        for t in 0..5 {
            assert_eq!(out[[0, 0, 0, t]], original[[0, 2, 0, t]]);
        }
    }

    #[test]
    fn test_parse_and_display() {
        let code: OrientationCode = "l, i, p".parse().unwrap();
        assert_eq!(code.labels(), [L, I, P]);
        assert_eq!(code.to_string(), "LIP");
    }

    #[test]
    fn test_parse_rejects_invalid_codes() {
        assert_matches!("LRS".parse::<OrientationCode>(), Err(OrientationError::RepeatedAxis { .. }));
        assert_matches!("RAX".parse::<OrientationCode>(), Err(OrientationError::InvalidLabel('X')));
        assert_matches!("RA".parse::<OrientationCode>(), Err(OrientationError::InvalidLength(2)));
    }

    #[test]
    fn test_from_affine_diagonal() {
        let code = OrientationCode::from_affine(&Affine::from_diagonal(-1.0, 1.0, 1.0)).unwrap();
        assert_eq!(code.to_string(), "LAS");

        let code = OrientationCode::from_affine(&Affine::from_diagonal(2.0, 0.9, 3.0)).unwrap();
        assert!(code.is_canonical());
    }

    #[test]
    fn test_from_affine_permuted() {
        // Voxel axis 1 runs toward inferior, axis 2 toward posterior
        let affine = Affine([
            [-1.0, 0.0, 0.0, 90.0],
            [0.0, 0.0, -1.2, 120.0],
            [0.0, -1.0, 0.0, 80.0],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        let code = OrientationCode::from_affine(&affine).unwrap();
        assert_eq!(code.to_string(), "LIP");
    }

    #[test]
    fn test_from_affine_oblique_picks_dominant_axis() {
        let affine = Affine([
            [0.95, 0.3, 0.0, 0.0],
            [-0.3, 0.95, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        assert!(OrientationCode::from_affine(&affine).unwrap().is_canonical());
    }

    #[test]
    fn test_from_affine_rejects_zero_column() {
        let affine = Affine::from_diagonal(1.0, 0.0, 1.0);
        assert_matches!(
            OrientationCode::from_affine(&affine),
            Err(OrientationError::DegenerateAffine { axis: 1 })
        );
    }
}
