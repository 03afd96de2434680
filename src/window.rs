//! Intensity windowing
//!
//! A window maps the intensity band `[level - width/2, level + width/2]`
//! onto the visible range. Values outside the band saturate at its edges.

use crate::types::Calibration;
use clap::ValueEnum;
use ndarray::{Array, ArrayBase, Data, Dimension};
use std::fmt;
use thiserror::Error;

/// Initial calibrated-unit window (level, width)
pub const CALIBRATED_DEFAULT: (f32, f32) = (150.0, 300.0);

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum WindowError {
    #[error("Window width must be positive, got {0}")]
    NonPositiveWidth(f32),

    #[error("Window level and width must be finite, got level={level}, width={width}")]
    NonFinite { level: f32, width: f32 },
}

/// Window center and span
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowParams {
    level: f32,
    width: f32,
}

impl WindowParams {
    pub fn new(level: f32, width: f32) -> Result<Self, WindowError> {
        if !level.is_finite() || !width.is_finite() {
            return Err(WindowError::NonFinite { level, width });
        }
        if width <= 0.0 {
            return Err(WindowError::NonPositiveWidth(width));
        }
        Ok(Self { level, width })
    }

    #[inline]
    #[must_use]
    pub fn level(&self) -> f32 {
        self.level
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Lower and upper edge of the window
    #[inline]
    #[must_use]
    pub fn bounds(&self) -> (f32, f32) {
        let half = self.width / 2.0;
        (self.level - half, self.level + half)
    }
}

impl fmt::Display for WindowParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "level={level}, width={width}", level = self.level, width = self.width)
    }
}

/// How values strictly inside the window are mapped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum WindowFormula {
    /// `hi * (v - lo) / (hi - lo)` inside the window, edges outside
    #[default]
    Rescale,
    /// Plain clamp to `[lo, hi]`
    Clamp,
}

impl WindowFormula {
    #[inline(always)]
    #[must_use]
    // Hot path: called for every voxel on every redraw
    pub fn map(self, value: f32, lo: f32, hi: f32) -> f32 {
        if value <= lo {
            lo
        } else if value >= hi {
            hi
        } else {
            match self {
                Self::Rescale => hi * (value - lo) / (hi - lo),
                Self::Clamp => value,
            }
        }
    }

    /// Smallest and largest value `map` can produce for the band `[lo, hi]`
    #[must_use]
    pub fn output_range(self, lo: f32, hi: f32) -> (f32, f32) {
        match self {
            // the interior ramps up from 0, the lower edge saturates at lo
            Self::Rescale => (lo.min(0.0), hi),
            Self::Clamp => (lo, hi),
        }
    }
}

/// Window `data` with the default [`WindowFormula::Rescale`] mapping.
///
/// Returns a new array of the same shape; the input is left untouched.
pub fn window<S, D>(data: &ArrayBase<S, D>, level: f32, width: f32) -> Result<Array<f32, D>, WindowError>
where
    S: Data<Elem = f32>,
    D: Dimension,
{
    let params = WindowParams::new(level, width)?;
    Ok(apply_window(data, &params, WindowFormula::Rescale))
}

/// Window `data` with an explicit formula
#[must_use]
pub fn apply_window<S, D>(data: &ArrayBase<S, D>, params: &WindowParams, formula: WindowFormula) -> Array<f32, D>
where
    S: Data<Elem = f32>,
    D: Dimension,
{
    let (lo, hi) = params.bounds();
    data.mapv(|v| formula.map(v, lo, hi))
}

/// Which intensities the window operates on
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayMode {
    /// Stored voxel values
    Raw,
    /// `slope * v + intercept`
    Calibrated(Calibration),
}

impl DisplayMode {
    /// Starting window for a volume whose largest displayed value is `max`
    #[must_use]
    pub fn initial_window(&self, max: f32) -> WindowParams {
        let (level, width) = match self {
            Self::Raw => (max, (2.0 * max).max(1.0)),
            Self::Calibrated(_) => CALIBRATED_DEFAULT,
        };
        WindowParams::new(level, width).unwrap_or(WindowParams { level: 0.0, width: 1.0 })
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw => write!(f, "raw intensity"),
            Self::Calibrated(cal) => write!(f, "calibrated ({cal})"),
        }
    }
}

/// Range the window can be adjusted within
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowLimits {
    pub level: (f32, f32),
    pub width: (f32, f32),
}

impl WindowLimits {
    /// Level in `[1, max]`, width in `[1, 2 * max]`, widened to contain `initial`
    #[must_use]
    pub fn for_volume(max: f32, initial: &WindowParams) -> Self {
        let max = if max.is_finite() { max } else { 1.0 };
        Self {
            level: (
                initial.level().min(1.0),
                initial.level().max(max).max(1.0),
            ),
            width: (1.0_f32.min(initial.width()), initial.width().max(2.0 * max).max(1.0)),
        }
    }

    /// Keyboard step: 1% of the range, at least 1
    #[must_use]
    pub fn level_step(&self) -> f32 {
        ((self.level.1 - self.level.0) / 100.0).round().max(1.0)
    }

    #[must_use]
    pub fn width_step(&self) -> f32 {
        ((self.width.1 - self.width.0) / 100.0).round().max(1.0)
    }

    /// Clamp a window into the limits
    #[must_use]
    pub fn clamp(&self, level: f32, width: f32) -> WindowParams {
        let level = level.clamp(self.level.0, self.level.1);
        let width = width.clamp(self.width.0, self.width.1);
        WindowParams::new(level, width).unwrap_or(WindowParams {
            level,
            width: self.width.0.max(f32::MIN_POSITIVE),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use assert_matches::assert_matches;
    use ndarray::{array, Array3};

    #[test]
    fn test_rescale_window_edges_and_center() {
        let data = array![10.0_f32, 75.0, 90.0, 100.0, 124.0, 125.0, 400.0];
        let out = window(&data, 100.0, 50.0).unwrap();
        assert_eq!(out[0], 75.0);
        assert_eq!(out[1], 75.0);
        assert_relative_eq!(out[2], 125.0 * 15.0 / 50.0);
        assert_relative_eq!(out[3], 62.5);
        assert_relative_eq!(out[4], 125.0 * 49.0 / 50.0);
        assert_eq!(out[5], 125.0);
        assert_eq!(out[6], 125.0);
    }

    #[test]
    fn test_clamp_window() {
        let data = array![10.0_f32, 100.0, 400.0];
        let params = WindowParams::new(100.0, 50.0).unwrap();
        let out = apply_window(&data, &params, WindowFormula::Clamp);
        assert_eq!(out.to_vec(), vec![75.0, 100.0, 125.0]);
    }

    #[test]
    fn test_output_range_covers_mapped_values() {
        let (lo, hi) = (75.0, 125.0);
        assert_eq!(WindowFormula::Rescale.output_range(lo, hi), (0.0, 125.0));
        assert_eq!(WindowFormula::Clamp.output_range(lo, hi), (75.0, 125.0));
        assert_eq!(WindowFormula::Rescale.output_range(-50.0, 50.0), (-50.0, 50.0));

        for v in [-10.0_f32, 76.0, 100.0, 124.9, 300.0] {
            let mapped = WindowFormula::Rescale.map(v, lo, hi);
            assert!((0.0..=125.0).contains(&mapped));
        }
    }

    #[test]
    fn test_window_keeps_shape_and_input() {
        let data = Array3::from_shape_fn((3, 4, 5), |(i, j, k)| (i * 20 + j * 5 + k) as f32);
        let before = data.clone();
        let out = window(&data, 30.0, 20.0).unwrap();
        assert_eq!(out.dim(), (3, 4, 5));
        assert_eq!(data, before);
    }

    #[test]
    fn test_non_positive_width_rejected() {
        let data = array![1.0_f32];
        assert_matches!(window(&data, 10.0, 0.0), Err(WindowError::NonPositiveWidth(_)));
        assert_matches!(window(&data, 10.0, -5.0), Err(WindowError::NonPositiveWidth(_)));
        assert_matches!(window(&data, f32::NAN, 5.0), Err(WindowError::NonFinite { .. }));
    }

    #[test]
    fn test_nan_voxels_stay_nan() {
        let data = array![f32::NAN];
        let out = window(&data, 100.0, 50.0).unwrap();
        assert!(out[0].is_nan());
    }

    #[test]
    fn test_initial_windows() {
        let raw = DisplayMode::Raw.initial_window(800.0);
        assert_eq!((raw.level(), raw.width()), (800.0, 1600.0));

        let calibrated = DisplayMode::Calibrated(Calibration::identity()).initial_window(800.0);
        assert_eq!((calibrated.level(), calibrated.width()), (150.0, 300.0));

        let empty = DisplayMode::Raw.initial_window(0.0);
        assert_eq!((empty.level(), empty.width()), (0.0, 1.0));
    }

    #[test]
    fn test_limits_contain_initial_window() {
        let initial = WindowParams::new(150.0, 300.0).unwrap();
        let limits = WindowLimits::for_volume(80.0, &initial);
        assert_eq!(limits.level, (1.0, 150.0));
        assert_eq!(limits.width, (1.0, 300.0));

        let clamped = limits.clamp(1000.0, -3.0);
        assert_eq!((clamped.level(), clamped.width()), (150.0, 1.0));
    }

    #[test]
    fn test_limit_steps() {
        let initial = WindowParams::new(2000.0, 4000.0).unwrap();
        let limits = WindowLimits::for_volume(2000.0, &initial);
        assert_eq!(limits.level_step(), 20.0);
        assert_eq!(limits.width_step(), 40.0);

        let small = WindowLimits::for_volume(10.0, &WindowParams::new(10.0, 20.0).unwrap());
        assert_eq!(small.level_step(), 1.0);
    }
}
