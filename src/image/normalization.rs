use ndarray::ArrayView2;

/// Finite minimum and maximum of a slice, `None` when it holds no finite value
#[inline]
#[must_use]
pub fn find_min_max(values: &ArrayView2<'_, f32>) -> Option<(f32, f32)> {
    values
        .iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, &val| match acc {
            None => Some((val, val)),
            Some((min, max)) => Some((min.min(val), max.max(val))),
        })
}

/// Map `value` from `[min, min + range]` onto 0-255.
///
/// The float-to-int cast saturates, so out-of-range values land on 0 or 255
/// and NaN lands on 0.
#[inline]
#[must_use]
pub fn normalize_to_u8(value: f32, min: f32, range: f32) -> u8 {
    let normalized = (value - min) / range;
    (normalized * 255.0_f32) as u8
}
