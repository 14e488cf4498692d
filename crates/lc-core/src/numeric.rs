use crate::CoreError;

/// Pass `v` through when finite, otherwise name the offending field.
pub fn ensure_finite(v: f64, what: &'static str) -> Result<f64, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Returns `(lo, hi)` with the pair swapped when `hi < lo`.
///
/// Inverted limit pairs are a configuration mistake the loop repairs
/// instead of rejecting.
pub fn ordered_bounds(lo: f64, hi: f64) -> (f64, f64) {
    if hi < lo { (hi, lo) } else { (lo, hi) }
}

/// Clamp `x` into `[lo, hi]`, swapping an inverted pair first.
///
/// Unlike [`f64::clamp`] this never panics. A NaN bound is ignored and the
/// finite one still clamps on its own side (`lo` from below, `hi` from
/// above); with both bounds NaN, or a NaN `x`, `x` is returned as-is.
pub fn clamp_ordered(x: f64, lo: f64, hi: f64) -> f64 {
    let (lo, hi) = ordered_bounds(lo, hi);
    if x < lo {
        lo
    } else if x > hi {
        hi
    } else {
        x
    }
}
