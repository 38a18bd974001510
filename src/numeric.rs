//! Null-safe scalar arithmetic
//!
//! Every counter in a day record is optional. These helpers keep "no data"
//! distinct from zero: a ratio with an unknown input stays unknown, and a
//! zero denominator never turns into a zero result.

/// Deciseconds to milliseconds
const DECISECOND_MS: f64 = 100.0;

/// Resolve a formula over a fixed set of inputs.
///
/// Returns `None` when any input is unknown, when the formula declines, or when
/// the formula produces a non-finite value.
pub fn project<const N: usize>(
    inputs: [Option<f64>; N],
    formula: impl FnOnce([f64; N]) -> Option<f64>,
) -> Option<f64> {
    let mut resolved = [0.0; N];
    for (slot, input) in resolved.iter_mut().zip(inputs) {
        *slot = input.filter(|v| v.is_finite())?;
    }
    formula(resolved).filter(|v| v.is_finite())
}

/// Divide two optional values.
///
/// Unknown when either side is unknown or the denominator is exactly zero.
pub fn safe_divide(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    project([numerator, denominator], |[n, d]| (d != 0.0).then(|| n / d))
}

/// Add two optional values, treating an unknown operand as zero.
///
/// Deliberately asymmetric with [`safe_divide`]: sums are used to build
/// denominators (e.g. total device views) that should still resolve when one
/// side was never recorded.
pub fn safe_add(a: Option<f64>, b: Option<f64>) -> f64 {
    a.filter(|v| v.is_finite()).unwrap_or(0.0) + b.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Convert deciseconds to milliseconds
pub fn scale_time_unit(value: Option<f64>) -> Option<f64> {
    project([value], |[ds]| Some(ds * DECISECOND_MS))
}

/// Saturate a value into `[lo, hi]`
pub fn clamp(value: f64, lo: f64, hi: f64) -> f64 {
    value.max(lo).min(hi)
}

/// Widen an optional count for arithmetic
pub fn widen(value: Option<u64>) -> Option<f64> {
    value.map(|v| v as f64)
}
