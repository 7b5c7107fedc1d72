//! Shared scalar kernels.
//!
//! Every division in the analytics crate funnels through [`safe_div`] so
//! that no NaN or infinity can leak into a downstream artifact.

/// Division with a zero/non-finite guard. Returns `default` when the
/// denominator is zero or either operand is non-finite.
pub fn safe_div(numerator: f64, denominator: f64, default: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() || !numerator.is_finite() {
        return default;
    }
    numerator / denominator
}

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0.0 for slices shorter than two.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Quantile with linear interpolation between order statistics.
///
/// Matches the interpolation the original analytics stack used for its
/// segmentation thresholds: the quantile position is `q * (n - 1)` and
/// fractional positions interpolate between the two neighboring values.
/// Returns 0.0 for an empty slice; `q` is clamped to [0, 1].
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Min-max scale a slice to [0, 1]. A zero-range slice scales to all
/// zeros (the convention the health scorer's normalization inherits).
pub fn min_max_scale(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    values
        .iter()
        .map(|v| safe_div(v - min, range, 0.0))
        .collect()
}

/// Replace non-finite values with 0.0 before they reach a scaler or the
/// clusterer.
pub fn zero_non_finite(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
