//! Order statistics

/// Percentile of an ascending-sorted slice using linear interpolation
/// between the two closest ranks (`p` in 0..=100).
///
/// Returns NaN for an empty slice.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let p = p.clamp(0.0, 100.0);
    let pos = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    let frac = pos - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

/// Lower (25th) and upper (75th) quartiles of unsorted values.
///
/// Non-finite values must be removed by the caller.
pub fn quartiles(values: &[f64]) -> (f64, f64) {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    (percentile(&sorted, 25.0), percentile(&sorted, 75.0))
}
