//! Fixed-width histograms with Freedman-Diaconis bin width
//!
//! `bin_width = 2 * IQR * n^(-1/3)`, `num_bins = ceil((max - min) / bin_width) + padding`.
//! Edges start at the sample minimum and advance by exactly `bin_width`, so the
//! last edge lies beyond the sample maximum by the padding bins.

use crate::statistics::quantile::quartiles;
use ratchange_core::{Error, Result};

/// Parameters for histogram construction
#[derive(Debug, Clone)]
pub struct HistogramParams {
    /// Extra bins appended past `ceil((max - min) / bin_width)`
    pub padding_bins: usize,
    /// Smallest sample for which a bin width is derived
    pub min_samples: usize,
    /// Upper bound on the number of bins
    pub max_bins: usize,
}

impl Default for HistogramParams {
    fn default() -> Self {
        Self {
            padding_bins: 2,
            min_samples: 2,
            max_bins: 1_000_000,
        }
    }
}

/// Histogram of a one-dimensional sample
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Count per bin
    pub counts: Vec<u64>,
    /// Bin edges, `counts.len() + 1` values, strictly increasing
    pub edges: Vec<f64>,
    /// Width of every bin
    pub bin_width: f64,
    /// Sample minimum (first edge)
    pub min: f64,
    /// Sample maximum
    pub max: f64,
    /// 25th percentile of the sample
    pub lower_quartile: f64,
    /// 75th percentile of the sample
    pub upper_quartile: f64,
}

impl Histogram {
    pub fn num_bins(&self) -> usize {
        self.counts.len()
    }

    /// Total number of samples
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn iqr(&self) -> f64 {
        self.upper_quartile - self.lower_quartile
    }

    /// Largest bin count
    pub fn max_count(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Bin centers
    pub fn centers(&self) -> Vec<f64> {
        self.edges.windows(2).map(|e| (e[0] + e[1]) / 2.0).collect()
    }

    /// Number of lower truncations searched: bins between the first edge
    /// and the lower quartile, plus one.
    pub fn lower_window_count(&self) -> usize {
        ((self.lower_quartile - self.edges[0]) / self.bin_width).floor() as usize + 1
    }

    /// Number of upper truncations searched: bins between the upper
    /// quartile and the last edge, plus one.
    pub fn upper_window_count(&self) -> usize {
        let last = self.edges[self.edges.len() - 1];
        ((last - self.upper_quartile) / self.bin_width).floor() as usize + 1
    }

    /// Threshold value for a bin edge: the center of the bin starting there
    pub fn threshold_at(&self, edge_index: usize) -> f64 {
        self.edges[edge_index] + self.bin_width / 2.0
    }
}

/// Build a histogram of `values`.
///
/// # Errors
/// `DegenerateDistribution` when the sample is smaller than
/// `params.min_samples`, contains non-finite values, has a (near) zero
/// interquartile range, or would need more than `params.max_bins` bins.
pub fn build_histogram(values: &[f64], params: &HistogramParams) -> Result<Histogram> {
    let n = values.len();
    if n < params.min_samples.max(1) {
        return Err(Error::DegenerateDistribution(format!(
            "{} samples, at least {} required",
            n,
            params.min_samples.max(1)
        )));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(Error::DegenerateDistribution(
            "sample contains non-finite values".into(),
        ));
    }

    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let (lower_quartile, upper_quartile) = quartiles(values);
    let iqr = upper_quartile - lower_quartile;

    let scale = min.abs().max(max.abs());
    if !(iqr > scale * 1e-12) {
        return Err(Error::DegenerateDistribution(format!(
            "interquartile range is {} (quartiles {} and {})",
            iqr, lower_quartile, upper_quartile
        )));
    }

    let bin_width = 2.0 * iqr * (n as f64).powf(-1.0 / 3.0);
    let span_bins = ((max - min) / bin_width).ceil();
    if !span_bins.is_finite() || span_bins + params.padding_bins as f64 > params.max_bins as f64 {
        return Err(Error::DegenerateDistribution(format!(
            "bin width {} over range [{}, {}] needs more than {} bins",
            bin_width, min, max, params.max_bins
        )));
    }
    let num_bins = span_bins as usize + params.padding_bins;
    if num_bins == 0 {
        return Err(Error::DegenerateDistribution("zero bins".into()));
    }

    let edges: Vec<f64> = (0..=num_bins).map(|i| min + i as f64 * bin_width).collect();

    let mut counts = vec![0u64; num_bins];
    for &v in values {
        let idx = (((v - min) / bin_width).floor() as usize).min(num_bins - 1);
        counts[idx] += 1;
    }

    Ok(Histogram {
        counts,
        edges,
        bin_width,
        min,
        max,
        lower_quartile,
        upper_quartile,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    #[test]
    fn test_bin_width_rule() {
        let values = ramp(1000);
        let h = build_histogram(&values, &HistogramParams::default()).unwrap();

        let expected = 2.0 * h.iqr() * 1000f64.powf(-1.0 / 3.0);
        assert_relative_eq!(h.bin_width, expected, epsilon = 1e-12);
        assert_relative_eq!(h.iqr(), 499.5, epsilon = 1e-9);

        let expected_bins = (999.0 / expected).ceil() as usize + 2;
        assert_eq!(h.num_bins(), expected_bins);
        assert_eq!(h.edges.len(), h.num_bins() + 1);
    }

    #[test]
    fn test_mass_and_edges() {
        let values = vec![0.3, 1.2, 1.9, 2.2, 2.8, 3.1, 3.3, 4.7, 5.5, 9.0];
        let h = build_histogram(&values, &HistogramParams::default()).unwrap();

        assert_eq!(h.total(), values.len() as u64);
        assert!(h.edges.windows(2).all(|e| e[1] > e[0]));
        assert_relative_eq!(h.edges[0], 0.3);
        assert!(*h.edges.last().unwrap() > 9.0);
    }

    #[test]
    fn test_padding_bins_empty() {
        let values = ramp(200);
        let h = build_histogram(&values, &HistogramParams::default()).unwrap();
        let n = h.num_bins();
        assert_eq!(h.counts[n - 1], 0);
    }

    #[test]
    fn test_window_counts() {
        let values = ramp(101);
        let h = build_histogram(&values, &HistogramParams::default()).unwrap();

        let lq_bins = ((25.0 - 0.0) / h.bin_width).floor() as usize + 1;
        assert_eq!(h.lower_window_count(), lq_bins);
        assert!(h.lower_window_count() + h.upper_window_count() <= h.num_bins() + 1);
        assert_relative_eq!(h.threshold_at(0), h.bin_width / 2.0);
    }

    #[test]
    fn test_zero_iqr_is_degenerate() {
        let values = vec![1.0, 1.0, 1.0, 1.0, 1.0, 5.0];
        let err = build_histogram(&values, &HistogramParams::default()).unwrap_err();
        assert!(matches!(err, Error::DegenerateDistribution(_)));
    }

    #[test]
    fn test_too_small_sample() {
        let err = build_histogram(&[3.0], &HistogramParams::default()).unwrap_err();
        assert!(matches!(err, Error::DegenerateDistribution(_)));
        assert!(build_histogram(&[], &HistogramParams::default()).is_err());
    }

    #[test]
    fn test_non_finite_rejected() {
        let err = build_histogram(&[1.0, f64::NAN, 3.0], &HistogramParams::default()).unwrap_err();
        assert!(matches!(err, Error::DegenerateDistribution(_)));
    }

    #[test]
    fn test_bin_limit() {
        // Tight core with one far outlier
        let mut values: Vec<f64> = (0..100).map(|i| i as f64 * 1e-3).collect();
        values.push(1e9);
        let params = HistogramParams { max_bins: 1000, ..Default::default() };
        assert!(build_histogram(&values, &params).is_err());
    }
}
