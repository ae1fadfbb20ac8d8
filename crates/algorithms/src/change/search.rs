//! Histogram truncation search
//!
//! The no-change range of a change variable is found by truncating its
//! histogram and scoring each truncation by the |skewness| and |kurtosis| of
//! what remains. A truncation is a window `[low_bin, num_bins - up_bin)`:
//!
//! - two-sided: `low_bin` in `0..lower_window_count`, `up_bin` in `0..upper_window_count`
//! - lower-only: `up_bin = 0`
//! - upper-only: `low_bin = 0`
//!
//! All three share one score grid (`lower × upper`, with a single column or
//! row in the one-sided cases). Windows whose moments are undefined are
//! left out. The grid minimum of |kurtosis|, |skewness| and of their
//! min-max normalized sum give three candidate threshold pairs; a threshold
//! is the center of the bin at the window edge.
//!
//! Each window costs a pass over its bins, so grids larger than a window
//! limit ([`MAX_WINDOWS`] by default) are refused before scoring.

use crate::change::measure::{ThresholdDirection, ThresholdMeasure};
use crate::maybe_rayon::*;
use crate::statistics::{build_histogram, window_moments, Histogram, HistogramParams};
use ndarray::Array2;
use ratchange_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Default limit on the number of truncation windows scored by one search
pub const MAX_WINDOWS: usize = 4_000_000;

/// Lower and upper bound of the no-change range, in the units of the
/// searched variable
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdPair {
    pub lower: f64,
    pub upper: f64,
}

impl ThresholdPair {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Change label of a value.
    ///
    /// Two-sided: 1 below `lower`, 2 above `upper`, else 0.
    /// Lower-only: 1 below `lower`. Upper-only: 1 above `upper`.
    pub fn classify(&self, value: f64, direction: ThresholdDirection) -> i64 {
        match direction {
            ThresholdDirection::LowerUpper => {
                if value > self.upper {
                    2
                } else if value < self.lower {
                    1
                } else {
                    0
                }
            }
            ThresholdDirection::Lower => i64::from(value < self.lower),
            ThresholdDirection::Upper => i64::from(value > self.upper),
        }
    }

    /// Whether `value` lies strictly inside `(lower, upper)`
    pub fn contains(&self, value: f64) -> bool {
        value > self.lower && value < self.upper
    }
}

/// Grid cell of a truncation window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowIndex {
    /// Bins dropped from the bottom
    pub low_bin: usize,
    /// Bins dropped from the top
    pub up_bin: usize,
}

/// The three candidate threshold pairs of one search
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdCandidates {
    pub direction: ThresholdDirection,
    pub kurtosis: ThresholdPair,
    pub skewness: ThresholdPair,
    pub combined: ThresholdPair,
    pub kurtosis_window: WindowIndex,
    pub skewness_window: WindowIndex,
    pub combined_window: WindowIndex,
    pub lower_quartile: f64,
    pub upper_quartile: f64,
}

impl ThresholdCandidates {
    /// Interquartile range of the searched sample
    pub fn iqr(&self) -> f64 {
        self.upper_quartile - self.lower_quartile
    }

    /// Whether the kurtosis and skewness candidates differ by more than the
    /// IQR on either bound
    pub fn measures_disagree(&self) -> bool {
        let tol = self.iqr();
        (self.kurtosis.lower - self.skewness.lower).abs() > tol
            || (self.kurtosis.upper - self.skewness.upper).abs() > tol
    }

    /// Thresholds for a measure.
    ///
    /// `Auto` takes the skewness candidate when the kurtosis and skewness
    /// candidates disagree by more than the IQR, the combined one otherwise.
    pub fn select(&self, measure: ThresholdMeasure) -> ThresholdPair {
        match measure {
            ThresholdMeasure::Kurtosis => self.kurtosis,
            ThresholdMeasure::Skewness => self.skewness,
            ThresholdMeasure::Combined => self.combined,
            ThresholdMeasure::Auto => {
                if self.measures_disagree() {
                    self.skewness
                } else {
                    self.combined
                }
            }
        }
    }
}

/// |kurtosis| and |skewness| per window; NaN where undefined
struct ScoreGrid {
    kurtosis: Array2<f64>,
    skewness: Array2<f64>,
}

fn score_grid(hist: &Histogram, low_windows: usize, up_windows: usize) -> Result<ScoreGrid> {
    let n = hist.num_bins();

    let cells: Vec<(f64, f64)> = (0..low_windows)
        .into_par_iter()
        .flat_map(|low| {
            (0..up_windows)
                .map(|up| match window_moments(&hist.counts[low..n - up]) {
                    Some(m) => (m.kurtosis.abs(), m.skewness.abs()),
                    None => (f64::NAN, f64::NAN),
                })
                .collect::<Vec<_>>()
        })
        .collect();

    let (kurt, skew): (Vec<f64>, Vec<f64>) = cells.into_iter().unzip();
    let shape = (low_windows, up_windows);
    Ok(ScoreGrid {
        kurtosis: Array2::from_shape_vec(shape, kurt).map_err(|e| Error::Other(e.to_string()))?,
        skewness: Array2::from_shape_vec(shape, skew).map_err(|e| Error::Other(e.to_string()))?,
    })
}

/// Min-max normalize the finite cells to [0, 1]; a constant grid maps to 0.
fn normalize(scores: &Array2<f64>) -> Array2<f64> {
    let (lo, hi) = scores
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = hi - lo;
    scores.mapv(|v| {
        if !v.is_finite() {
            f64::NAN
        } else if range > 0.0 {
            (v - lo) / range
        } else {
            0.0
        }
    })
}

/// First finite minimum in row-major order
fn argmin(scores: &Array2<f64>) -> Option<WindowIndex> {
    let mut best: Option<((usize, usize), f64)> = None;
    for (idx, &v) in scores.indexed_iter() {
        if !v.is_finite() {
            continue;
        }
        if best.map_or(true, |(_, b)| v < b) {
            best = Some((idx, v));
        }
    }
    best.map(|((low_bin, up_bin), _)| WindowIndex { low_bin, up_bin })
}

/// Search the truncation windows of `hist` for one direction, with the
/// default window limit.
///
/// # Errors
/// `DegenerateDistribution` when no window has defined moments or the grid
/// exceeds [`MAX_WINDOWS`].
pub fn search(hist: &Histogram, direction: ThresholdDirection) -> Result<ThresholdCandidates> {
    search_limited(hist, direction, MAX_WINDOWS)
}

/// Search the truncation windows of `hist`, scoring at most `max_windows`.
pub fn search_limited(
    hist: &Histogram,
    direction: ThresholdDirection,
    max_windows: usize,
) -> Result<ThresholdCandidates> {
    let n = hist.num_bins();
    let (low_windows, up_windows) = match direction {
        ThresholdDirection::Lower => (hist.lower_window_count(), 1),
        ThresholdDirection::Upper => (1, hist.upper_window_count()),
        ThresholdDirection::LowerUpper => (hist.lower_window_count(), hist.upper_window_count()),
    };
    match low_windows.checked_mul(up_windows) {
        Some(cells) if cells <= max_windows => {}
        _ => {
            return Err(Error::DegenerateDistribution(format!(
                "{} x {} truncation windows over {} bins exceed the limit of {}",
                low_windows, up_windows, n, max_windows
            )))
        }
    }
    debug!(
        "{} search over {} x {} windows of {} bins",
        direction, low_windows, up_windows, n
    );

    let grid = score_grid(hist, low_windows, up_windows)?;
    let combined = &normalize(&grid.kurtosis) + &normalize(&grid.skewness);

    let degenerate = || {
        Error::DegenerateDistribution(format!(
            "no truncation window of the {}-bin histogram has defined moments",
            n
        ))
    };
    let kurtosis_window = argmin(&grid.kurtosis).ok_or_else(degenerate)?;
    let skewness_window = argmin(&grid.skewness).ok_or_else(degenerate)?;
    let combined_window = argmin(&combined).ok_or_else(degenerate)?;

    debug!(
        "Window indexes: kurtosis {:?}, skewness {:?}, combined {:?}",
        kurtosis_window, skewness_window, combined_window
    );

    let pair = |w: WindowIndex| ThresholdPair {
        lower: match direction {
            ThresholdDirection::Upper => hist.min,
            _ => hist.threshold_at(w.low_bin),
        },
        upper: match direction {
            ThresholdDirection::Lower => hist.max,
            _ => hist.threshold_at(n - w.up_bin),
        },
    };

    let candidates = ThresholdCandidates {
        direction,
        kurtosis: pair(kurtosis_window),
        skewness: pair(skewness_window),
        combined: pair(combined_window),
        kurtosis_window,
        skewness_window,
        combined_window,
        lower_quartile: hist.lower_quartile,
        upper_quartile: hist.upper_quartile,
    };

    debug!(
        "No-change range: kurtosis [{}, {}], skewness [{}, {}], combined [{}, {}]",
        candidates.kurtosis.lower,
        candidates.kurtosis.upper,
        candidates.skewness.lower,
        candidates.skewness.upper,
        candidates.combined.lower,
        candidates.combined.upper
    );

    Ok(candidates)
}

/// Two-sided search
pub fn search_both(hist: &Histogram) -> Result<ThresholdCandidates> {
    search(hist, ThresholdDirection::LowerUpper)
}

/// Lower-only search; upper thresholds are the sample maximum
pub fn search_lower(hist: &Histogram) -> Result<ThresholdCandidates> {
    search(hist, ThresholdDirection::Lower)
}

/// Upper-only search; lower thresholds are the sample minimum
pub fn search_upper(hist: &Histogram) -> Result<ThresholdCandidates> {
    search(hist, ThresholdDirection::Upper)
}

/// Everything one threshold search produced
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub histogram: Histogram,
    pub candidates: ThresholdCandidates,
    pub measure: ThresholdMeasure,
    /// Thresholds selected by `measure`
    pub thresholds: ThresholdPair,
}

/// Histogram construction, window search and measure selection for a
/// sample of values
#[derive(Debug, Clone)]
pub struct ThresholdSearchEngine {
    pub histogram: HistogramParams,
    /// Largest truncation grid scored before giving up
    pub max_windows: usize,
}

impl Default for ThresholdSearchEngine {
    fn default() -> Self {
        Self::new(HistogramParams::default())
    }
}

impl ThresholdSearchEngine {
    pub fn new(histogram: HistogramParams) -> Self {
        Self {
            histogram,
            max_windows: MAX_WINDOWS,
        }
    }

    pub fn with_max_windows(mut self, max_windows: usize) -> Self {
        self.max_windows = max_windows;
        self
    }

    pub fn run(
        &self,
        values: &[f64],
        direction: ThresholdDirection,
        measure: ThresholdMeasure,
    ) -> Result<SearchReport> {
        let histogram = build_histogram(values, &self.histogram)?;
        debug!(
            "Bin width = {}, bins = {}, LQ = {}, UQ = {}",
            histogram.bin_width,
            histogram.num_bins(),
            histogram.lower_quartile,
            histogram.upper_quartile
        );

        let candidates = search_limited(&histogram, direction, self.max_windows)?;
        let thresholds = candidates.select(measure);
        info!(
            "No-change range ({}, {}): [{}, {}]",
            direction, measure, thresholds.lower, thresholds.upper
        );

        Ok(SearchReport {
            histogram,
            candidates,
            measure,
            thresholds,
        })
    }
}
