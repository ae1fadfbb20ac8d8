//! Per-class summary statistics over attribute table rows
//!
//! Summarizes one numeric column over the regions of a class. Only the
//! moment-type aggregations are provided; order and shape aggregations
//! are rejected.

use ratchange_core::rat::{AttributeStore, ClassValue};
use ratchange_core::{Error, Result};
use std::str::FromStr;

/// Aggregations over the regions of a class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionStatistic {
    Min,
    Max,
    Mean,
    Sum,
    StdDev,
    Median,
    Count,
    ShapeIndex,
}

impl FromStr for RegionStatistic {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "min" => Ok(RegionStatistic::Min),
            "max" => Ok(RegionStatistic::Max),
            "mean" => Ok(RegionStatistic::Mean),
            "sum" => Ok(RegionStatistic::Sum),
            "stddev" | "std" => Ok(RegionStatistic::StdDev),
            "median" => Ok(RegionStatistic::Median),
            "count" => Ok(RegionStatistic::Count),
            "shapeindex" | "shape" => Ok(RegionStatistic::ShapeIndex),
            other => Err(Error::Configuration(format!(
                "unknown region statistic '{}'",
                other
            ))),
        }
    }
}

/// Summary of one attribute over the regions of a class
#[derive(Debug, Clone)]
pub struct ClassSummary {
    pub count: usize,
    pub sum: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

/// Summarize `value_col` over rows whose `class_col` equals `class`.
///
/// Non-finite values are skipped. Returns `None` when no row qualifies.
pub fn class_summary<S: AttributeStore + ?Sized>(
    store: &S,
    class_col: &str,
    class: &ClassValue,
    value_col: &str,
) -> Result<Option<ClassSummary>> {
    let in_class = store.read_column(class_col)?.matches(class, class_col)?;
    let values = store.read_real(value_col)?;

    let vals: Vec<f64> = values
        .iter()
        .zip(&in_class)
        .filter(|(v, keep)| **keep && v.is_finite())
        .map(|(v, _)| *v)
        .collect();

    if vals.is_empty() {
        return Ok(None);
    }

    let count = vals.len();
    let sum: f64 = vals.iter().sum();
    let mean = sum / count as f64;
    let var = vals.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / count as f64;
    let (min, max) = vals
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    Ok(Some(ClassSummary {
        count,
        sum,
        mean,
        std_dev: var.sqrt(),
        min,
        max,
    }))
}

/// One aggregation of `value_col` over the regions of a class.
///
/// # Errors
/// `UnsupportedFeature` for `Median`, `Count` and `ShapeIndex`.
pub fn class_statistic<S: AttributeStore + ?Sized>(
    store: &S,
    class_col: &str,
    class: &ClassValue,
    value_col: &str,
    statistic: RegionStatistic,
) -> Result<Option<f64>> {
    match statistic {
        RegionStatistic::Median | RegionStatistic::Count | RegionStatistic::ShapeIndex => {
            return Err(Error::UnsupportedFeature(format!(
                "{:?} aggregation of region attributes",
                statistic
            )));
        }
        _ => {}
    }

    let summary = class_summary(store, class_col, class, value_col)?;
    Ok(summary.map(|s| match statistic {
        RegionStatistic::Min => s.min,
        RegionStatistic::Max => s.max,
        RegionStatistic::Mean => s.mean,
        RegionStatistic::Sum => s.sum,
        RegionStatistic::StdDev => s.std_dev,
        RegionStatistic::Median | RegionStatistic::Count | RegionStatistic::ShapeIndex => f64::NAN,
    }))
}
