//! Statistics over attribute samples
//!
//! - **quantile**: Percentiles with linear interpolation
//! - **histogram**: Freedman-Diaconis fixed-width histograms
//! - **moments**: Skewness/kurtosis of histogram windows
//! - **region**: Per-class summaries of attribute columns

pub mod histogram;
pub mod moments;
pub mod quantile;
pub mod region;

pub use histogram::{build_histogram, Histogram, HistogramParams};
pub use moments::{window_moments, Moments};
pub use quantile::{percentile, quartiles};
pub use region::{class_statistic, class_summary, ClassSummary, RegionStatistic};
