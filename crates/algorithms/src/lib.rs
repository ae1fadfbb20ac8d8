//! # ratchange algorithms
//!
//! Threshold search and change labelling for region attribute tables.
//!
//! ## Available Algorithm Categories
//!
//! - **statistics**: Percentiles, Freedman-Diaconis histograms, window moments, class summaries
//! - **classification**: PCA reduction of multi-column change variables
//! - **change**: Skewness/kurtosis threshold search, vote and containment combination

pub mod change;
pub mod classification;
pub(crate) mod maybe_rayon;
pub mod statistics;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::change::{
        define_class_names, search, search_both, search_limited, search_lower, search_upper,
        AttributeSample,
        ChangeDetector, ChangeOutcome, ChangeVariableSpec, DiagnosticPlotSink, HistogramFigure,
        PlotTarget, ResolvedVariable, SearchReport, ThresholdCandidates, ThresholdDirection,
        ThresholdMeasure, ThresholdPair, ThresholdSearchEngine, VoteOutcome,
    };
    #[cfg(feature = "plot")]
    pub use crate::change::TiffHistogramSink;
    pub use crate::classification::{pca, JacobiPca, PcaParams, PcaReducer, PcaResult};
    pub use crate::statistics::{
        build_histogram, percentile, quartiles, window_moments, Histogram, HistogramParams,
        Moments,
    };
    pub use ratchange_core::prelude::*;
}
