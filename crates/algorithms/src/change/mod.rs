//! Change detection by histogram truncation
//!
//! - **measure**: threshold measures and search directions
//! - **sample**: per-class samples of one or more attribute columns
//! - **search**: truncation window search over a histogram
//! - **detector**: single-variable labelling, vote and containment combination
//! - **plot**: diagnostic histogram figures
//! - **class_names**: class name columns

mod class_names;
mod detector;
mod measure;
mod plot;
mod sample;
mod search;

pub use class_names::define_class_names;
pub use detector::{ChangeDetector, ChangeOutcome, ChangeVariableSpec, ResolvedVariable, VoteOutcome};
pub use measure::{ThresholdDirection, ThresholdMeasure};
pub use plot::{DiagnosticPlotSink, HistogramFigure, MarkerColor, PlotTarget, ThresholdMarker};
#[cfg(feature = "plot")]
pub use plot::TiffHistogramSink;
pub use sample::AttributeSample;
pub use search::{
    search, search_both, search_limited, search_lower, search_upper, SearchReport,
    ThresholdCandidates, ThresholdPair, ThresholdSearchEngine, WindowIndex, MAX_WINDOWS,
};
