//! Change detection over region attribute tables
//!
//! [`ChangeDetector::find_change`] labels the regions of one class by where
//! their change variable falls relative to the searched no-change range.
//! Several variables are combined either by counting change labels
//! ([`ChangeDetector::combine_by_vote`]) or by requiring a region to lie
//! inside every variable's range ([`ChangeDetector::combine_by_containment`]).

use crate::change::measure::{ThresholdDirection, ThresholdMeasure};
use crate::change::plot::{DiagnosticPlotSink, HistogramFigure, PlotTarget};
use crate::change::sample::AttributeSample;
use crate::change::search::{SearchReport, ThresholdPair, ThresholdSearchEngine};
use crate::classification::{JacobiPca, PcaReducer};
use crate::statistics::HistogramParams;
use ratchange_core::rat::{AttributeStore, ClassValue, Column};
use ratchange_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// One change variable: the column(s) searched and where labels go
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeVariableSpec {
    /// Source columns; more than one is reduced by PCA
    pub columns: Vec<String>,
    /// Integer column receiving the change labels
    pub output_column: String,
    /// Values treated as missing in any source column
    #[serde(default)]
    pub no_data: Vec<f64>,
    #[serde(default)]
    pub measure: ThresholdMeasure,
    #[serde(default)]
    pub direction: ThresholdDirection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plot: Option<PlotTarget>,
}

impl ChangeVariableSpec {
    /// Single-column variable with default measure and direction
    pub fn new(column: impl Into<String>, output_column: impl Into<String>) -> Self {
        Self {
            columns: vec![column.into()],
            output_column: output_column.into(),
            no_data: Vec::new(),
            measure: ThresholdMeasure::default(),
            direction: ThresholdDirection::default(),
            plot: None,
        }
    }

    pub fn with_direction(mut self, direction: ThresholdDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_measure(mut self, measure: ThresholdMeasure) -> Self {
        self.measure = measure;
        self
    }

    pub fn with_no_data(mut self, no_data: Vec<f64>) -> Self {
        self.no_data = no_data;
        self
    }

    pub fn with_plot(mut self, plot: PlotTarget) -> Self {
        self.plot = Some(plot);
        self
    }
}

/// A variable spec with the thresholds found for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedVariable {
    #[serde(flatten)]
    pub spec: ChangeVariableSpec,
    /// `None` when the class had no usable regions
    pub thresholds: Option<ThresholdPair>,
}

/// Result of a single-variable search
#[derive(Debug, Clone)]
pub struct ChangeOutcome {
    pub thresholds: Option<ThresholdPair>,
    pub report: Option<SearchReport>,
    /// Label per table row, as written to the output column
    pub labels: Vec<i64>,
    /// Regions that entered the search
    pub sample_size: usize,
}

/// Result of a vote over several variables
#[derive(Debug, Clone)]
pub struct VoteOutcome {
    pub resolved: Vec<ResolvedVariable>,
    /// Number of variables flagging change, per table row
    pub votes: Vec<i64>,
}

/// Threshold search and label writing for a class of regions
pub struct ChangeDetector {
    engine: ThresholdSearchEngine,
    reducer: Option<Box<dyn PcaReducer>>,
    plot_sink: Option<Box<dyn DiagnosticPlotSink>>,
}

impl Default for ChangeDetector {
    fn default() -> Self {
        Self {
            engine: ThresholdSearchEngine::default(),
            reducer: Some(Box::new(JacobiPca)),
            plot_sink: None,
        }
    }
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_histogram_params(mut self, params: HistogramParams) -> Self {
        self.engine.histogram = params;
        self
    }

    /// Largest truncation grid a search may score
    pub fn with_max_windows(mut self, max_windows: usize) -> Self {
        self.engine.max_windows = max_windows;
        self
    }

    pub fn with_reducer(mut self, reducer: Box<dyn PcaReducer>) -> Self {
        self.reducer = Some(reducer);
        self
    }

    /// Detector that rejects multi-column variables
    pub fn without_pca(mut self) -> Self {
        self.reducer = None;
        self
    }

    pub fn with_plot_sink(mut self, sink: Box<dyn DiagnosticPlotSink>) -> Self {
        self.plot_sink = Some(sink);
        self
    }

    /// Fail before any work when `spec` needs a capability this detector lacks
    fn check_capabilities(&self, spec: &ChangeVariableSpec) -> Result<()> {
        if spec.columns.is_empty() {
            return Err(Error::Configuration(format!(
                "change variable '{}' has no source columns",
                spec.output_column
            )));
        }
        if spec.output_column.is_empty() {
            return Err(Error::Configuration("empty output column name".into()));
        }
        if spec.columns.len() > 1 && self.reducer.is_none() {
            return Err(Error::MissingDependency {
                capability: "PCA reducer",
                reason: format!(
                    "variable '{}' combines {} columns",
                    spec.output_column,
                    spec.columns.len()
                ),
            });
        }
        if spec.plot.is_some() && self.plot_sink.is_none() {
            return Err(Error::MissingDependency {
                capability: "diagnostic plot sink",
                reason: format!("a histogram plot was requested for '{}'", spec.output_column),
            });
        }
        Ok(())
    }

    /// Search the no-change range of one variable over the regions of
    /// `class` and write change labels to `spec.output_column`.
    ///
    /// Regions outside the class, or excluded by no-data, get 0. When no
    /// region qualifies the output column is all zeros and no thresholds
    /// are returned.
    pub fn find_change<S: AttributeStore + ?Sized>(
        &self,
        store: &mut S,
        class_col: &str,
        class: &ClassValue,
        spec: &ChangeVariableSpec,
    ) -> Result<ChangeOutcome> {
        self.check_capabilities(spec)?;

        let sample = AttributeSample::from_table(
            &*store,
            class_col,
            class,
            &spec.columns,
            &spec.no_data,
            self.reducer.as_deref(),
        )?;

        let mut labels = vec![0i64; store.num_rows()];
        if sample.is_empty() {
            warn!(
                "No regions of class {} left for '{}', writing zeros",
                class, spec.output_column
            );
            store.write_column(&spec.output_column, Column::zeros(labels.len()))?;
            return Ok(ChangeOutcome {
                thresholds: None,
                report: None,
                labels,
                sample_size: 0,
            });
        }

        info!(
            "Searching {} ({}) over {} regions of class {}",
            spec.columns.join("+"),
            spec.direction,
            sample.len(),
            class
        );
        let report = self.engine.run(sample.values(), spec.direction, spec.measure)?;
        let thresholds = report.thresholds;

        for (row, value) in sample.iter() {
            labels[row] = thresholds.classify(value, spec.direction);
        }
        let changed = labels.iter().filter(|&&l| l != 0).count();
        debug!("{} of {} regions flagged", changed, sample.len());

        store.write_column(&spec.output_column, Column::Integer(labels.clone()))?;

        if let (Some(target), Some(sink)) = (&spec.plot, &self.plot_sink) {
            let figure = HistogramFigure::from_report(spec.output_column.as_str(), &report, target);
            sink.render(&figure)?;
        }

        Ok(ChangeOutcome {
            thresholds: Some(thresholds),
            report: Some(report),
            labels,
            sample_size: sample.len(),
        })
    }

    /// Run [`find_change`](Self::find_change) for every spec and write the
    /// number of variables flagging change to `output_column`.
    ///
    /// Two-sided labels count as one vote whichever side they fall on.
    pub fn combine_by_vote<S: AttributeStore + ?Sized>(
        &self,
        store: &mut S,
        class_col: &str,
        class: &ClassValue,
        specs: &[ChangeVariableSpec],
        output_column: &str,
    ) -> Result<VoteOutcome> {
        if specs.is_empty() {
            return Err(Error::Configuration("no change variables to vote over".into()));
        }
        for spec in specs {
            self.check_capabilities(spec)?;
        }

        let mut votes = vec![0i64; store.num_rows()];
        let mut resolved = Vec::with_capacity(specs.len());
        for spec in specs {
            let outcome = self.find_change(store, class_col, class, spec)?;
            let labels = store.read_integer(&spec.output_column)?;
            for (vote, label) in votes.iter_mut().zip(labels) {
                *vote += match (spec.direction, label) {
                    (_, 0) => 0,
                    (ThresholdDirection::LowerUpper, 2) => 1,
                    (_, l) => l,
                };
            }
            resolved.push(ResolvedVariable {
                spec: spec.clone(),
                thresholds: outcome.thresholds,
            });
        }

        store.write_column(output_column, Column::Integer(votes.clone()))?;
        info!(
            "Wrote votes of {} variables to '{}'",
            specs.len(),
            output_column
        );

        Ok(VoteOutcome { resolved, votes })
    }

    /// Mark regions of `class` whose every variable lies strictly inside
    /// its resolved no-change range.
    ///
    /// The output starts from the first variable (1 inside, 0 outside) and
    /// each further variable zeroes the regions outside its range. Variables
    /// without thresholds contain no region.
    ///
    /// # Errors
    /// `Configuration` for an empty list or a multi-column variable, whose
    /// thresholds are not in the units of any single column.
    pub fn combine_by_containment<S: AttributeStore + ?Sized>(
        &self,
        store: &mut S,
        class_col: &str,
        class: &ClassValue,
        resolved: &[ResolvedVariable],
        output_column: &str,
    ) -> Result<Vec<i64>> {
        let Some((first, rest)) = resolved.split_first() else {
            return Err(Error::Configuration("no resolved variables to combine".into()));
        };
        if let Some(multi) = resolved.iter().find(|r| r.spec.columns.len() != 1) {
            return Err(Error::Configuration(format!(
                "containment needs single-column variables, '{}' has {}",
                multi.spec.output_column,
                multi.spec.columns.len()
            )));
        }

        let in_class = store.read_column(class_col)?.matches(class, class_col)?;
        let inside = |var: &ResolvedVariable| -> Result<Vec<bool>> {
            let values = store.read_real(&var.spec.columns[0])?;
            Ok(values
                .iter()
                .zip(&in_class)
                .map(|(&v, &member)| member && var.thresholds.map_or(false, |t| t.contains(v)))
                .collect())
        };

        let mut within: Vec<i64> = inside(first)?.into_iter().map(i64::from).collect();
        for var in rest {
            for (acc, keep) in within.iter_mut().zip(inside(var)?) {
                if !keep {
                    *acc = 0;
                }
            }
        }

        let count = within.iter().filter(|&&v| v != 0).count();
        info!(
            "{} regions of class {} within all {} ranges",
            count,
            class,
            resolved.len()
        );
        store.write_column(output_column, Column::Integer(within.clone()))?;
        Ok(within)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratchange_core::rat::AttributeTable;

    /// Class 1: binomial core at 50..=60 plus 30 low outliers; class 2: noise
    fn table() -> (AttributeTable, usize) {
        let binom = [1, 10, 45, 120, 210, 252, 210, 120, 45, 10, 1];
        let mut v: Vec<f64> = (0..30).map(|i| i as f64 * 0.1).collect();
        for (k, &c) in binom.iter().enumerate() {
            v.extend(std::iter::repeat(50.0 + k as f64).take(c));
        }
        let n_class1 = v.len();
        let mut class = vec![1i64; n_class1];
        for i in 0..20 {
            v.push(1000.0 + i as f64);
            class.push(2);
        }
        let w: Vec<f64> = v.iter().map(|x| x * 2.0 + 1.0).collect();
        let rat = AttributeTable::from_columns([
            ("class", Column::Integer(class)),
            ("v", Column::Real(v)),
            ("w", Column::Real(w)),
        ])
        .unwrap();
        (rat, n_class1)
    }

    #[test]
    fn test_find_change_labels_outliers() {
        let (mut rat, n_class1) = table();
        let spec = ChangeVariableSpec::new("v", "v_change").with_measure(ThresholdMeasure::Skewness);
        let outcome = ChangeDetector::default()
            .find_change(&mut rat, "class", &ClassValue::Integer(1), &spec)
            .unwrap();

        assert_eq!(outcome.sample_size, n_class1);
        let labels = rat.read_integer("v_change").unwrap();
        assert_eq!(labels, outcome.labels);
        assert!(labels[..30].iter().all(|&l| l == 1));
        assert!(labels[n_class1..].iter().all(|&l| l == 0));
        assert!(outcome.thresholds.unwrap().lower > 2.9);
    }

    #[test]
    fn test_empty_class_writes_zeros() {
        let (mut rat, _) = table();
        let spec = ChangeVariableSpec::new("v", "out");
        let outcome = ChangeDetector::default()
            .find_change(&mut rat, "class", &ClassValue::Integer(9), &spec)
            .unwrap();
        assert!(outcome.thresholds.is_none());
        assert!(rat.read_integer("out").unwrap().iter().all(|&l| l == 0));
    }

    #[test]
    fn test_single_column_ignores_reducer() {
        let (mut a, _) = table();
        let (mut b, _) = table();
        let spec = ChangeVariableSpec::new("v", "out").with_direction(ThresholdDirection::LowerUpper);
        let class = ClassValue::Integer(1);
        let with_pca = ChangeDetector::default()
            .find_change(&mut a, "class", &class, &spec)
            .unwrap();
        let direct = ChangeDetector::default()
            .without_pca()
            .find_change(&mut b, "class", &class, &spec)
            .unwrap();
        assert_eq!(with_pca.thresholds, direct.thresholds);
        assert_eq!(with_pca.labels, direct.labels);
    }

    #[test]
    fn test_single_column_first_component_is_identity() {
        let (rat, n_class1) = table();
        let v = rat.read_real("v").unwrap();
        let matrix = ndarray::Array2::from_shape_vec((n_class1, 1), v[..n_class1].to_vec()).unwrap();
        let projected = JacobiPca.fit_transform(matrix.view()).unwrap();
        assert_eq!(projected, v[..n_class1].to_vec());

        // Searching the projection gives the thresholds of the raw column
        let engine = ThresholdSearchEngine::default();
        let raw = engine
            .run(&v[..n_class1], ThresholdDirection::LowerUpper, ThresholdMeasure::Auto)
            .unwrap();
        let reduced = engine
            .run(&projected, ThresholdDirection::LowerUpper, ThresholdMeasure::Auto)
            .unwrap();
        assert_eq!(raw.thresholds, reduced.thresholds);
    }

    #[test]
    fn test_missing_capabilities_fail_early() {
        let (mut rat, _) = table();
        let class = ClassValue::Integer(1);

        let mut multi = ChangeVariableSpec::new("v", "out");
        multi.columns.push("w".into());
        let err = ChangeDetector::default()
            .without_pca()
            .find_change(&mut rat, "class", &class, &multi)
            .unwrap_err();
        assert!(matches!(err, Error::MissingDependency { .. }));

        let plotted = ChangeVariableSpec::new("v", "out").with_plot(PlotTarget {
            path: "h.tif".into(),
            show_all: false,
        });
        let err = ChangeDetector::default()
            .find_change(&mut rat, "class", &class, &plotted)
            .unwrap_err();
        assert!(matches!(err, Error::MissingDependency { .. }));
        assert!(!rat.has_column("out"));
    }

    #[test]
    fn test_multi_column_search() {
        let (mut rat, _) = table();
        let mut spec = ChangeVariableSpec::new("v", "vw_change").with_measure(ThresholdMeasure::Skewness);
        spec.columns.push("w".into());
        let outcome = ChangeDetector::default()
            .find_change(&mut rat, "class", &ClassValue::Integer(1), &spec)
            .unwrap();
        assert!(outcome.thresholds.is_some());
        assert!(outcome.labels[..30].iter().all(|&l| l == 1));
    }

    #[test]
    fn test_vote_counts_flagging_variables() {
        let (mut rat, n_class1) = table();
        let specs = vec![
            ChangeVariableSpec::new("v", "v_change"),
            ChangeVariableSpec::new("w", "w_change").with_direction(ThresholdDirection::LowerUpper),
        ];
        let outcome = ChangeDetector::default()
            .combine_by_vote(&mut rat, "class", &ClassValue::Integer(1), &specs, "votes")
            .unwrap();

        assert_eq!(outcome.resolved.len(), 2);
        let votes = rat.read_integer("votes").unwrap();
        assert_eq!(votes, outcome.votes);
        assert!(votes.iter().all(|&v| (0..=2).contains(&v)));
        assert!(votes[..30].iter().all(|&v| v == 2));
        assert!(votes[n_class1..].iter().all(|&v| v == 0));
    }

    #[test]
    fn test_vote_needs_variables() {
        let (mut rat, _) = table();
        let err = ChangeDetector::default()
            .combine_by_vote(&mut rat, "class", &ClassValue::Integer(1), &[], "votes")
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    fn resolved(column: &str, lower: f64, upper: f64) -> ResolvedVariable {
        ResolvedVariable {
            spec: ChangeVariableSpec::new(column, format!("{}_change", column)),
            thresholds: Some(ThresholdPair::new(lower, upper)),
        }
    }

    #[test]
    fn test_containment_fold() {
        let mut rat = AttributeTable::from_columns([
            ("class", Column::Integer(vec![1, 1, 1, 1, 2])),
            ("a", Column::Real(vec![1.0, 5.0, 5.0, 9.0, 5.0])),
            ("b", Column::Real(vec![5.0, 5.0, 0.0, 5.0, 5.0])),
        ])
        .unwrap();
        let class = ClassValue::Integer(1);
        let detector = ChangeDetector::default();

        let one = detector
            .combine_by_containment(&mut rat, "class", &class, &[resolved("a", 2.0, 8.0)], "within")
            .unwrap();
        assert_eq!(one, vec![0, 1, 1, 0, 0]);

        let two = detector
            .combine_by_containment(
                &mut rat,
                "class",
                &class,
                &[resolved("a", 2.0, 8.0), resolved("b", 1.0, 6.0)],
                "within",
            )
            .unwrap();
        assert_eq!(two, vec![0, 1, 0, 0, 0]);
        assert_eq!(rat.read_integer("within").unwrap(), two);

        // Bounds are exclusive
        let edge = detector
            .combine_by_containment(&mut rat, "class", &class, &[resolved("a", 1.0, 9.0)], "within")
            .unwrap();
        assert_eq!(edge, vec![0, 1, 1, 0, 0]);
    }

    #[test]
    fn test_containment_rejects_bad_input() {
        let (mut rat, _) = table();
        let class = ClassValue::Integer(1);
        let detector = ChangeDetector::default();

        let err = detector
            .combine_by_containment(&mut rat, "class", &class, &[], "within")
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));

        let mut multi = resolved("v", 0.0, 1.0);
        multi.spec.columns.push("w".into());
        let err = detector
            .combine_by_containment(&mut rat, "class", &class, &[multi], "within")
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_containment_without_thresholds() {
        let (mut rat, _) = table();
        let var = ResolvedVariable {
            spec: ChangeVariableSpec::new("v", "v_change"),
            thresholds: None,
        };
        let within = ChangeDetector::default()
            .combine_by_containment(&mut rat, "class", &ClassValue::Integer(1), &[var], "within")
            .unwrap();
        assert!(within.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_resolved_json_roundtrip() {
        let var = resolved("v", 1.5, 8.0);
        let json = serde_json::to_string(&var).unwrap();
        assert!(json.contains("\"thresholds\""));
        let back: ResolvedVariable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, var);

        let spec: ChangeVariableSpec =
            serde_json::from_str(r#"{"columns": ["v"], "output_column": "out", "direction": "both"}"#)
                .unwrap();
        assert_eq!(spec.direction, ThresholdDirection::LowerUpper);
        assert_eq!(spec.measure, ThresholdMeasure::Auto);
    }
}
