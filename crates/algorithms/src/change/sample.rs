//! Attribute samples: per-region values of a class of interest

use crate::classification::PcaReducer;
use ndarray::Array2;
use ratchange_core::rat::{AttributeStore, ClassValue};
use ratchange_core::{Error, Result};
use tracing::debug;

/// Values of one change variable for the regions of a class.
///
/// `ids[i]` is the table row of `values[i]`. Rows outside the class, with a
/// non-finite value in any variable, or with a no-data value in any
/// variable are excluded. When several variables are given they are
/// reduced to their first principal component over the retained rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeSample {
    ids: Vec<usize>,
    values: Vec<f64>,
}

impl AttributeSample {
    /// Extract a sample from an attribute table.
    ///
    /// `reducer` is required when more than one column is given.
    pub fn from_table<S: AttributeStore + ?Sized>(
        store: &S,
        class_col: &str,
        class: &ClassValue,
        columns: &[String],
        no_data: &[f64],
        reducer: Option<&dyn PcaReducer>,
    ) -> Result<Self> {
        let in_class = store.read_column(class_col)?.matches(class, class_col)?;
        let data = columns
            .iter()
            .map(|name| store.read_real(name))
            .collect::<Result<Vec<_>>>()?;
        Self::from_columns(&in_class, &data, no_data, reducer)
    }

    /// Extract a sample from a class mask and parallel variable columns.
    pub fn from_columns(
        in_class: &[bool],
        columns: &[Vec<f64>],
        no_data: &[f64],
        reducer: Option<&dyn PcaReducer>,
    ) -> Result<Self> {
        if columns.is_empty() {
            return Err(Error::Configuration("no change variable columns given".into()));
        }
        let n_rows = in_class.len();
        if let Some(bad) = columns.iter().find(|c| c.len() != n_rows) {
            return Err(Error::ColumnLength {
                column: "change variable".into(),
                expected: n_rows,
                actual: bad.len(),
            });
        }
        let reducer = match reducer {
            _ if columns.len() == 1 => None,
            Some(r) => Some(r),
            None => {
                return Err(Error::MissingDependency {
                    capability: "PCA reducer",
                    reason: format!("{} change variable columns need reducing to one", columns.len()),
                })
            }
        };

        let ids: Vec<usize> = (0..n_rows)
            .filter(|&row| {
                in_class[row]
                    && columns.iter().all(|col| {
                        let v = col[row];
                        v.is_finite() && !no_data.contains(&v)
                    })
            })
            .collect();

        debug!(
            "{} of {} regions retained for {} variable(s)",
            ids.len(),
            n_rows,
            columns.len()
        );

        if ids.is_empty() {
            return Ok(Self::default());
        }

        let values = match reducer {
            None => ids.iter().map(|&row| columns[0][row]).collect(),
            Some(reducer) => {
                let matrix = Array2::from_shape_fn((ids.len(), columns.len()), |(r, c)| {
                    columns[c][ids[r]]
                });
                let projected = reducer.fit_transform(matrix.view())?;
                if projected.len() != ids.len() {
                    return Err(Error::Other(format!(
                        "PCA reducer returned {} values for {} regions",
                        projected.len(),
                        ids.len()
                    )));
                }
                projected
            }
        };

        Ok(Self { ids, values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// (row, value) pairs
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.ids.iter().copied().zip(self.values.iter().copied())
    }
}
