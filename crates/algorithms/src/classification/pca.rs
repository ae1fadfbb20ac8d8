//! Principal Component Analysis of attribute samples
//!
//! Builds the covariance matrix of the valid rows of a regions × variables
//! matrix, then extracts eigenvalues/eigenvectors via Jacobi iteration.
//! Rows with any non-finite value are left out of the fit and project to NaN.

use ndarray::{Array2, ArrayView2};
use ratchange_core::{Error, Result};

/// Parameters for PCA
#[derive(Debug, Clone)]
pub struct PcaParams {
    /// Number of principal components to return (default: all)
    pub n_components: Option<usize>,
}

impl Default for PcaParams {
    fn default() -> Self {
        Self { n_components: None }
    }
}

/// Result of PCA
#[derive(Debug)]
pub struct PcaResult {
    /// Projected scores, regions × components
    pub components: Array2<f64>,
    /// Eigenvalues (variance explained by each component)
    pub eigenvalues: Vec<f64>,
    /// Proportion of variance explained by each component
    pub variance_explained: Vec<f64>,
    /// Unit eigenvectors, one per component (length = number of variables)
    pub loadings: Vec<Vec<f64>>,
}

/// Reduces a regions × variables matrix to one value per region.
pub trait PcaReducer {
    /// Scores of the first principal component, one per matrix row
    fn fit_transform(&self, matrix: ArrayView2<'_, f64>) -> Result<Vec<f64>>;
}

/// First-component reducer backed by [`pca`].
///
/// A single-variable matrix is its own first component and is passed
/// through unchanged, keeping values in their original units.
#[derive(Debug, Clone, Copy, Default)]
pub struct JacobiPca;

impl PcaReducer for JacobiPca {
    fn fit_transform(&self, matrix: ArrayView2<'_, f64>) -> Result<Vec<f64>> {
        if matrix.ncols() == 1 {
            return Ok(matrix.column(0).to_vec());
        }
        let result = pca(matrix, PcaParams { n_components: Some(1) })?;
        Ok(result.components.column(0).to_vec())
    }
}

/// Compute PCA on a regions × variables matrix.
///
/// Each eigenvector's largest-magnitude loading is made positive so the
/// projection sign is deterministic.
pub fn pca(matrix: ArrayView2<'_, f64>, params: PcaParams) -> Result<PcaResult> {
    let (n_rows, n_vars) = matrix.dim();
    if n_vars == 0 {
        return Err(Error::Configuration("PCA requires at least 1 variable".into()));
    }

    let valid_mask: Vec<bool> = matrix
        .rows()
        .into_iter()
        .map(|row| row.iter().all(|v| v.is_finite()))
        .collect();
    let n_valid = valid_mask.iter().filter(|&&v| v).count();

    if n_valid == 0 {
        return Err(Error::DegenerateDistribution(
            "no rows with finite values for PCA".into(),
        ));
    }

    // Mean of each variable
    let mut means = vec![0.0; n_vars];
    for (row, _) in matrix.rows().into_iter().zip(&valid_mask).filter(|(_, keep)| **keep) {
        for (i, v) in row.iter().enumerate() {
            means[i] += v;
        }
    }
    for m in &mut means {
        *m /= n_valid as f64;
    }

    // Covariance matrix
    let mut cov = vec![vec![0.0; n_vars]; n_vars];
    for (row, _) in matrix.rows().into_iter().zip(&valid_mask).filter(|(_, keep)| **keep) {
        for i in 0..n_vars {
            let di = row[i] - means[i];
            for j in i..n_vars {
                let dj = row[j] - means[j];
                cov[i][j] += di * dj;
            }
        }
    }
    for i in 0..n_vars {
        for j in i..n_vars {
            cov[i][j] /= (n_valid - 1).max(1) as f64;
            if j > i {
                cov[j][i] = cov[i][j];
            }
        }
    }

    let (eigenvalues, eigenvectors) = jacobi_eigen(&cov, n_vars);

    // Sort by eigenvalue descending
    let mut indices: Vec<usize> = (0..n_vars).collect();
    indices.sort_by(|&a, &b| eigenvalues[b].total_cmp(&eigenvalues[a]));

    let n_components = params.n_components.unwrap_or(n_vars).clamp(1, n_vars);
    let total_var: f64 = eigenvalues.iter().sum();

    let sorted_eigenvalues: Vec<f64> = indices
        .iter()
        .take(n_components)
        .map(|&i| eigenvalues[i])
        .collect();
    let variance_explained: Vec<f64> = sorted_eigenvalues
        .iter()
        .map(|ev| if total_var > 0.0 { ev / total_var } else { 0.0 })
        .collect();

    let loadings: Vec<Vec<f64>> = indices
        .iter()
        .take(n_components)
        .map(|&k| {
            let mut vec: Vec<f64> = (0..n_vars).map(|b| eigenvectors[b][k]).collect();
            let pivot = vec
                .iter()
                .copied()
                .fold(0.0_f64, |acc, v| if v.abs() > acc.abs() { v } else { acc });
            if pivot < 0.0 {
                vec.iter_mut().for_each(|v| *v = -*v);
            }
            vec
        })
        .collect();

    // Project rows onto principal components
    let mut components = Array2::from_elem((n_rows, n_components), f64::NAN);
    for (r, row) in matrix.rows().into_iter().enumerate() {
        if !valid_mask[r] {
            continue;
        }
        for (c, loading) in loadings.iter().enumerate() {
            components[[r, c]] = (0..n_vars).map(|b| (row[b] - means[b]) * loading[b]).sum();
        }
    }

    Ok(PcaResult {
        components,
        eigenvalues: sorted_eigenvalues,
        variance_explained,
        loadings,
    })
}

/// Jacobi eigenvalue algorithm for symmetric matrices.
///
/// Returns eigenvalues and a matrix whose columns are the eigenvectors.
fn jacobi_eigen(matrix: &[Vec<f64>], n: usize) -> (Vec<f64>, Vec<Vec<f64>>) {
    let max_iter = 100 * n * n;
    let eps = 1e-12;

    let mut a: Vec<Vec<f64>> = matrix.to_vec();

    let mut v = vec![vec![0.0; n]; n];
    for (i, row) in v.iter_mut().enumerate() {
        row[i] = 1.0;
    }

    for _ in 0..max_iter {
        // Largest off-diagonal element
        let mut max_val = 0.0;
        let mut p = 0;
        let mut q = 1;
        for i in 0..n {
            for j in (i + 1)..n {
                if a[i][j].abs() > max_val {
                    max_val = a[i][j].abs();
                    p = i;
                    q = j;
                }
            }
        }

        if max_val < eps {
            break;
        }

        let theta = if (a[p][p] - a[q][q]).abs() < eps {
            std::f64::consts::FRAC_PI_4
        } else {
            0.5 * (2.0 * a[p][q] / (a[p][p] - a[q][q])).atan()
        };

        let cos_t = theta.cos();
        let sin_t = theta.sin();

        let mut new_a = a.clone();
        for i in 0..n {
            if i != p && i != q {
                new_a[i][p] = cos_t * a[i][p] + sin_t * a[i][q];
                new_a[p][i] = new_a[i][p];
                new_a[i][q] = -sin_t * a[i][p] + cos_t * a[i][q];
                new_a[q][i] = new_a[i][q];
            }
        }
        new_a[p][p] = cos_t * cos_t * a[p][p] + 2.0 * sin_t * cos_t * a[p][q] + sin_t * sin_t * a[q][q];
        new_a[q][q] = sin_t * sin_t * a[p][p] - 2.0 * sin_t * cos_t * a[p][q] + cos_t * cos_t * a[q][q];
        new_a[p][q] = 0.0;
        new_a[q][p] = 0.0;
        a = new_a;

        for row in v.iter_mut() {
            let vip = row[p];
            let viq = row[q];
            row[p] = cos_t * vip + sin_t * viq;
            row[q] = -sin_t * vip + cos_t * viq;
        }
    }

    let eigenvalues: Vec<f64> = (0..n).map(|i| a[i][i]).collect();
    (eigenvalues, v)
}
