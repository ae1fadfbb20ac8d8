//! Dimensionality reduction for multi-attribute change variables
//!
//! - **PCA**: Principal Component Analysis; the first component reduces
//!   several attribute columns to one change variable

mod pca;

pub use pca::{pca, JacobiPca, PcaParams, PcaReducer, PcaResult};
