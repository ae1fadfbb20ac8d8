//! # ratchange core
//!
//! Core types and I/O for region attribute table change detection.
//!
//! This crate provides:
//! - `AttributeTable`: in-memory region attribute table (one row per clump)
//! - `AttributeStore`: column read/write interface used by the algorithms
//! - `Column` / `ClassValue`: typed columns and class labels
//! - JSON persistence of attribute tables

pub mod error;
pub mod io;
pub mod rat;

pub use error::{Error, Result};
pub use rat::{AttributeStore, AttributeTable, ClassValue, Column, ColumnType};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::rat::{AttributeStore, AttributeTable, ClassValue, Column, ColumnType};
}
