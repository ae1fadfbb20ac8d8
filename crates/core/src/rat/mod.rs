//! Region attribute table (RAT) data structures

mod column;
mod table;

pub use column::{ClassValue, Column, ColumnType};
pub use table::{AttributeStore, AttributeTable, NamedColumn};
