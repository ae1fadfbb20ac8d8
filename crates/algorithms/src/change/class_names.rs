//! Class name column from class numbers

use ratchange_core::rat::{AttributeStore, Column};
use ratchange_core::Result;
use std::collections::HashMap;
use tracing::debug;

/// Write a string column naming each region's class.
///
/// `class_num_col` must hold integer class numbers. Rows whose number has
/// no entry in `names` get an empty name.
pub fn define_class_names<S: AttributeStore + ?Sized>(
    store: &mut S,
    class_num_col: &str,
    class_name_col: &str,
    names: &HashMap<i64, String>,
) -> Result<()> {
    let numbers = store.read_integer(class_num_col)?;
    let labels: Vec<String> = numbers
        .iter()
        .map(|n| names.get(n).cloned().unwrap_or_default())
        .collect();

    let unnamed = labels.iter().filter(|l| l.is_empty()).count();
    debug!(
        "Named {} of {} regions in '{}'",
        labels.len() - unnamed,
        labels.len(),
        class_name_col
    );

    store.write_column(class_name_col, Column::String(labels))
}
