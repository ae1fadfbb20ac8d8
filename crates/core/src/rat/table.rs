//! In-memory region attribute table

use crate::error::{Error, Result};
use crate::rat::{Column, ColumnType};
use serde::{Deserialize, Serialize};

/// Access to the columns of a region attribute table.
///
/// Every column holds one value per region, aligned by region index.
/// Readers receive owned copies; writers replace or append a whole column.
pub trait AttributeStore {
    /// Number of regions (rows)
    fn num_rows(&self) -> usize;

    /// Column names in table order
    fn column_names(&self) -> Vec<String>;

    /// Read a full column
    fn read_column(&self, name: &str) -> Result<Column>;

    /// Write a full column, replacing any column with the same name
    fn write_column(&mut self, name: &str, column: Column) -> Result<()>;

    /// Read a numeric column as `f64`
    fn read_real(&self, name: &str) -> Result<Vec<f64>> {
        self.read_column(name)?.to_f64(name)
    }

    /// Read a column as integers
    fn read_integer(&self, name: &str) -> Result<Vec<i64>> {
        self.read_column(name)?.to_i64(name)
    }
}

/// A named column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedColumn {
    pub name: String,
    pub data: Column,
}

/// Region attribute table held in memory.
///
/// Row `i` describes region (clump) `i`. Columns keep their insertion order.
///
/// # Example
///
/// ```ignore
/// use ratchange_core::rat::{AttributeStore, AttributeTable, Column};
///
/// let mut rat = AttributeTable::with_rows(3);
/// rat.write_column("class", Column::Integer(vec![0, 1, 1]))?;
/// let class = rat.read_integer("class")?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeTable {
    num_rows: usize,
    columns: Vec<NamedColumn>,
}

impl AttributeTable {
    /// Create an empty table with a fixed number of regions
    pub fn with_rows(num_rows: usize) -> Self {
        Self {
            num_rows,
            columns: Vec::new(),
        }
    }

    /// Build a table from named columns; all columns must have the same length
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Column)>,
        S: Into<String>,
    {
        let mut columns = columns.into_iter().peekable();
        let num_rows = columns.peek().map(|(_, c)| c.len()).unwrap_or(0);
        let mut table = Self::with_rows(num_rows);
        for (name, column) in columns {
            let name: String = name.into();
            table.write_column(&name, column)?;
        }
        Ok(table)
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Borrow a column without copying
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.data)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    /// (name, type) pairs in table order
    pub fn schema(&self) -> Vec<(&str, ColumnType)> {
        self.columns
            .iter()
            .map(|c| (c.name.as_str(), c.data.column_type()))
            .collect()
    }

    /// Check internal consistency after deserialization
    pub fn validate(&self) -> Result<()> {
        for c in &self.columns {
            if c.data.len() != self.num_rows {
                return Err(Error::ColumnLength {
                    column: c.name.clone(),
                    expected: self.num_rows,
                    actual: c.data.len(),
                });
            }
        }
        Ok(())
    }
}

impl AttributeStore for AttributeTable {
    fn num_rows(&self) -> usize {
        self.num_rows
    }

    fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    fn read_column(&self, name: &str) -> Result<Column> {
        self.column(name).cloned()
    }

    fn write_column(&mut self, name: &str, column: Column) -> Result<()> {
        if column.len() != self.num_rows {
            return Err(Error::ColumnLength {
                column: name.to_string(),
                expected: self.num_rows,
                actual: column.len(),
            });
        }

        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.data = column,
            None => self.columns.push(NamedColumn {
                name: name.to_string(),
                data: column,
            }),
        }
        Ok(())
    }
}
