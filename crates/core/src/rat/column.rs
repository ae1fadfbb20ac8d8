//! Typed attribute table columns

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Storage type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Integer,
    Real,
    String,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Real => "real",
            ColumnType::String => "string",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One column of a region attribute table.
///
/// Values are aligned by region index: element `i` belongs to region `i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "lowercase")]
pub enum Column {
    Integer(Vec<i64>),
    Real(#[serde(with = "real_values")] Vec<f64>),
    String(Vec<String>),
}

impl Column {
    /// Integer column of `len` zeros
    pub fn zeros(len: usize) -> Self {
        Column::Integer(vec![0; len])
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Integer(v) => v.len(),
            Column::Real(v) => v.len(),
            Column::String(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            Column::Integer(_) => ColumnType::Integer,
            Column::Real(_) => ColumnType::Real,
            Column::String(_) => ColumnType::String,
        }
    }

    /// Numeric view of the column as `f64`.
    ///
    /// `name` is only used for the error message.
    pub fn to_f64(&self, name: &str) -> Result<Vec<f64>> {
        match self {
            Column::Integer(v) => Ok(v.iter().map(|&x| x as f64).collect()),
            Column::Real(v) => Ok(v.clone()),
            Column::String(_) => Err(Error::ColumnType {
                column: name.to_string(),
                expected: "numeric",
                actual: ColumnType::String.as_str(),
            }),
        }
    }

    /// Integer view of the column. Real columns are accepted when every
    /// value is integral.
    pub fn to_i64(&self, name: &str) -> Result<Vec<i64>> {
        let wrong_type = |actual: ColumnType| Error::ColumnType {
            column: name.to_string(),
            expected: ColumnType::Integer.as_str(),
            actual: actual.as_str(),
        };
        match self {
            Column::Integer(v) => Ok(v.clone()),
            Column::Real(v) => v
                .iter()
                .map(|&x| {
                    if x.is_finite() && x.fract() == 0.0 {
                        Ok(x as i64)
                    } else {
                        Err(wrong_type(ColumnType::Real))
                    }
                })
                .collect(),
            Column::String(_) => Err(wrong_type(ColumnType::String)),
        }
    }

    /// Per-row mask of rows equal to `class`.
    ///
    /// Numeric columns compare numerically against numeric class values,
    /// string columns compare against the textual form of the class value.
    pub fn matches(&self, class: &ClassValue, name: &str) -> Result<Vec<bool>> {
        match (self, class) {
            (Column::Integer(v), ClassValue::Integer(c)) => Ok(v.iter().map(|x| x == c).collect()),
            (Column::Integer(v), ClassValue::Real(c)) => {
                Ok(v.iter().map(|&x| x as f64 == *c).collect())
            }
            (Column::Real(v), ClassValue::Integer(c)) => {
                Ok(v.iter().map(|&x| x == *c as f64).collect())
            }
            (Column::Real(v), ClassValue::Real(c)) => Ok(v.iter().map(|x| x == c).collect()),
            (Column::String(v), class) => {
                let label = class.to_string();
                Ok(v.iter().map(|x| *x == label).collect())
            }
            (other, ClassValue::Text(_)) => Err(Error::ColumnType {
                column: name.to_string(),
                expected: ColumnType::String.as_str(),
                actual: other.column_type().as_str(),
            }),
        }
    }
}

/// Class label used to select the class of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassValue {
    Integer(i64),
    Real(f64),
    Text(String),
}

impl FromStr for ClassValue {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(v) = s.parse::<i64>() {
            return Ok(ClassValue::Integer(v));
        }
        if let Ok(v) = s.parse::<f64>() {
            return Ok(ClassValue::Real(v));
        }
        Ok(ClassValue::Text(s.to_string()))
    }
}

impl fmt::Display for ClassValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassValue::Integer(v) => write!(f, "{}", v),
            ClassValue::Real(v) => write!(f, "{}", v),
            ClassValue::Text(v) => f.write_str(v),
        }
    }
}

/// JSON has no NaN: non-finite reals are stored as `null` and read back as NaN.
mod real_values {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|v| v.is_finite().then_some(*v)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        let raw: Vec<Option<f64>> = Vec::deserialize(deserializer)?;
        Ok(raw.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }
}
