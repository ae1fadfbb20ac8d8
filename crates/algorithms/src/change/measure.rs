//! Threshold measures and search directions

use ratchange_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Score used to pick the truncation that defines the no-change range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdMeasure {
    /// Minimum |kurtosis|
    Kurtosis,
    /// Minimum |skewness|
    Skewness,
    /// Minimum of normalized |kurtosis| + normalized |skewness|
    Combined,
    /// Skewness when kurtosis and skewness disagree by more than the IQR,
    /// combined otherwise
    #[default]
    Auto,
}

impl ThresholdMeasure {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThresholdMeasure::Kurtosis => "kurtosis",
            ThresholdMeasure::Skewness => "skewness",
            ThresholdMeasure::Combined => "combined",
            ThresholdMeasure::Auto => "auto",
        }
    }
}

impl FromStr for ThresholdMeasure {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "kurtosis" | "kurt" => Ok(ThresholdMeasure::Kurtosis),
            "skewness" | "skew" => Ok(ThresholdMeasure::Skewness),
            "combined" | "comb" => Ok(ThresholdMeasure::Combined),
            "auto" => Ok(ThresholdMeasure::Auto),
            other => Err(Error::Configuration(format!(
                "unknown threshold measure '{}', use kurtosis, skewness, combined or auto",
                other
            ))),
        }
    }
}

impl fmt::Display for ThresholdMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side(s) of the histogram may hold change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdDirection {
    /// Change lies below the lower threshold
    #[default]
    Lower,
    /// Change lies above the upper threshold
    Upper,
    /// Change lies on both sides
    #[serde(alias = "both")]
    LowerUpper,
}

impl ThresholdDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThresholdDirection::Lower => "lower",
            ThresholdDirection::Upper => "upper",
            ThresholdDirection::LowerUpper => "lowerupper",
        }
    }
}

impl FromStr for ThresholdDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "lower" => Ok(ThresholdDirection::Lower),
            "upper" => Ok(ThresholdDirection::Upper),
            "lowerupper" | "both" | "two-sided" => Ok(ThresholdDirection::LowerUpper),
            other => Err(Error::Configuration(format!(
                "unknown threshold direction '{}', use lower, upper or lowerupper",
                other
            ))),
        }
    }
}

impl fmt::Display for ThresholdDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
