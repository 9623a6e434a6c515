//! Record kinds and the partition schemes derived from them.
//!
//! The record kind decides everything downstream of the filename: which
//! columns are derived, which are dropped, and how the dataset is laid out
//! on disk.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// The three kinds of GRIB index files published by the benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// Reanalysis fields; timestamps are shifted to the valid time.
    Analysis,
    /// Operational forecasts; timestamps are the model-run initialization.
    Forecast,
    /// Reforecasts (hindcasts); same layout as forecasts.
    Reforecast,
}

impl RecordKind {
    /// All record kinds, in dataset order.
    pub const ALL: [RecordKind; 3] = [
        RecordKind::Analysis,
        RecordKind::Forecast,
        RecordKind::Reforecast,
    ];

    /// Returns the token used in filenames and dataset names.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Analysis => "analysis",
            RecordKind::Forecast => "forecast",
            RecordKind::Reforecast => "reforecast",
        }
    }

    /// Returns the physical partition layout for this kind.
    pub fn partition_scheme(&self) -> PartitionScheme {
        match self {
            RecordKind::Analysis => PartitionScheme::ValidDay,
            RecordKind::Forecast | RecordKind::Reforecast => PartitionScheme::RunDay,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "analysis" => Ok(RecordKind::Analysis),
            "forecast" => Ok(RecordKind::Forecast),
            "reforecast" => Ok(RecordKind::Reforecast),
            _ => Err(ModelError::UnknownRecordKind(s.to_string())),
        }
    }
}

/// Ordered set of columns used to subdivide a dataset into directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartitionScheme {
    /// `year/month/day` of the valid time (analysis).
    ValidDay,
    /// `version/product/year/month/day` of the model run (forecast, reforecast).
    RunDay,
}

impl PartitionScheme {
    /// Partition columns in directory nesting order.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            PartitionScheme::ValidDay => &["year", "month", "day"],
            PartitionScheme::RunDay => &["version", "product", "year", "month", "day"],
        }
    }
}
