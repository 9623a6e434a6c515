//! Normalized rows, batches and partition keys.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::kind::{PartitionScheme, RecordKind};
use crate::value::FieldValue;

/// Column holding the provenance path of the archive member a row came from.
pub const PATH_COLUMN: &str = "_path";

/// Directory value Hive-style readers use for a null partition value.
pub const HIVE_NULL_PARTITION: &str = "__HIVE_DEFAULT_PARTITION__";

/// Fields whose derivation depends on the record kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RowDetail {
    /// Analysis rows carry the hour of the valid time.
    Analysis { hour: i32 },
    /// Forecast and reforecast rows carry run metadata and the member id.
    Forecast {
        version: Option<i64>,
        product: String,
        number: i64,
    },
}

/// One row of a committed dataset.
///
/// `year`, `month` and `day` are the valid day for analysis rows and the
/// model-run initialization day for forecast rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRow {
    pub param: String,
    pub path: String,
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub detail: RowDetail,
    /// Columns carried through unchanged, keyed by column name.
    pub extra: BTreeMap<String, FieldValue>,
}

impl NormalizedRow {
    pub fn hour(&self) -> Option<i32> {
        match &self.detail {
            RowDetail::Analysis { hour } => Some(*hour),
            RowDetail::Forecast { .. } => None,
        }
    }

    pub fn number(&self) -> Option<i64> {
        match &self.detail {
            RowDetail::Forecast { number, .. } => Some(*number),
            RowDetail::Analysis { .. } => None,
        }
    }

    /// Partition key of this row under `scheme`.
    pub fn partition_key(&self, scheme: PartitionScheme) -> PartitionKey {
        let values = scheme
            .columns()
            .iter()
            .map(|column| (*column, self.partition_value(column)))
            .collect();
        PartitionKey { values }
    }

    fn partition_value(&self, column: &str) -> PartitionValue {
        match (column, &self.detail) {
            ("year", _) => PartitionValue::Int(i64::from(self.year)),
            ("month", _) => PartitionValue::Int(i64::from(self.month)),
            ("day", _) => PartitionValue::Int(i64::from(self.day)),
            ("version", RowDetail::Forecast { version, .. }) => {
                version.map_or(PartitionValue::Null, PartitionValue::Int)
            }
            ("product", RowDetail::Forecast { product, .. }) => {
                PartitionValue::Text(product.clone())
            }
            _ => PartitionValue::Null,
        }
    }
}

/// A single partition column value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PartitionValue {
    Null,
    Int(i64),
    Text(String),
}

impl PartitionValue {
    /// Parse a directory segment value; the Hive null marker maps to `Null`.
    pub fn from_segment(column: &str, raw: &str) -> Self {
        if raw == HIVE_NULL_PARTITION {
            return PartitionValue::Null;
        }
        if column == "product" {
            return PartitionValue::Text(raw.to_string());
        }
        match raw.parse::<i64>() {
            Ok(value) => PartitionValue::Int(value),
            Err(_) => PartitionValue::Text(raw.to_string()),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PartitionValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for PartitionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartitionValue::Null => f.write_str(HIVE_NULL_PARTITION),
            PartitionValue::Int(v) => write!(f, "{v}"),
            PartitionValue::Text(s) => f.write_str(s),
        }
    }
}

/// Ordered partition column values identifying one partition directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartitionKey {
    pub values: Vec<(&'static str, PartitionValue)>,
}

impl PartitionKey {
    /// Hive-style relative directory, e.g. `year=2017/month=1/day=1`.
    pub fn relative_dir(&self) -> String {
        self.values
            .iter()
            .map(|(column, value)| format!("{column}={value}"))
            .collect::<Vec<_>>()
            .join("/")
    }

    pub fn get(&self, column: &str) -> Option<&PartitionValue> {
        self.values
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.relative_dir())
    }
}

/// The normalizer's output for one source file.
///
/// All rows share `record_kind` and `partition_scheme`.
#[derive(Debug, Clone)]
pub struct NormalizedBatch {
    pub record_kind: RecordKind,
    pub partition_scheme: PartitionScheme,
    pub rows: Vec<NormalizedRow>,
    pub distinct_paths: BTreeSet<String>,
}

impl NormalizedBatch {
    /// Build a batch, collecting the distinct provenance paths from `rows`.
    pub fn new(record_kind: RecordKind, rows: Vec<NormalizedRow>) -> Self {
        let distinct_paths = rows.iter().map(|row| row.path.clone()).collect();
        Self {
            record_kind,
            partition_scheme: record_kind.partition_scheme(),
            rows,
            distinct_paths,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows grouped by partition key, preserving row order inside each group.
    pub fn partitions(&self) -> BTreeMap<PartitionKey, Vec<&NormalizedRow>> {
        let mut groups: BTreeMap<PartitionKey, Vec<&NormalizedRow>> = BTreeMap::new();
        for row in &self.rows {
            groups
                .entry(row.partition_key(self.partition_scheme))
                .or_default()
                .push(row);
        }
        groups
    }
}
