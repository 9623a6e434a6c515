//! Assembling normalized rows into Polars DataFrames.
//!
//! Passthrough columns are typed over the whole batch before any partition
//! is built, so every part file of a batch agrees on the column types. A
//! passthrough column with no value in the whole batch is left out; it has
//! no type to agree on with other batches.

use std::collections::BTreeMap;

use polars::prelude::*;

use crate::error::Result;
use crate::kind::PartitionScheme;
use crate::row::{NormalizedBatch, NormalizedRow, PATH_COLUMN, RowDetail};
use crate::value::FieldValue;

/// Physical type chosen for a passthrough column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Boolean,
    Int64,
    Float64,
    String,
}

#[derive(Debug, Default, Clone, Copy)]
struct ValueStats {
    bools: usize,
    ints: usize,
    floats: usize,
    texts: usize,
}

impl ValueStats {
    fn observe(&mut self, value: &FieldValue) {
        match value {
            FieldValue::Null => {}
            FieldValue::Bool(_) => self.bools += 1,
            FieldValue::Int(_) => self.ints += 1,
            FieldValue::Float(_) => self.floats += 1,
            FieldValue::Text(_) => self.texts += 1,
        }
    }

    /// `None` when only nulls were observed.
    fn column_type(self) -> Option<ColumnType> {
        match (self.bools, self.ints, self.floats, self.texts) {
            (0, 0, 0, 0) => None,
            (_, 0, 0, 0) => Some(ColumnType::Boolean),
            (0, _, 0, 0) => Some(ColumnType::Int64),
            (0, _, _, 0) => Some(ColumnType::Float64),
            _ => Some(ColumnType::String),
        }
    }
}

/// Column layout shared by every frame built from one batch.
#[derive(Debug, Clone)]
pub struct FrameLayout {
    scheme: PartitionScheme,
    extras: Vec<(String, ColumnType)>,
}

impl FrameLayout {
    /// Infer passthrough column types from all rows of `batch`.
    pub fn infer(batch: &NormalizedBatch) -> Self {
        let mut stats: BTreeMap<&str, ValueStats> = BTreeMap::new();
        for row in &batch.rows {
            for (name, value) in &row.extra {
                stats.entry(name.as_str()).or_default().observe(value);
            }
        }
        let extras = stats
            .into_iter()
            .filter_map(|(name, stats)| Some((name.to_string(), stats.column_type()?)))
            .collect();
        Self {
            scheme: batch.partition_scheme,
            extras,
        }
    }

    /// Passthrough columns and their chosen types, sorted by name.
    pub fn extras(&self) -> &[(String, ColumnType)] {
        &self.extras
    }

    /// Build a frame from `rows`.
    ///
    /// Part files are written without partition columns; those live in the
    /// directory names.
    pub fn build(&self, rows: &[&NormalizedRow], include_partitions: bool) -> Result<DataFrame> {
        let mut columns: Vec<Column> = Vec::new();

        if include_partitions {
            for name in self.scheme.columns() {
                columns.push(partition_series(name, rows).into_column());
            }
        }

        let params: Vec<&str> = rows.iter().map(|row| row.param.as_str()).collect();
        columns.push(Series::new("param".into(), params).into_column());
        let paths: Vec<&str> = rows.iter().map(|row| row.path.as_str()).collect();
        columns.push(Series::new(PATH_COLUMN.into(), paths).into_column());

        match self.scheme {
            PartitionScheme::ValidDay => {
                let hours: Vec<Option<i32>> = rows.iter().map(|row| row.hour()).collect();
                columns.push(Series::new("hour".into(), hours).into_column());
            }
            PartitionScheme::RunDay => {
                let numbers: Vec<Option<i64>> = rows.iter().map(|row| row.number()).collect();
                columns.push(Series::new("number".into(), numbers).into_column());
            }
        }

        for (name, column_type) in &self.extras {
            columns.push(extra_series(name, *column_type, rows).into_column());
        }

        Ok(DataFrame::new(columns)?)
    }
}

fn partition_series(name: &str, rows: &[&NormalizedRow]) -> Series {
    match name {
        "version" => {
            let values: Vec<Option<i64>> = rows
                .iter()
                .map(|row| match &row.detail {
                    RowDetail::Forecast { version, .. } => *version,
                    RowDetail::Analysis { .. } => None,
                })
                .collect();
            Series::new(name.into(), values)
        }
        "product" => {
            let values: Vec<Option<&str>> = rows
                .iter()
                .map(|row| match &row.detail {
                    RowDetail::Forecast { product, .. } => Some(product.as_str()),
                    RowDetail::Analysis { .. } => None,
                })
                .collect();
            Series::new(name.into(), values)
        }
        "year" => Series::new(name.into(), rows.iter().map(|r| r.year).collect::<Vec<_>>()),
        "month" => Series::new(name.into(), rows.iter().map(|r| r.month).collect::<Vec<_>>()),
        _ => Series::new(name.into(), rows.iter().map(|r| r.day).collect::<Vec<_>>()),
    }
}

fn extra_series(name: &str, column_type: ColumnType, rows: &[&NormalizedRow]) -> Series {
    let cells = rows.iter().map(|row| row.extra.get(name));
    match column_type {
        ColumnType::Boolean => {
            let values: Vec<Option<bool>> = cells
                .map(|cell| match cell {
                    Some(FieldValue::Bool(b)) => Some(*b),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), values)
        }
        ColumnType::Int64 => {
            let values: Vec<Option<i64>> = cells
                .map(|cell| match cell {
                    Some(FieldValue::Int(i)) => Some(*i),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), values)
        }
        ColumnType::Float64 => {
            let values: Vec<Option<f64>> = cells
                .map(|cell| match cell {
                    Some(FieldValue::Int(i)) => Some(*i as f64),
                    Some(FieldValue::Float(v)) => Some(*v),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), values)
        }
        ColumnType::String => {
            let values: Vec<Option<String>> = cells
                .map(|cell| match cell {
                    None | Some(FieldValue::Null) => None,
                    Some(value) => Some(value.to_string()),
                })
                .collect();
            Series::new(name.into(), values)
        }
    }
}

impl NormalizedBatch {
    /// The whole batch as one frame, partition columns included.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let layout = FrameLayout::infer(self);
        let rows: Vec<&NormalizedRow> = self.rows.iter().collect();
        layout.build(&rows, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::RecordKind;

    fn analysis_row(hour: i32, extra: &[(&str, FieldValue)]) -> NormalizedRow {
        NormalizedRow {
            param: "2t".to_string(),
            path: "p1".to_string(),
            year: 2017,
            month: 1,
            day: 1,
            detail: RowDetail::Analysis { hour },
            extra: extra
                .iter()
                .map(|(name, value)| ((*name).to_string(), value.clone()))
                .collect(),
        }
    }

    #[test]
    fn infers_passthrough_types_over_the_batch() {
        let batch = NormalizedBatch::new(
            RecordKind::Analysis,
            vec![
                analysis_row(0, &[("_offset", FieldValue::Int(0)), ("levelist", FieldValue::Text("500".into()))]),
                analysis_row(6, &[("_offset", FieldValue::Int(10)), ("scale", FieldValue::Float(0.5))]),
                analysis_row(12, &[("scale", FieldValue::Int(2)), ("flag", FieldValue::Bool(true))]),
            ],
        );
        let layout = FrameLayout::infer(&batch);
        let types: BTreeMap<&str, ColumnType> = layout
            .extras()
            .iter()
            .map(|(name, ty)| (name.as_str(), *ty))
            .collect();
        assert_eq!(types["_offset"], ColumnType::Int64);
        assert_eq!(types["levelist"], ColumnType::String);
        assert_eq!(types["scale"], ColumnType::Float64);
        assert_eq!(types["flag"], ColumnType::Boolean);
    }

    #[test]
    fn all_null_passthrough_column_is_left_out() {
        let batch = NormalizedBatch::new(
            RecordKind::Analysis,
            vec![
                analysis_row(0, &[("foo", FieldValue::Null), ("_offset", FieldValue::Int(1))]),
                analysis_row(6, &[("foo", FieldValue::Null)]),
            ],
        );
        let layout = FrameLayout::infer(&batch);
        assert_eq!(layout.extras(), &[("_offset".to_string(), ColumnType::Int64)]);

        let df = batch.to_dataframe().unwrap();
        assert!(df.column("foo").is_err());
        assert_eq!(df.column("_offset").unwrap().null_count(), 1);
    }

    #[test]
    fn builds_frame_with_partition_columns_first() {
        let batch = NormalizedBatch::new(
            RecordKind::Analysis,
            vec![analysis_row(12, &[("_offset", FieldValue::Int(42))])],
        );
        let df = batch.to_dataframe().unwrap();
        let names: Vec<String> = df
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect();
        assert_eq!(
            names,
            vec!["year", "month", "day", "param", "_path", "hour", "_offset"]
        );
        assert_eq!(df.height(), 1);
    }

    #[test]
    fn part_frames_omit_partition_columns() {
        let batch = NormalizedBatch::new(RecordKind::Analysis, vec![analysis_row(3, &[])]);
        let layout = FrameLayout::infer(&batch);
        let rows: Vec<&NormalizedRow> = batch.rows.iter().collect();
        let df = layout.build(&rows, false).unwrap();
        assert_eq!(df.width(), 3);
        assert!(df.column("year").is_err());
        let names: Vec<String> = df
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect();
        assert_eq!(names, vec!["param", "_path", "hour"]);
    }
}
