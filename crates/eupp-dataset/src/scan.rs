//! Reading committed rows back.
//!
//! Partition columns are not stored in the part files; they are rebuilt from
//! the `key=value` directory names on the way out. Entries whose name starts
//! with `_` or `.` (staging, lock leftovers, hidden files) are never read.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use polars::prelude::*;

use eupp_model::{PATH_COLUMN, PartitionScheme, PartitionValue};

use crate::error::{DatasetError, Result};
use crate::handle::DatasetHandle;

const PART_EXTENSION: &str = "parquet";

/// Equality predicates on partition columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanFilter {
    equals: Vec<(String, PartitionValue)>,
}

impl ScanFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only partitions where `column` equals `value`.
    #[must_use]
    pub fn equals(mut self, column: &str, value: PartitionValue) -> Self {
        self.equals.push((column.to_string(), value));
        self
    }

    fn matches(&self, key: &[(&'static str, PartitionValue)]) -> bool {
        self.equals.iter().all(|(column, expected)| {
            key.iter()
                .any(|(name, value)| name == column && value == expected)
        })
    }
}

/// One committed part file and the partition it belongs to.
#[derive(Debug, Clone)]
pub(crate) struct PartFile {
    pub(crate) path: PathBuf,
    pub(crate) key: Vec<(&'static str, PartitionValue)>,
}

/// List committed part files in a stable order.
pub(crate) fn part_files(handle: &DatasetHandle) -> Result<Vec<PartFile>> {
    let mut files = Vec::new();
    if handle.exists() {
        walk(handle.root(), handle.scheme(), &mut Vec::new(), &mut files)?;
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

fn walk(
    dir: &Path,
    scheme: PartitionScheme,
    key: &mut Vec<(&'static str, PartitionValue)>,
    files: &mut Vec<PartFile>,
) -> Result<()> {
    let columns = scheme.columns();
    let entries = fs::read_dir(dir).map_err(|e| DatasetError::read(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| DatasetError::read(dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('_') || name.starts_with('.') {
            continue;
        }
        let path = entry.path();

        if path.is_dir() {
            let Some(&column) = columns.get(key.len()) else {
                tracing::warn!(path = %path.display(), "unexpected directory below partitions");
                continue;
            };
            let Some(value) = name
                .strip_prefix(column)
                .and_then(|rest| rest.strip_prefix('='))
            else {
                tracing::warn!(path = %path.display(), expected = column, "unexpected partition directory");
                continue;
            };
            key.push((column, PartitionValue::from_segment(column, value)));
            walk(&path, scheme, key, files)?;
            key.pop();
        } else if key.len() == columns.len()
            && path.extension().is_some_and(|ext| ext == PART_EXTENSION)
        {
            files.push(PartFile {
                path,
                key: key.clone(),
            });
        }
    }
    Ok(())
}

fn read_part(path: &Path, columns: Option<Vec<String>>) -> Result<DataFrame> {
    let file = File::open(path).map_err(|e| DatasetError::read(path, e))?;
    ParquetReader::new(file)
        .with_columns(columns)
        .finish()
        .map_err(|e| DatasetError::ParquetRead {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// `_path` values of one part file that are in `paths`.
///
/// The membership test is pushed into the Parquet scan, so only matching
/// rows of the `_path` column are materialized. `limit` stops the scan after
/// that many matching rows.
pub(crate) fn matching_paths_in_part(
    path: &Path,
    paths: &BTreeSet<String>,
    limit: Option<IdxSize>,
) -> Result<BTreeSet<String>> {
    let Some(predicate) = paths
        .iter()
        .map(|p| col(PATH_COLUMN).eq(lit(p.clone())))
        .reduce(Expr::or)
    else {
        return Ok(BTreeSet::new());
    };

    let path_str = path.to_string_lossy();
    let parquet_error = |e: PolarsError| DatasetError::ParquetRead {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    let mut lf = LazyFrame::scan_parquet(PlPath::new(&path_str), ScanArgsParquet::default())
        .map_err(parquet_error)?
        .select([col(PATH_COLUMN)])
        .filter(predicate);
    if let Some(limit) = limit {
        lf = lf.limit(limit);
    }
    let df = lf.collect().map_err(parquet_error)?;

    let values = df.column(PATH_COLUMN)?.as_materialized_series().str()?;
    Ok(values.into_iter().flatten().map(str::to_string).collect())
}

/// Read committed rows with their partition columns.
///
/// Columns are ordered partition columns first, then the stored columns in
/// the order the first part file lists them. Part files written by different
/// batches may carry different passthrough columns; missing cells are null,
/// and a column typed differently by two batches is widened to their common
/// supertype. An empty or missing dataset yields an empty frame.
pub fn scan(handle: &DatasetHandle, filter: &ScanFilter) -> Result<DataFrame> {
    let mut frames = Vec::new();
    for part in part_files(handle)? {
        if !filter.matches(&part.key) {
            continue;
        }
        let df = read_part(&part.path, None)?;
        frames.push(with_partition_columns(df, &part.key)?.lazy());
    }
    if frames.is_empty() {
        return Ok(DataFrame::empty());
    }
    let args = UnionArgs {
        diagonal: true,
        to_supertypes: true,
        ..Default::default()
    };
    Ok(concat(frames, args)?.collect()?)
}

/// Number of committed rows.
pub fn count_rows(handle: &DatasetHandle) -> Result<usize> {
    let mut rows = 0;
    for part in part_files(handle)? {
        rows += read_part(&part.path, Some(vec![PATH_COLUMN.to_string()]))?.height();
    }
    Ok(rows)
}

fn with_partition_columns(
    df: DataFrame,
    key: &[(&'static str, PartitionValue)],
) -> Result<DataFrame> {
    let height = df.height();
    let mut columns: Vec<Column> = key
        .iter()
        .map(|(name, value)| partition_series(name, value, height).into_column())
        .collect();
    columns.extend(df.get_columns().iter().cloned());
    Ok(DataFrame::new(columns)?)
}

/// `version` is Int64 (nullable), `product` String, date parts Int32.
fn partition_series(name: &str, value: &PartitionValue, height: usize) -> Series {
    match name {
        "product" => {
            let text = match value {
                PartitionValue::Null => None,
                other => Some(other.to_string()),
            };
            Series::new(name.into(), vec![text; height])
        }
        "version" => Series::new(name.into(), vec![value.as_i64(); height]),
        _ => {
            let part = value.as_i64().and_then(|v| i32::try_from(v).ok());
            Series::new(name.into(), vec![part; height])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eupp_model::RecordKind;

    #[test]
    fn filter_matches_all_predicates() {
        let key = vec![
            ("version", PartitionValue::Int(0)),
            ("product", PartitionValue::Text("ens".to_string())),
            ("year", PartitionValue::Int(2017)),
        ];
        assert!(ScanFilter::new().matches(&key));
        assert!(ScanFilter::new()
            .equals("product", PartitionValue::Text("ens".to_string()))
            .equals("year", PartitionValue::Int(2017))
            .matches(&key));
        assert!(!ScanFilter::new()
            .equals("product", PartitionValue::Text("efi".to_string()))
            .matches(&key));
        assert!(!ScanFilter::new().equals("month", PartitionValue::Int(1)).matches(&key));
    }

    #[test]
    fn missing_dataset_scans_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let handle = DatasetHandle::open(dir.path(), RecordKind::Forecast);
        assert_eq!(scan(&handle, &ScanFilter::new()).unwrap().height(), 0);
        assert_eq!(count_rows(&handle).unwrap(), 0);
    }

    #[test]
    fn part_membership_is_filtered_in_the_scan() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("part-a.parquet");
        let mut df = DataFrame::new(vec![
            Series::new("param".into(), ["2t", "tp", "2t"]).into_column(),
            Series::new(PATH_COLUMN.into(), ["p1", "p2", "p1"]).into_column(),
        ])
        .unwrap();
        let mut file = File::create(&path).unwrap();
        ParquetWriter::new(&mut file).finish(&mut df).unwrap();

        let wanted: BTreeSet<String> = ["p1", "p9"].iter().map(|p| (*p).to_string()).collect();
        let found = matching_paths_in_part(&path, &wanted, None).unwrap();
        assert_eq!(found.into_iter().collect::<Vec<_>>(), vec!["p1".to_string()]);

        let first = matching_paths_in_part(&path, &wanted, Some(1)).unwrap();
        assert_eq!(first.len(), 1);

        let none: BTreeSet<String> = ["p9"].iter().map(|p| (*p).to_string()).collect();
        assert!(matching_paths_in_part(&path, &none, None).unwrap().is_empty());
        assert!(matching_paths_in_part(&path, &BTreeSet::new(), None).unwrap().is_empty());
    }

    #[test]
    fn partition_series_types() {
        let version = partition_series("version", &PartitionValue::Null, 2);
        assert_eq!(version.dtype(), &DataType::Int64);
        assert_eq!(version.null_count(), 2);
        let day = partition_series("day", &PartitionValue::Int(3), 1);
        assert_eq!(day.dtype(), &DataType::Int32);
        let product = partition_series("product", &PartitionValue::Text("ens".into()), 1);
        assert_eq!(product.dtype(), &DataType::String);
    }
}
