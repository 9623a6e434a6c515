//! Error types for dataset storage.

use std::path::PathBuf;
use thiserror::Error;

use eupp_model::{ModelError, RecordKind};

/// Errors raised while reading or writing a dataset.
///
/// Write-side variants leave committed partition data untouched.
#[derive(Debug, Error)]
pub enum DatasetError {
    // === Write Errors ===
    /// Storage fault while writing, renaming or removing a file.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Polars failed to encode a part file.
    #[error("failed to write parquet file {path}: {message}")]
    ParquetWrite { path: PathBuf, message: String },

    /// A part file with the same name is already committed.
    #[error("refusing to overwrite committed part file {path}")]
    PartExists { path: PathBuf },

    /// A staged commit with the same id is waiting to be rolled forward.
    #[error("staged commit {path} is pending recovery")]
    PendingCommit { path: PathBuf },

    /// Batch does not belong to this dataset.
    #[error("cannot commit {batch} rows to the {dataset} dataset")]
    KindMismatch {
        dataset: RecordKind,
        batch: RecordKind,
    },

    // === Read Errors ===
    /// Failed to read a file or list a directory.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Polars failed to decode a part file.
    #[error("failed to read parquet file {path}: {message}")]
    ParquetRead { path: PathBuf, message: String },

    /// Commit marker lists a path outside the staging directory.
    #[error("corrupt commit marker {path}: {reason}")]
    CorruptMarker { path: PathBuf, reason: String },

    // === Lock Errors ===
    /// Lock file could not be created or locked.
    #[error("failed to lock {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Another process held the lock for longer than the timeout.
    #[error("timed out after {waited_ms} ms waiting for lock {path}")]
    LockTimeout { path: PathBuf, waited_ms: u64 },

    // === Data Errors ===
    /// Polars operation failed.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },

    /// Frame assembly failed.
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl From<polars::prelude::PolarsError> for DatasetError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

impl DatasetError {
    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }
}

/// Result type for dataset operations.
pub type Result<T> = std::result::Result<T, DatasetError>;
