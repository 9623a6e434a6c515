//! Error types for GRIB index ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading and normalizing one source file.
///
/// Every variant is fatal for the file it was raised on and for that file only.
#[derive(Debug, Error)]
pub enum IngestError {
    // === Filename Errors ===
    /// Filename does not follow the `EU_<kind>_<product>[_<subkind>]_params...grb.index.zip` convention.
    #[error("filename '{filename}' not in expected format: {reason}")]
    Format { filename: String, reason: String },

    // === Record Errors ===
    /// Batch is empty or a record lacks a column the table needs.
    #[error("invalid record batch: {reason}")]
    Schema { reason: String },

    /// A record's `step` is neither `<end>` nor `<start>-<end>`.
    #[error("cannot decode step '{value}' in record {record}")]
    StepDecode { record: usize, value: String },

    // === Archive Errors ===
    /// Source archive not found.
    #[error("archive not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read a file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Archive could not be opened or a member could not be read.
    #[error("problem unzipping {path}: {message}")]
    Archive { path: PathBuf, message: String },

    /// A line of an archive member is not a JSON object.
    #[error("{path} [{member}:{line}]: {message}")]
    RecordDecode {
        path: PathBuf,
        member: String,
        line: usize,
        message: String,
    },

    // === Option Errors ===
    /// Caller passed an unusable option value.
    #[error("invalid {name}: {reason}")]
    InvalidOption { name: &'static str, reason: String },
}

impl IngestError {
    pub(crate) fn format(filename: &str, reason: impl Into<String>) -> Self {
        Self::Format {
            filename: filename.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn schema(reason: impl Into<String>) -> Self {
        Self::Schema {
            reason: reason.into(),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::format("foo.zip", "missing 'EU_' prefix");
        assert_eq!(
            err.to_string(),
            "filename 'foo.zip' not in expected format: missing 'EU_' prefix"
        );

        let err = IngestError::StepDecode {
            record: 3,
            value: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "cannot decode step 'abc' in record 3");
    }
}
