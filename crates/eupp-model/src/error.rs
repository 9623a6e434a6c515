//! Error types for the data model.

use thiserror::Error;

/// Errors raised while building model values.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Record kind token is not analysis, forecast or reforecast.
    #[error("unknown record kind '{0}'")]
    UnknownRecordKind(String),

    /// Failed to assemble a DataFrame from normalized rows.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for ModelError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
