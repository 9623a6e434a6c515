//! Data model for GRIB index ingestion.
//!
//! This crate holds the types shared by the ingestion and dataset crates:
//! - [`RecordKind`] and [`PartitionScheme`]: which dataset a file feeds and how it is laid out
//! - [`SourceFileDescriptor`]: metadata parsed from a source filename
//! - [`RawRecord`] and [`FieldValue`]: schemaless input records and passthrough cells
//! - [`NormalizedRow`] and [`NormalizedBatch`]: the committed row shape
//! - [`FrameLayout`]: typed DataFrame assembly for part files

pub mod descriptor;
pub mod error;
pub mod frame;
pub mod kind;
pub mod row;
pub mod value;

pub use descriptor::{CONTROL_RUN, ENSEMBLE, SourceFileDescriptor};
pub use error::{ModelError, Result};
pub use frame::{ColumnType, FrameLayout};
pub use kind::{PartitionScheme, RecordKind};
pub use row::{
    HIVE_NULL_PARTITION, NormalizedBatch, NormalizedRow, PATH_COLUMN, PartitionKey,
    PartitionValue, RowDetail,
};
pub use value::{FieldValue, RawRecord, json_scalar_text};
