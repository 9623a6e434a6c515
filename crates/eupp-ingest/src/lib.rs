//! GRIB index ingestion.
//!
//! This crate turns one zipped GRIB index into a [`NormalizedBatch`] ready to
//! be committed to a dataset.
//!
//! # Features
//!
//! - **Filename metadata**: record kind, product, sub-kind and version from the file name
//! - **Archive reading**: newline-delimited JSON members of a zip archive
//! - **Normalization**: per-kind column derivation and cleanup
//! - **Catalog**: expected source files for a period
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use eupp_ingest::load_source_file;
//!
//! let path = Path::new("_data/EU_forecast_ctr_pressure_params_2017-01_0.grb.index.zip");
//! let (descriptor, batch) = load_source_file(path, None)?;
//! println!("{descriptor}: {} rows", batch.len());
//! ```

mod archive;
mod catalog;
mod error;
mod filename;
mod normalize;
mod step;

use std::path::Path;

use eupp_model::{NormalizedBatch, SourceFileDescriptor};

// === Error Types ===
pub use error::{IngestError, Result};

// === Filename Metadata ===
pub use filename::{INDEX_EXTENSION, ZIPPED_INDEX_EXTENSION, extract};

// === Archive Reading ===
pub use archive::read_archive;

// === Normalization ===
pub use normalize::normalize;
pub use step::decode_step;

// === Catalog ===
pub use catalog::{BASE_URL, CatalogEntry, MAX_YEAR, MIN_YEAR, catalog, validate_period};

/// Extract, read and normalize one source archive.
///
/// The filename is validated before the archive is opened.
pub fn load_source_file(
    path: &Path,
    max_records: Option<usize>,
) -> Result<(SourceFileDescriptor, NormalizedBatch)> {
    let name = path
        .file_name()
        .map(std::ffi::OsStr::to_string_lossy)
        .unwrap_or_else(|| path.to_string_lossy());
    let descriptor = extract(&name)?;
    let records = read_archive(path, max_records)?;
    tracing::debug!(
        source_file = %path.display(),
        records = records.len(),
        "read archive"
    );
    let batch = normalize(&descriptor, &records)?;
    Ok((descriptor, batch))
}
