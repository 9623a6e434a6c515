//! Append-only partitioned Parquet datasets.
//!
//! One dataset per record kind lives in `<base>/<kind>.parquet`, laid out as
//! Hive-style `key=value` partition directories. Writers append part files
//! and never modify committed ones.
//!
//! # Features
//!
//! - **Dedup**: a batch whose provenance paths overlap committed rows is skipped
//! - **Atomic commits**: staged part files are published after a commit marker
//! - **Locking**: check and write run under one exclusive lock per dataset
//! - **Read-back**: committed rows with partition columns rebuilt
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use eupp_dataset::{DatasetHandle, IngestOutcome, ingest_batch};
//!
//! let handle = DatasetHandle::open(Path::new("datasets"), batch.record_kind);
//! match ingest_batch(&handle, &batch)? {
//!     IngestOutcome::Committed(result) => println!("{} rows", result.rows_written),
//!     IngestOutcome::Skipped { .. } => println!("already ingested"),
//! }
//! ```

mod dedup;
mod error;
mod handle;
mod lock;
mod scan;
mod staging;
mod writer;

// === Error Types ===
pub use error::{DatasetError, Result};

// === Dataset Handles ===
pub use handle::{DATASET_EXTENSION, DEFAULT_LOCK_TIMEOUT, DatasetHandle};
pub use lock::DatasetLock;

// === Writing ===
pub use dedup::{already_ingested, matching_paths};
pub use staging::{RecoveryOutcome, STAGING_DIR};
pub use writer::{IngestOutcome, WriteResult, batch_id, commit, ingest_batch, recover};

// === Reading ===
pub use scan::{ScanFilter, count_rows, scan};
