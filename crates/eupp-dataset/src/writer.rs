//! Partitioned append writer.

use std::collections::BTreeSet;
use std::fs;
use std::time::Instant;

use sha2::{Digest, Sha256};

use eupp_model::{FrameLayout, NormalizedBatch, RecordKind};

use crate::dedup::matching_paths;
use crate::error::{DatasetError, Result};
use crate::handle::DatasetHandle;
use crate::lock::DatasetLock;
use crate::staging::{self, RecoveryOutcome};

/// Result of a successful commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteResult {
    pub rows_written: usize,
    pub partitions: usize,
}

/// What [`ingest_batch`] did with a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Rows were appended.
    Committed(WriteResult),
    /// Some provenance paths were already committed; nothing was written.
    Skipped { matched_paths: BTreeSet<String> },
}

/// Deterministic commit id: a batch with the same kind and provenance paths
/// always gets the same id, so a rolled-forward commit can never be written twice.
pub fn batch_id(kind: RecordKind, paths: &BTreeSet<String>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_str().as_bytes());
    for path in paths {
        hasher.update(b"\n");
        hasher.update(path.as_bytes());
    }
    let digest = hex::encode(hasher.finalize());
    digest[..16].to_string()
}

/// Append `batch` to the dataset, all rows or none.
///
/// Every partition of the batch gets one `part-<id>.parquet` file. Existing
/// part files are never replaced. Callers outside [`ingest_batch`] must hold
/// the dataset lock.
///
/// # Errors
///
/// Any storage fault is returned as a write error with its cause; nothing
/// is retried.
pub fn commit(handle: &DatasetHandle, batch: &NormalizedBatch) -> Result<WriteResult> {
    if batch.record_kind != handle.kind() {
        return Err(DatasetError::KindMismatch {
            dataset: handle.kind(),
            batch: batch.record_kind,
        });
    }
    if batch.is_empty() {
        return Ok(WriteResult::default());
    }

    let start = Instant::now();
    let root = handle.root();
    fs::create_dir_all(root).map_err(|e| DatasetError::write(root, e))?;

    let id = batch_id(batch.record_kind, &batch.distinct_paths);
    let file_name = format!("part-{id}.parquet");

    let layout = FrameLayout::infer(batch);
    let parts = batch
        .partitions()
        .iter()
        .map(|(key, rows)| Ok((key.relative_dir(), layout.build(rows, false)?)))
        .collect::<Result<Vec<_>>>()?;
    let partitions = parts.len();

    let staged = staging::stage(root, &id, &file_name, parts)?;
    staging::publish(root, &staged)?;

    let result = WriteResult {
        rows_written: batch.len(),
        partitions,
    };
    tracing::info!(
        dataset = %root.display(),
        commit = %id,
        rows = result.rows_written,
        partitions,
        duration_ms = start.elapsed().as_millis(),
        "committed batch"
    );
    Ok(result)
}

/// Recover interrupted commits of this dataset. Requires the dataset lock.
pub fn recover(handle: &DatasetHandle) -> Result<Vec<RecoveryOutcome>> {
    if !handle.exists() {
        return Ok(Vec::new());
    }
    staging::recover(handle.root())
}

/// Check-then-write under the dataset lock.
///
/// Interrupted commits are recovered first, then the batch's provenance
/// paths are checked against the committed rows. Any overlap skips the whole
/// batch.
pub fn ingest_batch(handle: &DatasetHandle, batch: &NormalizedBatch) -> Result<IngestOutcome> {
    let lock = DatasetLock::acquire(&handle.lock_path(), handle.lock_timeout())?;
    tracing::debug!(lock = %lock.path().display(), "dataset lock acquired");

    recover(handle)?;

    let matched = matching_paths(handle, &batch.distinct_paths)?;
    if !matched.is_empty() {
        tracing::info!(
            dataset = %handle.root().display(),
            matched = ?matched,
            "source already ingested, skipping"
        );
        return Ok(IngestOutcome::Skipped {
            matched_paths: matched,
        });
    }

    commit(handle, batch).map(IngestOutcome::Committed)
}
