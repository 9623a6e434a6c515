//! Per-file ingestion pipeline.
//!
//! Each archive goes through extract → read → normalize → dedup → commit.
//! A failure is recorded against its file and the run moves on.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, error, info, info_span};

use eupp_dataset::{DatasetHandle, IngestOutcome, ingest_batch};
use eupp_ingest::{extract, load_source_file};
use eupp_model::{NormalizedBatch, SourceFileDescriptor};

use crate::types::{FileStatus, FileSummary, IngestRunResult};

/// Options shared by every file of a run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub dataset_root: PathBuf,
    pub max_records: Option<usize>,
    pub lock_timeout: Duration,
}

/// Output of one successfully processed file.
#[derive(Debug)]
pub struct ProcessedFile {
    pub descriptor: SourceFileDescriptor,
    pub records: usize,
    pub outcome: IngestOutcome,
}

/// Load, normalize and ingest one archive.
pub fn process_file(path: &Path, options: &PipelineOptions) -> Result<ProcessedFile> {
    let source_file = path.display().to_string();
    let process_span = info_span!("process_file", source_file = %source_file);
    let _process_guard = process_span.enter();
    let process_start = Instant::now();

    let (descriptor, batch) = info_span!("load").in_scope(
        || -> Result<(SourceFileDescriptor, NormalizedBatch)> {
            let start = Instant::now();
            let (descriptor, batch) = load_source_file(path, options.max_records)
                .with_context(|| format!("load {source_file}"))?;
            debug!(
                source_file = %source_file,
                record_kind = %descriptor.record_kind,
                rows = batch.len(),
                paths = batch.distinct_paths.len(),
                duration_ms = start.elapsed().as_millis(),
                "load complete"
            );
            Ok((descriptor, batch))
        },
    )?;

    let handle = DatasetHandle::open(&options.dataset_root, descriptor.record_kind)
        .with_lock_timeout(options.lock_timeout);

    let outcome = info_span!("write", dataset = %descriptor.dataset_name()).in_scope(|| {
        let start = Instant::now();
        let outcome = ingest_batch(&handle, &batch)
            .with_context(|| format!("write {} rows to {}", batch.len(), handle.root().display()))?;
        debug!(
            source_file = %source_file,
            duration_ms = start.elapsed().as_millis(),
            "write complete"
        );
        Ok::<_, anyhow::Error>(outcome)
    })?;

    debug!(
        source_file = %source_file,
        duration_ms = process_start.elapsed().as_millis(),
        "file processed"
    );

    Ok(ProcessedFile {
        descriptor,
        records: batch.len(),
        outcome,
    })
}

/// Best-effort descriptor for a file that failed after its name was parsed.
fn descriptor_for(path: &Path) -> Option<SourceFileDescriptor> {
    let name = path.file_name()?.to_string_lossy();
    extract(&name).ok()
}

/// Process every archive, continuing past per-file failures.
pub fn run_pipeline(paths: &[PathBuf], options: &PipelineOptions) -> IngestRunResult {
    let run_start = Instant::now();
    let mut files = Vec::with_capacity(paths.len());

    for path in paths {
        let start = Instant::now();
        let (descriptor, records, status) = match process_file(path, options) {
            Ok(processed) => {
                let status = match processed.outcome {
                    IngestOutcome::Committed(result) => FileStatus::Committed {
                        rows: result.rows_written,
                        partitions: result.partitions,
                    },
                    IngestOutcome::Skipped { matched_paths } => {
                        FileStatus::Skipped { matched_paths }
                    }
                };
                (Some(processed.descriptor), processed.records, status)
            }
            Err(err) => {
                let message = format!("{err:#}");
                error!(source_file = %path.display(), error = %message, "file failed");
                (descriptor_for(path), 0, FileStatus::Failed { error: message })
            }
        };
        files.push(FileSummary {
            source: path.clone(),
            descriptor,
            records,
            status,
            duration_ms: start.elapsed().as_millis(),
        });
    }

    let result = IngestRunResult { files };
    info!(
        files = result.files.len(),
        committed = result.count(|s| matches!(s, FileStatus::Committed { .. })),
        skipped = result.count(|s| matches!(s, FileStatus::Skipped { .. })),
        failed = result.count(|s| matches!(s, FileStatus::Failed { .. })),
        rows = result.rows_written(),
        duration_ms = run_start.elapsed().as_millis(),
        "ingest run complete"
    );
    result
}
