use std::collections::BTreeSet;
use std::path::PathBuf;

use eupp_model::SourceFileDescriptor;

#[derive(Debug)]
pub struct IngestRunResult {
    pub files: Vec<FileSummary>,
}

impl IngestRunResult {
    pub fn has_errors(&self) -> bool {
        self.files
            .iter()
            .any(|file| matches!(file.status, FileStatus::Failed { .. }))
    }

    pub fn rows_written(&self) -> usize {
        self.files
            .iter()
            .map(|file| match file.status {
                FileStatus::Committed { rows, .. } => rows,
                _ => 0,
            })
            .sum()
    }

    pub fn count(&self, predicate: impl Fn(&FileStatus) -> bool) -> usize {
        self.files.iter().filter(|file| predicate(&file.status)).count()
    }
}

#[derive(Debug)]
pub struct FileSummary {
    pub source: PathBuf,
    pub descriptor: Option<SourceFileDescriptor>,
    pub records: usize,
    pub status: FileStatus,
    pub duration_ms: u128,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Committed { rows: usize, partitions: usize },
    Skipped { matched_paths: BTreeSet<String> },
    Failed { error: String },
}
