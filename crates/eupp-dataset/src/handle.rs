//! Dataset locations.

use std::path::{Path, PathBuf};
use std::time::Duration;

use eupp_model::{PartitionScheme, RecordKind};

/// Directory extension of every dataset.
pub const DATASET_EXTENSION: &str = "parquet";

/// Default time to wait for another writer to release the lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(60);

/// A dataset directory for one record kind.
///
/// Opening a handle never touches the file system; the directory is created
/// by the first commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetHandle {
    root: PathBuf,
    kind: RecordKind,
    scheme: PartitionScheme,
    lock_timeout: Duration,
}

impl DatasetHandle {
    /// Resolve `<base>/<kind>.parquet`.
    pub fn open(base: &Path, kind: RecordKind) -> Self {
        Self {
            root: base.join(format!("{}.{DATASET_EXTENSION}", kind.as_str())),
            kind,
            scheme: kind.partition_scheme(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn scheme(&self) -> PartitionScheme {
        self.scheme
    }

    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    /// Lock file next to the dataset directory, e.g. `forecast.parquet.lock`.
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self.root.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Whether anything has been committed yet.
    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }
}
