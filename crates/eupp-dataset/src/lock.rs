//! Per-dataset writer lock.
//!
//! The dedup check and the commit must run as one critical section per
//! record kind, across processes. The lock is an advisory exclusive lock on
//! a file next to the dataset directory; it is released when the guard is
//! dropped or the process exits.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::error::{DatasetError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Guard holding the exclusive lock.
#[derive(Debug)]
pub struct DatasetLock {
    file: File,
    path: PathBuf,
}

impl DatasetLock {
    /// Acquire the lock, polling until `timeout` has elapsed.
    ///
    /// # Errors
    ///
    /// - [`DatasetError::LockTimeout`] if another holder keeps the lock
    /// - [`DatasetError::Lock`] if the lock file cannot be created or locked
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self> {
        let lock_error = |source| DatasetError::Lock {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(lock_error)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(lock_error)?;

        let started = Instant::now();
        let contended = fs2::lock_contended_error().raw_os_error();
        loop {
            match FileExt::try_lock_exclusive(&file) {
                Ok(()) => {
                    tracing::debug!(lock = %path.display(), "acquired dataset lock");
                    return Ok(Self {
                        file,
                        path: path.to_path_buf(),
                    });
                }
                Err(e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.raw_os_error() == contended =>
                {
                    let waited = started.elapsed();
                    if waited >= timeout {
                        return Err(DatasetError::LockTimeout {
                            path: path.to_path_buf(),
                            waited_ms: u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
                        });
                    }
                    tracing::trace!(lock = %path.display(), "dataset lock busy");
                    std::thread::sleep(POLL_INTERVAL.min(timeout - waited));
                }
                Err(e) => return Err(lock_error(e)),
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DatasetLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(lock = %self.path.display(), error = %e, "failed to release dataset lock");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn second_holder_times_out_until_release() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("analysis.parquet.lock");

        let first = DatasetLock::acquire(&path, Duration::from_millis(100)).unwrap();
        assert_eq!(first.path(), path.as_path());

        let err = DatasetLock::acquire(&path, Duration::from_millis(120)).unwrap_err();
        assert!(matches!(err, DatasetError::LockTimeout { .. }), "{err}");

        drop(first);
        DatasetLock::acquire(&path, Duration::from_millis(100)).unwrap();
    }
}
