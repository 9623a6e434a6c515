//! Staged commits and crash recovery.
//!
//! A commit first writes every part file of a batch below
//! `<root>/_staging/<id>/`, then writes a `COMMIT` marker listing them, then
//! renames each file into its partition directory. The marker is the commit
//! point:
//!
//! - no marker: nothing is visible yet, the staging directory is discarded
//! - marker present: the batch is committed, remaining files are moved into place
//!
//! Recovery runs under the dataset lock before every dedup check, so an
//! interrupted commit is either completed or forgotten before anyone looks
//! at the committed paths.

use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use polars::prelude::*;

use crate::error::{DatasetError, Result};

/// Directory below the dataset root holding in-flight commits.
pub const STAGING_DIR: &str = "_staging";

const MARKER: &str = "COMMIT";
const MARKER_TMP: &str = "COMMIT.tmp";

/// What recovery did with one staging directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// Marker found; the listed part files are now in place.
    RolledForward { id: String, files: usize },
    /// No marker; the staged files were removed.
    RolledBack { id: String },
}

/// Part files written to staging and sealed by a marker.
#[derive(Debug)]
pub(crate) struct StagedCommit {
    dir: PathBuf,
    files: Vec<String>,
}

/// Write `parts` (relative partition directory, frame) below the staging area
/// and seal them with the marker.
pub(crate) fn stage(
    root: &Path,
    id: &str,
    file_name: &str,
    parts: Vec<(String, DataFrame)>,
) -> Result<StagedCommit> {
    let dir = root.join(STAGING_DIR).join(id);
    if dir.exists() {
        if dir.join(MARKER).exists() {
            return Err(DatasetError::PendingCommit { path: dir });
        }
        fs::remove_dir_all(&dir).map_err(|e| DatasetError::write(&dir, e))?;
    }

    let mut files = Vec::with_capacity(parts.len());
    for (partition_dir, mut df) in parts {
        let relative = format!("{partition_dir}/{file_name}");
        let path = dir.join(&relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| DatasetError::write(parent, e))?;
        }
        let mut file = File::create(&path).map_err(|e| DatasetError::write(&path, e))?;
        ParquetWriter::new(&mut file)
            .finish(&mut df)
            .map_err(|e| DatasetError::ParquetWrite {
                path: path.clone(),
                message: e.to_string(),
            })?;
        file.sync_all().map_err(|e| DatasetError::write(&path, e))?;
        files.push(relative);
    }

    let tmp = dir.join(MARKER_TMP);
    fs::write(&tmp, files.join("\n")).map_err(|e| DatasetError::write(&tmp, e))?;
    fs::rename(&tmp, dir.join(MARKER)).map_err(|e| DatasetError::write(&tmp, e))?;

    tracing::debug!(staging = %dir.display(), files = files.len(), "staged commit");
    Ok(StagedCommit { dir, files })
}

/// Move every staged file into place and remove the staging directory.
///
/// Files already moved by an earlier, interrupted attempt are skipped.
pub(crate) fn publish(root: &Path, staged: &StagedCommit) -> Result<usize> {
    for relative in &staged.files {
        let source = staged.dir.join(relative);
        let target = root.join(relative);
        if !source.exists() {
            if target.exists() {
                continue;
            }
            return Err(DatasetError::read(
                &source,
                std::io::Error::new(std::io::ErrorKind::NotFound, "staged part file missing"),
            ));
        }
        if target.exists() {
            return Err(DatasetError::PartExists { path: target });
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| DatasetError::write(parent, e))?;
        }
        fs::rename(&source, &target).map_err(|e| DatasetError::write(&target, e))?;
    }
    fs::remove_dir_all(&staged.dir).map_err(|e| DatasetError::write(&staged.dir, e))?;
    remove_staging_dir(&root.join(STAGING_DIR));
    Ok(staged.files.len())
}

/// Complete or discard every interrupted commit below `root`.
pub fn recover(root: &Path) -> Result<Vec<RecoveryOutcome>> {
    let staging = root.join(STAGING_DIR);
    if !staging.is_dir() {
        return Ok(Vec::new());
    }

    let mut outcomes = Vec::new();
    let entries = fs::read_dir(&staging).map_err(|e| DatasetError::read(&staging, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| DatasetError::read(&staging, e))?;
        let dir = entry.path();
        if !dir.is_dir() {
            continue;
        }
        let id = entry.file_name().to_string_lossy().into_owned();

        let marker = dir.join(MARKER);
        if marker.is_file() {
            let staged = StagedCommit {
                files: read_marker(&marker)?,
                dir,
            };
            let files = publish(root, &staged)?;
            tracing::warn!(commit = %id, files, "rolled forward interrupted commit");
            outcomes.push(RecoveryOutcome::RolledForward { id, files });
        } else {
            fs::remove_dir_all(&dir).map_err(|e| DatasetError::write(&dir, e))?;
            tracing::warn!(commit = %id, "discarded unsealed commit");
            outcomes.push(RecoveryOutcome::RolledBack { id });
        }
    }

    remove_staging_dir(&staging);
    Ok(outcomes)
}

/// Remove `_staging` once no other commit is staged in it.
fn remove_staging_dir(staging: &Path) {
    match fs::remove_dir(staging) {
        Ok(()) => {}
        Err(e) if matches!(e.kind(), ErrorKind::DirectoryNotEmpty | ErrorKind::NotFound) => {}
        Err(e) => {
            tracing::debug!(path = %staging.display(), error = %e, "could not remove staging directory");
        }
    }
}

fn read_marker(marker: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(marker).map_err(|e| DatasetError::read(marker, e))?;
    let files: Vec<String> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect();
    for file in &files {
        let is_relative = Path::new(file)
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if !is_relative {
            return Err(DatasetError::CorruptMarker {
                path: marker.to_path_buf(),
                reason: format!("'{file}' is not a relative path"),
            });
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn frame() -> DataFrame {
        DataFrame::new(vec![
            Series::new("param".into(), ["2t", "tp"]).into_column(),
            Series::new("_path".into(), ["p1", "p1"]).into_column(),
        ])
        .unwrap()
    }

    #[test]
    fn stage_then_publish_moves_files_into_partitions() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("analysis.parquet");
        let staged = stage(
            &root,
            "abc",
            "part-abc.parquet",
            vec![
                ("year=2017/month=1/day=1".to_string(), frame()),
                ("year=2017/month=1/day=2".to_string(), frame()),
            ],
        )
        .unwrap();
        assert!(root.join("_staging/abc/COMMIT").is_file());
        assert!(!root.join("year=2017").exists());

        assert_eq!(publish(&root, &staged).unwrap(), 2);
        assert!(root.join("year=2017/month=1/day=2/part-abc.parquet").is_file());
        assert!(!root.join("_staging/abc").exists());
    }

    #[test]
    fn recovery_rolls_forward_sealed_and_discards_unsealed() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("analysis.parquet");
        stage(
            &root,
            "sealed",
            "part-sealed.parquet",
            vec![("year=2017/month=1/day=1".to_string(), frame())],
        )
        .unwrap();
        let unsealed = root.join("_staging/unsealed/year=2017/month=1/day=1");
        fs::create_dir_all(&unsealed).unwrap();
        fs::write(unsealed.join("part-unsealed.parquet"), b"partial").unwrap();

        let mut outcomes = recover(&root).unwrap();
        outcomes.sort_by_key(|outcome| format!("{outcome:?}"));
        assert_eq!(
            outcomes,
            vec![
                RecoveryOutcome::RolledBack {
                    id: "unsealed".to_string()
                },
                RecoveryOutcome::RolledForward {
                    id: "sealed".to_string(),
                    files: 1
                },
            ]
        );
        assert!(root.join("year=2017/month=1/day=1/part-sealed.parquet").is_file());
        assert!(!root.join("year=2017/month=1/day=1/part-unsealed.parquet").exists());
        assert!(!root.join(STAGING_DIR).exists());
    }

    #[test]
    fn publish_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("analysis.parquet");
        let target = root.join("year=2017/month=1/day=1/part-x.parquet");
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, b"committed").unwrap();

        let staged = stage(
            &root,
            "x",
            "part-x.parquet",
            vec![("year=2017/month=1/day=1".to_string(), frame())],
        )
        .unwrap();
        let err = publish(&root, &staged).unwrap_err();
        assert!(matches!(err, DatasetError::PartExists { .. }));
        assert_eq!(fs::read(&target).unwrap(), b"committed");
    }

    #[test]
    fn staging_dir_is_kept_while_another_commit_is_staged() {
        let dir = TempDir::new().unwrap();
        let staging = dir.path().join(STAGING_DIR);
        fs::create_dir_all(staging.join("other")).unwrap();

        remove_staging_dir(&staging);
        assert!(staging.join("other").is_dir());

        fs::remove_dir(staging.join("other")).unwrap();
        remove_staging_dir(&staging);
        assert!(!staging.exists());

        // Already gone: nothing to report.
        remove_staging_dir(&staging);
    }

    #[test]
    fn marker_with_escaping_path_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let marker = dir.path().join(MARKER);
        fs::write(&marker, "../outside.parquet\n").unwrap();
        assert!(matches!(
            read_marker(&marker),
            Err(DatasetError::CorruptMarker { .. })
        ));
    }
}
