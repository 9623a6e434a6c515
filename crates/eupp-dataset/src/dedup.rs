//! Provenance deduplication.
//!
//! Part files are checked one at a time with the batch's paths as a scan
//! predicate; the committed `_path` column is never loaded as a whole.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::handle::DatasetHandle;
use crate::scan::{matching_paths_in_part, part_files};

/// Committed provenance paths that also appear in `paths`.
///
/// Empty when the dataset does not exist yet. Stops reading part files once
/// every path of `paths` has been found.
pub fn matching_paths(
    handle: &DatasetHandle,
    paths: &BTreeSet<String>,
) -> Result<BTreeSet<String>> {
    let mut matched = BTreeSet::new();
    if paths.is_empty() || !handle.exists() {
        return Ok(matched);
    }
    for part in part_files(handle)? {
        matched.extend(matching_paths_in_part(&part.path, paths, None)?);
        if matched.len() == paths.len() {
            break;
        }
    }
    Ok(matched)
}

/// Whether at least one committed row has a `_path` in `paths`.
///
/// Any overlap counts: a file whose records were partly committed is treated
/// as fully ingested. Returns at the first matching row.
pub fn already_ingested(handle: &DatasetHandle, paths: &BTreeSet<String>) -> Result<bool> {
    if paths.is_empty() || !handle.exists() {
        return Ok(false);
    }
    for part in part_files(handle)? {
        if !matching_paths_in_part(&part.path, paths, Some(1))?.is_empty() {
            return Ok(true);
        }
    }
    Ok(false)
}
