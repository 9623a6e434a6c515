//! Reading zipped newline-delimited JSON archives.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde_json::Value;

use eupp_model::RawRecord;

use crate::error::{IngestError, Result};

/// Read every record from a zipped GRIB index.
///
/// Members are read in archive order; directory entries and blank lines are
/// skipped. `max_records` caps the number of decoded records across all
/// members, which is useful for quick trial runs against large indexes.
///
/// # Errors
///
/// - [`IngestError::FileNotFound`] if `path` does not exist
/// - [`IngestError::Archive`] if the zip cannot be opened or read
/// - [`IngestError::RecordDecode`] if a line is not a JSON object
/// - [`IngestError::InvalidOption`] if `max_records` is `Some(0)`
pub fn read_archive(path: &Path, max_records: Option<usize>) -> Result<Vec<RawRecord>> {
    if max_records == Some(0) {
        return Err(IngestError::InvalidOption {
            name: "max_records",
            reason: "must be positive when set".to_string(),
        });
    }

    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    let mut archive = zip::ZipArchive::new(file).map_err(|e| IngestError::Archive {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut records = Vec::new();
    'members: for index in 0..archive.len() {
        let member = archive.by_index(index).map_err(|e| IngestError::Archive {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if member.is_dir() {
            continue;
        }
        let member_name = member.name().to_string();
        tracing::debug!(archive = %path.display(), member = %member_name, "reading archive member");

        let reader = BufReader::new(member);
        for (line_idx, line_result) in reader.lines().enumerate() {
            let line = line_result.map_err(|e| IngestError::Archive {
                path: path.to_path_buf(),
                message: format!("{member_name}: {e}"),
            })?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            records.push(decode_line(path, &member_name, line_idx + 1, trimmed)?);

            if max_records.is_some_and(|max| records.len() >= max) {
                break 'members;
            }
        }
    }

    Ok(records)
}

fn decode_line(path: &Path, member: &str, line: usize, text: &str) -> Result<RawRecord> {
    let decode_error = |message: String| IngestError::RecordDecode {
        path: path.to_path_buf(),
        member: member.to_string(),
        line,
        message,
    };
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(decode_error("expected a JSON object".to_string())),
        Err(e) => Err(decode_error(e.to_string())),
    }
}
