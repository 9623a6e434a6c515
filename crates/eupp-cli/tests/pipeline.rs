//! Integration tests for the ingestion pipeline.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::{Value, json};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

use eupp_cli::pipeline::{PipelineOptions, process_file, run_pipeline};
use eupp_cli::types::FileStatus;
use eupp_dataset::{DatasetHandle, count_rows};
use eupp_model::RecordKind;

fn write_archive(dir: &Path, name: &str, records: &[Value]) -> PathBuf {
    let path = dir.join(name);
    let file = File::create(&path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    writer
        .start_file(name.trim_end_matches(".zip"), SimpleFileOptions::default())
        .unwrap();
    for record in records {
        writeln!(writer, "{record}").unwrap();
    }
    writer.finish().unwrap();
    path
}

fn analysis_records(path: &str) -> Vec<Value> {
    // The last record is valid on the following day.
    [("0000", "0"), ("0600", "0"), ("1200", "0"), ("1800", "12")]
        .iter()
        .map(|(time, step)| {
            json!({
                "domain": "g", "class": "od", "type": "an", "stream": "oper",
                "date": "20170131", "time": time, "step": step, "levtype": "sfc",
                "param": "2t", "_path": path, "_offset": 0, "_length": 100
            })
        })
        .collect()
}

fn options(root: &Path) -> PipelineOptions {
    PipelineOptions {
        dataset_root: root.to_path_buf(),
        max_records: None,
        lock_timeout: Duration::from_secs(5),
    }
}

#[test]
fn test_second_run_skips_ingested_file() {
    let dir = TempDir::new().unwrap();
    let archive = write_archive(
        dir.path(),
        "EU_analysis_surf_params_2017-01.grb.index.zip",
        &analysis_records("data/ana/surf/EU_analysis_surf_params_2017-01.grb"),
    );
    let root = dir.path().join("datasets");
    let options = options(&root);

    let first = run_pipeline(std::slice::from_ref(&archive), &options);
    assert!(!first.has_errors());
    assert_eq!(first.rows_written(), 4);
    assert!(matches!(
        first.files[0].status,
        FileStatus::Committed { rows: 4, partitions: 2 }
    ));
    assert_eq!(first.files[0].records, 4);

    let second = run_pipeline(std::slice::from_ref(&archive), &options);
    assert!(!second.has_errors());
    assert_eq!(second.rows_written(), 0);
    assert!(matches!(second.files[0].status, FileStatus::Skipped { .. }));

    let handle = DatasetHandle::open(&root, RecordKind::Analysis);
    assert_eq!(count_rows(&handle).unwrap(), 4);
}

#[test]
fn test_failed_file_does_not_stop_the_run() {
    let dir = TempDir::new().unwrap();
    let broken = write_archive(
        dir.path(),
        "EU_analysis_pressure_params_2017-02.grb.index.zip",
        &[json!({"date": "20170201", "time": "0000", "step": "x", "param": "t", "_path": "a"})],
    );
    let misnamed = dir.path().join("notes.zip");
    let good = write_archive(
        dir.path(),
        "EU_analysis_surf_params_2017-01.grb.index.zip",
        &analysis_records("b"),
    );
    let root = dir.path().join("datasets");

    let result = run_pipeline(&[broken, misnamed, good], &options(&root));
    assert!(result.has_errors());
    assert_eq!(result.files.len(), 3);
    assert_eq!(
        result.count(|status| matches!(status, FileStatus::Failed { .. })),
        2
    );
    assert!(matches!(
        result.files[2].status,
        FileStatus::Committed { rows: 4, .. }
    ));

    // The step decode failure still reports which file it came from.
    let descriptor = result.files[0].descriptor.as_ref().unwrap();
    assert_eq!(descriptor.record_kind, RecordKind::Analysis);
    assert_eq!(descriptor.product, "pressure");
    assert!(result.files[1].descriptor.is_none());
}

#[test]
fn test_process_file_respects_record_cap() {
    let dir = TempDir::new().unwrap();
    let archive = write_archive(
        dir.path(),
        "EU_analysis_surf_params_2017-01.grb.index.zip",
        &analysis_records("c"),
    );
    let mut options = options(&dir.path().join("datasets"));
    options.max_records = Some(1);

    let processed = process_file(&archive, &options).unwrap();
    assert_eq!(processed.records, 1);
    assert_eq!(processed.descriptor.record_kind, RecordKind::Analysis);
}
