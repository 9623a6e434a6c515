use std::time::Duration;

use anyhow::{Context, Result, bail};
use comfy_table::{Cell, CellAlignment, Table};
use tracing::{debug, info_span};

use eupp_cli::pipeline::{PipelineOptions, run_pipeline};
use eupp_cli::settings::Settings;
use eupp_cli::types::IngestRunResult;
use eupp_dataset::{DatasetHandle, count_rows};
use eupp_ingest::{BASE_URL, catalog, extract};
use eupp_model::RecordKind;

use crate::cli::{CatalogArgs, CountArgs, IngestArgs, InspectArgs};
use crate::summary::{align_column, apply_table_style, dim_cell, header_cell};

pub fn run_ingest(args: &IngestArgs, settings: &Settings) -> Result<IngestRunResult> {
    let max_records = args.max_records.or(settings.max_records);
    if max_records == Some(0) {
        bail!("--max-records must be at least 1");
    }
    let options = PipelineOptions {
        dataset_root: settings.dataset_root.clone(),
        max_records,
        lock_timeout: args
            .lock_timeout_ms
            .map_or_else(|| settings.lock_timeout(), Duration::from_millis),
    };
    let _span = info_span!("ingest", dataset_root = %options.dataset_root.display()).entered();
    Ok(run_pipeline(&args.archives, &options))
}

/// Print the descriptor of each file name; returns false when any name is rejected.
pub fn run_inspect(args: &InspectArgs) -> Result<bool> {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("File"),
        header_cell("Kind"),
        header_cell("Product"),
        header_cell("Sub-kind"),
        header_cell("Version"),
        header_cell("Dataset"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 4, CellAlignment::Right);

    let mut all_valid = true;
    for filename in &args.filenames {
        match extract(filename) {
            Ok(descriptor) => {
                table.add_row(vec![
                    filename.clone(),
                    descriptor.record_kind.to_string(),
                    descriptor.product.clone(),
                    descriptor.sub_kind.clone(),
                    descriptor
                        .version
                        .map_or_else(|| "-".to_string(), |v| v.to_string()),
                    descriptor.dataset_name().to_string(),
                ]);
            }
            Err(error) => {
                all_valid = false;
                eprintln!("{filename}: {error}");
            }
        }
    }
    println!("{table}");
    Ok(all_valid)
}

pub fn run_catalog(args: &CatalogArgs, settings: &Settings) -> Result<()> {
    let kind = RecordKind::from(args.kind);
    let months: Vec<u32> = if args.months.is_empty() {
        (1..=12).collect()
    } else {
        args.months.clone()
    };
    let version = args.index_version.unwrap_or(settings.version);
    let data_dir = args.data_dir.as_ref().unwrap_or(&settings.data_dir);

    let entries = catalog(kind, &args.years, &months, version)
        .with_context(|| format!("list {kind} index files"))?;
    debug!(kind = %kind, entries = entries.len(), "catalog built");

    let mut present = 0usize;
    for entry in &entries {
        let local = data_dir.join(entry.zip_name());
        let location = if args.urls {
            entry.url(BASE_URL)
        } else {
            entry.remote_path.clone()
        };
        if local.is_file() {
            present += 1;
            println!("[x] {location}");
        } else {
            println!("[ ] {location}");
        }
    }
    eprintln!(
        "{present} of {} files present in {}",
        entries.len(),
        data_dir.display()
    );
    Ok(())
}

pub fn run_count(args: &CountArgs, settings: &Settings) -> Result<()> {
    let kinds: Vec<RecordKind> = match args.kind {
        Some(kind) => vec![kind.into()],
        None => RecordKind::ALL.to_vec(),
    };

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Dataset"),
        header_cell("Path"),
        header_cell("Rows"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);

    for kind in kinds {
        let handle = DatasetHandle::open(&settings.dataset_root, kind);
        let rows = count_rows(&handle)
            .with_context(|| format!("count rows in {}", handle.root().display()))?;
        let rows_cell = if handle.exists() {
            Cell::new(rows)
        } else {
            dim_cell("absent")
        };
        table.add_row(vec![
            Cell::new(kind.as_str()),
            Cell::new(handle.root().display()),
            rows_cell,
        ]);
    }
    println!("{table}");
    Ok(())
}
