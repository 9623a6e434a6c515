use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use eupp_cli::types::{FileStatus, FileSummary, IngestRunResult};

pub fn print_ingest_summary(result: &IngestRunResult) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Source"),
        header_cell("Dataset"),
        header_cell("Product"),
        header_cell("Version"),
        header_cell("Records"),
        header_cell("Status"),
        header_cell("Partitions"),
        header_cell("ms"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);
    align_column(&mut table, 5, CellAlignment::Center);
    align_column(&mut table, 6, CellAlignment::Right);
    align_column(&mut table, 7, CellAlignment::Right);

    for file in &result.files {
        table.add_row(file_row(file));
    }

    let committed = result.count(|s| matches!(s, FileStatus::Committed { .. }));
    let skipped = result.count(|s| matches!(s, FileStatus::Skipped { .. }));
    let failed = result.count(|s| matches!(s, FileStatus::Failed { .. }));
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(format!("{} files", result.files.len()))
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
        Cell::new(result.rows_written()).add_attribute(Attribute::Bold),
        Cell::new(format!("{committed} new / {skipped} skipped / {failed} failed"))
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
    ]);
    println!("{table}");

    let failures: Vec<(&FileSummary, &str)> = result
        .files
        .iter()
        .filter_map(|file| match &file.status {
            FileStatus::Failed { error } => Some((file, error.as_str())),
            _ => None,
        })
        .collect();
    if !failures.is_empty() {
        eprintln!("Errors:");
        for (file, error) in failures {
            eprintln!("- {}: {error}", file.source.display());
        }
    }
}

fn file_row(file: &FileSummary) -> Vec<Cell> {
    let source = file
        .source
        .file_name()
        .map_or_else(|| file.source.display().to_string(), |name| {
            name.to_string_lossy().into_owned()
        });
    let (dataset, product, version) = match &file.descriptor {
        Some(descriptor) => (
            Cell::new(descriptor.dataset_name()),
            Cell::new(&descriptor.product),
            descriptor
                .version
                .map_or_else(|| dim_cell("-"), Cell::new),
        ),
        None => (dim_cell("-"), dim_cell("-"), dim_cell("-")),
    };
    let (status, partitions) = match &file.status {
        FileStatus::Committed { partitions, .. } => (
            Cell::new("committed")
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
            Cell::new(partitions),
        ),
        FileStatus::Skipped { .. } => (Cell::new("skipped").fg(Color::Yellow), dim_cell("-")),
        FileStatus::Failed { .. } => (
            Cell::new("failed")
                .fg(Color::Red)
                .add_attribute(Attribute::Bold),
            dim_cell("-"),
        ),
    };
    let records = if file.records > 0 {
        Cell::new(file.records)
    } else {
        dim_cell("-")
    };
    vec![
        Cell::new(source),
        dataset,
        product,
        version,
        records,
        status,
        partitions,
        dim_cell(file.duration_ms),
    ]
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(160);
}

pub fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

pub fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

pub fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value.to_string()).fg(Color::DarkGrey)
}
