//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use eupp_model::RecordKind;

#[derive(Parser)]
#[command(
    name = "eupp",
    version,
    about = "Ingest EUPP benchmark GRIB indexes into partitioned Parquet datasets",
    long_about = "Ingest zipped GRIB index files of the EUPP benchmark into one\n\
                  Hive-partitioned Parquet dataset per record kind.\n\n\
                  Files whose records are already in the dataset are skipped."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Settings file (default: platform configuration folder).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the datasets (overrides the settings file).
    #[arg(long = "dataset-root", value_name = "DIR", global = true)]
    pub dataset_root: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Ingest zipped GRIB index files.
    Ingest(IngestArgs),

    /// Show the metadata parsed from file names.
    Inspect(InspectArgs),

    /// List the index files expected for a period.
    Catalog(CatalogArgs),

    /// Count committed rows per dataset.
    Count(CountArgs),
}

#[derive(Args)]
pub struct IngestArgs {
    /// Zipped GRIB index files (`EU_*.grb.index.zip`).
    #[arg(value_name = "ARCHIVE", required = true)]
    pub archives: Vec<PathBuf>,

    /// Read at most this many records per archive (development only).
    #[arg(long = "max-records", value_name = "N")]
    pub max_records: Option<usize>,

    /// Milliseconds to wait for another writer to release a dataset.
    #[arg(long = "lock-timeout-ms", value_name = "MS")]
    pub lock_timeout_ms: Option<u64>,
}

#[derive(Args)]
pub struct InspectArgs {
    /// File names or paths to parse.
    #[arg(value_name = "FILENAME", required = true)]
    pub filenames: Vec<String>,
}

#[derive(Args)]
pub struct CatalogArgs {
    /// Record kind to list.
    #[arg(value_enum)]
    pub kind: KindArg,

    /// Years to list (repeat or comma-separate).
    #[arg(long = "year", value_name = "YEAR", required = true, value_delimiter = ',')]
    pub years: Vec<i32>,

    /// Months to list (default: all twelve).
    #[arg(long = "month", value_name = "MONTH", value_delimiter = ',')]
    pub months: Vec<u32>,

    /// Index version (default from settings).
    #[arg(long = "index-version", value_name = "N")]
    pub index_version: Option<i64>,

    /// Local mirror to check for zipped copies (default from settings).
    #[arg(long = "data-dir", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Print full download URLs instead of relative paths.
    #[arg(long = "urls")]
    pub urls: bool,
}

#[derive(Args)]
pub struct CountArgs {
    /// Dataset to count (default: all).
    #[arg(value_enum)]
    pub kind: Option<KindArg>,
}

/// CLI record kind choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum KindArg {
    Analysis,
    Forecast,
    Reforecast,
}

impl From<KindArg> for RecordKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Analysis => RecordKind::Analysis,
            KindArg::Forecast => RecordKind::Forecast,
            KindArg::Reforecast => RecordKind::Reforecast,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
