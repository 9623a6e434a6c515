//! Settings file.
//!
//! Settings are read from `--config <PATH>` or, when absent, from the
//! platform configuration folder:
//! - macOS: ~/Library/Application Support/org.eupp.eupp/
//! - Windows: %APPDATA%/eupp/eupp/config/
//! - Linux: ~/.config/eupp/
//!
//! A missing or unreadable file is never fatal; defaults are used instead.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

const APP_QUALIFIER: &str = "org";
const APP_ORG: &str = "eupp";
const APP_NAME: &str = "eupp";
const CONFIG_FILENAME: &str = "settings.toml";

/// Persistent defaults for the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding `<kind>.parquet` datasets.
    pub dataset_root: PathBuf,
    /// Local mirror of zipped GRIB indexes.
    pub data_dir: PathBuf,
    /// How long to wait for another writer, in milliseconds.
    pub lock_timeout_ms: u64,
    /// Cap on records read per archive; development only.
    pub max_records: Option<usize>,
    /// Index version used by the catalog.
    pub version: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dataset_root: PathBuf::from("."),
            data_dir: PathBuf::from("_data"),
            lock_timeout_ms: 60_000,
            max_records: None,
            version: 0,
        }
    }
}

impl Settings {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

/// Get the path to the default settings file.
///
/// Returns `None` if the platform-specific directory cannot be determined.
pub fn settings_path() -> Option<PathBuf> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}

/// Load settings from `explicit`, or from the default location.
pub fn load_settings(explicit: Option<&Path>) -> Settings {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let Some(path) = settings_path() else {
                tracing::warn!("could not determine settings path, using defaults");
                return Settings::default();
            };
            path
        }
    };
    load_settings_from(&path)
}

/// Load settings from `path`, falling back to defaults.
pub fn load_settings_from(path: &Path) -> Settings {
    match fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                tracing::debug!(path = %path.display(), "loaded settings");
                settings
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to parse settings file, using defaults");
                Settings::default()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            Settings::default()
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to read settings file, using defaults");
            Settings::default()
        }
    }
}
