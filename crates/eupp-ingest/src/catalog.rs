//! Expected source files per record kind and period.
//!
//! The benchmark publishes one GRIB index per product and month (per day for
//! ensemble runs). The catalog lists the names a complete local mirror should
//! contain; fetching them is left to other tools.

use chrono::{Datelike, NaiveDate, Weekday};

use eupp_model::RecordKind;

use crate::error::{IngestError, Result};
use crate::filename::INDEX_EXTENSION;

/// Root of the public benchmark bucket.
pub const BASE_URL: &str = "https://storage.ecmwf.europeanweather.cloud/benchmark-dataset";

/// Earliest year the catalog accepts.
pub const MIN_YEAR: i32 = 1950;

/// Latest year the catalog accepts.
pub const MAX_YEAR: i32 = 2050;

/// One expected GRIB index file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Path relative to the bucket root, e.g. `data/ana/surf/EU_analysis_surf_params_2017-01.grb.index`.
    pub remote_path: String,
    /// Index file name without directories.
    pub filename: String,
}

impl CatalogEntry {
    fn new(directory: &str, filename: String) -> Self {
        Self {
            remote_path: format!("{directory}/{filename}"),
            filename,
        }
    }

    /// Name of the zipped local copy.
    pub fn zip_name(&self) -> String {
        format!("{}.zip", self.filename)
    }

    /// Full URL below `base`.
    pub fn url(&self, base: &str) -> String {
        format!("{}/{}", base.trim_end_matches('/'), self.remote_path)
    }
}

/// Check that every year is within the catalog range and every month is a month.
///
/// # Errors
///
/// Returns [`IngestError::InvalidOption`] naming the first offending value,
/// or when either list is empty.
pub fn validate_period(years: &[i32], months: &[u32]) -> Result<()> {
    if years.is_empty() {
        return Err(invalid("years", "at least one year is required".to_string()));
    }
    if months.is_empty() {
        return Err(invalid("months", "at least one month is required".to_string()));
    }
    if let Some(year) = years.iter().find(|y| !(MIN_YEAR..=MAX_YEAR).contains(*y)) {
        return Err(invalid(
            "years",
            format!("{year} outside {MIN_YEAR}-{MAX_YEAR}"),
        ));
    }
    if let Some(month) = months.iter().find(|m| !(1..=12).contains(*m)) {
        return Err(invalid("months", format!("{month} outside 1-12")));
    }
    Ok(())
}

fn invalid(name: &'static str, reason: String) -> IngestError {
    IngestError::InvalidOption { name, reason }
}

/// List the index files expected for `kind` over the given period.
///
/// `version` is ignored for analysis files, which are not versioned.
pub fn catalog(
    kind: RecordKind,
    years: &[i32],
    months: &[u32],
    version: i64,
) -> Result<Vec<CatalogEntry>> {
    validate_period(years, months)?;

    let mut entries = Vec::new();
    for &year in years {
        for &month in months {
            let period = format!("{year:04}-{month:02}");
            match kind {
                RecordKind::Analysis => analysis_month(&mut entries, &period),
                RecordKind::Forecast => {
                    forecast_month(&mut entries, &period, version);
                    for day in days_of_month(year, month)? {
                        forecast_day(&mut entries, day, version);
                    }
                }
                RecordKind::Reforecast => {
                    reforecast_month(&mut entries, &period, version);
                    for day in days_of_month(year, month)?
                        .filter(|day| matches!(day.weekday(), Weekday::Mon | Weekday::Thu))
                    {
                        reforecast_day(&mut entries, day, version);
                    }
                }
            }
        }
    }
    Ok(entries)
}

fn index_name(stem: &str, suffix: &str) -> String {
    format!("EU_{stem}_params_{suffix}{INDEX_EXTENSION}")
}

fn analysis_month(entries: &mut Vec<CatalogEntry>, period: &str) {
    for level in ["pressure", "surf"] {
        entries.push(CatalogEntry::new(
            &format!("data/ana/{level}"),
            index_name(&format!("analysis_{level}"), period),
        ));
    }
}

fn forecast_month(entries: &mut Vec<CatalogEntry>, period: &str, version: i64) {
    let suffix = format!("{period}_{version}");
    for (directory, stem) in [
        ("data/fcs/pressure", "forecast_ctr_pressure"),
        ("data/fcs/surf", "forecast_ctr_surf"),
        ("data/fcs/surf", "forecast_hr_surf"),
        ("data/fcs/efi", "forecast_efi"),
    ] {
        entries.push(CatalogEntry::new(directory, index_name(stem, &suffix)));
    }
}

fn forecast_day(entries: &mut Vec<CatalogEntry>, day: NaiveDate, version: i64) {
    let suffix = format!("{}_{version}", day.format("%Y-%m-%d"));
    for level in ["pressure", "surf"] {
        entries.push(CatalogEntry::new(
            &format!("data/fcs/{level}"),
            index_name(&format!("forecast_ens_{level}"), &suffix),
        ));
    }
}

fn reforecast_month(entries: &mut Vec<CatalogEntry>, period: &str, version: i64) {
    let suffix = format!("{period}_{version}");
    for level in ["surf", "pressure"] {
        entries.push(CatalogEntry::new(
            &format!("data/rfcs/{level}"),
            index_name(&format!("reforecast_ctr_{level}"), &suffix),
        ));
    }
}

fn reforecast_day(entries: &mut Vec<CatalogEntry>, day: NaiveDate, version: i64) {
    let suffix = format!("{}_{version}", day.format("%Y-%m-%d"));
    for level in ["surf", "pressure"] {
        entries.push(CatalogEntry::new(
            &format!("data/rfcs/{level}"),
            index_name(&format!("reforecast_ens_{level}"), &suffix),
        ));
    }
}

fn days_of_month(year: i32, month: u32) -> Result<impl Iterator<Item = NaiveDate>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| invalid("months", format!("{year}-{month} is not a valid month")))?;
    Ok(first
        .iter_days()
        .take_while(move |day| day.month() == month))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filename::extract;

    #[test]
    fn analysis_lists_both_levels() {
        let entries = catalog(RecordKind::Analysis, &[2017], &[1], 0).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0].remote_path,
            "data/ana/pressure/EU_analysis_pressure_params_2017-01.grb.index"
        );
        assert_eq!(
            entries[1].zip_name(),
            "EU_analysis_surf_params_2017-01.grb.index.zip"
        );
        assert_eq!(
            entries[1].url(&format!("{BASE_URL}/")),
            format!("{BASE_URL}/data/ana/surf/EU_analysis_surf_params_2017-01.grb.index")
        );
    }

    #[test]
    fn forecast_lists_monthly_and_daily_files() {
        let entries = catalog(RecordKind::Forecast, &[2017], &[2], 0).unwrap();
        // 4 monthly files plus 2 per day of February 2017
        assert_eq!(entries.len(), 4 + 2 * 28);
        assert!(entries.iter().any(|e| e.filename
            == "EU_forecast_ens_surf_params_2017-02-28_0.grb.index"));
    }

    #[test]
    fn reforecast_days_are_mondays_and_thursdays() {
        // January 2018: Mondays 1, 8, 15, 22, 29; Thursdays 4, 11, 18, 25
        let entries = catalog(RecordKind::Reforecast, &[2018], &[1], 1).unwrap();
        assert_eq!(entries.len(), 2 + 2 * 9);
        assert!(entries.iter().any(|e| e.remote_path
            == "data/rfcs/surf/EU_reforecast_ens_surf_params_2018-01-01_1.grb.index"));
        assert!(!entries.iter().any(|e| e.filename.contains("2018-01-02")));
    }

    #[test]
    fn every_zipped_name_is_extractable() {
        for kind in RecordKind::ALL {
            for entry in catalog(kind, &[2017], &[1, 12], 3).unwrap() {
                let descriptor = extract(&entry.zip_name()).unwrap();
                assert_eq!(descriptor.record_kind, kind);
                if kind != RecordKind::Analysis {
                    assert_eq!(descriptor.version, Some(3));
                }
            }
        }
    }

    #[test]
    fn rejects_out_of_range_periods() {
        assert!(validate_period(&[1949], &[1]).is_err());
        assert!(validate_period(&[2051], &[1]).is_err());
        assert!(validate_period(&[2017], &[0]).is_err());
        assert!(validate_period(&[2017], &[13]).is_err());
        assert!(validate_period(&[], &[1]).is_err());
        assert!(validate_period(&[1950, 2050], &[1, 12]).is_ok());
    }
}
