//! Source filename parsing.
//!
//! GRIB index archives are named
//! `EU_<kind>_<product>[_<subkind>]_params<suffix>.grb.index.zip`, where the
//! suffix usually carries the period and, for forecasts, a trailing
//! `_<version>`. The name is the only place the record kind and product are
//! recorded, so it is validated strictly.

use std::path::Path;

use eupp_model::{RecordKind, SourceFileDescriptor};

use crate::error::{IngestError, Result};

const PREFIX: &str = "EU_";
const PARAMS_MARKER: &str = "_params";

/// Extension of an uncompressed GRIB index.
pub const INDEX_EXTENSION: &str = ".grb.index";

/// Extension of a zipped GRIB index.
pub const ZIPPED_INDEX_EXTENSION: &str = ".grb.index.zip";

/// Parse a source file identifier into its descriptor.
///
/// Only the final path component is inspected.
///
/// # Errors
///
/// Returns [`IngestError::Format`] naming the filename when it does not
/// follow the convention. No partial descriptor is ever produced.
pub fn extract(filename: &str) -> Result<SourceFileDescriptor> {
    let name = Path::new(filename)
        .file_name()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or(filename);

    let rest = name
        .strip_prefix(PREFIX)
        .ok_or_else(|| IngestError::format(name, "missing 'EU_' prefix"))?;
    let stem = rest
        .strip_suffix(ZIPPED_INDEX_EXTENSION)
        .ok_or_else(|| IngestError::format(name, "expected '.grb.index.zip' extension"))?;
    let marker = stem
        .find(PARAMS_MARKER)
        .ok_or_else(|| IngestError::format(name, "missing '_params' marker"))?;

    let head = &stem[..marker];
    let tail = &stem[marker + PARAMS_MARKER.len()..];

    let tokens: Vec<&str> = head.split('_').collect();
    if tokens.iter().any(|token| token.is_empty()) {
        return Err(IngestError::format(name, "empty token before '_params'"));
    }

    let (kind, product, sub_kind) = match tokens.as_slice() {
        [kind, product, sub_kind, _] => (*kind, *product, *sub_kind),
        [kind, product] | [kind, product, _] => (*kind, *product, *product),
        _ => {
            return Err(IngestError::format(
                name,
                format!("expected 2 to 4 tokens before '_params', found {}", tokens.len()),
            ));
        }
    };

    let record_kind: RecordKind = kind
        .parse()
        .map_err(|_| IngestError::format(name, format!("unknown record kind '{kind}'")))?;

    let version = parse_version(name, tail)?;

    Ok(SourceFileDescriptor::new(
        record_kind,
        product,
        sub_kind,
        version,
    ))
}

/// Version is a trailing `_<digits>` right before the index extension.
fn parse_version(name: &str, tail: &str) -> Result<Option<i64>> {
    let Some((_, last)) = tail.rsplit_once('_') else {
        return Ok(None);
    };
    if last.is_empty() || !last.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(None);
    }
    last.parse::<i64>()
        .map(Some)
        .map_err(|_| IngestError::format(name, format!("version '{last}' out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_file_uses_product_as_sub_kind() {
        let descriptor = extract("EU_analysis_pressure_params_2017-01.grb.index.zip").unwrap();
        assert_eq!(descriptor.record_kind, RecordKind::Analysis);
        assert_eq!(descriptor.product, "pressure");
        assert_eq!(descriptor.sub_kind, "pressure");
        assert_eq!(descriptor.version, None);
    }

    #[test]
    fn control_run_becomes_ensemble() {
        let descriptor =
            extract("_data/EU_forecast_ctr_pressure_params_2017-01_0.grb.index.zip").unwrap();
        assert_eq!(descriptor.record_kind, RecordKind::Forecast);
        assert_eq!(descriptor.product, "ens");
        assert_eq!(descriptor.sub_kind, "ens");
        assert_eq!(descriptor.version, Some(0));
    }

    #[test]
    fn four_tokens_keep_sub_kind() {
        let descriptor =
            extract("EU_reforecast_ens_surf_x_params_2018-01-01_12.grb.index.zip").unwrap();
        assert_eq!(descriptor.record_kind, RecordKind::Reforecast);
        assert_eq!(descriptor.product, "ens");
        assert_eq!(descriptor.sub_kind, "surf");
        assert_eq!(descriptor.version, Some(12));
    }

    #[test]
    fn efi_has_no_sub_kind() {
        let descriptor = extract("EU_forecast_efi_params_2017-01_0.grb.index.zip").unwrap();
        assert_eq!(descriptor.product, "efi");
        assert_eq!(descriptor.sub_kind, "efi");
    }

    #[test]
    fn rejects_malformed_names() {
        for name in [
            "forecast_ctr_pressure_params_2017-01_0.grb.index.zip",
            "EU_forecast_ctr_pressure_params_2017-01_0.grb.index",
            "EU_forecast_ctr_pressure_2017-01_0.grb.index.zip",
            "EU_forecast_params_2017-01_0.grb.index.zip",
            "EU_hindcast_ens_params_2017-01_0.grb.index.zip",
            "EU_forecast__surf_params_2017-01_0.grb.index.zip",
            "EU_a_b_c_d_e_params.grb.index.zip",
        ] {
            let err = extract(name).unwrap_err();
            match err {
                IngestError::Format { filename, .. } => assert_eq!(filename, name),
                other => panic!("unexpected error for {name}: {other}"),
            }
        }
    }

    #[test]
    fn version_requires_digits_only() {
        let descriptor = extract("EU_forecast_ens_surf_params_2017-01-01_v1.grb.index.zip").unwrap();
        assert_eq!(descriptor.version, None);
        let descriptor = extract("EU_forecast_ens_surf_params_2017-01-01.grb.index.zip").unwrap();
        assert_eq!(descriptor.version, None);
    }
}
