//! Record normalization.
//!
//! Raw GRIB index records are flat JSON objects with a loose schema. This
//! module turns the records of one source file into [`NormalizedRow`]s:
//!
//! - analysis records are shifted to their valid time (`date + time + step`)
//!   and keep the hour as a regular column
//! - forecast and reforecast records keep the model-run day, fold `levelist`
//!   into `param` and carry the run metadata from the filename
//! - noise columns are dropped, everything else is passed through

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, NaiveTime, TimeDelta, Timelike};
use serde_json::Value;

use eupp_model::{
    FieldValue, NormalizedBatch, NormalizedRow, PATH_COLUMN, RawRecord, RecordKind, RowDetail,
    SourceFileDescriptor, json_scalar_text,
};

use crate::error::{IngestError, Result};
use crate::step::decode_step;

/// Columns removed from every record.
const DROPPED_COLUMNS: &[&str] = &[
    "domain",
    "levtype",
    "class",
    "type",
    "stream",
    "expver",
    "_leg_number",
    "_param_id",
];

/// Columns consumed by analysis normalization.
const ANALYSIS_CONSUMED: &[&str] = &["date", "time", "step", "param", PATH_COLUMN];

/// Output names owned by analysis rows; raw columns with these names are dropped.
const ANALYSIS_RESERVED: &[&str] = &["year", "month", "day", "hour"];

/// Columns consumed by forecast normalization. `step` is re-added decoded.
const FORECAST_CONSUMED: &[&str] = &["date", "step", "param", PATH_COLUMN, "levelist", "number"];

const FORECAST_RESERVED: &[&str] = &["year", "month", "day", "version", "product"];

/// Normalize the records of one source file.
///
/// # Errors
///
/// - [`IngestError::Schema`] if `records` is empty, a record lacks a required
///   column, or `date`, `time` or `number` cannot be interpreted
/// - [`IngestError::StepDecode`] if a `step` value is not `<end>` or `<start>-<end>`
pub fn normalize(
    descriptor: &SourceFileDescriptor,
    records: &[RawRecord],
) -> Result<NormalizedBatch> {
    if records.is_empty() {
        return Err(IngestError::schema("no records to normalize"));
    }

    let rows = records
        .iter()
        .enumerate()
        .map(|(index, record)| match descriptor.record_kind {
            RecordKind::Analysis => normalize_analysis(index, record),
            RecordKind::Forecast | RecordKind::Reforecast => {
                normalize_forecast(descriptor, index, record)
            }
        })
        .collect::<Result<Vec<_>>>()?;

    let batch = NormalizedBatch::new(descriptor.record_kind, rows);
    tracing::debug!(
        record_kind = %batch.record_kind,
        rows = batch.len(),
        paths = batch.distinct_paths.len(),
        "normalized records"
    );
    Ok(batch)
}

fn normalize_analysis(index: usize, record: &RawRecord) -> Result<NormalizedRow> {
    let date = parse_date(index, &required_text(index, record, "date")?)?;
    let time = parse_time(index, &required_text(index, record, "time")?)?;
    let step = required_step(index, record)?;
    let param = required_text(index, record, "param")?;
    let path = required_text(index, record, PATH_COLUMN)?;

    let valid = TimeDelta::try_hours(step)
        .and_then(|delta| date.and_time(time).checked_add_signed(delta))
        .ok_or_else(|| {
            IngestError::schema(format!("record {index}: valid time out of range for step {step}"))
        })?;

    Ok(NormalizedRow {
        param,
        path,
        year: valid.year(),
        month: valid.month() as i32,
        day: valid.day() as i32,
        detail: RowDetail::Analysis {
            hour: valid.hour() as i32,
        },
        extra: passthrough(record, ANALYSIS_CONSUMED, ANALYSIS_RESERVED),
    })
}

fn normalize_forecast(
    descriptor: &SourceFileDescriptor,
    index: usize,
    record: &RawRecord,
) -> Result<NormalizedRow> {
    let date = parse_date(index, &required_text(index, record, "date")?)?;
    let step = required_step(index, record)?;
    let mut param = required_text(index, record, "param")?;
    let path = required_text(index, record, PATH_COLUMN)?;

    if let Some(level) = record.get("levelist").and_then(json_scalar_text) {
        param.push_str(&level);
    }
    let number = parse_number(index, record.get("number"))?;

    let mut extra = passthrough(record, FORECAST_CONSUMED, FORECAST_RESERVED);
    extra.insert("step".to_string(), FieldValue::Int(step));

    Ok(NormalizedRow {
        param,
        path,
        year: date.year(),
        month: date.month() as i32,
        day: date.day() as i32,
        detail: RowDetail::Forecast {
            version: descriptor.version,
            product: descriptor.product.clone(),
            number,
        },
        extra,
    })
}

fn required_text(index: usize, record: &RawRecord, column: &str) -> Result<String> {
    record
        .get(column)
        .and_then(json_scalar_text)
        .ok_or_else(|| IngestError::schema(format!("record {index} lacks column '{column}'")))
}

fn required_step(index: usize, record: &RawRecord) -> Result<i64> {
    let value = required_text(index, record, "step")?;
    decode_step(&value).ok_or(IngestError::StepDecode {
        record: index,
        value,
    })
}

/// `YYYYMMDD`, exactly eight digits.
fn parse_date(index: usize, value: &str) -> Result<NaiveDate> {
    let invalid = || IngestError::schema(format!("record {index}: invalid date '{value}'"));
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let year = value[0..4].parse().map_err(|_| invalid())?;
    let month = value[4..6].parse().map_err(|_| invalid())?;
    let day = value[6..8].parse().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

/// `HHMM`; shorter values are left-padded, so `0` and `600` are midnight and 06:00.
fn parse_time(index: usize, value: &str) -> Result<NaiveTime> {
    let invalid = || IngestError::schema(format!("record {index}: invalid time '{value}'"));
    if value.is_empty() || value.len() > 4 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let padded = format!("{value:0>4}");
    let hour = padded[0..2].parse().map_err(|_| invalid())?;
    let minute = padded[2..4].parse().map_err(|_| invalid())?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

/// Ensemble member; control runs carry no `number` and become member 0.
fn parse_number(index: usize, value: Option<&Value>) -> Result<i64> {
    let invalid = |shown: String| {
        IngestError::schema(format!("record {index}: invalid number '{shown}'"))
    };
    match value {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => n.as_i64().ok_or_else(|| invalid(n.to_string())),
        Some(Value::String(s)) => s.trim().parse().map_err(|_| invalid(s.clone())),
        Some(other) => Err(invalid(other.to_string())),
    }
}

fn passthrough(
    record: &RawRecord,
    consumed: &[&str],
    reserved: &[&str],
) -> BTreeMap<String, FieldValue> {
    record
        .iter()
        .filter(|(name, _)| {
            let name = name.as_str();
            !consumed.contains(&name) && !reserved.contains(&name) && !is_dropped(name)
        })
        .map(|(name, value)| (name.clone(), FieldValue::from_json(value)))
        .collect()
}

/// Fixed noise columns plus internal `_<name>_id` identifiers.
fn is_dropped(name: &str) -> bool {
    DROPPED_COLUMNS.contains(&name) || (name.starts_with('_') && name.ends_with("_id"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    fn analysis() -> SourceFileDescriptor {
        SourceFileDescriptor::new(RecordKind::Analysis, "surf", "surf", None)
    }

    #[test]
    fn analysis_shifts_to_valid_time() {
        let records = vec![record(json!({
            "date": "20170101", "time": "0000", "step": "12", "param": "2t",
            "_path": "p1", "domain": "g", "class": "ce", "_offset": 0, "_length": 120,
        }))];
        let batch = normalize(&analysis(), &records).unwrap();
        let row = &batch.rows[0];
        assert_eq!((row.year, row.month, row.day), (2017, 1, 1));
        assert_eq!(row.hour(), Some(12));
        let extras: Vec<&str> = row.extra.keys().map(String::as_str).collect();
        assert_eq!(extras, vec!["_length", "_offset"]);
    }

    #[test]
    fn analysis_step_crosses_midnight() {
        let records = vec![record(json!({
            "date": "20171231", "time": "1800", "step": "0-12", "param": "tp", "_path": "p1",
        }))];
        let row = &normalize(&analysis(), &records).unwrap().rows[0];
        assert_eq!((row.year, row.month, row.day), (2018, 1, 1));
        assert_eq!(row.hour(), Some(6));
    }

    #[test]
    fn short_times_are_padded() {
        assert_eq!(parse_time(0, "0").unwrap(), NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        assert_eq!(parse_time(0, "600").unwrap(), NaiveTime::from_hms_opt(6, 0, 0).unwrap());
        assert!(parse_time(0, "2400").is_err());
        assert!(parse_time(0, "12:00").is_err());
    }

    #[test]
    fn rejects_bad_dates() {
        assert!(parse_date(0, "2017011").is_err());
        assert!(parse_date(0, "20170230").is_err());
        assert!(parse_date(0, "2017-01-01").is_err());
        assert_eq!(
            parse_date(0, "20170228").unwrap(),
            NaiveDate::from_ymd_opt(2017, 2, 28).unwrap()
        );
    }

    #[test]
    fn drops_internal_id_columns() {
        assert!(is_dropped("_param_id"));
        assert!(is_dropped("_grid_id"));
        assert!(is_dropped("expver"));
        assert!(!is_dropped("_offset"));
        assert!(!is_dropped("levelist"));
    }

    #[test]
    fn number_accepts_digit_strings() {
        assert_eq!(parse_number(0, None).unwrap(), 0);
        assert_eq!(parse_number(0, Some(&json!(null))).unwrap(), 0);
        assert_eq!(parse_number(0, Some(&json!(7))).unwrap(), 7);
        assert_eq!(parse_number(0, Some(&json!("10"))).unwrap(), 10);
        assert!(parse_number(0, Some(&json!("ten"))).is_err());
        assert!(parse_number(0, Some(&json!(1.5))).is_err());
    }
}
