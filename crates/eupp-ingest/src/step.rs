//! Forecast step decoding.

/// Decode a GRIB index `step` value to its end-of-range hour.
///
/// Accepts `<end>` or `<start>-<end>` where both parts are ASCII digits;
/// returns `None` for anything else, including values that overflow `i64`.
///
/// ```
/// use eupp_ingest::decode_step;
///
/// assert_eq!(decode_step("12"), Some(12));
/// assert_eq!(decode_step("6-12"), Some(12));
/// assert_eq!(decode_step("abc"), None);
/// ```
pub fn decode_step(value: &str) -> Option<i64> {
    let end = match value.split_once('-') {
        Some((start, end)) if is_digits(start) => end,
        Some(_) => return None,
        None => value,
    };
    if !is_digits(end) {
        return None;
    }
    end.parse().ok()
}

fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}
