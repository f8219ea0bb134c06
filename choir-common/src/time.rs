//! Calendar day keys for event date matching

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];
const NAIVE_DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Local calendar date of an event date string.
///
/// Date-only strings are calendar dates as written. Timestamps with an offset
/// are converted to the local time zone first, so `2025-10-10` and an ISO
/// timestamp falling on that local day share a key. Returns `None` when the
/// string is not a recognizable date.
pub fn day_key(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Some(instant.with_timezone(&Local).date_naive());
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(local) = NaiveDateTime::parse_from_str(value, format) {
            return Some(local.date());
        }
    }

    None
}

/// Whether two event date strings name the same day.
///
/// Falls back to trimmed string equality when either side does not parse.
pub fn same_day(a: &str, b: &str) -> bool {
    match (day_key(a), day_key(b)) {
        (Some(left), Some(right)) => left == right,
        _ => a.trim() == b.trim(),
    }
}

/// Current wall-clock time as Unix milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
