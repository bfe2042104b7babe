//! Timestamp helpers.
//!
//! Record timestamps are stored as RFC 3339 strings with millisecond
//! precision and a `Z` suffix. Older or hand-entered records may carry a bare
//! `YYYY-MM-DD` date or integer unix milliseconds; all three are accepted.

use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use serde_json::Value;

/// Format an instant the way records store it.
#[must_use]
pub fn to_record_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The current instant formatted for a record.
#[must_use]
pub fn now_timestamp() -> String {
    to_record_timestamp(Utc::now())
}

/// Parse a timestamp string (RFC 3339 or `YYYY-MM-DD`).
#[must_use]
pub fn parse_timestamp_str(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Parse a timestamp held in a JSON value.
#[must_use]
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp_str(s),
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    }
}
