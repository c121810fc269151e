use crate::error::{AlogError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Current wall clock in microseconds since the Unix epoch.
#[must_use]
pub fn now_us() -> i64 {
    Utc::now().timestamp_micros()
}

/// Parse a user-supplied date into microseconds since the epoch (UTC).
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM` and RFC 3339.
///
/// # Errors
///
/// Returns a validation error naming `field` when the input matches none of
/// the accepted formats.
pub fn parse_date(field: &'static str, raw: &str) -> Result<i64> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc).timestamp_micros());
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M") {
        return Ok(dt.and_utc().timestamp_micros());
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt.and_utc().timestamp_micros());
        }
    }

    Err(AlogError::validation(
        field,
        format!("'{raw}' is not a date (expected YYYY-MM-DD, YYYY-MM-DD HH:MM, or RFC 3339)"),
    ))
}

/// Render microseconds as `YYYY-MM-DD` (UTC).
#[must_use]
pub fn format_date(us: i64) -> String {
    DateTime::<Utc>::from_timestamp_micros(us)
        .map_or_else(|| us.to_string(), |ts| ts.format("%Y-%m-%d").to_string())
}

/// Render microseconds as an RFC 3339 UTC timestamp.
#[must_use]
pub fn format_timestamp(us: i64) -> String {
    DateTime::<Utc>::from_timestamp_micros(us).map_or_else(
        || us.to_string(),
        |ts| ts.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
    )
}
