//! CF time-axis conversion.
//!
//! CF time coordinates are offsets from a reference date, described by a
//! units string such as `"hours since 2024-01-01 00:00:00"`.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

/// Parse the reference date of a CF time units string.
fn parse_base_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    // Trailing "Z" or "UTC" markers carry no extra information
    let s = s.trim_end_matches(" UTC").trim_end_matches('Z');
    for fmt in [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }

    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

/// Milliseconds per unit of a CF clock unit name.
fn unit_millis(unit: &str) -> Option<f64> {
    match unit.to_lowercase().as_str() {
        "days" | "day" => Some(86_400_000.0),
        "hours" | "hour" => Some(3_600_000.0),
        "minutes" | "minute" => Some(60_000.0),
        "seconds" | "second" => Some(1_000.0),
        "msecs" | "msec" => Some(1.0),
        _ => None,
    }
}

/// Resolve a time coordinate value to a UTC instant.
pub fn time_to_datetime(value: f64, units: &str) -> Option<DateTime<Utc>> {
    let (unit, base) = units.trim().split_once(" since ")?;
    let millis = value * unit_millis(unit.trim())?;
    if !millis.is_finite() {
        return None;
    }
    let base = parse_base_date(base)?;
    base.checked_add_signed(Duration::try_milliseconds(millis.round() as i64)?)
}

/// Format a time coordinate value as an RFC 3339 UTC string with
/// milliseconds, e.g. `2024-01-01T06:00:00.000Z`.
///
/// Values whose units cannot be interpreted are returned as plain numbers.
pub fn time_iso_string(value: f64, units: &str) -> String {
    match time_to_datetime(value, units) {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => value.to_string(),
    }
}
