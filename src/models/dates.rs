//! Date parsing shared by the store, the notification rules and the
//! dashboard aggregator.
//!
//! Records carry dates as strings. Anything that does not parse yields
//! `None` and the caller treats the record as matching nothing.

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a stored date string into a clinic-local date-time.
///
/// Offset-carrying RFC 3339 values are converted to local time; naive
/// values are taken as already local; a bare date is midnight.
pub fn parse_instant(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).naive_local());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Same as [`parse_instant`] for optional fields.
pub fn parse_opt(raw: Option<&str>) -> Option<NaiveDateTime> {
    raw.and_then(parse_instant)
}

pub fn start_of_day(at: NaiveDateTime) -> NaiveDateTime {
    at.date().and_time(NaiveTime::MIN)
}

/// Monday 00:00:00 of the ISO week containing `at`.
pub fn start_of_week(at: NaiveDateTime) -> NaiveDateTime {
    let days_from_monday = at.date().weekday().num_days_from_monday() as i64;
    start_of_day(at) - Duration::days(days_from_monday)
}

/// Current clinic-local time.
pub fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Format a date-time the way the store writes it.
pub fn format_instant(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%dT%H:%M:%S").to_string()
}
