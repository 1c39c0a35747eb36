//! Calendar-date handling.
//!
//! Stage dates travel as plain `YYYY-MM-DD` strings and are stored as noon UTC
//! on that day, so no client or server offset can push them onto a neighbouring
//! day. Display always reads the UTC calendar components back.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

pub const DATE_ONLY_FORMAT: &str = "%Y-%m-%d";
pub const DISPLAY_FORMAT: &str = "%b %-d, %Y";

pub fn noon_utc(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)) + Duration::hours(12)
}

/// Parses a stage date. Accepts `YYYY-MM-DD` or an RFC 3339 instant (whose UTC
/// day is kept); anything else yields `None`.
pub fn parse_date_only(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, DATE_ONLY_FORMAT) {
        return Some(noon_utc(date));
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|instant| noon_utc(instant.with_timezone(&Utc).date_naive()))
}

/// Parses a free event timestamp. RFC 3339 instants are kept as-is, bare
/// dates become noon UTC.
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    match DateTime::parse_from_rfc3339(value) {
        Ok(instant) => Some(instant.with_timezone(&Utc)),
        Err(_) => parse_date_only(value),
    }
}

#[cfg(test)]
pub fn to_date_only_string(instant: &DateTime<Utc>) -> String {
    instant.format(DATE_ONLY_FORMAT).to_string()
}

/// Renders `Mar 15, 2024` from the UTC calendar day.
pub fn format_display(instant: &DateTime<Utc>) -> String {
    instant.format(DISPLAY_FORMAT).to_string()
}
