//! Timestamp helpers.
//!
//! All records carry timestamps as ISO-8601 strings. The backend is not
//! consistent about the exact form, so parsing accepts RFC 3339, naive
//! date-times and bare dates (interpreted as UTC).

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

/// Current time as an RFC 3339 string with millisecond precision.
///
pub fn now_iso() -> String {
    to_iso(Utc::now())
}

pub fn to_iso(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a backend timestamp, returning `None` when it is not recognizable.
///
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Midnight (UTC) at the start of the day containing `at`.
///
pub fn start_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    at.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .unwrap_or(at)
}

/// Start of the week (Sunday) containing `at`.
///
pub fn start_of_week(at: DateTime<Utc>) -> DateTime<Utc> {
    use chrono::Datelike;
    let today = start_of_day(at);
    today - Duration::days(i64::from(today.weekday().num_days_from_sunday()))
}

/// Start of the month `months_back` months before the month containing `at`.
///
pub fn start_of_month(at: DateTime<Utc>, months_back: u32) -> DateTime<Utc> {
    use chrono::Datelike;
    let mut year = at.year();
    let mut month = at.month() as i32 - months_back as i32;
    while month < 1 {
        month += 12;
        year -= 1;
    }
    NaiveDate::from_ymd_opt(year, month as u32, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .unwrap_or(at)
}

/// Start of the year containing `at`.
///
pub fn start_of_year(at: DateTime<Utc>) -> DateTime<Utc> {
    use chrono::Datelike;
    NaiveDate::from_ymd_opt(at.year(), 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .unwrap_or(at)
}
