//! UTC time handling
//!
//! Every timestamp in the domain is UTC. Wall-clock input from the wizard is
//! interpreted as UTC as well.

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, Utc};

/// The one accepted explicit date/time format
pub const WIZARD_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Interpret a naive timestamp as UTC
pub fn ensure_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    naive.and_utc()
}

/// Parse `YYYY-MM-DD HH:MM` as a UTC instant
///
/// # Examples
///
/// ```
/// use invevent_core::timezone::parse_wizard_datetime;
///
/// let at = parse_wizard_datetime("2025-06-01 20:00").unwrap();
/// assert_eq!(at.to_rfc3339(), "2025-06-01T20:00:00+00:00");
/// assert!(parse_wizard_datetime("tomorrow please").is_none());
/// ```
pub fn parse_wizard_datetime(input: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(input.trim(), WIZARD_DATETIME_FORMAT)
        .ok()
        .map(ensure_utc)
}

/// Start of the UTC day containing `now`
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    ensure_utc(now.date_naive().and_time(chrono::NaiveTime::MIN))
}

/// Midnight that begins the next UTC day
pub fn next_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    let today: NaiveDate = now.date_naive();
    let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);
    ensure_utc(tomorrow.and_time(chrono::NaiveTime::MIN))
}

/// Human readable UTC timestamp used in messages
pub fn format_utc(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}
