//! Display and calendar helpers.

use chrono::{Datelike, Days, NaiveDate, Weekday};

/// Formats seconds as a running timer display, `HH:MM:SS`.
/// Negative values show as zero.
pub fn format_clock(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Formats minutes as `Xh Ym`, or `Ym` under an hour.
pub fn format_duration(minutes: u64) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    if hours > 0 {
        format!("{hours}h {mins}m")
    } else {
        format!("{mins}m")
    }
}

/// Formats minutes as decimal hours with one digit, rounded half-up: `3.5h`.
pub fn format_hours(minutes: u64) -> String {
    let tenths = minutes.saturating_mul(10).saturating_add(30) / 60;
    format!("{}.{}h", tenths / 10, tenths % 10)
}

/// The first day of the week containing `date`.
pub fn week_start(date: NaiveDate, first_day: Weekday) -> NaiveDate {
    let offset = (7 + date.weekday().num_days_from_monday() - first_day.num_days_from_monday()) % 7;
    date.checked_sub_days(Days::new(u64::from(offset)))
        .unwrap_or(NaiveDate::MIN)
}
