//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::{Context, bail};
use chrono::{Days, NaiveDate, NaiveTime};
use hrs_core::{EntryId, TimeEntry};
use regex::Regex;

/// Pre-compiled regex for durations like `90`, `45m`, `2h` or `1h30m`.
static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<hours>\d+)\s*h)?\s*(?:(?P<minutes>\d+)\s*m?)?$")
        .expect("duration regex is valid")
});

/// Length of entry IDs shown in listings.
pub const SHORT_ID_LEN: usize = 8;

/// Parse a duration in minutes.
///
/// Supports:
/// - Plain minutes: "90", "-5" (negative values are passed through for validation)
/// - Units: "45m", "2h", "1h30m", "1h 30m"
pub fn parse_duration(s: &str) -> anyhow::Result<i64> {
    let s = s.trim();
    if let Ok(minutes) = s.parse::<i64>() {
        return Ok(minutes);
    }

    let caps = DURATION_RE
        .captures(s)
        .filter(|caps| caps.name("hours").is_some() || caps.name("minutes").is_some());
    let Some(caps) = caps else {
        bail!("Invalid duration: {s}. Use minutes (e.g., 90) or hours and minutes (e.g., 1h30m)");
    };

    let hours: i64 = caps
        .name("hours")
        .map_or(Ok(0), |m| m.as_str().parse())
        .context("failed to parse hours in duration")?;
    let minutes: i64 = caps
        .name("minutes")
        .map_or(Ok(0), |m| m.as_str().parse())
        .context("failed to parse minutes in duration")?;

    hours
        .checked_mul(60)
        .and_then(|h| h.checked_add(minutes))
        .with_context(|| format!("duration too large: {s}"))
}

/// Parse a calendar day as `YYYY-MM-DD`, `today` or `yesterday`.
pub fn parse_day(s: &str, today: NaiveDate) -> anyhow::Result<NaiveDate> {
    match s {
        "today" => Ok(today),
        "yesterday" => today
            .checked_sub_days(Days::new(1))
            .context("date out of range"),
        _ => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("Invalid date: {s}. Use YYYY-MM-DD, 'today' or 'yesterday'")),
    }
}

/// Parse a time of day as `HH:MM`.
pub fn parse_time(s: &str) -> anyhow::Result<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .with_context(|| format!("Invalid time: {s}. Use HH:MM (e.g., 09:30)"))
}

/// The leading characters of an entry ID.
pub fn short_id(id: &EntryId) -> &str {
    let id = id.as_str();
    id.get(..SHORT_ID_LEN).unwrap_or(id)
}

/// Finds the single entry whose ID is or starts with `prefix`.
pub fn find_entry<'a>(entries: &'a [TimeEntry], prefix: &str) -> anyhow::Result<&'a TimeEntry> {
    if let Some(exact) = entries.iter().find(|e| e.id.as_str() == prefix) {
        return Ok(exact);
    }
    let mut matches = entries.iter().filter(|e| e.id.as_str().starts_with(prefix));
    match (matches.next(), matches.next()) {
        (Some(entry), None) => Ok(entry),
        (None, _) => bail!("time entry not found: {prefix}"),
        (Some(_), Some(_)) => bail!("ambiguous entry ID {prefix}; use more characters"),
    }
}
