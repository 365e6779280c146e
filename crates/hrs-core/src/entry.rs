//! Completed time entries and the edits and queries applied to them.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::earnings::earnings;
use crate::types::{EntryId, Money, ProjectId, ValidationError};

/// Label shown for entries recorded without a task description.
pub const UNTITLED_TASK: &str = "Untitled";

/// Lifecycle status of a stored entry. Stored entries are always completed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    #[default]
    Completed,
}

impl EntryStatus {
    /// String representation for database storage.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
        }
    }
}

/// How an entry came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySource {
    /// Emitted by stopping a timer session.
    Tracked,
    /// Entered by hand.
    Manual,
}

impl EntrySource {
    /// String representation for database storage.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tracked => "tracked",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for EntrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntrySource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tracked" => Ok(Self::Tracked),
            "manual" => Ok(Self::Manual),
            _ => Err(format!("invalid entry source: {s}")),
        }
    }
}

/// A completed unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: EntryId,
    pub project_id: ProjectId,
    /// Free text; may be empty for manual entries.
    #[serde(default)]
    pub task: String,
    /// Calendar day the work is booked on.
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    pub duration_minutes: u32,
    pub billable: bool,
    /// Hourly rate copied from the project when the entry was created.
    /// Present exactly when the entry is billable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<Money>,
    #[serde(default)]
    pub status: EntryStatus,
    pub source: EntrySource,
    pub created_at: DateTime<Utc>,
}

impl TimeEntry {
    /// Money earned by this entry, rounded to the cent.
    pub fn earnings(&self) -> Money {
        earnings(
            u64::from(self.duration_minutes),
            self.rate.unwrap_or(Money::ZERO),
            self.billable,
        )
    }

    /// The task description, or [`UNTITLED_TASK`] when blank.
    pub fn task_label(&self) -> &str {
        if self.task.trim().is_empty() {
            UNTITLED_TASK
        } else {
            &self.task
        }
    }

    /// Checks the stored-entry invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_invariants(
            self.start,
            self.end,
            self.duration_minutes,
            self.billable,
            self.rate,
        )
    }
}

/// Everything needed to store a new entry except what the timesheet assigns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDraft {
    pub project_id: ProjectId,
    pub task: String,
    pub date: NaiveDate,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub duration_minutes: u32,
    pub billable: bool,
    pub rate: Option<Money>,
    pub source: EntrySource,
}

impl EntryDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_invariants(
            self.start,
            self.end,
            self.duration_minutes,
            self.billable,
            self.rate,
        )
    }

    pub(crate) fn into_entry(self, id: EntryId, created_at: DateTime<Utc>) -> TimeEntry {
        TimeEntry {
            id,
            project_id: self.project_id,
            task: self.task,
            date: self.date,
            start: self.start,
            end: self.end,
            duration_minutes: self.duration_minutes,
            billable: self.billable,
            rate: self.rate,
            status: EntryStatus::Completed,
            source: self.source,
            created_at,
        }
    }
}

/// Converts a user-supplied minute count into a storable duration.
pub fn duration_minutes(minutes: i64) -> Result<u32, ValidationError> {
    if minutes < 0 {
        return Err(ValidationError::NegativeDuration { minutes });
    }
    u32::try_from(minutes).map_err(|_| ValidationError::DurationTooLarge { minutes })
}

/// Whole minutes between `start` and `end`.
pub fn span_minutes(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<i64, ValidationError> {
    if end < start {
        return Err(ValidationError::EndBeforeStart { start, end });
    }
    let span = end - start;
    if span.num_seconds() % 60 != 0 || span.subsec_nanos() != 0 {
        return Err(ValidationError::SubMinuteTimeRange);
    }
    Ok(span.num_minutes())
}

fn check_invariants(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    duration: u32,
    billable: bool,
    rate: Option<Money>,
) -> Result<(), ValidationError> {
    match (start, end) {
        (Some(start), Some(end)) => {
            let computed = span_minutes(start, end)?;
            if computed != i64::from(duration) {
                return Err(ValidationError::DurationMismatch {
                    given: i64::from(duration),
                    computed,
                });
            }
        }
        (None, None) => {}
        _ => return Err(ValidationError::IncompleteTimeRange),
    }

    match (billable, rate) {
        (true, Some(rate)) => {
            rate.validate_rate()?;
        }
        (true, None) => return Err(ValidationError::BillableWithoutRate),
        (false, Some(_)) => return Err(ValidationError::RateOnNonBillable),
        (false, None) => {}
    }
    Ok(())
}

/// A partial update to a stored entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryPatch {
    pub task: Option<String>,
    pub duration_minutes: Option<i64>,
    pub billable: Option<bool>,
    /// Only accepted together with `billable: Some(true)` on a non-billable entry.
    pub rate: Option<Money>,
}

impl EntryPatch {
    pub fn is_empty(&self) -> bool {
        self.task.is_none()
            && self.duration_minutes.is_none()
            && self.billable.is_none()
            && self.rate.is_none()
    }

    /// Returns the entry with this patch applied, re-validated.
    ///
    /// Entries with start and end times keep their start; the end moves with
    /// the new duration. Making an entry non-billable drops its rate.
    pub fn apply(&self, entry: &TimeEntry) -> Result<TimeEntry, ValidationError> {
        let mut updated = entry.clone();

        if let Some(task) = &self.task {
            updated.task.clone_from(task);
        }

        if let Some(minutes) = self.duration_minutes {
            let minutes = duration_minutes(minutes)?;
            updated.duration_minutes = minutes;
            if let Some(start) = updated.start {
                updated.end = Some(start + Duration::minutes(i64::from(minutes)));
            }
        }

        match (self.billable, entry.billable) {
            (Some(true), false) => {
                let rate = self.rate.ok_or(ValidationError::RateRequired)?;
                updated.billable = true;
                updated.rate = Some(rate.validate_rate()?);
            }
            (Some(false), true) => {
                if self.rate.is_some() {
                    return Err(ValidationError::RateWithoutBillableChange);
                }
                updated.billable = false;
                updated.rate = None;
            }
            _ => {
                if self.rate.is_some() {
                    return Err(ValidationError::RateWithoutBillableChange);
                }
            }
        }

        updated.validate()?;
        Ok(updated)
    }
}

/// Criteria for listing entries. Empty criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    pub project_id: Option<ProjectId>,
    /// First day included.
    pub from: Option<NaiveDate>,
    /// First day excluded.
    pub to: Option<NaiveDate>,
    pub billable: Option<bool>,
}

impl EntryFilter {
    /// Matches entries dated within `[from, to)`.
    pub const fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            project_id: None,
            from: Some(from),
            to: Some(to),
            billable: None,
        }
    }

    #[must_use]
    pub fn project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    #[must_use]
    pub const fn billable(mut self, billable: bool) -> Self {
        self.billable = Some(billable);
        self
    }

    pub fn matches(&self, entry: &TimeEntry) -> bool {
        self.project_id
            .as_ref()
            .is_none_or(|id| *id == entry.project_id)
            && self.from.is_none_or(|from| entry.date >= from)
            && self.to.is_none_or(|to| entry.date < to)
            && self.billable.is_none_or(|b| b == entry.billable)
    }
}
