//! Rollups over time entries.
//!
//! Everything here is a pure function of its inputs. Live totals take an
//! optional [`LiveSlice`] from the active session; it is counted like an entry
//! but never stored. Durations are summed as `u64` minutes and earnings through
//! [`EarningsAccumulator`], so results are rounded exactly once.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::earnings::EarningsAccumulator;
use crate::entry::TimeEntry;
use crate::session::LiveSlice;
use crate::types::{Money, ProjectId};

/// Duration and earnings totals for a set of entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub total_minutes: u64,
    pub billable_minutes: u64,
    pub non_billable_minutes: u64,
    pub earnings: Money,
}

/// Totals for one project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProjectTotals {
    pub total_minutes: u64,
    pub billable_minutes: u64,
    pub earnings: Money,
}

/// Totals for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub totals: Totals,
    pub includes_live: bool,
}

/// Totals for the seven days starting at `week_start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklySummary {
    pub week_start: NaiveDate,
    /// First day after the week.
    pub week_end: NaiveDate,
    pub days: Vec<DaySummary>,
    pub totals: Totals,
    /// Distinct projects with at least one entry in the week.
    pub projects_worked: usize,
    pub includes_live: bool,
}

/// One unit of time to account for: a stored entry or the live session.
struct Contribution<'a> {
    project_id: &'a ProjectId,
    date: NaiveDate,
    minutes: u64,
    billable: bool,
    rate: Money,
}

impl<'a> From<&'a TimeEntry> for Contribution<'a> {
    fn from(entry: &'a TimeEntry) -> Self {
        Self {
            project_id: &entry.project_id,
            date: entry.date,
            minutes: u64::from(entry.duration_minutes),
            billable: entry.billable,
            rate: entry.rate.unwrap_or(Money::ZERO),
        }
    }
}

impl<'a> From<&'a LiveSlice> for Contribution<'a> {
    fn from(live: &'a LiveSlice) -> Self {
        Self {
            project_id: &live.project_id,
            date: live.date,
            minutes: u64::from(live.minutes),
            billable: live.billable,
            rate: live.rate.unwrap_or(Money::ZERO),
        }
    }
}

fn contributions<'a>(
    entries: &'a [TimeEntry],
    live: Option<&'a LiveSlice>,
) -> impl Iterator<Item = Contribution<'a>> {
    entries
        .iter()
        .map(Contribution::from)
        .chain(live.map(Contribution::from))
}

#[derive(Default)]
struct TotalsBuilder {
    total_minutes: u64,
    billable_minutes: u64,
    non_billable_minutes: u64,
    earnings: EarningsAccumulator,
}

impl TotalsBuilder {
    fn add(&mut self, c: &Contribution<'_>) {
        self.total_minutes = self.total_minutes.saturating_add(c.minutes);
        if c.billable {
            self.billable_minutes = self.billable_minutes.saturating_add(c.minutes);
        } else {
            self.non_billable_minutes = self.non_billable_minutes.saturating_add(c.minutes);
        }
        self.earnings.add(c.minutes, c.rate, c.billable);
    }

    fn finish(self) -> Totals {
        Totals {
            total_minutes: self.total_minutes,
            billable_minutes: self.billable_minutes,
            non_billable_minutes: self.non_billable_minutes,
            earnings: self.earnings.total(),
        }
    }
}

/// Sum of all durations in minutes.
pub fn total_duration(entries: &[TimeEntry]) -> u64 {
    entries
        .iter()
        .map(|e| u64::from(e.duration_minutes))
        .fold(0, u64::saturating_add)
}

/// Sum of billable durations in minutes.
pub fn billable_duration(entries: &[TimeEntry]) -> u64 {
    entries
        .iter()
        .filter(|e| e.billable)
        .map(|e| u64::from(e.duration_minutes))
        .fold(0, u64::saturating_add)
}

/// Sum of non-billable durations in minutes.
pub fn non_billable_duration(entries: &[TimeEntry]) -> u64 {
    entries
        .iter()
        .filter(|e| !e.billable)
        .map(|e| u64::from(e.duration_minutes))
        .fold(0, u64::saturating_add)
}

/// Earnings across all entries, summed exactly and rounded once.
pub fn total_earnings(entries: &[TimeEntry]) -> Money {
    totals(entries).earnings
}

pub fn totals(entries: &[TimeEntry]) -> Totals {
    let mut builder = TotalsBuilder::default();
    for c in contributions(entries, None) {
        builder.add(&c);
    }
    builder.finish()
}

/// Per-project totals. Only projects that appear in `entries` get a key.
pub fn group_by_project(entries: &[TimeEntry]) -> BTreeMap<ProjectId, ProjectTotals> {
    let mut groups: BTreeMap<ProjectId, TotalsBuilder> = BTreeMap::new();
    for c in contributions(entries, None) {
        groups.entry(c.project_id.clone()).or_default().add(&c);
    }
    groups
        .into_iter()
        .map(|(id, builder)| {
            let totals = builder.finish();
            (
                id,
                ProjectTotals {
                    total_minutes: totals.total_minutes,
                    billable_minutes: totals.billable_minutes,
                    earnings: totals.earnings,
                },
            )
        })
        .collect()
}

/// Totals for a single day, optionally counting the live session.
pub fn daily_summary(
    entries: &[TimeEntry],
    date: NaiveDate,
    live: Option<&LiveSlice>,
) -> DaySummary {
    let mut builder = TotalsBuilder::default();
    for c in contributions(entries, live).filter(|c| c.date == date) {
        builder.add(&c);
    }
    DaySummary {
        date,
        totals: builder.finish(),
        includes_live: live.is_some_and(|l| l.date == date),
    }
}

/// Buckets entries dated in `[week_start, week_start + 7 days)`.
///
/// Entries outside the week are ignored, so callers may pass a wider set.
pub fn weekly_summary(
    entries: &[TimeEntry],
    week_start: NaiveDate,
    live: Option<&LiveSlice>,
) -> WeeklySummary {
    let week_end = week_start
        .checked_add_days(Days::new(7))
        .unwrap_or(NaiveDate::MAX);
    let in_week = |date: NaiveDate| date >= week_start && date < week_end;

    let mut week = TotalsBuilder::default();
    let mut days: BTreeMap<NaiveDate, TotalsBuilder> = week_start
        .iter_days()
        .take_while(|d| in_week(*d))
        .map(|d| (d, TotalsBuilder::default()))
        .collect();
    let mut projects = BTreeSet::new();

    for c in contributions(entries, live).filter(|c| in_week(c.date)) {
        week.add(&c);
        if let Some(day) = days.get_mut(&c.date) {
            day.add(&c);
        }
        projects.insert(c.project_id);
    }

    let live_date = live.map(|l| l.date).filter(|d| in_week(*d));
    WeeklySummary {
        week_start,
        week_end,
        days: days
            .into_iter()
            .map(|(date, builder)| DaySummary {
                date,
                totals: builder.finish(),
                includes_live: live_date == Some(date),
            })
            .collect(),
        totals: week.finish(),
        projects_worked: projects.len(),
        includes_live: live_date.is_some(),
    }
}
