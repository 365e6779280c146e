//! The time tracker: one user's session, timesheet and summaries.
//!
//! [`TimeTracker`] wires the session state machine to an entry store, a
//! project directory and a clock. Every operation either fully applies or
//! leaves both the session and the store as they were.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::{self, DaySummary, ProjectTotals, Totals, WeeklySummary};
use crate::clock::Clock;
use crate::entry::{
    EntryDraft, EntryFilter, EntryPatch, EntrySource, TimeEntry, duration_minutes, span_minutes,
};
use crate::error::{InvalidStateError, TrackerError};
use crate::project::{Project, ProjectDirectory};
use crate::session::{ActiveSession, LiveSlice, rounded_minutes};
use crate::store::{EntryStore, Timesheet};
use crate::types::{EntryId, ProjectId, ValidationError};

/// What `stop` does when the session rounds to zero minutes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZeroDurationPolicy {
    /// Store a zero-minute entry.
    #[default]
    Record,
    /// Drop the session without storing anything.
    Discard,
}

/// Tracker settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerConfig {
    pub zero_duration: ZeroDurationPolicy,
    /// Offset used to decide which calendar day an instant belongs to.
    pub offset: FixedOffset,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            zero_duration: ZeroDurationPolicy::default(),
            offset: Utc.fix(),
        }
    }
}

/// Fields for an entry typed in by hand.
///
/// Either `duration_minutes` or both `start` and `end` must be given. With
/// all three, the duration must match the span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualEntry {
    pub project_id: ProjectId,
    pub task: String,
    pub date: NaiveDate,
    pub start: Option<NaiveTime>,
    pub end: Option<NaiveTime>,
    pub duration_minutes: Option<i64>,
    pub billable: bool,
}

impl ManualEntry {
    /// A billable entry of `minutes` with no start or end time.
    pub fn with_duration(project_id: ProjectId, date: NaiveDate, minutes: i64) -> Self {
        Self {
            project_id,
            task: String::new(),
            date,
            start: None,
            end: None,
            duration_minutes: Some(minutes),
            billable: true,
        }
    }
}

/// Per-project totals joined with project details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectBreakdownRow {
    pub project_id: ProjectId,
    /// `None` when the project is no longer in the directory.
    pub name: Option<String>,
    pub client: Option<String>,
    #[serde(flatten)]
    pub totals: ProjectTotals,
}

/// Project breakdown ordered by project ID, with overall totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectBreakdown {
    pub rows: Vec<ProjectBreakdownRow>,
    pub totals: Totals,
}

/// One user's time tracker.
#[derive(Debug)]
pub struct TimeTracker<S, P, C> {
    timesheet: Timesheet<S>,
    projects: P,
    clock: C,
    session: ActiveSession,
    config: TrackerConfig,
}

impl<S, P, C> TimeTracker<S, P, C>
where
    S: EntryStore,
    P: ProjectDirectory,
    C: Clock,
{
    pub fn new(store: S, projects: P, clock: C, config: TrackerConfig) -> Self {
        Self {
            timesheet: Timesheet::new(store),
            projects,
            clock,
            session: ActiveSession::default(),
            config,
        }
    }

    /// Restores a previously persisted session.
    #[must_use]
    pub fn with_session(mut self, session: ActiveSession) -> Self {
        self.session = session;
        self
    }

    pub const fn session(&self) -> &ActiveSession {
        &self.session
    }

    pub const fn timesheet(&self) -> &Timesheet<S> {
        &self.timesheet
    }

    pub const fn projects(&self) -> &P {
        &self.projects
    }

    pub const fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Current local date according to the clock and configured offset.
    pub fn today(&self) -> NaiveDate {
        self.clock.now().with_timezone(&self.config.offset).date_naive()
    }

    fn project(&self, id: &ProjectId) -> Result<Project, TrackerError> {
        self.projects
            .project(id)
            .map_err(TrackerError::storage)?
            .ok_or_else(|| {
                ValidationError::UnknownProject {
                    id: id.to_string(),
                }
                .into()
            })
    }

    // ========== Session ==========

    pub fn select_project(&mut self, project_id: &ProjectId) -> Result<(), TrackerError> {
        if self.session.is_active() {
            return Err(InvalidStateError::SessionLocked { field: "project" }.into());
        }
        self.project(project_id)?;
        self.session.select_project(project_id.clone())?;
        Ok(())
    }

    pub fn set_task(&mut self, task: impl Into<String>) -> Result<(), TrackerError> {
        self.session.set_task(task)?;
        Ok(())
    }

    pub fn set_billable(&mut self, billable: bool) -> Result<(), TrackerError> {
        self.session.set_billable(billable)?;
        Ok(())
    }

    /// Starts the timer for the selected project and task.
    pub fn start(&mut self) -> Result<(), TrackerError> {
        let project_id = self.session.start_target()?.clone();
        let project = self.project(&project_id)?;
        let now = self.clock.now();
        self.session.start(now, project.hourly_rate)?;
        tracing::info!(project_id = %project_id, started_at = %now, "session started");
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), TrackerError> {
        self.session.pause(self.clock.now())?;
        tracing::info!(
            elapsed_ms = self.session.elapsed_ms(self.clock.now()),
            "session paused"
        );
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), TrackerError> {
        self.session.resume(self.clock.now())?;
        tracing::info!("session resumed");
        Ok(())
    }

    /// Stops the timer and stores the tracked entry.
    ///
    /// Returns `None` when the session rounded to zero minutes and the
    /// zero-duration policy is [`ZeroDurationPolicy::Discard`].
    pub fn stop(&mut self) -> Result<Option<TimeEntry>, TrackerError> {
        let now = self.clock.now();
        let mut next = self.session.clone();
        let finished = next.finish(now, "stop")?;
        let minutes = rounded_minutes(finished.elapsed_ms);

        if minutes == 0 && self.config.zero_duration == ZeroDurationPolicy::Discard {
            self.session = next;
            tracing::info!(elapsed_ms = finished.elapsed_ms, "discarded zero-duration session");
            return Ok(None);
        }

        let run = finished.run;
        let draft = EntryDraft {
            project_id: run.project_id,
            task: run.task,
            date: now.with_timezone(&self.config.offset).date_naive(),
            start: Some(now - Duration::minutes(i64::from(minutes))),
            end: Some(now),
            duration_minutes: minutes,
            billable: run.billable,
            rate: run.rate,
            source: EntrySource::Tracked,
        };
        let entry = self.timesheet.add_entry(draft, now)?;
        self.session = next;
        tracing::info!(
            entry_id = %entry.id,
            elapsed_ms = finished.elapsed_ms,
            duration_minutes = entry.duration_minutes,
            "session stopped"
        );
        Ok(Some(entry))
    }

    /// Ends the session without storing an entry. Returns the time dropped.
    pub fn discard(&mut self) -> Result<Duration, TrackerError> {
        let finished = self.session.finish(self.clock.now(), "discard")?;
        tracing::info!(elapsed_ms = finished.elapsed_ms, "session discarded");
        Ok(Duration::milliseconds(finished.elapsed_ms))
    }

    /// Elapsed seconds of the active session, excluding pauses.
    pub fn elapsed_seconds(&self) -> i64 {
        self.session.elapsed_seconds(self.clock.now())
    }

    /// The active session as a live contribution to totals.
    pub fn live_slice(&self) -> Option<LiveSlice> {
        self.session
            .live_slice(self.clock.now(), self.config.offset)
    }

    // ========== Entries ==========

    /// Stores an entry typed in by hand, snapshotting the project's rate.
    pub fn add_manual_entry(&mut self, manual: ManualEntry) -> Result<TimeEntry, TrackerError> {
        let project = self.project(&manual.project_id)?;

        let (start, end, minutes) = match (manual.start, manual.end) {
            (Some(start), Some(end)) => {
                let start = self.local_instant(manual.date, start);
                let end = self.local_instant(manual.date, end);
                let computed = span_minutes(start, end)?;
                if let Some(given) = manual.duration_minutes
                    && given != computed
                {
                    return Err(ValidationError::DurationMismatch { given, computed }.into());
                }
                (Some(start), Some(end), duration_minutes(computed)?)
            }
            (None, None) => {
                let given = manual
                    .duration_minutes
                    .ok_or(ValidationError::MissingDuration)?;
                (None, None, duration_minutes(given)?)
            }
            _ => return Err(ValidationError::IncompleteTimeRange.into()),
        };

        let draft = EntryDraft {
            project_id: project.id,
            task: manual.task.trim().to_string(),
            date: manual.date,
            start,
            end,
            duration_minutes: minutes,
            billable: manual.billable,
            rate: manual.billable.then_some(project.hourly_rate),
            source: EntrySource::Manual,
        };
        self.timesheet.add_entry(draft, self.clock.now())
    }

    fn local_instant(&self, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        let local = date.and_time(time);
        // A fixed offset maps every local time to exactly one instant.
        self.config
            .offset
            .from_local_datetime(&local)
            .single()
            .map_or_else(|| local.and_utc(), |dt| dt.with_timezone(&Utc))
    }

    pub fn edit_entry(
        &mut self,
        id: &EntryId,
        patch: &EntryPatch,
    ) -> Result<TimeEntry, TrackerError> {
        self.timesheet.edit_entry(id, patch)
    }

    pub fn delete_entry(&mut self, id: &EntryId) -> Result<TimeEntry, TrackerError> {
        self.timesheet.delete_entry(id)
    }

    pub fn get_entry(&self, id: &EntryId) -> Result<TimeEntry, TrackerError> {
        self.timesheet.get_entry(id)
    }

    /// Lists matching entries, most recent first.
    pub fn query_entries(&self, filter: &EntryFilter) -> Result<Vec<TimeEntry>, TrackerError> {
        self.timesheet.list_entries(filter)
    }

    // ========== Summaries ==========

    pub fn daily_summary(
        &self,
        date: NaiveDate,
        include_live: bool,
    ) -> Result<DaySummary, TrackerError> {
        let next = date.succ_opt().unwrap_or(date);
        let entries = self.query_entries(&EntryFilter::between(date, next))?;
        let live = include_live.then(|| self.live_slice()).flatten();
        Ok(aggregate::daily_summary(&entries, date, live.as_ref()))
    }

    pub fn weekly_summary(
        &self,
        week_start: NaiveDate,
        include_live: bool,
    ) -> Result<WeeklySummary, TrackerError> {
        let week_end = week_start
            .checked_add_days(chrono::Days::new(7))
            .unwrap_or(NaiveDate::MAX);
        let entries = self.query_entries(&EntryFilter::between(week_start, week_end))?;
        let live = include_live.then(|| self.live_slice()).flatten();
        Ok(aggregate::weekly_summary(&entries, week_start, live.as_ref()))
    }

    /// Per-project totals for the matching entries, with project names.
    pub fn project_breakdown(&self, filter: &EntryFilter) -> Result<ProjectBreakdown, TrackerError> {
        let entries = self.query_entries(filter)?;
        let groups = aggregate::group_by_project(&entries);
        let mut rows = Vec::with_capacity(groups.len());
        for (project_id, totals) in groups {
            let project = self
                .projects
                .project(&project_id)
                .map_err(TrackerError::storage)?;
            rows.push(ProjectBreakdownRow {
                name: project.as_ref().map(|p| p.name.clone()),
                client: project.map(|p| p.client),
                project_id,
                totals,
            });
        }
        Ok(ProjectBreakdown {
            rows,
            totals: aggregate::totals(&entries),
        })
    }
}
