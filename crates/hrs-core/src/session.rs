//! The active timer session.
//!
//! A user has exactly one [`ActiveSession`]. It is `Idle` while the user picks
//! a project and types a task, `Running` while time accumulates, and `Paused`
//! while accumulation is frozen. Elapsed time is never counted tick by tick:
//! closed segments are folded into `accumulated_ms` and the open segment is
//! always `now - segment_started_at`.
//!
//! ```text
//!          start            pause
//!   Idle ---------> Running ------> Paused
//!    ^               |  ^             |
//!    |   stop/discard|  +--- resume --+
//!    +---------------+----------------+
//! ```

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::InvalidStateError;
use crate::types::{Money, ProjectId, ValidationError};

const MS_PER_MINUTE: i64 = 60_000;

/// Which of the three timer states a session is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Running,
    Paused,
}

impl SessionState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the user has picked before starting the timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    #[serde(default)]
    pub task: String,
    pub billable: bool,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            project_id: None,
            task: String::new(),
            billable: true,
        }
    }
}

/// A started session. Project, task, billable flag and rate are fixed for
/// its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub project_id: ProjectId,
    pub task: String,
    pub billable: bool,
    /// Project rate at the moment the run started; `None` when non-billable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<Money>,
    pub started_at: DateTime<Utc>,
    /// Time from segments that have already been closed by a pause.
    pub accumulated_ms: i64,
}

/// The in-progress timer for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ActiveSession {
    Idle {
        #[serde(default)]
        selection: Selection,
    },
    Running {
        run: Run,
        segment_started_at: DateTime<Utc>,
    },
    Paused {
        run: Run,
    },
}

impl Default for ActiveSession {
    fn default() -> Self {
        Self::Idle {
            selection: Selection::default(),
        }
    }
}

/// Read-only view of a running or paused session for live totals.
///
/// All elapsed time is counted on the local day of `now`, even for a session
/// that started before midnight. This is the day `stop` books the entry on,
/// so live totals never move between days when the timer is stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveSlice {
    pub project_id: ProjectId,
    pub billable: bool,
    pub rate: Option<Money>,
    /// Local day the live time is counted on.
    pub date: NaiveDate,
    pub minutes: u32,
}

/// A run that has just been stopped or discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedRun {
    pub run: Run,
    pub elapsed_ms: i64,
}

/// Rounds elapsed milliseconds half-up to whole minutes.
pub fn rounded_minutes(elapsed_ms: i64) -> u32 {
    let minutes = elapsed_ms.max(0).saturating_add(MS_PER_MINUTE / 2) / MS_PER_MINUTE;
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

fn open_segment_ms(segment_started_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    // A clock that stepped backwards contributes nothing rather than negative time.
    (now - segment_started_at).num_milliseconds().max(0)
}

impl ActiveSession {
    pub const fn state(&self) -> SessionState {
        match self {
            Self::Idle { .. } => SessionState::Idle,
            Self::Running { .. } => SessionState::Running,
            Self::Paused { .. } => SessionState::Paused,
        }
    }

    pub const fn is_active(&self) -> bool {
        !matches!(self, Self::Idle { .. })
    }

    /// The selection while idle.
    pub const fn selection(&self) -> Option<&Selection> {
        match self {
            Self::Idle { selection } => Some(selection),
            _ => None,
        }
    }

    /// The started run while running or paused.
    pub const fn run(&self) -> Option<&Run> {
        match self {
            Self::Idle { .. } => None,
            Self::Running { run, .. } | Self::Paused { run } => Some(run),
        }
    }

    fn selection_mut(&mut self, field: &'static str) -> Result<&mut Selection, InvalidStateError> {
        match self {
            Self::Idle { selection } => Ok(selection),
            _ => Err(InvalidStateError::SessionLocked { field }),
        }
    }

    pub fn select_project(&mut self, project_id: ProjectId) -> Result<(), InvalidStateError> {
        self.selection_mut("project")?.project_id = Some(project_id);
        Ok(())
    }

    pub fn set_task(&mut self, task: impl Into<String>) -> Result<(), InvalidStateError> {
        self.selection_mut("task")?.task = task.into();
        Ok(())
    }

    pub fn set_billable(&mut self, billable: bool) -> Result<(), InvalidStateError> {
        self.selection_mut("billable")?.billable = billable;
        Ok(())
    }

    /// Checks that a session can start and returns the selected project.
    pub fn start_target(&self) -> Result<&ProjectId, crate::TrackerError> {
        let Self::Idle { selection } = self else {
            return Err(InvalidStateError::AlreadyActive.into());
        };
        match &selection.project_id {
            Some(project_id) if !selection.task.trim().is_empty() => Ok(project_id),
            _ => Err(ValidationError::ProjectAndTaskRequired.into()),
        }
    }

    /// Idle -> Running.
    ///
    /// `hourly_rate` is the selected project's current rate; it is kept only
    /// if the selection is billable.
    pub fn start(
        &mut self,
        now: DateTime<Utc>,
        hourly_rate: Money,
    ) -> Result<(), crate::TrackerError> {
        let project_id = self.start_target()?.clone();
        let Self::Idle { selection } = self else {
            return Err(InvalidStateError::AlreadyActive.into());
        };
        let run = Run {
            project_id,
            task: selection.task.trim().to_string(),
            billable: selection.billable,
            rate: selection.billable.then_some(hourly_rate),
            started_at: now,
            accumulated_ms: 0,
        };
        *self = Self::Running {
            run,
            segment_started_at: now,
        };
        Ok(())
    }

    /// Running -> Paused, freezing elapsed time.
    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<(), InvalidStateError> {
        match self {
            Self::Running {
                run,
                segment_started_at,
            } => {
                let mut run = run.clone();
                run.accumulated_ms = run
                    .accumulated_ms
                    .saturating_add(open_segment_ms(*segment_started_at, now));
                *self = Self::Paused { run };
                Ok(())
            }
            Self::Paused { .. } => Err(InvalidStateError::AlreadyPaused),
            Self::Idle { .. } => Err(InvalidStateError::NoActiveSession { action: "pause" }),
        }
    }

    /// Paused -> Running, continuing from the frozen elapsed time.
    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<(), InvalidStateError> {
        match self {
            Self::Paused { run } => {
                *self = Self::Running {
                    run: run.clone(),
                    segment_started_at: now,
                };
                Ok(())
            }
            Self::Running { .. } => Err(InvalidStateError::NotPaused),
            Self::Idle { .. } => Err(InvalidStateError::NoActiveSession { action: "resume" }),
        }
    }

    /// Running/Paused -> Idle with a fresh selection, returning the run and
    /// its final elapsed time.
    pub fn finish(
        &mut self,
        now: DateTime<Utc>,
        action: &'static str,
    ) -> Result<FinishedRun, InvalidStateError> {
        let elapsed_ms = self.elapsed_ms(now);
        let run = match self {
            Self::Running { run, .. } | Self::Paused { run } => run.clone(),
            Self::Idle { .. } => return Err(InvalidStateError::NoActiveSession { action }),
        };
        *self = Self::default();
        Ok(FinishedRun { run, elapsed_ms })
    }

    /// Elapsed milliseconds excluding paused time.
    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> i64 {
        match self {
            Self::Idle { .. } => 0,
            Self::Paused { run } => run.accumulated_ms,
            Self::Running {
                run,
                segment_started_at,
            } => run
                .accumulated_ms
                .saturating_add(open_segment_ms(*segment_started_at, now)),
        }
    }

    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> i64 {
        self.elapsed_ms(now) / 1000
    }

    /// The session's contribution to live totals, if one is active.
    ///
    /// Time is not split at midnight; see [`LiveSlice`].
    pub fn live_slice(&self, now: DateTime<Utc>, offset: FixedOffset) -> Option<LiveSlice> {
        let run = self.run()?;
        Some(LiveSlice {
            project_id: run.project_id.clone(),
            billable: run.billable,
            rate: run.rate,
            date: now.with_timezone(&offset).date_naive(),
            minutes: rounded_minutes(self.elapsed_ms(now)),
        })
    }
}
