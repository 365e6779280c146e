//! Error taxonomy for tracker operations.

use thiserror::Error;

use crate::types::{EntryId, ValidationError};

/// Boxed error from a storage backend or project directory.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// An operation was attempted in a session state that does not allow it.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InvalidStateError {
    /// `start` while a session is running or paused.
    #[error("session already active")]
    AlreadyActive,

    /// `pause`, `resume`, `stop` or `discard` while idle.
    #[error("no active session to {action}")]
    NoActiveSession { action: &'static str },

    /// `pause` while already paused.
    #[error("session is already paused")]
    AlreadyPaused,

    /// `resume` while running.
    #[error("session is not paused")]
    NotPaused,

    /// Changing the selection while a session is active.
    #[error("cannot change {field} while a session is active")]
    SessionLocked { field: &'static str },
}

/// Errors returned by tracker and timesheet operations.
///
/// None of these are retried: they describe user input or state problems,
/// except [`TrackerError::Storage`] which wraps backend failures.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    InvalidState(#[from] InvalidStateError),

    /// No entry with this ID exists for the user.
    #[error("time entry not found: {0}")]
    NotFound(EntryId),

    /// The storage backend or project directory failed.
    #[error("storage error: {0}")]
    Storage(#[source] BoxError),
}

impl TrackerError {
    pub(crate) fn storage(err: impl Into<BoxError>) -> Self {
        Self::Storage(err.into())
    }
}
