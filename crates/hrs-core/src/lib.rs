//! Core domain logic for the hours tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Sessions: the idle/running/paused timer state machine
//! - Timesheet: validated time entries with snapshotted billing rates
//! - Aggregation: daily, weekly and per-project totals and earnings
//!
//! Storage and project lookup are traits ([`EntryStore`], [`ProjectDirectory`])
//! so the same logic runs against memory in tests and `SQLite` in the CLI.

pub mod aggregate;
pub mod clock;
pub mod earnings;
pub mod entry;
mod error;
pub mod format;
pub mod project;
pub mod registry;
pub mod session;
pub mod store;
pub mod tracker;
mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use earnings::{EarningsAccumulator, earnings};
pub use entry::{EntryDraft, EntryFilter, EntryPatch, EntrySource, EntryStatus, TimeEntry};
pub use error::{BoxError, InvalidStateError, TrackerError};
pub use project::{Project, ProjectCatalog, ProjectDirectory};
pub use registry::TrackerRegistry;
pub use session::{ActiveSession, LiveSlice, SessionState};
pub use store::{EntryStore, MemoryStore, Timesheet};
pub use tracker::{
    ManualEntry, ProjectBreakdown, ProjectBreakdownRow, TimeTracker, TrackerConfig,
    ZeroDurationPolicy,
};
pub use types::{EntryId, Money, ProjectId, UserId, ValidationError};
