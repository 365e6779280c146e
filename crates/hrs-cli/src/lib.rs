//! Command-line front end for the `hrs` time tracker.
//!
//! Each invocation opens the `SQLite` database, loads the user's saved
//! session, runs one command and saves the session back.

mod app;
mod cli;
pub mod commands;
mod config;

pub use app::{App, Tracker};
pub use cli::{AddArgs, Cli, Commands, EditArgs, ProjectsAction, RangeArgs};
pub use config::{Config, WeekStart};
