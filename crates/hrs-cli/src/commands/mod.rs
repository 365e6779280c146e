//! CLI subcommand implementations.
//!
//! Each command writes its output to the given writer so tests can capture it.

pub mod entries;
pub mod export;
pub mod projects;
pub mod summary;
pub mod timer;
pub mod util;
