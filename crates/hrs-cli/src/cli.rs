//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Freelancer time tracker.
///
/// Runs a timer per project and task, keeps a timesheet of completed work,
/// and reports hours and earnings by day, week and project.
#[derive(Debug, Parser)]
#[command(name = "hrs", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Track time as this user instead of the configured one.
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage projects and their hourly rates.
    #[command(subcommand)]
    Projects(ProjectsAction),

    /// Start the timer.
    Start {
        /// Project to track time against. Defaults to the selection shown by `hrs status`,
        /// which a start that failed validation keeps.
        #[arg(short, long)]
        project: Option<String>,

        /// What you are working on.
        task: Option<String>,

        /// Record the session as non-billable.
        #[arg(long)]
        non_billable: bool,
    },

    /// Pause the running timer.
    Pause,

    /// Resume a paused timer.
    Resume,

    /// Stop the timer and record the session.
    Stop,

    /// Stop the timer without recording anything.
    Discard,

    /// Show the current timer.
    Status {
        /// Keep redrawing the elapsed time every second until Ctrl-C.
        #[arg(short, long)]
        watch: bool,

        /// Stop watching after this many updates.
        #[arg(long, requires = "watch")]
        ticks: Option<u64>,
    },

    /// Add a time entry by hand.
    Add(AddArgs),

    /// Change a recorded time entry.
    Edit(EditArgs),

    /// Delete a recorded time entry.
    Delete {
        /// Entry ID (as shown by `hrs log`).
        id: String,
    },

    /// List time entries, most recent first.
    Log {
        #[command(flatten)]
        range: RangeArgs,

        /// Only billable entries.
        #[arg(long, conflicts_with = "non_billable")]
        billable: bool,

        /// Only non-billable entries.
        #[arg(long)]
        non_billable: bool,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show today's totals, including a running timer.
    Today {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show a weekly summary, including a running timer.
    Week {
        /// Any day in the week to show (YYYY-MM-DD). Defaults to today.
        #[arg(long, conflicts_with = "last")]
        start: Option<String>,

        /// Show last week.
        #[arg(long)]
        last: bool,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show hours and earnings per project.
    Breakdown {
        #[command(flatten)]
        range: RangeArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Export time entries as JSON Lines.
    Export {
        #[command(flatten)]
        range: RangeArgs,
    },
}

/// Project management actions.
#[derive(Debug, Subcommand)]
pub enum ProjectsAction {
    /// List projects.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Add a project, or update an existing one.
    ///
    /// A new rate applies only to entries recorded afterwards.
    Add {
        /// Short project ID, used on the command line.
        id: String,

        /// Display name.
        #[arg(short, long)]
        name: String,

        /// Client the project is billed to.
        #[arg(long, default_value = "")]
        client: String,

        /// Hourly rate (e.g., 50 or 62.50).
        #[arg(short, long)]
        rate: String,
    },
}

/// Project and date filters shared by listing commands.
#[derive(Debug, Clone, Default, Args)]
pub struct RangeArgs {
    /// Only this project.
    #[arg(short, long)]
    pub project: Option<String>,

    /// First day to include (YYYY-MM-DD, `today` or `yesterday`).
    #[arg(long)]
    pub from: Option<String>,

    /// First day to exclude (YYYY-MM-DD, `today` or `yesterday`).
    #[arg(long)]
    pub to: Option<String>,
}

/// Arguments for `hrs add`.
#[derive(Debug, Clone, Args)]
pub struct AddArgs {
    /// Project the time was spent on.
    pub project: String,

    /// What the time was spent on.
    #[arg(short, long, default_value = "")]
    pub task: String,

    /// Day of the work (YYYY-MM-DD, `today` or `yesterday`). Defaults to today.
    #[arg(short, long)]
    pub date: Option<String>,

    /// Start time (HH:MM). Requires --end.
    #[arg(long, requires = "end")]
    pub start: Option<String>,

    /// End time (HH:MM). Requires --start.
    #[arg(long, requires = "start")]
    pub end: Option<String>,

    /// Duration (e.g., 90, 45m, 1h30m).
    #[arg(long = "duration", short = 'D', allow_negative_numbers = true)]
    pub duration: Option<String>,

    /// Record the entry as non-billable.
    #[arg(long)]
    pub non_billable: bool,
}

/// Arguments for `hrs edit`.
#[derive(Debug, Clone, Args)]
pub struct EditArgs {
    /// Entry ID (as shown by `hrs log`).
    pub id: String,

    /// New task description.
    #[arg(short, long)]
    pub task: Option<String>,

    /// New duration (e.g., 90, 45m, 1h30m).
    #[arg(long = "duration", short = 'D', allow_negative_numbers = true)]
    pub duration: Option<String>,

    /// Mark the entry billable. Needs --rate if it was non-billable.
    #[arg(long, conflicts_with = "non_billable")]
    pub billable: bool,

    /// Mark the entry non-billable.
    #[arg(long)]
    pub non_billable: bool,

    /// Hourly rate to use when marking an entry billable.
    #[arg(short, long)]
    pub rate: Option<String>,
}
