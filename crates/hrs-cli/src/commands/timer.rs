//! Timer commands: start, pause, resume, stop, discard and status.

use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use hrs_core::format::{format_clock, format_duration};
use hrs_core::{
    ActiveSession, InvalidStateError, Money, ProjectId, SessionState, TimeEntry, earnings,
};
use tokio::time::MissedTickBehavior;

use crate::App;

pub fn start<W: Write>(
    writer: &mut W,
    app: &App,
    project: Option<&str>,
    task: Option<&str>,
    non_billable: bool,
) -> Result<()> {
    // The selection is saved on its own so a start that fails validation
    // keeps it for the next attempt.
    app.mutate(|tracker| {
        if tracker.session().is_active() {
            return Err(InvalidStateError::AlreadyActive.into());
        }
        if let Some(project) = project {
            tracker.select_project(&ProjectId::new(project)?)?;
        }
        if let Some(task) = task {
            tracker.set_task(task)?;
        }
        tracker.set_billable(!non_billable)
    })?;
    let session = app.mutate(|tracker| {
        tracker.start()?;
        Ok(tracker.session().clone())
    })?;

    if let Some(run) = session.run() {
        let billing = run
            .rate
            .map_or_else(|| "non-billable".to_string(), |rate| format!("{rate}/h"));
        writeln!(
            writer,
            "Started {}: {} ({billing})",
            run.project_id, run.task
        )?;
    }
    Ok(())
}

pub fn pause<W: Write>(writer: &mut W, app: &App) -> Result<()> {
    let elapsed = app.mutate(|tracker| {
        tracker.pause()?;
        Ok(tracker.elapsed_seconds())
    })?;
    writeln!(writer, "Paused at {}", format_clock(elapsed))?;
    Ok(())
}

pub fn resume<W: Write>(writer: &mut W, app: &App) -> Result<()> {
    let elapsed = app.mutate(|tracker| {
        tracker.resume()?;
        Ok(tracker.elapsed_seconds())
    })?;
    writeln!(writer, "Resumed at {}", format_clock(elapsed))?;
    Ok(())
}

pub fn stop<W: Write>(writer: &mut W, app: &App) -> Result<()> {
    match app.mutate(|tracker| tracker.stop())? {
        Some(entry) => writeln!(writer, "Stopped {}", describe_entry(&entry))?,
        None => writeln!(writer, "Stopped after less than a minute; nothing recorded.")?,
    }
    Ok(())
}

pub fn discard<W: Write>(writer: &mut W, app: &App) -> Result<()> {
    let (run, dropped) = app.mutate(|tracker| {
        let run = tracker.session().run().cloned();
        let dropped = tracker.discard()?;
        Ok((run, dropped))
    })?;
    if let Some(run) = run {
        writeln!(
            writer,
            "Discarded {} on {}: {}",
            format_clock(dropped.num_seconds()),
            run.project_id,
            run.task
        )?;
    }
    Ok(())
}

fn describe_entry(entry: &TimeEntry) -> String {
    let billing = if entry.billable {
        format!("earned {}", entry.earnings())
    } else {
        "non-billable".to_string()
    };
    format!(
        "{}: {}, {} ({billing})",
        entry.project_id,
        entry.task_label(),
        format_duration(u64::from(entry.duration_minutes))
    )
}

/// Writes the timer state and today's totals.
pub fn status<W: Write>(writer: &mut W, app: &App) -> Result<()> {
    let tracker = app.tracker()?;
    writeln!(writer, "{}", status_line(app)?)?;

    if let ActiveSession::Idle { selection } = tracker.session()
        && let Some(project_id) = &selection.project_id
    {
        let task = if selection.task.is_empty() {
            "(no task)"
        } else {
            selection.task.as_str()
        };
        writeln!(writer, "Selected: {project_id}: {task}")?;
    }

    let today = tracker.daily_summary(app.today(), true)?;
    writeln!(
        writer,
        "Today: {} (earned {})",
        format_duration(today.totals.total_minutes),
        today.totals.earnings
    )?;
    Ok(())
}

/// One line describing the timer, e.g. `Running  01:30:00  p1: design  75.00`.
fn status_line(app: &App) -> Result<String> {
    let tracker = app.tracker()?;
    let session = tracker.session();
    let Some(run) = session.run() else {
        return Ok("No timer running.".to_string());
    };

    let label = match session.state() {
        SessionState::Paused => "Paused ",
        _ => "Running",
    };
    let minutes = tracker.live_slice().map_or(0, |live| live.minutes);
    let so_far = earnings(
        u64::from(minutes),
        run.rate.unwrap_or(Money::ZERO),
        run.billable,
    );
    Ok(format!(
        "{label}  {}  {}: {}  {so_far}",
        format_clock(tracker.elapsed_seconds()),
        run.project_id,
        run.task
    ))
}

/// Redraws the status line every second until Ctrl-C or `ticks` updates.
///
/// Elapsed time is recomputed from the saved session on each tick, so a
/// timer stopped from another terminal shows up immediately.
pub fn watch<W: Write>(writer: &mut W, app: &App, ticks: Option<u64>) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to initialize tokio runtime")?;
    runtime.block_on(watch_loop(writer, app, ticks))
}

async fn watch_loop<W: Write>(writer: &mut W, app: &App, ticks: Option<u64>) -> Result<()> {
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut shown = 0_u64;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                write!(writer, "\r{:<60}", status_line(app)?)?;
                writer.flush()?;
                shown += 1;
                if ticks.is_some_and(|limit| shown >= limit) {
                    break;
                }
            }
            result = &mut ctrl_c => {
                result.context("failed to listen for Ctrl-C")?;
                break;
            }
        }
    }
    writeln!(writer)?;
    tracing::debug!(ticks = shown, "stopped watching");
    Ok(())
}
