//! Timesheet commands: manual entries, edits, deletion and the entry log.

use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::FixedOffset;
use hrs_core::format::format_duration;
use hrs_core::{EntryFilter, EntryPatch, ManualEntry, Money, ProjectId, TimeEntry, aggregate};

use crate::App;
use crate::cli::{AddArgs, EditArgs};
use crate::commands::util::{find_entry, parse_day, parse_duration, parse_time, short_id};

pub fn add<W: Write>(writer: &mut W, app: &App, args: &AddArgs) -> Result<()> {
    let date = match &args.date {
        Some(date) => parse_day(date, app.today())?,
        None => app.today(),
    };
    let manual = ManualEntry {
        project_id: ProjectId::new(args.project.as_str())?,
        task: args.task.clone(),
        date,
        start: args.start.as_deref().map(parse_time).transpose()?,
        end: args.end.as_deref().map(parse_time).transpose()?,
        duration_minutes: args.duration.as_deref().map(parse_duration).transpose()?,
        billable: !args.non_billable,
    };

    let entry = app.mutate(|tracker| tracker.add_manual_entry(manual))?;
    writeln!(writer, "Added {}", describe(&entry))?;
    Ok(())
}

pub fn edit<W: Write>(writer: &mut W, app: &App, args: &EditArgs) -> Result<()> {
    let billable = match (args.billable, args.non_billable) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    };
    let patch = EntryPatch {
        task: args.task.clone(),
        duration_minutes: args.duration.as_deref().map(parse_duration).transpose()?,
        billable,
        rate: args.rate.as_deref().map(str::parse::<Money>).transpose()?,
    };
    if patch.is_empty() {
        bail!("nothing to change; pass --task, --duration, --billable, --non-billable or --rate");
    }

    let id = resolve_id(app, &args.id)?;
    let entry = app.mutate(|tracker| tracker.edit_entry(&id, &patch))?;
    writeln!(writer, "Updated {}", describe(&entry))?;
    Ok(())
}

pub fn delete<W: Write>(writer: &mut W, app: &App, id: &str) -> Result<()> {
    let id = resolve_id(app, id)?;
    let entry = app.mutate(|tracker| tracker.delete_entry(&id))?;
    writeln!(writer, "Deleted {}", describe(&entry))?;
    Ok(())
}

fn resolve_id(app: &App, prefix: &str) -> Result<hrs_core::EntryId> {
    let entries = app
        .tracker()?
        .query_entries(&EntryFilter::default())
        .context("failed to list entries")?;
    Ok(find_entry(&entries, prefix)?.id.clone())
}

fn describe(entry: &TimeEntry) -> String {
    let billing = if entry.billable {
        format!("earned {}", entry.earnings())
    } else {
        "non-billable".to_string()
    };
    format!(
        "{} {}: {}, {} on {} ({billing})",
        short_id(&entry.id),
        entry.project_id,
        entry.task_label(),
        format_duration(u64::from(entry.duration_minutes)),
        entry.date
    )
}

/// Lists entries most recent first, with totals.
pub fn log<W: Write>(writer: &mut W, app: &App, filter: &EntryFilter, json: bool) -> Result<()> {
    let entries = app.tracker()?.query_entries(filter)?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&entries)?)?;
        return Ok(());
    }

    if entries.is_empty() {
        writeln!(writer, "No time entries found.")?;
        return Ok(());
    }

    writeln!(
        writer,
        "{:<10}  {:<11}  {:<10}  {:<24}  {:>8}  {:>9}  ID",
        "DATE", "TIME", "PROJECT", "TASK", "DURATION", "EARNED"
    )?;
    for entry in &entries {
        writeln!(writer, "{}", format_row(entry, app.offset()))?;
    }

    let totals = aggregate::totals(&entries);
    writeln!(writer)?;
    writeln!(
        writer,
        "Total: {} (billable {}, non-billable {}), earned {}",
        format_duration(totals.total_minutes),
        format_duration(totals.billable_minutes),
        format_duration(totals.non_billable_minutes),
        totals.earnings
    )?;
    Ok(())
}

fn format_row(entry: &TimeEntry, offset: FixedOffset) -> String {
    let time = match (entry.start, entry.end) {
        (Some(start), Some(end)) => format!(
            "{}-{}",
            start.with_timezone(&offset).format("%H:%M"),
            end.with_timezone(&offset).format("%H:%M")
        ),
        _ => "-".to_string(),
    };
    let earned = if entry.billable {
        entry.earnings().to_string()
    } else {
        "-".to_string()
    };
    let task: String = entry.task_label().chars().take(24).collect();
    format!(
        "{:<10}  {:<11}  {:<10}  {:<24}  {:>8}  {:>9}  {}",
        entry.date.to_string(),
        time,
        entry.project_id.as_str(),
        task,
        format_duration(u64::from(entry.duration_minutes)),
        earned,
        short_id(&entry.id)
    )
}
