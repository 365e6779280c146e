//! Summary commands: today, week and per-project breakdown.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::Days;
use hrs_core::EntryFilter;
use hrs_core::format::{format_duration, format_hours, week_start};

use crate::App;
use crate::commands::util::parse_day;

/// Today's totals, counting a running or paused timer.
pub fn today<W: Write>(writer: &mut W, app: &App, json: bool) -> Result<()> {
    let summary = app.tracker()?.daily_summary(app.today(), true)?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&summary)?)?;
        return Ok(());
    }

    let totals = &summary.totals;
    writeln!(writer, "{}", summary.date.format("%A, %Y-%m-%d"))?;
    writeln!(writer, "  Total:         {}", format_duration(totals.total_minutes))?;
    writeln!(writer, "  Billable:      {}", format_duration(totals.billable_minutes))?;
    writeln!(
        writer,
        "  Non-billable:  {}",
        format_duration(totals.non_billable_minutes)
    )?;
    writeln!(writer, "  Earned:        {}", totals.earnings)?;
    if summary.includes_live {
        writeln!(writer)?;
        writeln!(writer, "Includes the current timer.")?;
    }
    Ok(())
}

/// The week containing `start` (or today), or the one before it with `last`.
pub fn week<W: Write>(
    writer: &mut W,
    app: &App,
    start: Option<&str>,
    last: bool,
    json: bool,
) -> Result<()> {
    let today = app.today();
    let anchor = start.map_or(Ok(today), |s| parse_day(s, today))?;
    let mut first = week_start(anchor, app.config().week_starts_on.weekday());
    if last {
        first = first
            .checked_sub_days(Days::new(7))
            .context("date out of range")?;
    }

    let summary = app.tracker()?.weekly_summary(first, true)?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&summary)?)?;
        return Ok(());
    }

    let last_day = summary.week_end.pred_opt().unwrap_or(summary.week_end);
    writeln!(writer, "Week of {} to {}", summary.week_start, last_day)?;
    writeln!(writer)?;
    for day in &summary.days {
        writeln!(
            writer,
            "{:<3} {}  {:>6}  {:>9}{}",
            day.date.format("%a").to_string(),
            day.date,
            format_hours(day.totals.total_minutes),
            day.totals.earnings.to_string(),
            if day.includes_live { "  *" } else { "" }
        )?;
    }
    writeln!(writer)?;
    writeln!(
        writer,
        "Total: {} (billable {}), earned {}",
        format_hours(summary.totals.total_minutes),
        format_hours(summary.totals.billable_minutes),
        summary.totals.earnings
    )?;
    writeln!(writer, "Projects worked: {}", summary.projects_worked)?;
    if summary.includes_live {
        writeln!(writer, "* includes the current timer")?;
    }
    Ok(())
}

pub fn breakdown<W: Write>(writer: &mut W, app: &App, filter: &EntryFilter, json: bool) -> Result<()> {
    let breakdown = app.tracker()?.project_breakdown(filter)?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&breakdown)?)?;
        return Ok(());
    }

    if breakdown.rows.is_empty() {
        writeln!(writer, "No time entries found.")?;
        return Ok(());
    }

    writeln!(
        writer,
        "{:<10}  {:<24}  {:>7}  {:>8}  {:>9}",
        "PROJECT", "NAME", "HOURS", "BILLABLE", "EARNED"
    )?;
    for row in &breakdown.rows {
        writeln!(
            writer,
            "{:<10}  {:<24}  {:>7}  {:>8}  {:>9}",
            row.project_id.as_str(),
            row.name.as_deref().unwrap_or("-"),
            format_hours(row.totals.total_minutes),
            format_hours(row.totals.billable_minutes),
            row.totals.earnings.to_string()
        )?;
    }
    let totals = &breakdown.totals;
    writeln!(
        writer,
        "{:<10}  {:<24}  {:>7}  {:>8}  {:>9}",
        "TOTAL",
        "",
        format_hours(totals.total_minutes),
        format_hours(totals.billable_minutes),
        totals.earnings.to_string()
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration;
    use hrs_core::ProjectId;
    use insta::assert_snapshot;

    use crate::app::testing::test_app;
    use crate::cli::AddArgs;
    use crate::commands::{entries, timer};

    fn run(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut output = Vec::new();
        f(&mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    fn add(app: &App, project: &str, date: &str, start: &str, end: &str, non_billable: bool) {
        let args = AddArgs {
            project: project.to_string(),
            task: "work".to_string(),
            date: Some(date.to_string()),
            start: Some(start.to_string()),
            end: Some(end.to_string()),
            duration: None,
            non_billable,
        };
        entries::add(&mut Vec::new(), app, &args).unwrap();
    }

    fn seed(app: &App) {
        add(app, "p1", "2025-08-18", "09:00", "10:00", false);
        add(app, "p1", "2025-08-25", "09:00", "12:30", false);
        add(app, "p1", "2025-08-26", "13:00", "15:45", false);
        add(app, "p2", "2025-08-27", "10:00", "14:30", false);
        add(app, "p3", "2025-08-28", "09:30", "12:00", false);
        add(app, "p3", "2025-08-28", "13:00", "14:00", true);
    }

    #[test]
    fn today_counts_the_running_timer() {
        let t = test_app();
        add(&t.app, "p1", "2025-08-30", "07:00", "08:00", false);
        run(|w| timer::start(w, &t.app, Some("p2"), Some("charts"), false));
        t.clock.advance(Duration::minutes(30));

        assert_snapshot!(run(|w| today(w, &t.app, false)), @r"
        Saturday, 2025-08-30
          Total:         1h 30m
          Billable:      1h 30m
          Non-billable:  0m
          Earned:        80.00

        Includes the current timer.
        ");
    }

    #[test]
    fn today_json() {
        let t = test_app();
        add(&t.app, "p1", "2025-08-30", "07:00", "08:00", true);
        let output = run(|w| today(w, &t.app, true));
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["date"], "2025-08-30");
        assert_eq!(value["totals"]["non_billable_minutes"], 60);
        assert_eq!(value["totals"]["earnings"], 0);
        assert_eq!(value["includes_live"], false);
    }

    #[test]
    fn week_buckets_days() {
        let t = test_app();
        seed(&t.app);
        assert_snapshot!(run(|w| week(w, &t.app, None, false, false)), @r"
        Week of 2025-08-25 to 2025-08-31

        Mon 2025-08-25    3.5h     175.00
        Tue 2025-08-26    2.8h     137.50
        Wed 2025-08-27    4.5h     270.00
        Thu 2025-08-28    3.5h     137.50
        Fri 2025-08-29    0.0h       0.00
        Sat 2025-08-30    0.0h       0.00
        Sun 2025-08-31    0.0h       0.00

        Total: 14.3h (billable 13.3h), earned 720.00
        Projects worked: 3
        ");
    }

    #[test]
    fn last_week_and_explicit_start() {
        let t = test_app();
        seed(&t.app);

        let output = run(|w| week(w, &t.app, None, true, true));
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["week_start"], "2025-08-18");
        assert_eq!(value["days"].as_array().unwrap().len(), 7);
        assert_eq!(value["totals"]["total_minutes"], 60);
        assert_eq!(value["totals"]["earnings"], 5000);
        assert_eq!(value["projects_worked"], 1);

        let output = run(|w| week(w, &t.app, Some("2025-08-20"), false, true));
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["week_start"], "2025-08-18");
    }

    #[test]
    fn breakdown_per_project() {
        let t = test_app();
        seed(&t.app);
        let filter = t
            .app
            .filter(None, Some("2025-08-25"), Some("2025-09-01"))
            .unwrap();
        assert_snapshot!(run(|w| breakdown(w, &t.app, &filter, false)), @r"
        PROJECT     NAME                        HOURS  BILLABLE     EARNED
        p1          E-commerce Platform          6.3h      6.3h     312.50
        p2          SaaS Dashboard               4.5h      4.5h     270.00
        p3          Analytics Dashboard          3.5h      2.5h     137.50
        TOTAL                                   14.3h     13.3h     720.00
        ");
    }

    #[test]
    fn breakdown_json_and_empty() {
        let t = test_app();
        seed(&t.app);
        let filter = EntryFilter::default().project(ProjectId::new("p2").unwrap());
        let output = run(|w| breakdown(w, &t.app, &filter, true));
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["rows"][0]["project_id"], "p2");
        assert_eq!(value["rows"][0]["client"], "InnovateTech Inc");
        assert_eq!(value["rows"][0]["earnings"], 27000);
        assert_eq!(value["totals"]["earnings"], 27000);

        let filter = t.app.filter(None, Some("2025-09-01"), None).unwrap();
        assert_snapshot!(run(|w| breakdown(w, &t.app, &filter, false)), @"No time entries found.");
    }
}
