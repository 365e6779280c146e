//! Implementation of the `hrs export` command.
//!
//! Writes the user's time entries as JSON Lines, oldest first, for import
//! into invoicing or spreadsheet tools.

use std::io::Write;

use anyhow::{Context, Result};
use hrs_core::EntryFilter;

use crate::App;

/// Run the export command.
pub fn run<W: Write>(writer: &mut W, app: &App, filter: &EntryFilter) -> Result<()> {
    let mut entries = app
        .tracker()?
        .query_entries(filter)
        .context("failed to list entries")?;
    entries.reverse();

    for entry in &entries {
        serde_json::to_writer(&mut *writer, entry).context("failed to serialize entry")?;
        // Handle broken pipe gracefully (e.g., when piped to `head`)
        if writeln!(writer).is_err() {
            break;
        }
    }
    writer.flush().ok();

    tracing::debug!(count = entries.len(), "exported entries");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use hrs_core::TimeEntry;

    use crate::app::testing::test_app;
    use crate::cli::AddArgs;
    use crate::commands::entries;

    fn add(app: &App, project: &str, date: &str, duration: &str) {
        let args = AddArgs {
            project: project.to_string(),
            task: format!("{project} work"),
            date: Some(date.to_string()),
            start: None,
            end: None,
            duration: Some(duration.to_string()),
            non_billable: false,
        };
        entries::add(&mut Vec::new(), app, &args).unwrap();
    }

    #[test]
    fn exports_one_entry_per_line_oldest_first() {
        let t = test_app();
        add(&t.app, "p2", "2025-08-27", "4h30m");
        add(&t.app, "p1", "2025-08-25", "90");

        let mut output = Vec::new();
        run(&mut output, &t.app, &EntryFilter::default()).unwrap();
        let output = String::from_utf8(output).unwrap();

        let exported: Vec<TimeEntry> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(exported.len(), 2);
        assert_eq!(exported[0].project_id.as_str(), "p1");
        assert_eq!(exported[0].duration_minutes, 90);
        assert_eq!(exported[1].task, "p2 work");
        assert_eq!(exported[1].rate.map(|r| r.cents()), Some(6000));
    }

    #[test]
    fn export_respects_filter() {
        let t = test_app();
        add(&t.app, "p1", "2025-08-25", "60");
        add(&t.app, "p3", "2025-08-28", "60");

        let filter = t.app.filter(Some("p3"), None, None).unwrap();
        let mut output = Vec::new();
        run(&mut output, &t.app, &filter).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert_eq!(output.lines().count(), 1);
        assert!(output.contains("\"project_id\":\"p3\""));
    }
}
