//! Project commands: listing projects and setting their rates.

use std::io::Write;

use anyhow::{Context, Result};
use hrs_core::{Money, Project, ProjectDirectory, ProjectId};

use crate::App;

pub fn list<W: Write>(writer: &mut W, app: &App, json: bool) -> Result<()> {
    let projects = app.db().projects().context("failed to list projects")?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&projects)?)?;
        return Ok(());
    }

    if projects.is_empty() {
        writeln!(writer, "No projects yet.")?;
        writeln!(writer)?;
        writeln!(
            writer,
            "Hint: Run 'hrs projects add <id> --name <name> --rate <rate>' to create one."
        )?;
        return Ok(());
    }

    writeln!(writer, "{:<12} {:<24} {:<22} {:>9}", "ID", "NAME", "CLIENT", "RATE/H")?;
    for project in projects {
        writeln!(
            writer,
            "{:<12} {:<24} {:<22} {:>9}",
            project.id.as_str(),
            project.name,
            project.client,
            project.hourly_rate.to_string()
        )?;
    }
    Ok(())
}

pub fn add<W: Write>(
    writer: &mut W,
    app: &App,
    id: &str,
    name: &str,
    client: &str,
    rate: &str,
) -> Result<()> {
    let rate: Money = rate.parse()?;
    let project = Project::new(ProjectId::new(id)?, name, client, rate)?;
    let existed = app.db().project(&project.id)?.is_some();
    app.db()
        .upsert_project(&project)
        .context("failed to save project")?;

    let verb = if existed { "Updated" } else { "Added" };
    writeln!(
        writer,
        "{verb} project {} ({}) at {}/h",
        project.id, project.name, project.hourly_rate
    )?;
    Ok(())
}
