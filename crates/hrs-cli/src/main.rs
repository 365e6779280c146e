use std::io::{BufWriter, Write, stdout};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use hrs_cli::commands::{entries, export, projects, summary, timer};
use hrs_cli::{App, Cli, Commands, Config, ProjectsAction, RangeArgs};

fn open_app(cli: &Cli) -> Result<App> {
    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    App::open(config, cli.user.as_deref())
}

fn filter(app: &App, range: &RangeArgs) -> Result<hrs_core::EntryFilter> {
    app.filter(
        range.project.as_deref(),
        range.from.as_deref(),
        range.to.as_deref(),
    )
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter_layer = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter_layer)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let app = open_app(&cli)?;
    let stdout = stdout();
    let mut out = BufWriter::new(stdout.lock());

    match command {
        Commands::Projects(action) => match action {
            ProjectsAction::List { json } => projects::list(&mut out, &app, *json)?,
            ProjectsAction::Add {
                id,
                name,
                client,
                rate,
            } => projects::add(&mut out, &app, id, name, client, rate)?,
        },
        Commands::Start {
            project,
            task,
            non_billable,
        } => timer::start(
            &mut out,
            &app,
            project.as_deref(),
            task.as_deref(),
            *non_billable,
        )?,
        Commands::Pause => timer::pause(&mut out, &app)?,
        Commands::Resume => timer::resume(&mut out, &app)?,
        Commands::Stop => timer::stop(&mut out, &app)?,
        Commands::Discard => timer::discard(&mut out, &app)?,
        Commands::Status { watch, ticks } => {
            if *watch {
                // Unbuffered so each redraw shows up immediately.
                drop(out);
                timer::watch(&mut std::io::stdout(), &app, *ticks)?;
                return Ok(());
            }
            timer::status(&mut out, &app)?;
        }
        Commands::Add(args) => entries::add(&mut out, &app, args)?,
        Commands::Edit(args) => entries::edit(&mut out, &app, args)?,
        Commands::Delete { id } => entries::delete(&mut out, &app, id)?,
        Commands::Log {
            range,
            billable,
            non_billable,
            json,
        } => {
            let mut filter = filter(&app, range)?;
            if *billable {
                filter = filter.billable(true);
            } else if *non_billable {
                filter = filter.billable(false);
            }
            entries::log(&mut out, &app, &filter, *json)?;
        }
        Commands::Today { json } => summary::today(&mut out, &app, *json)?,
        Commands::Week { start, last, json } => {
            summary::week(&mut out, &app, start.as_deref(), *last, *json)?;
        }
        Commands::Breakdown { range, json } => {
            summary::breakdown(&mut out, &app, &filter(&app, range)?, *json)?;
        }
        Commands::Export { range } => export::run(&mut out, &app, &filter(&app, range)?)?,
    }

    out.flush().ok();
    Ok(())
}
