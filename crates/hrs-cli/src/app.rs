//! Per-invocation state shared by all commands.

use std::fs::{self, File};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{FixedOffset, Local, NaiveDate, Offset, TimeZone};
use fs2::FileExt;
use hrs_core::{
    Clock, EntryFilter, ProjectId, SystemClock, TimeTracker, TrackerConfig, TrackerError, UserId,
};
use hrs_db::{Database, SqliteEntries};

use crate::Config;
use crate::commands::util::parse_day;

/// A tracker for one user backed by the `SQLite` database.
pub type Tracker<'a> = TimeTracker<SqliteEntries<'a>, &'a Database, Arc<dyn Clock + Send + Sync>>;

/// An open database plus the user and clock commands run with.
pub struct App {
    db: Database,
    config: Config,
    user: UserId,
    clock: Arc<dyn Clock + Send + Sync>,
    offset: FixedOffset,
}

impl App {
    /// Opens the configured database, ensuring its directory exists.
    pub fn open(config: Config, user: Option<&str>) -> Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            fs::create_dir_all(parent).context("failed to create database directory")?;
        }
        let db = Database::open(&config.database_path)
            .with_context(|| format!("failed to open {}", config.database_path.display()))?;
        Self::new(db, config, user)
    }

    /// Wraps an already open database, using the system clock and local offset.
    pub fn new(db: Database, config: Config, user: Option<&str>) -> Result<Self> {
        let user = UserId::new(user.unwrap_or(&config.user)).context("invalid user")?;
        let clock: Arc<dyn Clock + Send + Sync> = Arc::new(SystemClock);
        let offset = Local.offset_from_utc_datetime(&clock.now().naive_utc()).fix();
        Ok(Self {
            db,
            config,
            user,
            clock,
            offset,
        })
    }

    /// Replaces the clock and UTC offset.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>, offset: FixedOffset) -> Self {
        self.clock = clock;
        self.offset = offset;
        self
    }

    pub const fn db(&self) -> &Database {
        &self.db
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub const fn user(&self) -> &UserId {
        &self.user
    }

    /// UTC offset used for calendar days and displayed times.
    pub const fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Today's date in the local offset.
    pub fn today(&self) -> NaiveDate {
        self.clock.now().with_timezone(&self.offset).date_naive()
    }

    /// Builds the user's tracker with their saved session.
    pub fn tracker(&self) -> Result<Tracker<'_>> {
        let session = self
            .db
            .load_session(&self.user)
            .context("failed to load session")?;
        let config = TrackerConfig {
            zero_duration: self.config.zero_duration,
            offset: self.offset,
        };
        Ok(TimeTracker::new(
            self.db.entries(&self.user),
            &self.db,
            Arc::clone(&self.clock),
            config,
        )
        .with_session(session))
    }

    /// Runs a state-changing operation for the user.
    ///
    /// Holds the user's lock file for the duration, and commits entry
    /// changes and the updated session in one transaction.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut Tracker<'_>) -> Result<R, TrackerError>) -> Result<R> {
        let _lock = self.lock()?;
        self.db.atomically(|db| {
            let mut tracker = self.tracker()?;
            let value = f(&mut tracker)?;
            db.save_session(&self.user, tracker.session(), self.clock.now())
                .context("failed to save session")?;
            Ok(value)
        })
    }

    fn lock(&self) -> Result<File> {
        let path = self.config.lock_path(self.user.as_str());
        let file = File::create(&path)
            .with_context(|| format!("failed to create lock file {}", path.display()))?;
        file.lock_exclusive().context("failed to acquire lock")?;
        tracing::debug!(path = %path.display(), "acquired user lock");
        Ok(file)
    }

    /// Builds an entry filter from command-line range arguments.
    pub fn filter(
        &self,
        project: Option<&str>,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<EntryFilter> {
        let today = self.today();
        Ok(EntryFilter {
            project_id: project.map(ProjectId::new).transpose()?,
            from: from.map(|d| parse_day(d, today)).transpose()?,
            to: to.map(|d| parse_day(d, today)).transpose()?,
            billable: None,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    use chrono::{DateTime, Utc};
    use hrs_core::{ManualClock, Money, Project};

    /// An in-memory app at 2025-08-30 09:00 UTC with the sample projects.
    pub(crate) struct TestApp {
        pub app: App,
        pub clock: ManualClock,
        _dir: tempfile::TempDir,
    }

    pub(crate) fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-08-30T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    pub(crate) fn test_app() -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            database_path: dir.path().join("hrs.db"),
            ..Config::default()
        };
        let db = Database::open(&config.database_path).unwrap();
        for (id, name, client, rate) in [
            ("p1", "E-commerce Platform", "TechCorp Solutions", 5000),
            ("p2", "SaaS Dashboard", "InnovateTech Inc", 6000),
            ("p3", "Analytics Dashboard", "DataViz Solutions", 5500),
        ] {
            let project = Project::new(
                ProjectId::new(id).unwrap(),
                name,
                client,
                Money::from_cents(rate),
            )
            .unwrap();
            db.upsert_project(&project).unwrap();
        }
        let clock = ManualClock::new(t0());
        let app = App::new(db, config, Some("alice"))
            .unwrap()
            .with_clock(Arc::new(clock.clone()), Utc.fix());
        TestApp {
            app,
            clock,
            _dir: dir,
        }
    }
}
