//! Storage layer for the hours tracker.
//!
//! Provides persistence for projects, time entries and active sessions using
//! `rusqlite`. [`Database`] implements the core's [`ProjectDirectory`], and
//! [`SqliteEntries`] implements [`EntryStore`] for a single user.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` can be moved between threads but cannot be shared across threads
//! without external synchronization. The CLI opens one connection per invocation
//! and serializes writers with a lock file.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in RFC 3339 format with millisecond precision
//! (e.g., `2025-08-30T09:00:00.000Z`) and dates as `YYYY-MM-DD`. Both sort
//! lexicographically in chronological order.
//!
//! ## Money
//!
//! Rates are stored as INTEGER cents. A NULL `rate_cents` on a time entry means
//! the entry is non-billable.
//!
//! ## Sessions
//!
//! The `active_sessions` table holds one JSON-encoded `ActiveSession` per user.
//! Idle sessions are stored too, so a selected project and task survive between
//! invocations.

use std::path::Path;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use hrs_core::{
    ActiveSession, EntryFilter, EntryId, EntrySource, EntryStatus, EntryStore, Money, Project,
    ProjectDirectory, ProjectId, TimeEntry, UserId,
};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use thiserror::Error;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored session payload could not be encoded or decoded.
    #[error("invalid session data: {0}")]
    Json(#[from] serde_json::Error),
    /// Failed to parse a stored timestamp or date.
    #[error("invalid {column} value: {value}")]
    TimestampParse {
        column: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored row violates the domain model.
    #[error("invalid {table} row {id}: {message}")]
    InvalidRow {
        table: &'static str,
        id: String,
        message: String,
    },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.conn.path())
            .finish()
    }
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        tracing::debug!(path = %path.display(), "opened database");
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                client TEXT NOT NULL DEFAULT '',
                hourly_rate_cents INTEGER NOT NULL CHECK (hourly_rate_cents >= 0)
            );

            -- seq preserves insertion order for entries that otherwise tie
            -- rate_cents: NULL for non-billable entries
            CREATE TABLE IF NOT EXISTS time_entries (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                user_id TEXT NOT NULL,
                project_id TEXT NOT NULL,
                task TEXT NOT NULL,
                date TEXT NOT NULL,
                start_at TEXT,
                end_at TEXT,
                duration_minutes INTEGER NOT NULL CHECK (duration_minutes >= 0),
                billable INTEGER NOT NULL,
                rate_cents INTEGER,
                status TEXT NOT NULL,
                source TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (project_id) REFERENCES projects(id)
            );

            CREATE INDEX IF NOT EXISTS idx_time_entries_user_date ON time_entries(user_id, date);
            CREATE INDEX IF NOT EXISTS idx_time_entries_project ON time_entries(project_id);

            CREATE TABLE IF NOT EXISTS active_sessions (
                user_id TEXT PRIMARY KEY,
                state TEXT NOT NULL,
                data TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Runs `f` inside a transaction, committing only if it succeeds.
    ///
    /// Entry writes through [`SqliteEntries`] and session writes made inside
    /// `f` land together or not at all.
    pub fn atomically<T, E>(&self, f: impl FnOnce(&Self) -> Result<T, E>) -> Result<T, E>
    where
        E: From<DbError>,
    {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(DbError::from)?;
        let value = f(self)?;
        tx.commit().map_err(DbError::from)?;
        Ok(value)
    }

    // ========== Projects ==========

    /// Inserts a project or replaces the one with the same ID.
    ///
    /// Existing entries keep the rate they were created with.
    pub fn upsert_project(&self, project: &Project) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO projects (id, name, client, hourly_rate_cents)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                client = excluded.client,
                hourly_rate_cents = excluded.hourly_rate_cents
            ",
            params![
                project.id.as_str(),
                project.name,
                project.client,
                project.hourly_rate.cents(),
            ],
        )?;
        tracing::debug!(project_id = %project.id, rate = %project.hourly_rate, "saved project");
        Ok(())
    }

    // ========== Entries ==========

    /// Entry storage scoped to one user.
    pub fn entries(&self, user: &UserId) -> SqliteEntries<'_> {
        SqliteEntries {
            db: self,
            user: user.clone(),
        }
    }

    // ========== Sessions ==========

    /// Loads a user's session, or an idle one if none was saved.
    pub fn load_session(&self, user: &UserId) -> Result<ActiveSession, DbError> {
        let data: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM active_sessions WHERE user_id = ?",
                [user.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        match data {
            Some(data) => Ok(serde_json::from_str(&data)?),
            None => Ok(ActiveSession::default()),
        }
    }

    /// Stores a user's session, replacing any previous one.
    ///
    /// `updated_at` comes from the caller's clock.
    pub fn save_session(
        &self,
        user: &UserId,
        session: &ActiveSession,
        updated_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        let data = serde_json::to_string(session)?;
        self.conn.execute(
            "
            INSERT INTO active_sessions (user_id, state, data, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                state = excluded.state,
                data = excluded.data,
                updated_at = excluded.updated_at
            ",
            params![
                user.as_str(),
                session.state().as_str(),
                data,
                format_timestamp(updated_at),
            ],
        )?;
        tracing::debug!(user = %user, state = %session.state(), "saved session");
        Ok(())
    }
}

impl ProjectDirectory for Database {
    type Error = DbError;

    fn project(&self, id: &ProjectId) -> Result<Option<Project>, DbError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, client, hourly_rate_cents FROM projects WHERE id = ?",
                [id.as_str()],
                ProjectRow::from_row,
            )
            .optional()?;
        row.map(ProjectRow::into_project).transpose()
    }

    fn projects(&self) -> Result<Vec<Project>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, client, hourly_rate_cents FROM projects ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], ProjectRow::from_row)?;
        let mut projects = Vec::new();
        for row in rows {
            projects.push(row?.into_project()?);
        }
        Ok(projects)
    }
}

/// One user's time entries in a [`Database`].
#[derive(Debug)]
pub struct SqliteEntries<'a> {
    db: &'a Database,
    user: UserId,
}

impl SqliteEntries<'_> {
    pub const fn user(&self) -> &UserId {
        &self.user
    }
}

const ENTRY_COLUMNS: &str = "id, project_id, task, date, start_at, end_at, duration_minutes, \
                             billable, rate_cents, status, source, created_at";

impl EntryStore for SqliteEntries<'_> {
    type Error = DbError;

    fn insert(&mut self, entry: &TimeEntry) -> Result<(), DbError> {
        self.db.conn.execute(
            "
            INSERT INTO time_entries
            (id, user_id, project_id, task, date, start_at, end_at, duration_minutes,
             billable, rate_cents, status, source, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
            params![
                entry.id.as_str(),
                self.user.as_str(),
                entry.project_id.as_str(),
                entry.task,
                format_date(entry.date),
                entry.start.map(format_timestamp),
                entry.end.map(format_timestamp),
                entry.duration_minutes,
                entry.billable,
                entry.rate.map(Money::cents),
                entry.status.as_str(),
                entry.source.as_str(),
                format_timestamp(entry.created_at),
            ],
        )?;
        Ok(())
    }

    fn update(&mut self, entry: &TimeEntry) -> Result<bool, DbError> {
        let changed = self.db.conn.execute(
            "
            UPDATE time_entries
            SET project_id = ?, task = ?, date = ?, start_at = ?, end_at = ?,
                duration_minutes = ?, billable = ?, rate_cents = ?, status = ?, source = ?
            WHERE id = ? AND user_id = ?
            ",
            params![
                entry.project_id.as_str(),
                entry.task,
                format_date(entry.date),
                entry.start.map(format_timestamp),
                entry.end.map(format_timestamp),
                entry.duration_minutes,
                entry.billable,
                entry.rate.map(Money::cents),
                entry.status.as_str(),
                entry.source.as_str(),
                entry.id.as_str(),
                self.user.as_str(),
            ],
        )?;
        Ok(changed > 0)
    }

    fn remove(&mut self, id: &EntryId) -> Result<bool, DbError> {
        let changed = self.db.conn.execute(
            "DELETE FROM time_entries WHERE id = ? AND user_id = ?",
            params![id.as_str(), self.user.as_str()],
        )?;
        Ok(changed > 0)
    }

    fn get(&self, id: &EntryId) -> Result<Option<TimeEntry>, DbError> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM time_entries WHERE id = ? AND user_id = ?");
        let row = self
            .db
            .conn
            .query_row(&sql, params![id.as_str(), self.user.as_str()], EntryRow::from_row)
            .optional()?;
        row.map(EntryRow::into_entry).transpose()
    }

    fn list(&self, filter: &EntryFilter) -> Result<Vec<TimeEntry>, DbError> {
        let mut sql = format!("SELECT {ENTRY_COLUMNS} FROM time_entries WHERE user_id = ?");
        let mut values = vec![Value::Text(self.user.to_string())];
        if let Some(project_id) = &filter.project_id {
            sql.push_str(" AND project_id = ?");
            values.push(Value::Text(project_id.to_string()));
        }
        if let Some(from) = filter.from {
            sql.push_str(" AND date >= ?");
            values.push(Value::Text(format_date(from)));
        }
        if let Some(to) = filter.to {
            sql.push_str(" AND date < ?");
            values.push(Value::Text(format_date(to)));
        }
        if let Some(billable) = filter.billable {
            sql.push_str(" AND billable = ?");
            values.push(Value::Integer(i64::from(billable)));
        }
        sql.push_str(" ORDER BY seq ASC");

        let mut stmt = self.db.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), EntryRow::from_row)?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?.into_entry()?);
        }
        Ok(entries)
    }
}

#[derive(Debug)]
struct ProjectRow {
    id: String,
    name: String,
    client: String,
    hourly_rate_cents: i64,
}

impl ProjectRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            client: row.get(2)?,
            hourly_rate_cents: row.get(3)?,
        })
    }

    fn into_project(self) -> Result<Project, DbError> {
        let invalid = |message: String| DbError::InvalidRow {
            table: "projects",
            id: self.id.clone(),
            message,
        };
        let id = ProjectId::new(self.id.as_str()).map_err(|e| invalid(e.to_string()))?;
        Project::new(
            id,
            self.name.as_str(),
            self.client.as_str(),
            Money::from_cents(self.hourly_rate_cents),
        )
        .map_err(|e| invalid(e.to_string()))
    }
}

#[derive(Debug)]
struct EntryRow {
    id: String,
    project_id: String,
    task: String,
    date: String,
    start_at: Option<String>,
    end_at: Option<String>,
    duration_minutes: i64,
    billable: bool,
    rate_cents: Option<i64>,
    status: String,
    source: String,
    created_at: String,
}

impl EntryRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            project_id: row.get(1)?,
            task: row.get(2)?,
            date: row.get(3)?,
            start_at: row.get(4)?,
            end_at: row.get(5)?,
            duration_minutes: row.get(6)?,
            billable: row.get(7)?,
            rate_cents: row.get(8)?,
            status: row.get(9)?,
            source: row.get(10)?,
            created_at: row.get(11)?,
        })
    }

    fn into_entry(self) -> Result<TimeEntry, DbError> {
        let invalid = |message: String| DbError::InvalidRow {
            table: "time_entries",
            id: self.id.clone(),
            message,
        };
        let status = match self.status.as_str() {
            "completed" => EntryStatus::Completed,
            other => return Err(invalid(format!("unknown status {other}"))),
        };
        let entry = TimeEntry {
            id: EntryId::new(self.id.as_str()).map_err(|e| invalid(e.to_string()))?,
            project_id: ProjectId::new(self.project_id.as_str())
                .map_err(|e| invalid(e.to_string()))?,
            task: self.task.clone(),
            date: parse_date(&self.date)?,
            start: self.start_at.as_deref().map(parse_timestamp).transpose()?,
            end: self.end_at.as_deref().map(parse_timestamp).transpose()?,
            duration_minutes: u32::try_from(self.duration_minutes)
                .map_err(|e| invalid(e.to_string()))?,
            billable: self.billable,
            rate: self.rate_cents.map(Money::from_cents),
            status,
            source: self.source.parse::<EntrySource>().map_err(invalid)?,
            created_at: parse_timestamp(&self.created_at)?,
        };
        entry.validate().map_err(|e| invalid(e.to_string()))?;
        Ok(entry)
    }
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            column: "timestamp",
            value: value.to_string(),
            source,
        })
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_date(value: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|source| DbError::TimestampParse {
        column: "date",
        value: value.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use chrono::{Duration, TimeZone};
    use hrs_core::{
        EntryPatch, ManualClock, ManualEntry, TimeTracker, TrackerConfig, TrackerError,
    };

    fn user(name: &str) -> UserId {
        UserId::new(name).unwrap()
    }

    fn pid(id: &str) -> ProjectId {
        ProjectId::new(id).unwrap()
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, day, hour, 0, 0)
            .single()
            .expect("valid test timestamp")
    }

    fn seeded() -> Database {
        let db = Database::open_in_memory().expect("open in-memory db");
        for (id, name, client, rate) in [
            ("p1", "E-commerce Platform", "TechCorp Solutions", 5000),
            ("p2", "SaaS Dashboard", "InnovateTech Inc", 6000),
        ] {
            let project = Project::new(pid(id), name, client, Money::from_cents(rate)).unwrap();
            db.upsert_project(&project).unwrap();
        }
        db
    }

    fn entry(id: &str, project: &str, day: u32, hour: Option<u32>, minutes: u32) -> TimeEntry {
        let start = hour.map(|h| at(day, h));
        TimeEntry {
            id: EntryId::new(id).unwrap(),
            project_id: pid(project),
            task: format!("task {id}"),
            date: at(day, 0).date_naive(),
            start,
            end: start.map(|s| s + Duration::minutes(i64::from(minutes))),
            duration_minutes: minutes,
            billable: true,
            rate: Some(Money::from_cents(5000)),
            status: EntryStatus::Completed,
            source: EntrySource::Manual,
            created_at: at(31, 0),
        }
    }

    #[test]
    fn open_in_memory_database() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn schema_matches_data_model() {
        let db = Database::open_in_memory().expect("open in-memory db");

        assert_eq!(
            table_columns(&db.conn, "projects"),
            vec!["id", "name", "client", "hourly_rate_cents"]
        );
        assert_eq!(
            table_columns(&db.conn, "time_entries"),
            vec![
                "seq",
                "id",
                "user_id",
                "project_id",
                "task",
                "date",
                "start_at",
                "end_at",
                "duration_minutes",
                "billable",
                "rate_cents",
                "status",
                "source",
                "created_at",
            ]
        );
        assert_eq!(
            table_columns(&db.conn, "active_sessions"),
            vec!["user_id", "state", "data", "updated_at"]
        );

        let indexes = index_names(&db.conn, "time_entries");
        assert!(indexes.contains("idx_time_entries_user_date"));
        assert!(indexes.contains("idx_time_entries_project"));
    }

    fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .expect("prepare table_info");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query table_info");
        rows.map(|row| row.expect("table_info row")).collect()
    }

    fn index_names(conn: &Connection, table: &str) -> HashSet<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA index_list({table})"))
            .expect("prepare index_list");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query index_list");
        rows.map(|row| row.expect("index_list row")).collect()
    }

    #[test]
    fn projects_upsert_and_list_by_id() {
        let db = seeded();
        let repriced = Project::new(
            pid("p1"),
            "E-commerce Platform",
            "TechCorp Solutions",
            Money::from_cents(7500),
        )
        .unwrap();
        db.upsert_project(&repriced).unwrap();

        let projects = db.projects().unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0], repriced);
        assert_eq!(projects[1].name, "SaaS Dashboard");
        assert_eq!(db.project(&pid("missing")).unwrap(), None);
    }

    #[test]
    fn entries_round_trip() {
        let db = seeded();
        let mut store = db.entries(&user("alice"));
        let timed = entry("e1", "p1", 30, Some(9), 90);
        let mut untimed = entry("e2", "p2", 30, None, 45);
        untimed.billable = false;
        untimed.rate = None;
        untimed.task = String::new();

        store.insert(&timed).unwrap();
        store.insert(&untimed).unwrap();

        assert_eq!(store.get(&timed.id).unwrap(), Some(timed.clone()));
        assert_eq!(store.get(&untimed.id).unwrap(), Some(untimed.clone()));
        assert_eq!(store.list(&EntryFilter::default()).unwrap(), vec![timed, untimed]);
    }

    #[test]
    fn list_filters_and_keeps_insertion_order() {
        let db = seeded();
        let mut store = db.entries(&user("alice"));
        store.insert(&entry("e1", "p1", 28, Some(9), 60)).unwrap();
        store.insert(&entry("e2", "p2", 29, Some(9), 60)).unwrap();
        store.insert(&entry("e3", "p1", 29, None, 30)).unwrap();
        let mut non_billable = entry("e4", "p1", 30, None, 30);
        non_billable.billable = false;
        non_billable.rate = None;
        store.insert(&non_billable).unwrap();

        let ids = |filter: &EntryFilter| -> Vec<String> {
            store
                .list(filter)
                .unwrap()
                .into_iter()
                .map(|e| e.id.to_string())
                .collect()
        };
        let aug = |day| NaiveDate::from_ymd_opt(2025, 8, day).unwrap();

        assert_eq!(ids(&EntryFilter::default()), ["e1", "e2", "e3", "e4"]);
        assert_eq!(ids(&EntryFilter::between(aug(29), aug(30))), ["e2", "e3"]);
        assert_eq!(ids(&EntryFilter::default().project(pid("p1"))), ["e1", "e3", "e4"]);
        assert_eq!(ids(&EntryFilter::default().billable(false)), ["e4"]);
    }

    #[test]
    fn entries_are_scoped_per_user() {
        let db = seeded();
        let alice_entry = entry("e1", "p1", 30, Some(9), 60);
        db.entries(&user("alice")).insert(&alice_entry).unwrap();

        let mut bob = db.entries(&user("bob"));
        assert!(bob.list(&EntryFilter::default()).unwrap().is_empty());
        assert_eq!(bob.get(&alice_entry.id).unwrap(), None);
        assert!(!bob.update(&alice_entry).unwrap());
        assert!(!bob.remove(&alice_entry.id).unwrap());
        assert_eq!(db.entries(&user("alice")).list(&EntryFilter::default()).unwrap().len(), 1);
    }

    #[test]
    fn update_and_remove() {
        let db = seeded();
        let mut store = db.entries(&user("alice"));
        let mut e = entry("e1", "p1", 30, Some(9), 60);
        store.insert(&e).unwrap();

        e.task = "renamed".to_string();
        assert!(store.update(&e).unwrap());
        assert_eq!(store.get(&e.id).unwrap().unwrap().task, "renamed");

        assert!(store.remove(&e.id).unwrap());
        assert!(!store.remove(&e.id).unwrap());
        assert_eq!(store.get(&e.id).unwrap(), None);
    }

    #[test]
    fn session_defaults_to_idle_and_round_trips() {
        let db = seeded();
        let alice = user("alice");
        assert_eq!(db.load_session(&alice).unwrap(), ActiveSession::default());

        let mut session = ActiveSession::default();
        session.select_project(pid("p1")).unwrap();
        session.set_task("design").unwrap();
        session.start(at(30, 9), Money::from_cents(5000)).unwrap();
        db.save_session(&alice, &session, at(30, 9)).unwrap();
        assert_eq!(db.load_session(&alice).unwrap(), session);

        session.pause(at(30, 10)).unwrap();
        db.save_session(&alice, &session, at(30, 10)).unwrap();
        assert_eq!(db.load_session(&alice).unwrap(), session);

        let updated_at: String = db
            .conn
            .query_row(
                "SELECT updated_at FROM active_sessions WHERE user_id = ?",
                [alice.as_str()],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(parse_timestamp(&updated_at).unwrap(), at(30, 10));
        assert_eq!(db.load_session(&user("bob")).unwrap(), ActiveSession::default());
    }

    #[test]
    fn atomically_rolls_back_on_error() {
        let db = seeded();
        let alice = user("alice");
        let result: Result<(), DbError> = db.atomically(|db| {
            db.entries(&alice).insert(&entry("e1", "p1", 30, Some(9), 60))?;
            Err(DbError::InvalidRow {
                table: "time_entries",
                id: "e1".to_string(),
                message: "forced failure".to_string(),
            })
        });
        assert!(result.is_err());
        assert!(db.entries(&alice).list(&EntryFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("hrs.db");
        let stored = entry("e1", "p1", 30, Some(9), 60);
        {
            let db = Database::open(&path).unwrap();
            let project =
                Project::new(pid("p1"), "E-commerce Platform", "TechCorp Solutions", Money::from_cents(5000))
                    .unwrap();
            db.upsert_project(&project).unwrap();
            db.entries(&user("alice")).insert(&stored).unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(
            db.entries(&user("alice")).get(&stored.id).unwrap(),
            Some(stored)
        );
    }

    #[test]
    fn corrupt_rows_are_reported() {
        let db = seeded();
        db.conn
            .execute(
                "
                INSERT INTO time_entries
                (id, user_id, project_id, task, date, duration_minutes, billable, rate_cents,
                 status, source, created_at)
                VALUES ('bad', 'alice', 'p1', '', '2025-08-30', 60, 1, NULL,
                        'completed', 'manual', '2025-08-31T00:00:00.000Z')
                ",
                [],
            )
            .unwrap();
        let err = db
            .entries(&user("alice"))
            .get(&EntryId::new("bad").unwrap())
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidRow { table: "time_entries", .. }));
    }

    #[test]
    fn tracker_runs_against_sqlite() {
        let db = seeded();
        let alice = user("alice");
        let clock = ManualClock::new(at(30, 9));

        let mut tracker = TimeTracker::new(
            db.entries(&alice),
            &db,
            clock.clone(),
            TrackerConfig::default(),
        );
        tracker.select_project(&pid("p1")).unwrap();
        tracker.set_task("checkout flow").unwrap();
        tracker.start().unwrap();
        clock.advance(Duration::minutes(90));
        let tracked = tracker.stop().unwrap().unwrap();

        let manual = tracker
            .add_manual_entry(ManualEntry::with_duration(pid("p2"), at(29, 0).date_naive(), 30))
            .unwrap();
        let patch = EntryPatch {
            billable: Some(false),
            ..Default::default()
        };
        let edited = tracker.edit_entry(&manual.id, &patch).unwrap();
        assert_eq!(edited.rate, None);

        let listed = tracker.query_entries(&EntryFilter::default()).unwrap();
        assert_eq!(listed, vec![tracked.clone(), edited]);
        assert_eq!(tracked.earnings(), Money::from_cents(7500));

        tracker.delete_entry(&tracked.id).unwrap();
        assert!(matches!(
            tracker.delete_entry(&tracked.id),
            Err(TrackerError::NotFound(_))
        ));
    }
}
