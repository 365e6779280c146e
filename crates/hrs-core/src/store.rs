//! The time entry store.
//!
//! [`EntryStore`] is the durable contract a backend must provide (insert,
//! update, remove, get, list in insertion order). [`Timesheet`] layers the
//! entry rules on top: validation, ID assignment, edit semantics and the
//! most-recent-first ordering of listings.

use std::cmp::Reverse;
use std::convert::Infallible;

use chrono::{DateTime, Utc};

use crate::entry::{EntryDraft, EntryFilter, EntryPatch, TimeEntry};
use crate::error::TrackerError;
use crate::types::EntryId;

/// Storage backend for one user's time entries.
pub trait EntryStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Appends a new entry.
    fn insert(&mut self, entry: &TimeEntry) -> Result<(), Self::Error>;

    /// Replaces the entry with the same ID. Returns false if none exists.
    fn update(&mut self, entry: &TimeEntry) -> Result<bool, Self::Error>;

    /// Deletes an entry. Returns false if none exists.
    fn remove(&mut self, id: &EntryId) -> Result<bool, Self::Error>;

    fn get(&self, id: &EntryId) -> Result<Option<TimeEntry>, Self::Error>;

    /// Lists matching entries in insertion order.
    fn list(&self, filter: &EntryFilter) -> Result<Vec<TimeEntry>, Self::Error>;
}

/// In-memory entry backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Vec<TimeEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl EntryStore for MemoryStore {
    type Error = Infallible;

    fn insert(&mut self, entry: &TimeEntry) -> Result<(), Self::Error> {
        self.entries.push(entry.clone());
        Ok(())
    }

    fn update(&mut self, entry: &TimeEntry) -> Result<bool, Self::Error> {
        match self.entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => {
                existing.clone_from(entry);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove(&mut self, id: &EntryId) -> Result<bool, Self::Error> {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != *id);
        Ok(self.entries.len() != before)
    }

    fn get(&self, id: &EntryId) -> Result<Option<TimeEntry>, Self::Error> {
        Ok(self.entries.iter().find(|e| e.id == *id).cloned())
    }

    fn list(&self, filter: &EntryFilter) -> Result<Vec<TimeEntry>, Self::Error> {
        Ok(self
            .entries
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect())
    }
}

/// Sorts entries most recent first by date, then start time.
///
/// Entries without a start time sort after timed entries on the same day.
/// The sort is stable, so ties keep their insertion order.
pub fn sort_most_recent_first(entries: &mut [TimeEntry]) {
    entries.sort_by_key(|e| (Reverse(e.date), Reverse(e.start)));
}

/// Validating front for an [`EntryStore`].
#[derive(Debug, Clone, Default)]
pub struct Timesheet<S> {
    store: S,
}

impl<S: EntryStore> Timesheet<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Validates a draft, assigns it an ID and appends it.
    pub fn add_entry(
        &mut self,
        draft: EntryDraft,
        created_at: DateTime<Utc>,
    ) -> Result<TimeEntry, TrackerError> {
        draft.validate()?;
        let entry = draft.into_entry(EntryId::generate(), created_at);
        self.store.insert(&entry).map_err(TrackerError::storage)?;
        tracing::debug!(
            entry_id = %entry.id,
            project_id = %entry.project_id,
            duration_minutes = entry.duration_minutes,
            billable = entry.billable,
            "stored time entry"
        );
        Ok(entry)
    }

    /// Applies a patch to an existing entry.
    ///
    /// Nothing is written if the patched entry fails validation.
    pub fn edit_entry(
        &mut self,
        id: &EntryId,
        patch: &EntryPatch,
    ) -> Result<TimeEntry, TrackerError> {
        let existing = self.get_entry(id)?;
        let updated = patch.apply(&existing)?;
        if !self.store.update(&updated).map_err(TrackerError::storage)? {
            return Err(TrackerError::NotFound(id.clone()));
        }
        tracing::debug!(entry_id = %id, "edited time entry");
        Ok(updated)
    }

    /// Permanently removes an entry and returns it.
    pub fn delete_entry(&mut self, id: &EntryId) -> Result<TimeEntry, TrackerError> {
        let existing = self.get_entry(id)?;
        if !self.store.remove(id).map_err(TrackerError::storage)? {
            return Err(TrackerError::NotFound(id.clone()));
        }
        tracing::debug!(entry_id = %id, "deleted time entry");
        Ok(existing)
    }

    pub fn get_entry(&self, id: &EntryId) -> Result<TimeEntry, TrackerError> {
        self.store
            .get(id)
            .map_err(TrackerError::storage)?
            .ok_or_else(|| TrackerError::NotFound(id.clone()))
    }

    /// Lists matching entries, most recent first.
    pub fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<TimeEntry>, TrackerError> {
        let mut entries = self.store.list(filter).map_err(TrackerError::storage)?;
        sort_most_recent_first(&mut entries);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{Duration, NaiveDate, TimeZone};

    use crate::entry::EntrySource;
    use crate::types::{Money, ProjectId, ValidationError};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, day, hour, 0, 0)
            .single()
            .expect("valid test timestamp")
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, day).unwrap()
    }

    fn timed(task: &str, day: u32, hour: u32, minutes: u32) -> EntryDraft {
        let start = at(day, hour);
        EntryDraft {
            project_id: ProjectId::new("p1").unwrap(),
            task: task.to_string(),
            date: date(day),
            start: Some(start),
            end: Some(start + Duration::minutes(i64::from(minutes))),
            duration_minutes: minutes,
            billable: true,
            rate: Some(Money::from_cents(5000)),
            source: EntrySource::Manual,
        }
    }

    fn untimed(task: &str, day: u32, minutes: u32) -> EntryDraft {
        EntryDraft {
            start: None,
            end: None,
            ..timed(task, day, 0, minutes)
        }
    }

    fn timesheet() -> Timesheet<MemoryStore> {
        Timesheet::new(MemoryStore::new())
    }

    #[test]
    fn add_assigns_id_and_completes() {
        let mut sheet = timesheet();
        let entry = sheet.add_entry(timed("design", 30, 9, 60), at(30, 10)).unwrap();
        assert_eq!(entry.created_at, at(30, 10));
        assert_eq!(sheet.get_entry(&entry.id).unwrap(), entry);
    }

    #[test]
    fn add_rejects_invalid_draft_without_storing() {
        let mut sheet = timesheet();
        let mut draft = timed("design", 30, 9, 60);
        draft.duration_minutes = 45;
        let err = sheet.add_entry(draft, at(30, 10)).unwrap_err();
        assert!(matches!(
            err,
            TrackerError::Validation(ValidationError::DurationMismatch { .. })
        ));
        assert!(sheet.store().is_empty());
    }

    #[test]
    fn edit_unknown_entry_is_not_found() {
        let mut sheet = timesheet();
        let id = EntryId::new("missing").unwrap();
        let err = sheet.edit_entry(&id, &EntryPatch::default()).unwrap_err();
        assert!(matches!(err, TrackerError::NotFound(ref missing) if *missing == id));
    }

    #[test]
    fn failed_edit_leaves_entry_untouched() {
        let mut sheet = timesheet();
        let entry = sheet.add_entry(timed("design", 30, 9, 60), at(30, 10)).unwrap();
        let patch = EntryPatch {
            task: Some("renamed".to_string()),
            duration_minutes: Some(-5),
            ..Default::default()
        };
        assert!(sheet.edit_entry(&entry.id, &patch).is_err());
        assert_eq!(sheet.get_entry(&entry.id).unwrap().task, "design");
    }

    #[test]
    fn delete_removes_permanently() {
        let mut sheet = timesheet();
        let entry = sheet.add_entry(timed("design", 30, 9, 60), at(30, 10)).unwrap();
        let removed = sheet.delete_entry(&entry.id).unwrap();
        assert_eq!(removed.id, entry.id);
        assert!(matches!(
            sheet.delete_entry(&entry.id),
            Err(TrackerError::NotFound(_))
        ));
        assert!(sheet.store().is_empty());
    }

    #[test]
    fn list_orders_most_recent_first_with_stable_ties() {
        let mut sheet = timesheet();
        let created = at(31, 0);
        sheet.add_entry(timed("old", 28, 11, 60), created).unwrap();
        sheet.add_entry(untimed("manual a", 30, 30), created).unwrap();
        sheet.add_entry(timed("morning", 30, 9, 60), created).unwrap();
        sheet.add_entry(timed("afternoon", 30, 14, 60), created).unwrap();
        sheet.add_entry(untimed("manual b", 30, 15), created).unwrap();

        let tasks: Vec<_> = sheet
            .list_entries(&EntryFilter::default())
            .unwrap()
            .into_iter()
            .map(|e| e.task)
            .collect();
        assert_eq!(
            tasks,
            ["afternoon", "morning", "manual a", "manual b", "old"]
        );
    }

    #[test]
    fn list_applies_filter() {
        let mut sheet = timesheet();
        let created = at(31, 0);
        sheet.add_entry(timed("in range", 29, 9, 60), created).unwrap();
        sheet.add_entry(timed("out of range", 30, 9, 60), created).unwrap();
        let mut other = timed("other project", 29, 12, 60);
        other.project_id = ProjectId::new("p2").unwrap();
        sheet.add_entry(other, created).unwrap();

        let filter = EntryFilter::between(date(29), date(30)).project(ProjectId::new("p1").unwrap());
        let entries = sheet.list_entries(&filter).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].task, "in range");
    }
}
