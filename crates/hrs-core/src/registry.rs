//! Per-user tracker instances.
//!
//! Each user gets exactly one tracker behind its own mutex, so operations
//! for one user run one at a time while different users never contend.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::types::UserId;

type Factory<T> = Box<dyn Fn(&UserId) -> T + Send + Sync>;

/// Lazily creates and hands out one shared tracker per user.
pub struct TrackerRegistry<T> {
    factory: Factory<T>,
    trackers: Mutex<HashMap<UserId, Arc<Mutex<T>>>>,
}

impl<T> TrackerRegistry<T> {
    pub fn new(factory: impl Fn(&UserId) -> T + Send + Sync + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            trackers: Mutex::new(HashMap::new()),
        }
    }

    /// The user's tracker, created on first use.
    pub fn tracker(&self, user: &UserId) -> Arc<Mutex<T>> {
        let mut trackers = lock(&self.trackers);
        Arc::clone(trackers.entry(user.clone()).or_insert_with(|| {
            tracing::debug!(user = %user, "creating tracker");
            Arc::new(Mutex::new((self.factory)(user)))
        }))
    }

    /// Runs `f` with exclusive access to the user's tracker.
    ///
    /// A tracker whose previous holder panicked is still handed out: every
    /// tracker operation commits its state last, so a panic cannot leave it
    /// half-applied.
    pub fn with_tracker<R>(&self, user: &UserId, f: impl FnOnce(&mut T) -> R) -> R {
        let tracker = self.tracker(user);
        let mut guard = lock(&tracker);
        f(&mut guard)
    }

    /// Users that have a tracker, sorted.
    pub fn users(&self) -> Vec<UserId> {
        let mut users: Vec<_> = lock(&self.trackers).keys().cloned().collect();
        users.sort();
        users
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T> fmt::Debug for TrackerRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackerRegistry")
            .field("users", &self.users())
            .finish_non_exhaustive()
    }
}
