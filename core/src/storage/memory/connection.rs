//! In-memory document store shared by the memory repositories.
//!
//! One `MemoryDb` holds every collection and document, keyed by full
//! path. A registry of snapshot listeners fans writes out to subscribed
//! task stores synchronously, in registration order, which gives the
//! in-order snapshot delivery the sync layer relies on.

use chrono::{SecondsFormat, TimeZone, Utc};
use log::debug;
use shared::Task;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::storage::traits::{Connection, GoalDoc, SnapshotCallback};

use super::goal_repository::MemoryGoalRepository;
use super::task_repository::MemoryTaskRepository;

/// One registered snapshot listener.
struct Listener {
    id: u64,
    path: String,
    callback: SnapshotCallback,
}

/// Backing state for the in-memory store.
pub(super) struct MemoryDb {
    /// Task documents per collection path
    pub(super) tasks: Mutex<HashMap<String, Vec<Task>>>,
    /// Goal documents per document path
    pub(super) goals: Mutex<HashMap<String, GoalDoc>>,
    /// Live snapshot listeners, in registration order
    listeners: Mutex<Vec<Listener>>,
    next_listener_id: AtomicU64,
    /// Last issued creation timestamp, for strict monotonicity
    last_millis: Mutex<i64>,
}

impl MemoryDb {
    fn new() -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
            goals: Mutex::new(HashMap::new()),
            listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(1),
            last_millis: Mutex::new(0),
        }
    }

    /// Issue a creation timestamp strictly greater than every previous
    /// one, so `created_at` descending is a total order.
    pub(super) fn next_created_at(&self) -> String {
        let mut last = self.last_millis.lock().unwrap();
        let mut now = Utc::now().timestamp_millis();
        if now <= *last {
            now = *last + 1;
        }
        *last = now;
        Utc.timestamp_millis_opt(now)
            .single()
            .unwrap_or_else(Utc::now)
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Current contents of a collection, ordered by `created_at`
    /// descending.
    pub(super) fn snapshot_of(&self, path: &str) -> Vec<Task> {
        let tasks = self.tasks.lock().unwrap();
        let mut snapshot = tasks.get(path).cloned().unwrap_or_default();
        snapshot.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        snapshot
    }

    /// Deliver a fresh snapshot to every listener on `path`.
    pub(super) fn notify(&self, path: &str) {
        let snapshot = self.snapshot_of(path);
        let listeners = self.listeners.lock().unwrap();
        for listener in listeners.iter().filter(|l| l.path == path) {
            (listener.callback)(snapshot.clone());
        }
    }

    /// Deliver the current snapshot to a single listener (the initial
    /// delivery on subscribe).
    pub(super) fn notify_listener(&self, id: u64) {
        let path = {
            let listeners = self.listeners.lock().unwrap();
            listeners.iter().find(|l| l.id == id).map(|l| l.path.clone())
        };
        // The snapshot is taken between the two listener locks; no lock
        // is ever held while acquiring another.
        if let Some(path) = path {
            let snapshot = self.snapshot_of(&path);
            let listeners = self.listeners.lock().unwrap();
            if let Some(listener) = listeners.iter().find(|l| l.id == id) {
                (listener.callback)(snapshot);
            }
        }
    }

    pub(super) fn register_listener(&self, path: String, callback: SnapshotCallback) -> u64 {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        debug!("Registering snapshot listener {} on {}", id, path);
        self.listeners.lock().unwrap().push(Listener {
            id,
            path,
            callback,
        });
        id
    }

    pub(super) fn remove_listener(&self, id: u64) {
        debug!("Removing snapshot listener {}", id);
        self.listeners.lock().unwrap().retain(|l| l.id != id);
    }
}

/// MemoryConnection hands out repositories over one shared in-process
/// document store.
#[derive(Clone)]
pub struct MemoryConnection {
    db: Arc<MemoryDb>,
}

impl MemoryConnection {
    /// Create a new, empty in-memory store.
    pub fn new() -> Self {
        Self {
            db: Arc::new(MemoryDb::new()),
        }
    }
}

impl Default for MemoryConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl Connection for MemoryConnection {
    type TaskRepository = MemoryTaskRepository;
    type GoalRepository = MemoryGoalRepository;

    fn create_task_repository(&self) -> MemoryTaskRepository {
        MemoryTaskRepository::new(self.db.clone())
    }

    fn create_goal_repository(&self) -> MemoryGoalRepository {
        MemoryGoalRepository::new(self.db.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_at_is_strictly_monotonic() {
        let db = MemoryDb::new();
        let mut previous = String::new();
        for _ in 0..50 {
            let next = db.next_created_at();
            assert!(next > previous, "{} should sort after {}", next, previous);
            previous = next;
        }
    }

    #[test]
    fn removed_listener_gets_no_further_snapshots() {
        use std::sync::atomic::AtomicU32;

        let db = MemoryDb::new();
        let deliveries = Arc::new(AtomicU32::new(0));
        let counter = deliveries.clone();
        let id = db.register_listener(
            "users/u1/days/1/tasks".to_string(),
            Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        db.notify("users/u1/days/1/tasks");
        assert_eq!(deliveries.load(Ordering::SeqCst), 1);

        db.remove_listener(id);
        db.notify("users/u1/days/1/tasks");
        assert_eq!(deliveries.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn notify_only_reaches_matching_path() {
        use std::sync::atomic::AtomicU32;

        let db = MemoryDb::new();
        let deliveries = Arc::new(AtomicU32::new(0));
        let counter = deliveries.clone();
        db.register_listener(
            "users/u1/days/1/tasks".to_string(),
            Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        db.notify("users/u1/days/2/tasks");
        assert_eq!(deliveries.load(Ordering::SeqCst), 0);
    }
}
