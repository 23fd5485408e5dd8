//! # Storage Traits
//!
//! This module defines the remote document store abstraction the domain
//! layer runs against. The store is treated as a key-path addressed
//! document/collection API with query, write, and subscribe primitives;
//! any backend with those primitives (the in-memory backend, a hosted
//! document database) can sit behind these traits without the domain
//! layer changing.

use anyhow::Result;
use async_trait::async_trait;
use shared::{GoalScope, PeriodId, Task};
use std::fmt;

/// Errors surfaced by remote document store operations.
///
/// All variants are recoverable and local to the triggering operation.
/// They are carried inside `anyhow::Error`; callers that need to branch
/// on the cause downcast to this type.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Operation requires a signed-in user")]
    Unauthenticated,
    #[error("Permission denied for {0}")]
    PermissionDenied(String),
    #[error("Remote store unavailable: {0}")]
    Unavailable(String),
    #[error("Document not found: {0}")]
    NotFound(String),
}

/// Addresses one period's task collection: owner scope + period id.
///
/// Collections are disjoint by construction, so no cross-period
/// coordination is ever needed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskScope {
    pub user_id: String,
    pub period: PeriodId,
}

impl TaskScope {
    pub fn new(user_id: impl Into<String>, period: PeriodId) -> Self {
        Self {
            user_id: user_id.into(),
            period,
        }
    }

    /// Full collection path, e.g. `users/u1/days/17/tasks`.
    pub fn collection_path(&self) -> String {
        format!(
            "users/{}/{}/{}/tasks",
            self.user_id,
            self.period.collection_segment(),
            self.period.index()
        )
    }
}

impl fmt::Display for TaskScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.collection_path())
    }
}

/// Addresses one goal document: owner scope + goal scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GoalPath {
    pub user_id: String,
    pub scope: GoalScope,
}

impl GoalPath {
    pub fn new(user_id: impl Into<String>, scope: GoalScope) -> Self {
        Self {
            user_id: user_id.into(),
            scope,
        }
    }

    /// Full document path, e.g. `users/u1/weeklyGoals/week-3`.
    pub fn document_path(&self) -> String {
        let (collection, doc) = self.scope.document_key();
        format!("users/{}/{}/{}", self.user_id, collection, doc)
    }
}

impl fmt::Display for GoalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.document_path())
    }
}

/// Stored fields of a goal document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoalDoc {
    /// First day of the cycle (RFC 3339 date)
    pub start_date: Option<String>,
    /// Free-text goal for the scope
    pub goal: Option<String>,
}

/// Partial write to a goal document. `None` fields preserve whatever the
/// document already holds (merge semantics).
#[derive(Debug, Clone, Default)]
pub struct GoalPatch {
    pub start_date: Option<String>,
    pub goal: Option<String>,
}

/// Callback invoked with the full, ordered contents of a task collection
/// every time a snapshot is delivered.
pub type SnapshotCallback = Box<dyn Fn(Vec<Task>) + Send + Sync>;

/// Guard for one live subscription.
///
/// The subscriber must retain this handle; releasing it (explicitly or by
/// drop) cancels the subscription, after which no further snapshots are
/// delivered.
pub struct TaskSubscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TaskSubscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Cancel the subscription.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for TaskSubscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for TaskSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskSubscription")
            .field("live", &self.cancel.is_some())
            .finish()
    }
}

/// Trait defining the interface for task collection storage operations
///
/// Ids and creation timestamps are assigned by the store, never by the
/// caller. Listings and snapshots are ordered by `created_at` descending.
#[async_trait]
pub trait TaskStorage: Send + Sync {
    /// Create a task with `completed = false` and a store-assigned
    /// id and creation timestamp
    async fn create_task(&self, scope: &TaskScope, title: &str) -> Result<Task>;

    /// Partial update of the `completed` field
    async fn set_completed(&self, scope: &TaskScope, task_id: &str, completed: bool) -> Result<()>;

    /// Partial update of the `title` field
    async fn rename_task(&self, scope: &TaskScope, task_id: &str, title: &str) -> Result<()>;

    /// Delete a single task
    /// Returns true if the task was found and deleted, false otherwise
    async fn delete_task(&self, scope: &TaskScope, task_id: &str) -> Result<bool>;

    /// List the collection's tasks ordered by `created_at` descending
    async fn list_tasks(&self, scope: &TaskScope) -> Result<Vec<Task>>;

    /// Register a snapshot listener for the collection.
    ///
    /// The current contents are delivered immediately, then every write
    /// to the collection delivers a fresh full snapshot, in write order,
    /// until the returned handle is released.
    fn subscribe(&self, scope: &TaskScope, on_snapshot: SnapshotCallback) -> TaskSubscription;
}

/// Trait defining the interface for goal document storage operations
#[async_trait]
pub trait GoalStorage: Send + Sync {
    /// Fetch a goal document; `None` when it does not exist yet
    async fn get_goal(&self, path: &GoalPath) -> Result<Option<GoalDoc>>;

    /// Merge-write a goal document, creating it if missing
    async fn upsert_goal(&self, path: &GoalPath, patch: GoalPatch) -> Result<()>;
}

/// Trait defining the interface for storage connections
///
/// Abstracts away the concrete backend and provides factory methods for
/// creating repositories, so the domain layer can be instantiated over
/// any store implementation.
pub trait Connection: Send + Sync + Clone {
    /// The type of TaskStorage this connection creates
    type TaskRepository: TaskStorage;

    /// The type of GoalStorage this connection creates
    type GoalRepository: GoalStorage;

    /// Create a new task repository for this connection
    fn create_task_repository(&self) -> Self::TaskRepository;

    /// Create a new goal repository for this connection
    fn create_goal_repository(&self) -> Self::GoalRepository;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_scope_paths_are_disjoint_per_period() {
        let day = TaskScope::new("u1", PeriodId::Day(17));
        let week = TaskScope::new("u1", PeriodId::Week(3));
        assert_eq!(day.collection_path(), "users/u1/days/17/tasks");
        assert_eq!(week.collection_path(), "users/u1/weeks/3/tasks");
        assert_ne!(day.collection_path(), week.collection_path());
    }

    #[test]
    fn goal_paths_follow_scope_keys() {
        assert_eq!(
            GoalPath::new("u1", GoalScope::Cycle).document_path(),
            "users/u1/Goal/goal"
        );
        assert_eq!(
            GoalPath::new("u1", GoalScope::Month(2)).document_path(),
            "users/u1/monthlyGoals/month-2"
        );
    }

    #[test]
    fn subscription_invokes_cancel_exactly_once() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;

        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let sub = TaskSubscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        sub.unsubscribe();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let counter = calls.clone();
        drop(TaskSubscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
