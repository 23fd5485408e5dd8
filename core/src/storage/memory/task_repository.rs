//! # Memory Task Repository
//!
//! Task collection storage over the shared in-memory document store.
//! Collections live under their full path (`users/{uid}/days/{n}/tasks`),
//! ids and creation timestamps are assigned here, and every successful
//! write fans a fresh full snapshot out to the path's listeners.

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, info};
use shared::Task;
use std::sync::Arc;
use uuid::Uuid;

use crate::storage::traits::{
    SnapshotCallback, StoreError, TaskScope, TaskStorage, TaskSubscription,
};

use super::connection::MemoryDb;

/// In-memory task repository
#[derive(Clone)]
pub struct MemoryTaskRepository {
    db: Arc<MemoryDb>,
}

impl MemoryTaskRepository {
    pub(super) fn new(db: Arc<MemoryDb>) -> Self {
        Self { db }
    }

    /// Run `mutate` on the task if it exists, then notify the path's
    /// listeners. Missing tasks surface as `StoreError::NotFound`.
    fn update_task<F>(&self, scope: &TaskScope, task_id: &str, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut Task),
    {
        let path = scope.collection_path();
        {
            let mut collections = self.db.tasks.lock().unwrap();
            let task = collections
                .get_mut(&path)
                .and_then(|tasks| tasks.iter_mut().find(|t| t.id == task_id))
                .ok_or_else(|| StoreError::NotFound(format!("{}/{}", path, task_id)))?;
            mutate(task);
        }
        self.db.notify(&path);
        Ok(())
    }
}

#[async_trait]
impl TaskStorage for MemoryTaskRepository {
    async fn create_task(&self, scope: &TaskScope, title: &str) -> Result<Task> {
        let path = scope.collection_path();
        let task = Task {
            id: format!("task::{}", Uuid::new_v4()),
            title: title.to_string(),
            completed: false,
            created_at: self.db.next_created_at(),
        };

        info!("Creating task {} in {}", task.id, path);
        {
            let mut collections = self.db.tasks.lock().unwrap();
            collections.entry(path.clone()).or_default().push(task.clone());
        }
        self.db.notify(&path);
        Ok(task)
    }

    async fn set_completed(&self, scope: &TaskScope, task_id: &str, completed: bool) -> Result<()> {
        debug!("Setting completed={} on {} in {}", completed, task_id, scope);
        self.update_task(scope, task_id, |task| task.completed = completed)
    }

    async fn rename_task(&self, scope: &TaskScope, task_id: &str, title: &str) -> Result<()> {
        debug!("Renaming {} in {}", task_id, scope);
        self.update_task(scope, task_id, |task| task.title = title.to_string())
    }

    async fn delete_task(&self, scope: &TaskScope, task_id: &str) -> Result<bool> {
        let path = scope.collection_path();
        let removed = {
            let mut collections = self.db.tasks.lock().unwrap();
            match collections.get_mut(&path) {
                Some(tasks) => {
                    let before = tasks.len();
                    tasks.retain(|t| t.id != task_id);
                    tasks.len() < before
                }
                None => false,
            }
        };

        if removed {
            info!("Deleted task {} from {}", task_id, path);
            self.db.notify(&path);
        }
        Ok(removed)
    }

    async fn list_tasks(&self, scope: &TaskScope) -> Result<Vec<Task>> {
        Ok(self.db.snapshot_of(&scope.collection_path()))
    }

    fn subscribe(&self, scope: &TaskScope, on_snapshot: SnapshotCallback) -> TaskSubscription {
        let path = scope.collection_path();
        let id = self.db.register_listener(path, on_snapshot);

        // The listener is registered before the initial delivery, so a
        // write racing with subscribe produces a follow-up snapshot
        // rather than a silent gap.
        self.db.notify_listener(id);

        let db = self.db.clone();
        TaskSubscription::new(move || db.remove_listener(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryConnection;
    use crate::storage::traits::Connection;
    use shared::PeriodId;
    use std::sync::Mutex;

    fn day_scope(day: u32) -> TaskScope {
        TaskScope::new("u1", PeriodId::Day(day))
    }

    #[tokio::test]
    async fn create_assigns_id_and_timestamp() {
        let repo = MemoryConnection::new().create_task_repository();
        let task = repo
            .create_task(&day_scope(1), "Buy milk")
            .await
            .expect("Failed to create task");

        assert!(task.id.starts_with("task::"));
        assert!(!task.completed);
        assert!(!task.created_at.is_empty());
    }

    #[tokio::test]
    async fn listing_orders_newest_first() {
        let repo = MemoryConnection::new().create_task_repository();
        let scope = day_scope(1);
        repo.create_task(&scope, "first").await.expect("Failed to create task");
        repo.create_task(&scope, "second").await.expect("Failed to create task");
        repo.create_task(&scope, "third").await.expect("Failed to create task");

        let titles: Vec<String> = repo
            .list_tasks(&scope)
            .await
            .expect("Failed to list tasks")
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn updates_are_scoped_to_their_period() {
        let repo = MemoryConnection::new().create_task_repository();
        let task = repo
            .create_task(&day_scope(1), "Buy milk")
            .await
            .expect("Failed to create task");

        let err = repo
            .set_completed(&day_scope(2), &task.id, true)
            .await
            .expect_err("Update against the wrong period should fail");
        assert!(err.downcast_ref::<StoreError>().is_some());

        repo.set_completed(&day_scope(1), &task.id, true)
            .await
            .expect("Failed to toggle task");
        let tasks = repo.list_tasks(&day_scope(1)).await.expect("Failed to list tasks");
        assert!(tasks[0].completed);
    }

    #[tokio::test]
    async fn delete_reports_whether_task_existed() {
        let repo = MemoryConnection::new().create_task_repository();
        let scope = day_scope(1);
        let task = repo
            .create_task(&scope, "Buy milk")
            .await
            .expect("Failed to create task");

        assert!(repo.delete_task(&scope, &task.id).await.expect("Failed to delete"));
        assert!(!repo.delete_task(&scope, &task.id).await.expect("Failed to delete"));
    }

    #[tokio::test]
    async fn subscription_replays_initial_contents_then_every_write() {
        let repo = MemoryConnection::new().create_task_repository();
        let scope = day_scope(1);
        repo.create_task(&scope, "existing").await.expect("Failed to create task");

        let snapshots: Arc<Mutex<Vec<Vec<String>>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = snapshots.clone();
        let sub = repo.subscribe(
            &scope,
            Box::new(move |tasks| {
                sink.lock()
                    .unwrap()
                    .push(tasks.into_iter().map(|t| t.title).collect());
            }),
        );

        repo.create_task(&scope, "added").await.expect("Failed to create task");

        {
            let seen = snapshots.lock().unwrap();
            assert_eq!(seen.len(), 2);
            assert_eq!(seen[0], vec!["existing"]);
            assert_eq!(seen[1], vec!["added", "existing"]);
        }

        sub.unsubscribe();
        repo.create_task(&scope, "after cancel").await.expect("Failed to create task");
        assert_eq!(snapshots.lock().unwrap().len(), 2);
    }
}
