//! Task synchronization store for the goal cycle.
//!
//! One `TaskStore` instance serves one consumer (a period view). It
//! owns at most one live subscription to the remote task collection of
//! the attached period, mirrors every delivered snapshot into local
//! state, and issues writes that converge through the next snapshot.
//! The store never mutates its task list optimistically, so a failed
//! write can never leave the displayed list out of step with the
//! remote collection.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle --attach--> Loading --first snapshot--> Synced --snapshot--> Synced
//!   ^                                            |
//!   +----------- detach / re-attach -------------+
//! ```
//!
//! Re-attaching cancels the previous subscription before the new one is
//! established, and an attach generation counter discards snapshots
//! from superseded subscriptions that are already in flight: a late
//! delivery for an old period must never land in a store now bound to a
//! new one.

use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use shared::{PeriodId, Task};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::domain::session::AuthContext;
use crate::storage::{Connection, TaskScope, TaskStorage, TaskSubscription};

/// Maximum accepted task title length, matching the goal text limit.
const MAX_TITLE_LEN: usize = 256;

/// Subscription lifecycle state of a task store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// No subscription
    Idle,
    /// Subscription requested, no snapshot received yet
    Loading,
    /// Latest snapshot applied
    Synced,
}

/// Store state shared with the snapshot listener.
struct TaskListState {
    phase: SyncPhase,
    period: Option<PeriodId>,
    tasks: Vec<Task>,
    /// Draft title for the add field
    input: String,
    /// At most one task is editable at a time
    editing_task_id: Option<String>,
    editing_text: String,
}

impl TaskListState {
    fn new() -> Self {
        Self {
            phase: SyncPhase::Idle,
            period: None,
            tasks: Vec::new(),
            input: String::new(),
            editing_task_id: None,
            editing_text: String::new(),
        }
    }

    fn clear_edit_session(&mut self) {
        self.editing_task_id = None;
        self.editing_text.clear();
    }
}

/// Read-only view of the store for the navigation surface.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskListView {
    pub phase: SyncPhase,
    pub period: Option<PeriodId>,
    /// Tasks in snapshot order (`created_at` descending)
    pub tasks: Vec<Task>,
    pub editing_task_id: Option<String>,
    /// Percentage of tasks completed, 0 for an empty list
    pub completion_rate: u8,
}

/// Service for keeping one period's task list in sync with the remote
/// collection
pub struct TaskStore<C: Connection> {
    repository: C::TaskRepository,
    auth: AuthContext,
    state: Arc<Mutex<TaskListState>>,
    subscription: Mutex<Option<TaskSubscription>>,
    /// Bumped on every attach/detach; snapshot listeners carry the
    /// value current at subscribe time and drop deliveries once it
    /// moves on
    generation: Arc<AtomicU64>,
}

impl<C: Connection> TaskStore<C> {
    /// Create a new TaskStore over the given connection.
    pub fn new(connection: &C, auth: AuthContext) -> Self {
        Self {
            repository: connection.create_task_repository(),
            auth,
            state: Arc::new(Mutex::new(TaskListState::new())),
            subscription: Mutex::new(None),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Bind the store to a period and start its subscription.
    ///
    /// Any previous subscription is cancelled first; there is never
    /// more than one live subscription per store instance.
    pub fn attach(&self, period: PeriodId) -> Result<()> {
        let user_id = self.auth.require_user()?;

        // Invalidate in-flight deliveries before touching anything else.
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.cancel_subscription();

        {
            let mut state = self.state.lock().unwrap();
            state.phase = SyncPhase::Loading;
            state.period = Some(period);
            state.tasks.clear();
            state.clear_edit_session();
        }

        info!("Attaching task store to {}", period);
        let scope = TaskScope::new(user_id, period);
        let shared_state = self.state.clone();
        let latest = self.generation.clone();
        let subscription = self.repository.subscribe(
            &scope,
            Box::new(move |tasks| {
                if latest.load(Ordering::SeqCst) != generation {
                    debug!("Discarding snapshot from a superseded subscription");
                    return;
                }
                let mut state = shared_state.lock().unwrap();
                state.tasks = tasks;
                state.phase = SyncPhase::Synced;
            }),
        );
        *self.subscription.lock().unwrap() = Some(subscription);
        Ok(())
    }

    /// Tear down the subscription and return to `Idle`.
    pub fn detach(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cancel_subscription();

        let mut state = self.state.lock().unwrap();
        if state.period.take().is_some() {
            info!("Detached task store");
        }
        state.phase = SyncPhase::Idle;
        state.tasks.clear();
        state.clear_edit_session();
    }

    fn cancel_subscription(&self) {
        if let Some(subscription) = self.subscription.lock().unwrap().take() {
            subscription.unsubscribe();
        }
    }

    /// Create a task from the input buffer.
    ///
    /// A blank buffer is a silent no-op. On success the buffer is
    /// cleared; the new task shows up once the subscription replays it,
    /// keeping the remote collection the single source of ordering and
    /// id assignment.
    pub async fn add(&self) -> Result<()> {
        let (scope, title) = {
            let state = self.state.lock().unwrap();
            let title = state.input.trim().to_string();
            if title.is_empty() {
                debug!("Ignoring add with empty title");
                return Ok(());
            }
            (self.current_scope(&state)?, title)
        };
        if title.len() > MAX_TITLE_LEN {
            return Err(anyhow!("Task title cannot exceed {} characters", MAX_TITLE_LEN));
        }

        self.repository.create_task(&scope, &title).await?;
        self.state.lock().unwrap().input.clear();
        Ok(())
    }

    /// Flip a task's completed flag via a partial update.
    ///
    /// No optimistic flip: the visible state changes when the snapshot
    /// carrying the update arrives.
    pub async fn toggle_completion(&self, task_id: &str) -> Result<()> {
        let (scope, completed) = {
            let state = self.state.lock().unwrap();
            let task = state
                .tasks
                .iter()
                .find(|t| t.id == task_id)
                .ok_or_else(|| anyhow!("Task {} is not in the current snapshot", task_id))?;
            (self.current_scope(&state)?, task.completed)
        };
        self.repository.set_completed(&scope, task_id, !completed).await
    }

    /// Open an edit session for a task, seeding the edit buffer with
    /// its current title.
    pub fn start_edit(&self, task_id: &str) {
        let mut state = self.state.lock().unwrap();
        match state.tasks.iter().find(|t| t.id == task_id) {
            Some(task) => {
                let title = task.title.clone();
                state.editing_task_id = Some(task_id.to_string());
                state.editing_text = title;
            }
            None => warn!("Ignoring edit request for unknown task {}", task_id),
        }
    }

    /// Replace the edit buffer contents.
    pub fn set_editing_text(&self, text: impl Into<String>) {
        self.state.lock().unwrap().editing_text = text.into();
    }

    /// Commit the open edit session.
    ///
    /// With no session open this is a no-op. A blank edit buffer is a
    /// no-op that leaves the session open; otherwise the title is
    /// written and the session closed.
    pub async fn commit_edit(&self) -> Result<()> {
        let (scope, task_id, title) = {
            let state = self.state.lock().unwrap();
            let Some(task_id) = state.editing_task_id.clone() else {
                return Ok(());
            };
            let title = state.editing_text.trim().to_string();
            if title.is_empty() {
                debug!("Ignoring edit commit with empty title");
                return Ok(());
            }
            (self.current_scope(&state)?, task_id, title)
        };
        if title.len() > MAX_TITLE_LEN {
            return Err(anyhow!("Task title cannot exceed {} characters", MAX_TITLE_LEN));
        }

        self.repository.rename_task(&scope, &task_id, &title).await?;
        self.state.lock().unwrap().clear_edit_session();
        Ok(())
    }

    /// Delete a task. Deleting a task that is already gone is not an
    /// error.
    pub async fn remove(&self, task_id: &str) -> Result<()> {
        let scope = {
            let state = self.state.lock().unwrap();
            self.current_scope(&state)?
        };
        let removed = self.repository.delete_task(&scope, task_id).await?;
        if !removed {
            warn!("Task {} was already deleted remotely", task_id);
        }
        Ok(())
    }

    /// Percentage of tasks completed in the current snapshot.
    pub fn completion_rate(&self) -> u8 {
        completion_rate_of(&self.state.lock().unwrap().tasks)
    }

    pub fn phase(&self) -> SyncPhase {
        self.state.lock().unwrap().phase
    }

    pub fn set_input(&self, text: impl Into<String>) {
        self.state.lock().unwrap().input = text.into();
    }

    pub fn input(&self) -> String {
        self.state.lock().unwrap().input.clone()
    }

    pub fn is_editing(&self) -> bool {
        self.state.lock().unwrap().editing_task_id.is_some()
    }

    /// Snapshot of the store for rendering.
    pub fn view(&self) -> TaskListView {
        let state = self.state.lock().unwrap();
        TaskListView {
            phase: state.phase,
            period: state.period,
            tasks: state.tasks.clone(),
            editing_task_id: state.editing_task_id.clone(),
            completion_rate: completion_rate_of(&state.tasks),
        }
    }

    fn current_scope(&self, state: &TaskListState) -> Result<TaskScope> {
        let user_id = self.auth.require_user()?;
        let period = state
            .period
            .ok_or_else(|| anyhow!("No period attached; navigate into a period first"))?;
        Ok(TaskScope::new(user_id, period))
    }
}

impl<C: Connection> Drop for TaskStore<C> {
    fn drop(&mut self) {
        // Dropping the retained handle cancels the subscription.
        self.subscription.lock().unwrap().take();
    }
}

/// `round(100 * completed / total)`, 0 for an empty list.
fn completion_rate_of(tasks: &[Task]) -> u8 {
    if tasks.is_empty() {
        return 0;
    }
    let completed = tasks.iter().filter(|t| t.completed).count();
    ((completed as f64 / tasks.len() as f64) * 100.0).round() as u8
}
