//! Goal session: the owned, explicitly passed root object of the
//! engine.
//!
//! One `GoalSession` is created at app start and handed to each
//! consumer; it aggregates the cycle configuration, the owner identity,
//! and the cycle-wide goal record, and hands out per-consumer task and
//! goal stores. Nothing in the engine is process-global.

use anyhow::Result;
use chrono::NaiveDate;
use log::info;
use shared::{CycleConfig, CycleStatus, GoalRecord, GoalScope, NavSection};

use crate::domain::goal_service::GoalStore;
use crate::domain::navigation::navigation_sections;
use crate::domain::period::PeriodCalculator;
use crate::domain::task_service::TaskStore;
use crate::storage::{Connection, StoreError};

/// Owner identity for store paths.
///
/// The authentication flow itself is outside the engine; this only
/// carries its result. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    user_id: Option<String>,
}

impl AuthContext {
    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }

    pub fn signed_out() -> Self {
        Self { user_id: None }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// The signed-in user id, or `StoreError::Unauthenticated` before
    /// any remote call is attempted.
    pub fn require_user(&self) -> Result<String> {
        self.user_id
            .clone()
            .ok_or_else(|| StoreError::Unauthenticated.into())
    }
}

/// Application-wide session over one storage connection
pub struct GoalSession<C: Connection> {
    connection: C,
    config: CycleConfig,
    calculator: PeriodCalculator,
    auth: AuthContext,
    goal_store: GoalStore<C>,
}

impl<C: Connection> GoalSession<C> {
    /// Create a session for one (possibly signed-out) owner.
    pub fn new(connection: C, config: CycleConfig, auth: AuthContext) -> Self {
        info!(
            "Creating goal session ({} day cycle, user: {})",
            config.cycle_days,
            auth.user_id().unwrap_or("none")
        );
        let goal_store = GoalStore::new(&connection, auth.clone());
        Self {
            connection,
            config,
            calculator: PeriodCalculator::new(config),
            auth,
            goal_store,
        }
    }

    /// One-shot startup read of the cycle goal record.
    pub async fn startup(&self) -> Result<GoalRecord> {
        self.goal_store.load().await
    }

    pub fn config(&self) -> &CycleConfig {
        &self.config
    }

    pub fn calculator(&self) -> &PeriodCalculator {
        &self.calculator
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    /// Where "today" falls in the cycle.
    ///
    /// Before a start date is selected, and while the selected start
    /// date is still in the future, `current_day` is the 0 sentinel and
    /// nothing should be highlighted.
    pub fn status(&self, today: NaiveDate) -> CycleStatus {
        match self.goal_store.start_date() {
            Some(start) => {
                let raw = self.calculator.current_day(start, today);
                CycleStatus {
                    started: true,
                    current_day: raw.max(0) as u32,
                    start_date: Some(start.format("%Y-%m-%d").to_string()),
                    end_date: Some(self.calculator.end_date(start).format("%Y-%m-%d").to_string()),
                    cycle_days: self.config.cycle_days,
                }
            }
            None => CycleStatus {
                started: false,
                current_day: 0,
                start_date: None,
                end_date: None,
                cycle_days: self.config.cycle_days,
            },
        }
    }

    /// Select (or explicitly re-select) the cycle start date.
    pub async fn select_start_date(&self, date: NaiveDate) -> Result<()> {
        self.goal_store.save_start_date(date).await
    }

    /// Save the cycle-wide goal text.
    pub async fn save_goal_text(&self, text: &str) -> Result<()> {
        self.goal_store.save_goal_text(text).await
    }

    pub fn goal_record(&self) -> GoalRecord {
        self.goal_store.record()
    }

    /// Create a task store for one consumer. Each store owns its own
    /// subscription lifecycle.
    pub fn task_store(&self) -> TaskStore<C> {
        TaskStore::new(&self.connection, self.auth.clone())
    }

    /// Create a goal store for a monthly or weekly bucket.
    pub fn goal_store_for(&self, scope: GoalScope) -> GoalStore<C> {
        GoalStore::for_scope(&self.connection, self.auth.clone(), scope)
    }

    /// The declarative period list for the navigation surface.
    pub fn navigation(&self, today: NaiveDate) -> Vec<NavSection> {
        let current_day = self
            .goal_store
            .start_date()
            .map(|start| self.calculator.current_day(start, today))
            .unwrap_or(0);
        navigation_sections(&self.config, current_day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryConnection;
    use shared::PeriodId;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("Failed to build test date")
    }

    fn session() -> GoalSession<MemoryConnection> {
        GoalSession::new(
            MemoryConnection::new(),
            CycleConfig::default(),
            AuthContext::signed_in("u1"),
        )
    }

    #[tokio::test]
    async fn unstarted_session_reports_the_sentinel() {
        let session = session();
        session.startup().await.expect("Failed to start session");

        let status = session.status(date(2024, 1, 10));
        assert!(!status.started);
        assert_eq!(status.current_day, 0);
        assert!(status.end_date.is_none());
    }

    #[tokio::test]
    async fn status_tracks_the_selected_start_date() {
        let session = session();
        session.startup().await.expect("Failed to start session");
        session
            .select_start_date(date(2024, 1, 1))
            .await
            .expect("Failed to select start date");

        let status = session.status(date(2024, 1, 10));
        assert!(status.started);
        assert_eq!(status.current_day, 10);
        assert_eq!(status.start_date.as_deref(), Some("2024-01-01"));
        assert_eq!(status.end_date.as_deref(), Some("2024-03-24"));
    }

    #[tokio::test]
    async fn future_start_date_behaves_like_unstarted() {
        let session = session();
        session.startup().await.expect("Failed to start session");
        session
            .select_start_date(date(2024, 2, 1))
            .await
            .expect("Failed to select start date");

        let status = session.status(date(2024, 1, 10));
        assert!(status.started);
        assert_eq!(status.current_day, 0);

        let active: usize = session
            .navigation(date(2024, 1, 10))
            .iter()
            .flat_map(|s| s.entries.iter())
            .filter(|e| e.active)
            .count();
        assert_eq!(active, 0);
    }

    #[tokio::test]
    async fn goal_record_survives_a_session_restart() {
        let connection = MemoryConnection::new();
        {
            let session = GoalSession::new(
                connection.clone(),
                CycleConfig::default(),
                AuthContext::signed_in("u1"),
            );
            session.startup().await.expect("Failed to start session");
            session
                .select_start_date(date(2024, 1, 1))
                .await
                .expect("Failed to select start date");
            session
                .save_goal_text("Ship the project")
                .await
                .expect("Failed to save goal");
        }

        let session = GoalSession::new(
            connection,
            CycleConfig::default(),
            AuthContext::signed_in("u1"),
        );
        let record = session.startup().await.expect("Failed to start session");
        assert_eq!(record.start_date.as_deref(), Some("2024-01-01"));
        assert_eq!(record.goal_text, "Ship the project");
    }

    #[tokio::test]
    async fn session_hands_out_working_task_stores() {
        let session = session();
        session.startup().await.expect("Failed to start session");

        let store = session.task_store();
        store.attach(PeriodId::Day(3)).expect("Failed to attach store");
        store.set_input("Stretch for ten minutes");
        store.add().await.expect("Failed to add task");

        assert_eq!(store.view().tasks[0].title, "Stretch for ten minutes");
    }
}
