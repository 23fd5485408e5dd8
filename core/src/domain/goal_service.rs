//! Goal record store for the goal cycle.
//!
//! One store per goal document: the cycle-wide record (start date +
//! goal text) or a monthly/weekly goal. Reads are one-shot (there is
//! no subscription on goal documents) and writes use merge semantics
//! so saving one field never clobbers the other. A saved value updates
//! the local cache immediately; this path has a single writer per
//! record in practice, so the optimistic cache cannot diverge.

use anyhow::Result;
use chrono::NaiveDate;
use log::{debug, info};
use shared::{GoalRecord, GoalScope};
use std::sync::Mutex;

use crate::domain::session::AuthContext;
use crate::storage::{Connection, GoalPatch, GoalPath, GoalStorage};

/// Maximum accepted goal text length.
const MAX_GOAL_LEN: usize = 256;

/// Service for loading and saving one scope's goal record
pub struct GoalStore<C: Connection> {
    repository: C::GoalRepository,
    auth: AuthContext,
    scope: GoalScope,
    record: Mutex<GoalRecord>,
}

impl<C: Connection> GoalStore<C> {
    /// Create a store for the cycle-wide goal record.
    pub fn new(connection: &C, auth: AuthContext) -> Self {
        Self::for_scope(connection, auth, GoalScope::Cycle)
    }

    /// Create a store for a monthly or weekly goal record.
    pub fn for_scope(connection: &C, auth: AuthContext, scope: GoalScope) -> Self {
        Self {
            repository: connection.create_goal_repository(),
            auth,
            scope,
            record: Mutex::new(GoalRecord::default()),
        }
    }

    pub fn scope(&self) -> GoalScope {
        self.scope
    }

    /// Fetch the goal document once and cache it.
    ///
    /// A missing document is the empty default state, not an error.
    pub async fn load(&self) -> Result<GoalRecord> {
        let path = self.path()?;
        let record = match self.repository.get_goal(&path).await? {
            Some(doc) => GoalRecord {
                start_date: doc.start_date,
                goal_text: doc.goal.unwrap_or_default(),
            },
            None => {
                info!("No goal document at {}, starting from defaults", path);
                GoalRecord::default()
            }
        };
        *self.record.lock().unwrap() = record.clone();
        Ok(record)
    }

    /// Save the goal text. Empty or whitespace-only text is a silent
    /// no-op; otherwise the text is merge-written, leaving the start
    /// date untouched.
    pub async fn save_goal_text(&self, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            debug!("Ignoring goal save with empty text");
            return Ok(());
        }
        if text.len() > MAX_GOAL_LEN {
            return Err(anyhow::anyhow!(
                "Goal text cannot exceed {} characters",
                MAX_GOAL_LEN
            ));
        }

        let path = self.path()?;
        self.repository
            .upsert_goal(
                &path,
                GoalPatch {
                    start_date: None,
                    goal: Some(text.to_string()),
                },
            )
            .await?;

        info!("Saved goal text for {}", path);
        self.record.lock().unwrap().goal_text = text.to_string();
        Ok(())
    }

    /// Record the selected start date (explicit re-selection included),
    /// merge-written so the goal text is preserved.
    pub async fn save_start_date(&self, date: NaiveDate) -> Result<()> {
        let path = self.path()?;
        let formatted = date.format("%Y-%m-%d").to_string();
        self.repository
            .upsert_goal(
                &path,
                GoalPatch {
                    start_date: Some(formatted.clone()),
                    goal: None,
                },
            )
            .await?;

        info!("Saved start date {} for {}", formatted, path);
        self.record.lock().unwrap().start_date = Some(formatted);
        Ok(())
    }

    /// Last loaded/saved state of the record.
    pub fn record(&self) -> GoalRecord {
        self.record.lock().unwrap().clone()
    }

    /// Cached start date, parsed; `None` when unset or unparseable.
    pub fn start_date(&self) -> Option<NaiveDate> {
        let record = self.record.lock().unwrap();
        record
            .start_date
            .as_deref()
            .and_then(|raw| raw.parse::<NaiveDate>().ok())
    }

    fn path(&self) -> Result<GoalPath> {
        let user_id = self.auth.require_user()?;
        Ok(GoalPath::new(user_id, self.scope))
    }
}
