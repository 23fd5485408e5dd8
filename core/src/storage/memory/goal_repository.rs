//! # Memory Goal Repository
//!
//! Goal document storage over the shared in-memory document store.
//! Writes use merge semantics: fields absent from a patch keep whatever
//! the stored document already holds, so saving a goal text never
//! clobbers the start date and vice versa.

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, info};
use std::sync::Arc;

use crate::storage::traits::{GoalDoc, GoalPatch, GoalPath, GoalStorage};

use super::connection::MemoryDb;

/// In-memory goal repository
#[derive(Clone)]
pub struct MemoryGoalRepository {
    db: Arc<MemoryDb>,
}

impl MemoryGoalRepository {
    pub(super) fn new(db: Arc<MemoryDb>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl GoalStorage for MemoryGoalRepository {
    async fn get_goal(&self, path: &GoalPath) -> Result<Option<GoalDoc>> {
        let goals = self.db.goals.lock().unwrap();
        let doc = goals.get(&path.document_path()).cloned();
        debug!(
            "Fetched goal document {} (exists: {})",
            path,
            doc.is_some()
        );
        Ok(doc)
    }

    async fn upsert_goal(&self, path: &GoalPath, patch: GoalPatch) -> Result<()> {
        let mut goals = self.db.goals.lock().unwrap();
        let doc = goals.entry(path.document_path()).or_default();
        if let Some(start_date) = patch.start_date {
            doc.start_date = Some(start_date);
        }
        if let Some(goal) = patch.goal {
            doc.goal = Some(goal);
        }
        info!("Upserted goal document {}", path);
        Ok(())
    }
}
