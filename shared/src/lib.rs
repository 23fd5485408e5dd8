use serde::{Deserialize, Serialize};
use std::fmt;

/// Task ID in format: "task::<uuid>"
///
/// Tasks belong to exactly one period's collection. The `created_at`
/// timestamp is assigned by the store on creation and is the sole sort
/// key (descending) for every task listing and snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    /// Task title (non-empty after trimming)
    pub title: String,
    /// Whether the task has been checked off
    pub completed: bool,
    /// Store-assigned creation timestamp (RFC 3339)
    pub created_at: String,
}

/// The singleton goal document for a scope.
///
/// `start_date` is unset until the user picks one and only changes by
/// explicit re-selection. `goal_text` may be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalRecord {
    /// First day of the cycle (RFC 3339 date, e.g. "2024-01-01")
    pub start_date: Option<String>,
    /// Free-text goal for the scope
    pub goal_text: String,
}

/// Identifies one month, week, or day bucket within the goal cycle.
///
/// Derived from the start date and wall-clock "now"; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeriodId {
    /// Month 1..=3 (28-day months)
    Month(u32),
    /// Week 1..=12
    Week(u32),
    /// Day 1..=cycle length
    Day(u32),
}

impl PeriodId {
    /// The collection segment this period's tasks live under
    /// (e.g. "days" in `users/{uid}/days/{n}/tasks`).
    pub fn collection_segment(&self) -> &'static str {
        match self {
            PeriodId::Month(_) => "months",
            PeriodId::Week(_) => "weeks",
            PeriodId::Day(_) => "days",
        }
    }

    /// The 1-based index within the period kind.
    pub fn index(&self) -> u32 {
        match self {
            PeriodId::Month(n) | PeriodId::Week(n) | PeriodId::Day(n) => *n,
        }
    }

    pub fn kind(&self) -> PeriodKind {
        match self {
            PeriodId::Month(_) => PeriodKind::Month,
            PeriodId::Week(_) => PeriodKind::Week,
            PeriodId::Day(_) => PeriodKind::Day,
        }
    }
}

impl fmt::Display for PeriodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodId::Month(n) => write!(f, "month-{}", n),
            PeriodId::Week(n) => write!(f, "week-{}", n),
            PeriodId::Day(n) => write!(f, "day-{}", n),
        }
    }
}

/// The three period granularities of the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodKind {
    Month,
    Week,
    Day,
}

/// Keys the goal document for a scope.
///
/// The cycle scope holds the long-lived goal record (start date + goal
/// text); month and week scopes hold one free-text goal each, with
/// lifecycles independent of the cycle record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GoalScope {
    /// The whole cycle ("Goal/goal")
    Cycle,
    /// One month bucket ("monthlyGoals/month-{n}")
    Month(u32),
    /// One week bucket ("weeklyGoals/week-{n}")
    Week(u32),
}

impl GoalScope {
    /// Collection/document key pair for this scope's goal record.
    pub fn document_key(&self) -> (String, String) {
        match self {
            GoalScope::Cycle => ("Goal".to_string(), "goal".to_string()),
            GoalScope::Month(n) => ("monthlyGoals".to_string(), format!("month-{}", n)),
            GoalScope::Week(n) => ("weeklyGoals".to_string(), format!("week-{}", n)),
        }
    }
}

impl fmt::Display for GoalScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (collection, doc) = self.document_key();
        write!(f, "{}/{}", collection, doc)
    }
}

/// Shape of the goal cycle: how long it runs and how it buckets into
/// weeks and months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleConfig {
    /// Total cycle length in days
    pub cycle_days: u32,
    /// Days per week bucket
    pub days_per_week: u32,
    /// Days per month bucket
    pub days_per_month: u32,
}

impl CycleConfig {
    /// Number of week buckets in the cycle (rounded up).
    pub fn weeks(&self) -> u32 {
        self.cycle_days.div_ceil(self.days_per_week)
    }

    /// Number of complete month buckets in the cycle.
    ///
    /// Days past the last complete month (days 85-90 of a 90-day cycle)
    /// belong to no month bucket.
    pub fn months(&self) -> u32 {
        self.cycle_days / self.days_per_month
    }
}

impl Default for CycleConfig {
    fn default() -> Self {
        // 84 days = 12 weeks = 3 four-week months, so weeks and months
        // partition the cycle exactly.
        Self {
            cycle_days: 84,
            days_per_week: 7,
            days_per_month: 28,
        }
    }
}

/// Where "today" falls in the cycle, for the navigation surface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleStatus {
    /// False until a start date has been selected
    pub started: bool,
    /// 1-based day within the cycle; 0 when not started or the start
    /// date is still in the future
    pub current_day: u32,
    /// Selected start date (RFC 3339 date)
    pub start_date: Option<String>,
    /// Last day of the cycle (RFC 3339 date)
    pub end_date: Option<String>,
    /// Cycle length in days
    pub cycle_days: u32,
}

/// One selectable period in the navigation surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavEntry {
    pub period: PeriodId,
    /// Whether "today" falls inside this period
    pub active: bool,
}

/// One group of navigation entries (all months, all weeks, or all days).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavSection {
    pub kind: PeriodKind,
    pub entries: Vec<NavEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_display_matches_document_keys() {
        assert_eq!(PeriodId::Month(2).to_string(), "month-2");
        assert_eq!(PeriodId::Week(12).to_string(), "week-12");
        assert_eq!(PeriodId::Day(84).to_string(), "day-84");
        assert_eq!(PeriodId::Day(84).collection_segment(), "days");
    }

    #[test]
    fn goal_scope_paths() {
        assert_eq!(GoalScope::Cycle.to_string(), "Goal/goal");
        assert_eq!(GoalScope::Month(3).to_string(), "monthlyGoals/month-3");
        assert_eq!(GoalScope::Week(7).to_string(), "weeklyGoals/week-7");
    }

    #[test]
    fn default_cycle_partitions_exactly() {
        let config = CycleConfig::default();
        assert_eq!(config.cycle_days, 84);
        assert_eq!(config.weeks(), 12);
        assert_eq!(config.months(), 3);
    }

    #[test]
    fn ninety_day_cycle_has_unmapped_tail() {
        let config = CycleConfig {
            cycle_days: 90,
            ..CycleConfig::default()
        };
        assert_eq!(config.weeks(), 13);
        // Days 85-90 fall past the last complete month.
        assert_eq!(config.months(), 3);
    }

    #[test]
    fn task_round_trips_through_json() {
        let task = Task {
            id: "task::abc".to_string(),
            title: "Buy milk".to_string(),
            completed: false,
            created_at: "2024-01-10T08:30:00Z".to_string(),
        };
        let json = serde_json::to_string(&task).expect("Failed to serialize task");
        let back: Task = serde_json::from_str(&json).expect("Failed to deserialize task");
        assert_eq!(back, task);
    }
}
