//! Period calculation logic for the goal cycle.
//!
//! This module maps elapsed wall-clock days onto the cycle's month,
//! week, and day buckets. Everything here is pure arithmetic over
//! `(start_date, today)` pairs; no I/O, no stored state, and no failure
//! paths. Out-of-range inputs answer with `None` or `false` rather
//! than errors, so callers can feed raw values straight through.
//!
//! ## Bucket arithmetic
//!
//! - day `d` belongs to week `ceil(d / 7)` and month `ceil(d / 28)`
//! - week `w` covers days `(w-1)*7 + 1 ..= w*7`
//! - month `m` covers weeks `(m-1)*4 + 1 ..= m*4`
//!
//! With the default 84-day cycle, weeks and months partition the cycle
//! exactly. A 90-day cycle leaves days 85-90 outside any month bucket;
//! those days report no month rather than a fourth, partial one.

use chrono::{Duration, NaiveDate};
use shared::CycleConfig;
use std::ops::RangeInclusive;

/// Pure period math over one cycle configuration.
#[derive(Debug, Clone, Copy)]
pub struct PeriodCalculator {
    config: CycleConfig,
}

impl PeriodCalculator {
    pub fn new(config: CycleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CycleConfig {
        &self.config
    }

    /// 1-based day of the cycle for `today`, clamped at the cycle
    /// length once the cycle has run out.
    ///
    /// A `today` before `start` yields a non-positive number; callers
    /// treat any day below 1 the same as "not started".
    pub fn current_day(&self, start: NaiveDate, today: NaiveDate) -> i64 {
        let elapsed = (today - start).num_days() + 1;
        elapsed.min(self.config.cycle_days as i64)
    }

    /// Last day of the cycle.
    pub fn end_date(&self, start: NaiveDate) -> NaiveDate {
        start + Duration::days(self.config.cycle_days as i64 - 1)
    }

    /// Week bucket containing `day`, or `None` outside the cycle.
    pub fn week_of_day(&self, day: i64) -> Option<u32> {
        if day < 1 || day > self.config.cycle_days as i64 {
            return None;
        }
        Some((day as u32).div_ceil(self.config.days_per_week))
    }

    /// Month bucket containing `day`, or `None` outside the complete
    /// months of the cycle (days 85-90 of a 90-day cycle have none).
    pub fn month_of_day(&self, day: i64) -> Option<u32> {
        let last_mapped_day = (self.config.months() * self.config.days_per_month) as i64;
        if day < 1 || day > last_mapped_day {
            return None;
        }
        Some((day as u32).div_ceil(self.config.days_per_month))
    }

    /// Whether `day` falls inside week `week`.
    pub fn is_active_week(&self, day: i64, week: u32) -> bool {
        if week < 1 || week > self.config.weeks() {
            return false;
        }
        let first = ((week - 1) * self.config.days_per_week) as i64;
        let last = (week * self.config.days_per_week) as i64;
        first < day && day <= last
    }

    /// Whether `day` falls inside month `month`.
    pub fn is_active_month(&self, day: i64, month: u32) -> bool {
        if month < 1 || month > self.config.months() {
            return false;
        }
        let first = ((month - 1) * self.config.days_per_month) as i64;
        let last = (month * self.config.days_per_month) as i64;
        first < day && day <= last
    }

    /// The day numbers shown under week `week` (week 2 → 8..=14).
    pub fn days_of_week(&self, week: u32) -> RangeInclusive<u32> {
        let first = (week - 1) * self.config.days_per_week + 1;
        let last = (week * self.config.days_per_week).min(self.config.cycle_days);
        first..=last
    }

    /// The week numbers shown under month `month` (month 2 → 5..=8).
    pub fn weeks_of_month(&self, month: u32) -> RangeInclusive<u32> {
        let weeks_per_month = self.config.days_per_month / self.config.days_per_week;
        let first = (month - 1) * weeks_per_month + 1;
        let last = (month * weeks_per_month).min(self.config.weeks());
        first..=last
    }
}

impl Default for PeriodCalculator {
    fn default() -> Self {
        Self::new(CycleConfig::default())
    }
}
