//! Declarative navigation model for the goal cycle.
//!
//! One parametrized list of period entries: three sections (months,
//! weeks, days) whose entries carry the `PeriodId` to navigate into
//! and whether "today" falls inside that period. Rendering, ordering
//! on screen, and navigation chrome stay with the surface.

use shared::{CycleConfig, NavEntry, NavSection, PeriodId, PeriodKind};

use crate::domain::period::PeriodCalculator;

/// Build the full navigation model for a cycle.
///
/// `current_day` below 1 (not started, or start date in the future)
/// yields no active entry anywhere.
pub fn navigation_sections(config: &CycleConfig, current_day: i64) -> Vec<NavSection> {
    let calc = PeriodCalculator::new(*config);

    let months = (1..=config.months())
        .map(|m| NavEntry {
            period: PeriodId::Month(m),
            active: calc.is_active_month(current_day, m),
        })
        .collect();

    let weeks = (1..=config.weeks())
        .map(|w| NavEntry {
            period: PeriodId::Week(w),
            active: calc.is_active_week(current_day, w),
        })
        .collect();

    let days = (1..=config.cycle_days)
        .map(|d| NavEntry {
            period: PeriodId::Day(d),
            active: current_day == d as i64,
        })
        .collect();

    vec![
        NavSection {
            kind: PeriodKind::Month,
            entries: months,
        },
        NavSection {
            kind: PeriodKind::Week,
            entries: weeks,
        },
        NavSection {
            kind: PeriodKind::Day,
            entries: days,
        },
    ]
}
