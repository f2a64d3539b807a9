//! Project records.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::milestone::Milestone;
use crate::types::{Hours, ProjectId, WeekdaySet};

/// How far past its start a continuous project is budgeted, in days.
pub const CONTINUOUS_HORIZON_DAYS: u64 = 365;

/// When a project ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProjectEnd {
    /// Fixed end date (inclusive).
    On { date: NaiveDate },
    /// No fixed end. The effective end is resolved against the query window,
    /// capped at [`CONTINUOUS_HORIZON_DAYS`] past the start.
    Continuous,
}

/// A plannable project.
///
/// Snapshots arrive from the host application's data store; the engine never
/// mutates them. The invariant `start <= end` for fixed-end projects is the
/// store's responsibility; an inverted range simply yields empty results
/// downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier.
    pub id: ProjectId,

    /// Display name.
    pub name: String,

    /// First day of the project.
    pub start: NaiveDate,

    /// End of the project, fixed or continuous.
    pub end: ProjectEnd,

    /// Total time budget.
    pub budget: Hours,

    /// Weekdays eligible for auto-estimation.
    #[serde(default)]
    pub auto_weekdays: WeekdaySet,

    /// Owning user, opaque to the engine.
    pub owner: String,
}

impl Project {
    /// Resolves the last day the engine should iterate to.
    ///
    /// Fixed-end projects use their own end date. Continuous projects use
    /// the query window's end, capped at the budgeting horizon past the
    /// start; their stored end date is never consulted for filtering.
    #[must_use]
    pub fn effective_end(&self, window_end: NaiveDate) -> NaiveDate {
        match self.end {
            ProjectEnd::On { date } => date,
            ProjectEnd::Continuous => {
                let horizon = self
                    .start
                    .checked_add_days(Days::new(CONTINUOUS_HORIZON_DAYS))
                    .unwrap_or(window_end);
                window_end.min(horizon)
            }
        }
    }

    /// Budget not claimed by milestone allocations, floored at zero.
    ///
    /// Shared by budget validation and the auto-estimate tier so the two
    /// cannot disagree about the remainder.
    #[must_use]
    pub fn remaining_budget(&self, milestones: &[Milestone]) -> Hours {
        let allocated: Hours = milestones
            .iter()
            .filter(|m| m.project == self.id)
            .map(|m| m.allocation)
            .sum();
        self.budget.saturating_sub(allocated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MilestoneId;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    fn project(end: ProjectEnd) -> Project {
        Project {
            id: ProjectId::new("p1").unwrap(),
            name: "Website".to_string(),
            start: date(2025, 1, 1),
            end,
            budget: Hours::clamped(100.0),
            auto_weekdays: WeekdaySet::ALL,
            owner: "user-1".to_string(),
        }
    }

    fn milestone(project: &ProjectId, allocation: f64) -> Milestone {
        Milestone {
            id: MilestoneId::new("m1").unwrap(),
            project: project.clone(),
            name: "Design".to_string(),
            allocation: Hours::clamped(allocation),
            due: date(2025, 2, 1),
            start: None,
            recurrence: None,
            position: 0,
        }
    }

    #[test]
    fn fixed_end_ignores_window() {
        let p = project(ProjectEnd::On {
            date: date(2025, 6, 30),
        });
        assert_eq!(p.effective_end(date(2025, 3, 1)), date(2025, 6, 30));
        assert_eq!(p.effective_end(date(2026, 3, 1)), date(2025, 6, 30));
    }

    #[test]
    fn continuous_end_tracks_window_up_to_horizon() {
        let p = project(ProjectEnd::Continuous);
        // Window inside the horizon: window end wins
        assert_eq!(p.effective_end(date(2025, 3, 1)), date(2025, 3, 1));
        // Window beyond the horizon: capped at start + 365 days
        assert_eq!(p.effective_end(date(2027, 1, 1)), date(2026, 1, 1));
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "exact budget arithmetic")]
    fn remaining_budget_floors_at_zero() {
        let p = project(ProjectEnd::Continuous);
        let ms = vec![milestone(&p.id, 60.0)];
        assert_eq!(p.remaining_budget(&ms).value(), 40.0);

        let over = vec![milestone(&p.id, 150.0)];
        assert_eq!(p.remaining_budget(&over).value(), 0.0);
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "exact budget arithmetic")]
    fn remaining_budget_ignores_other_projects() {
        let p = project(ProjectEnd::Continuous);
        let other = ProjectId::new("p2").unwrap();
        let ms = vec![milestone(&other, 60.0)];
        assert_eq!(p.remaining_budget(&ms).value(), 100.0);
    }
}
