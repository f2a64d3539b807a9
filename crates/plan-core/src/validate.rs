//! Milestone budget validation.
//!
//! Budget overage is not an error: it is surfaced as a structured result
//! for the host to display, and calculation proceeds regardless.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::milestone::Milestone;
use crate::project::Project;
use crate::types::Hours;

/// Result of checking milestone allocations against a project's budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetCheck {
    /// False when allocations exceed the budget or non-recurring milestones
    /// share a due date.
    pub is_valid: bool,

    /// Sum of all milestone allocations.
    pub total_allocated: Hours,

    /// Budget not claimed by milestones, floored at zero.
    pub remaining: Hours,

    /// Hours by which allocations exceed the budget; zero when within it.
    pub overage: Hours,

    /// Due dates shared by more than one non-recurring milestone. A soft
    /// constraint: reported, never corrected.
    pub duplicate_due_dates: Vec<NaiveDate>,
}

/// Checks the project's milestones against its time budget.
///
/// Only milestones belonging to the project are considered. Recurring
/// milestones contribute their per-occurrence allocation once; the host
/// decides how to present recurring budgets.
#[must_use]
pub fn check_budget(project: &Project, milestones: &[Milestone]) -> BudgetCheck {
    let owned: Vec<&Milestone> = milestones
        .iter()
        .filter(|m| m.project == project.id)
        .collect();

    let total_allocated: Hours = owned.iter().map(|m| m.allocation).sum();
    let remaining = project.budget.saturating_sub(total_allocated);
    let overage = total_allocated.saturating_sub(project.budget);

    let mut due_counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for m in owned.iter().filter(|m| m.recurrence.is_none()) {
        *due_counts.entry(m.due).or_insert(0) += 1;
    }
    let duplicate_due_dates: Vec<NaiveDate> = due_counts
        .into_iter()
        .filter(|&(_, count)| count > 1)
        .map(|(date, _)| date)
        .collect();

    BudgetCheck {
        is_valid: overage == Hours::ZERO && duplicate_due_dates.is_empty(),
        total_allocated,
        remaining,
        overage,
        duplicate_due_dates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::ProjectEnd;
    use crate::types::{MilestoneId, ProjectId, WeekdaySet};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    fn project(budget: f64) -> Project {
        Project {
            id: ProjectId::new("p1").unwrap(),
            name: "Website".to_string(),
            start: date(2025, 1, 1),
            end: ProjectEnd::On {
                date: date(2025, 6, 30),
            },
            budget: Hours::clamped(budget),
            auto_weekdays: WeekdaySet::ALL,
            owner: "user-1".to_string(),
        }
    }

    fn milestone(id: &str, due: NaiveDate, allocation: f64) -> Milestone {
        Milestone {
            id: MilestoneId::new(id).unwrap(),
            project: ProjectId::new("p1").unwrap(),
            name: id.to_string(),
            allocation: Hours::clamped(allocation),
            due,
            start: None,
            recurrence: None,
            position: 0,
        }
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "exact budget arithmetic")]
    fn within_budget_is_valid() {
        let p = project(100.0);
        let ms = vec![
            milestone("m1", date(2025, 2, 1), 30.0),
            milestone("m2", date(2025, 3, 1), 40.0),
        ];

        let check = check_budget(&p, &ms);
        assert!(check.is_valid);
        assert_eq!(check.total_allocated.value(), 70.0);
        assert_eq!(check.remaining.value(), 30.0);
        assert_eq!(check.overage.value(), 0.0);
        assert!(check.duplicate_due_dates.is_empty());
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "exact budget arithmetic")]
    fn overage_reported_not_corrected() {
        let p = project(50.0);
        let ms = vec![
            milestone("m1", date(2025, 2, 1), 30.0),
            milestone("m2", date(2025, 3, 1), 40.0),
        ];

        let check = check_budget(&p, &ms);
        assert!(!check.is_valid);
        assert_eq!(check.total_allocated.value(), 70.0);
        assert_eq!(check.remaining.value(), 0.0);
        assert_eq!(check.overage.value(), 20.0);
    }

    #[test]
    fn duplicate_due_dates_flagged() {
        let p = project(100.0);
        let ms = vec![
            milestone("m1", date(2025, 2, 1), 10.0),
            milestone("m2", date(2025, 2, 1), 10.0),
            milestone("m3", date(2025, 3, 1), 10.0),
        ];

        let check = check_budget(&p, &ms);
        assert!(!check.is_valid);
        assert_eq!(check.duplicate_due_dates, vec![date(2025, 2, 1)]);
    }

    #[test]
    fn other_projects_milestones_ignored() {
        let p = project(10.0);
        let mut foreign = milestone("m1", date(2025, 2, 1), 500.0);
        foreign.project = ProjectId::new("p2").unwrap();

        let check = check_budget(&p, &[foreign]);
        assert!(check.is_valid);
        assert_eq!(check.total_allocated, Hours::ZERO);
    }

    #[test]
    fn no_milestones_is_trivially_valid() {
        let check = check_budget(&project(40.0), &[]);
        assert!(check.is_valid);
        assert_eq!(check.remaining, Hours::clamped(40.0));
    }
}
