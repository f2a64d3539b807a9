//! Day estimate calculation.
//!
//! For one project and its snapshot inputs, produces one estimate per
//! calendar day in the query window, applying a strict priority order:
//!
//! 1. Planned/completed event time. Checked before any working-day filter:
//!    manually scheduled or tracked time is a deliberate user action and is
//!    always visible, even on holidays, weekends, or excluded weekdays.
//! 2. Milestone allocation, on working days inside an owned segment.
//! 3. Project auto-estimate: budget unclaimed by milestones, spread over
//!    eligible unowned working days that pass the project's weekday flags.
//!
//! Working-day filtering applies only to tiers 2 and 3.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::{days_between, is_working_day, spread_evenly};
use crate::event::{CalendarEvent, expand_events};
use crate::holiday::Holiday;
use crate::milestone::Milestone;
use crate::pattern::WorkPattern;
use crate::project::Project;
use crate::segment::segment;
use crate::types::{Hours, MilestoneId, ProjectId};

/// Where a day's hours came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EstimateSource {
    /// Summed from planned or completed calendar events.
    Event,
    /// An owned segment's per-day milestone allocation.
    Milestone { milestone: MilestoneId },
    /// Even distribution of budget unclaimed by milestones.
    Auto,
}

/// Hours attributed to one calendar day for one project.
///
/// Estimates are ephemeral: recomputed on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayEstimate {
    /// The calendar day.
    pub date: NaiveDate,
    /// The project the hours belong to.
    pub project: ProjectId,
    /// Hours attributed to this day.
    pub hours: Hours,
    /// Where the hours came from.
    pub source: EstimateSource,
    /// Whether the day is a working day under the resolved pattern. Event
    /// hours can land on non-working days; this flag lets the host render
    /// that distinction.
    pub working_day: bool,
}

/// Computes day estimates for `[window_start, window_end]`.
///
/// Only days with nonzero attributed hours produce an entry. Output is
/// sorted by date and is a pure function of the inputs: identical snapshots
/// give identical results. An inverted window returns nothing.
///
/// Continuous projects are bounded by [`Project::effective_end`]; their
/// stored end date is never used to filter otherwise-valid estimates.
#[must_use]
pub fn calculate(
    project: &Project,
    milestones: &[Milestone],
    events: &[CalendarEvent],
    pattern: &WorkPattern,
    holidays: &[Holiday],
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Vec<DayEstimate> {
    if window_end < window_start {
        return Vec::new();
    }

    let effective_end = project.effective_end(window_end);
    let project_milestones: Vec<Milestone> = milestones
        .iter()
        .filter(|m| m.project == project.id)
        .cloned()
        .collect();

    // Expand events across the union of the window and the project range so
    // event-bearing days are known project-wide (the auto-estimate divisor
    // depends on them), then bucket hours per day.
    let expand_start = window_start.min(project.start);
    let expand_end = window_end.max(effective_end);
    let mut event_hours: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for occurrence in expand_events(events, expand_start, expand_end) {
        if occurrence.project.as_ref() != Some(&project.id) {
            continue;
        }
        for date in days_between(occurrence.start.date(), occurrence.end.date()) {
            let hours = occurrence.hours_on(date);
            if hours > 0.0 {
                *event_hours.entry(date).or_insert(0.0) += hours;
            }
        }
    }

    // Tier 2: per-day milestone hours from owned segments.
    let segments = segment(project.start, effective_end, &project_milestones);
    let mut milestone_hours: BTreeMap<NaiveDate, (MilestoneId, f64)> = BTreeMap::new();
    for seg in &segments {
        let Some(owner) = &seg.milestone else {
            continue;
        };
        for (date, hours) in seg.daily_hours(pattern, holidays) {
            if hours > 0.0 {
                milestone_hours.insert(date, (owner.clone(), hours));
            }
        }
    }

    // Tier 3: unclaimed budget over eligible unowned working days.
    let remaining = project.remaining_budget(&project_milestones);
    let auto_days: Vec<NaiveDate> = segments
        .iter()
        .filter(|s| s.milestone.is_none())
        .flat_map(|s| days_between(s.start, s.end))
        .filter(|&d| {
            is_working_day(d, pattern, holidays)
                && project.auto_weekdays.contains(chrono::Datelike::weekday(&d))
                && !event_hours.contains_key(&d)
        })
        .collect();
    let auto_hours: BTreeMap<NaiveDate, f64> = auto_days
        .iter()
        .copied()
        .zip(spread_evenly(remaining.value(), auto_days.len()))
        .collect();

    let mut estimates = Vec::new();
    for date in days_between(window_start, window_end) {
        let working_day = is_working_day(date, pattern, holidays);

        if let Some(&hours) = event_hours.get(&date) {
            estimates.push(DayEstimate {
                date,
                project: project.id.clone(),
                hours: Hours::clamped(hours),
                source: EstimateSource::Event,
                working_day,
            });
            continue;
        }
        if let Some((milestone, hours)) = milestone_hours.get(&date) {
            estimates.push(DayEstimate {
                date,
                project: project.id.clone(),
                hours: Hours::clamped(*hours),
                source: EstimateSource::Milestone {
                    milestone: milestone.clone(),
                },
                working_day,
            });
            continue;
        }
        if let Some(&hours) = auto_hours.get(&date) {
            if hours > 0.0 {
                estimates.push(DayEstimate {
                    date,
                    project: project.id.clone(),
                    hours: Hours::clamped(hours),
                    source: EstimateSource::Auto,
                    working_day,
                });
            }
        }
    }

    tracing::debug!(
        project = %project.id,
        window_start = %window_start,
        window_end = %window_end,
        estimates = estimates.len(),
        "calculated day estimates"
    );
    estimates
}
