//! Milestone segmentation.
//!
//! Partitions a project's date range into contiguous, non-overlapping
//! segments, each owned by exactly one milestone or by nobody (unallocated
//! project budget). Segment ranges are inclusive of the owning milestone's
//! due date; the next segment starts the day after. That one convention is
//! applied everywhere, including working-day divisors.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::calendar::{spread_evenly, working_days_between};
use crate::holiday::Holiday;
use crate::milestone::Milestone;
use crate::pattern::WorkPattern;
use crate::recurrence::{MAX_OCCURRENCES, expand};
use crate::types::{Hours, MilestoneId};

/// A contiguous date range owned by one milestone (or by none).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// First day of the segment (inclusive).
    pub start: NaiveDate,

    /// Last day of the segment (inclusive). For owned segments this is the
    /// milestone's due date.
    pub end: NaiveDate,

    /// Owning milestone, or `None` for unallocated project range.
    pub milestone: Option<MilestoneId>,

    /// Hours to spread over this segment's working days. Zero for unowned
    /// segments (those fall back to the project auto-estimate).
    pub allocation: Hours,
}

impl Segment {
    /// Returns whether the date falls inside this segment.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Per-working-day hours for this segment.
    ///
    /// The allocation is spread over the segment's working days (inclusive
    /// of the due date) with an exact telescoping split. A segment with no
    /// working days yields an empty list, never a division by zero.
    #[must_use]
    pub fn daily_hours(
        &self,
        pattern: &WorkPattern,
        holidays: &[Holiday],
    ) -> Vec<(NaiveDate, f64)> {
        let days = working_days_between(self.start, self.end, pattern, holidays);
        let shares = spread_evenly(self.allocation.value(), days.len());
        days.into_iter().zip(shares).collect()
    }
}

/// One due-date-bearing instance: a plain milestone, or a single occurrence
/// of a recurring one.
#[derive(Debug, Clone)]
struct Instance {
    id: MilestoneId,
    due: NaiveDate,
    start: Option<NaiveDate>,
    allocation: Hours,
    position: u32,
}

/// Partitions `[project_start, project_end]` into segments.
///
/// Recurring milestones are expanded into sequential occurrences first,
/// each carrying the milestone's per-occurrence allocation; successive
/// occurrences become successive segments (first occurrence: project start
/// through occurrence one; second: day after occurrence one through
/// occurrence two; and so on). Boundaries are always the day after the
/// previous due date, so segments neither overlap nor leave gaps. Any
/// trailing range after the last due date is an unowned segment.
///
/// An inverted project range returns no segments.
#[must_use]
pub fn segment(
    project_start: NaiveDate,
    project_end: NaiveDate,
    milestones: &[Milestone],
) -> Vec<Segment> {
    if project_end < project_start {
        return Vec::new();
    }

    let mut instances: Vec<Instance> = Vec::new();
    for m in milestones {
        match &m.recurrence {
            None => instances.push(Instance {
                id: m.id.clone(),
                due: m.due,
                start: m.start,
                allocation: m.allocation,
                position: m.position,
            }),
            Some(rule) => {
                // Each occurrence is an independent due date. Explicit start
                // dates do not apply to generated occurrences; boundaries
                // come from the previous occurrence.
                for due in expand(rule, m.due, project_start, project_end, MAX_OCCURRENCES) {
                    instances.push(Instance {
                        id: m.id.clone(),
                        due,
                        start: None,
                        allocation: m.allocation,
                        position: m.position,
                    });
                }
            }
        }
    }

    instances.retain(|i| {
        let in_range = project_start <= i.due && i.due <= project_end;
        if !in_range {
            tracing::debug!(milestone = %i.id, due = %i.due, "milestone due outside project range, skipped");
        }
        in_range
    });
    instances.sort_by(|a, b| {
        a.due
            .cmp(&b.due)
            .then_with(|| a.position.cmp(&b.position))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut segments = Vec::new();
    let mut cursor = project_start;
    for instance in instances {
        if instance.due < cursor {
            // A due date already consumed by the previous segment (e.g. a
            // duplicate). Validation reports it; here it owns no days.
            tracing::debug!(milestone = %instance.id, due = %instance.due, "milestone due already covered, skipped");
            continue;
        }

        // An explicit start after the natural boundary opens an unowned gap;
        // one before it is clamped so segments never overlap.
        let start = match instance.start {
            Some(s) if s > cursor && s <= instance.due => {
                if let Some(gap_end) = s.checked_sub_days(Days::new(1)) {
                    segments.push(Segment {
                        start: cursor,
                        end: gap_end,
                        milestone: None,
                        allocation: Hours::ZERO,
                    });
                }
                s
            }
            _ => cursor,
        };

        segments.push(Segment {
            start,
            end: instance.due,
            milestone: Some(instance.id),
            allocation: instance.allocation,
        });

        match instance.due.checked_add_days(Days::new(1)) {
            Some(next) => cursor = next,
            None => return segments,
        }
        if cursor > project_end {
            return segments;
        }
    }

    // Trailing unowned range through the project end
    segments.push(Segment {
        start: cursor,
        end: project_end,
        milestone: None,
        allocation: Hours::ZERO,
    });
    segments
}
