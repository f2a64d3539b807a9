//! Milestone records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::recurrence::RecurrenceRule;
use crate::types::{Hours, MilestoneId, ProjectId};

/// A named sub-deliverable of a project with its own hour allocation and
/// due date.
///
/// Within a project, non-recurring milestones are expected to have distinct
/// due dates; duplicates are surfaced by validation, not corrected. A
/// recurring milestone carries its allocation per occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    /// Unique identifier.
    pub id: MilestoneId,

    /// Owning project.
    pub project: ProjectId,

    /// Display name.
    pub name: String,

    /// Hours to spend by the due date (per occurrence when recurring).
    pub allocation: Hours,

    /// The day by which the allocation must be completed (inclusive).
    pub due: NaiveDate,

    /// Explicit first day of this milestone's work. When absent, the day
    /// after the previous milestone's due date (or the project start) is
    /// used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,

    /// Optional recurrence, seeded at the due date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrenceRule>,

    /// Display order within the project.
    #[serde(default)]
    pub position: u32,
}
