//! Core allocation engine for the project planner.
//!
//! This crate contains the fundamental types and logic for:
//! - Calendar primitives: working-day determination and duration math
//! - Recurrence expansion: daily/weekly/monthly rules into occurrence dates
//! - Milestone segmentation: partitioning a project range into owned segments
//! - Day estimates: per-day hour attribution with a strict priority order
//! - Budget validation: milestone allocations against the project budget
//!
//! Every function here is pure: inputs are in-memory snapshots fetched by
//! the host application, and nothing performs I/O or mutates shared state.

pub mod calendar;
pub mod estimate;
pub mod event;
pub mod holiday;
pub mod milestone;
pub mod pattern;
pub mod project;
pub mod recurrence;
pub mod segment;
pub mod types;
pub mod validate;

pub use calendar::{duration_hours_on_date, is_working_day, spread_evenly, working_days_between};
pub use estimate::{DayEstimate, EstimateSource, calculate};
pub use event::{CalendarEvent, EventOccurrence, EventState, ExceptionScope, SeriesLink, expand_events};
pub use holiday::Holiday;
pub use milestone::Milestone;
pub use pattern::{DaySchedule, WorkInterval, WorkPattern};
pub use project::{CONTINUOUS_HORIZON_DAYS, Project, ProjectEnd};
pub use recurrence::{
    Frequency, MAX_OCCURRENCES, MonthlyPattern, Occurrences, RecurrenceEnd, RecurrenceRule, expand,
};
pub use segment::{Segment, segment};
pub use types::{
    EventId, HolidayId, Hours, MilestoneId, ProjectId, ValidationError, WeekdaySet,
};
pub use validate::{BudgetCheck, check_budget};
