//! Calendar events and their expansion into concrete occurrences.
//!
//! Event timestamps are local wall-clock times (`NaiveDateTime`). Recurring
//! events expand to occurrences that reuse the seed's time-of-day, so a
//! daylight-saving transition never shifts the hour an occurrence reports.

use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::calendar::duration_hours_on_date;
use crate::recurrence::{MAX_OCCURRENCES, RecurrenceRule, expand};
use crate::types::{EventId, ProjectId};

/// Whether an event is planned ahead or tracked as done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventState {
    /// Scheduled in advance.
    Planned,
    /// Completed / tracked time.
    Completed,
}

/// How a replacement event modifies its originating series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionScope {
    /// Replaces the single occurrence on the replacement's start date.
    ThisInstance,
    /// Replaces that occurrence and every later one.
    ThisAndFuture,
}

/// Link from a replacement event to the recurring series it modifies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesLink {
    /// The recurring event being modified.
    pub series: EventId,
    /// Which occurrences the replacement displaces.
    pub scope: ExceptionScope,
}

/// A calendar event snapshot.
///
/// The invariant `end > start` is the store's responsibility; a violating
/// event contributes zero hours everywhere rather than erroring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Unique identifier.
    pub id: EventId,

    /// Owning project, if any. Unlinked events never contribute to project
    /// estimates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectId>,

    /// Local start timestamp.
    pub start: NaiveDateTime,

    /// Local end timestamp. May cross midnight.
    pub end: NaiveDateTime,

    /// Planned vs completed.
    pub state: EventState,

    /// Optional recurrence, seeded at the start date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrenceRule>,

    /// Present on replacement events that modify a recurring series.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<SeriesLink>,
}

/// One concrete occurrence of an event within a query window.
#[derive(Debug, Clone, PartialEq)]
pub struct EventOccurrence {
    /// The originating event.
    pub event: EventId,
    /// Owning project, if any.
    pub project: Option<ProjectId>,
    /// Local start timestamp.
    pub start: NaiveDateTime,
    /// Local end timestamp.
    pub end: NaiveDateTime,
    /// Planned vs completed.
    pub state: EventState,
}

impl EventOccurrence {
    /// Hours of this occurrence falling on the given calendar date.
    #[must_use]
    pub fn hours_on(&self, date: NaiveDate) -> f64 {
        duration_hours_on_date(self.start, self.end, date)
    }
}

/// Expands events into occurrences overlapping `[window_start, window_end]`.
///
/// Recurring events are expanded via their rule with the seed's duration and
/// time-of-day; replacement events suppress the occurrences their series
/// link displaces. Results are sorted by start time then event ID so the
/// expansion is deterministic.
pub fn expand_events(
    events: &[CalendarEvent],
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Vec<EventOccurrence> {
    let mut occurrences = Vec::new();

    for event in events {
        if event.end <= event.start {
            tracing::debug!(event = %event.id, "skipping event with non-positive duration");
            continue;
        }

        match &event.recurrence {
            None => {
                if event.end.date() >= window_start && event.start.date() <= window_end {
                    occurrences.push(occurrence_of(event, event.start, event.end));
                }
            }
            Some(rule) => {
                let duration = event.end - event.start;
                // Back the expansion window up so an occurrence that starts
                // before the window but runs into it is still produced.
                let span_days = u64::try_from((event.end.date() - event.start.date()).num_days())
                    .unwrap_or(0);
                let expand_from = window_start
                    .checked_sub_days(Days::new(span_days))
                    .unwrap_or(window_start);

                for occ_date in expand(
                    rule,
                    event.start.date(),
                    expand_from,
                    window_end,
                    MAX_OCCURRENCES,
                ) {
                    if is_suppressed(events, &event.id, occ_date) {
                        continue;
                    }
                    let start = occ_date.and_time(event.start.time());
                    let end = start + duration;
                    occurrences.push(occurrence_of(event, start, end));
                }
            }
        }
    }

    occurrences.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.event.cmp(&b.event)));
    occurrences
}

fn occurrence_of(event: &CalendarEvent, start: NaiveDateTime, end: NaiveDateTime) -> EventOccurrence {
    EventOccurrence {
        event: event.id.clone(),
        project: event.project.clone(),
        start,
        end,
        state: event.state,
    }
}

/// Whether any replacement event displaces the series occurrence on `date`.
fn is_suppressed(events: &[CalendarEvent], series: &EventId, date: NaiveDate) -> bool {
    events.iter().any(|e| {
        e.series.as_ref().is_some_and(|link| {
            link.series == *series
                && match link.scope {
                    ExceptionScope::ThisInstance => e.start.date() == date,
                    ExceptionScope::ThisAndFuture => date >= e.start.date(),
                }
        })
    })
}
