//! Weekly work-hour patterns and per-date overrides.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::types::Hours;

/// One contiguous block of availability within a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkInterval {
    /// Local start time of the block.
    pub start: NaiveTime,
    /// Length of the block.
    pub hours: Hours,
}

/// The effective schedule for a single day: an ordered list of intervals.
///
/// A day whose intervals sum to zero is a non-work day.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DaySchedule {
    pub intervals: Vec<WorkInterval>,
}

impl DaySchedule {
    /// A day with no availability.
    #[must_use]
    pub const fn off() -> Self {
        Self {
            intervals: Vec::new(),
        }
    }

    /// A single block of the given length starting at `start`.
    #[must_use]
    pub fn block(start: NaiveTime, hours: Hours) -> Self {
        Self {
            intervals: vec![WorkInterval { start, hours }],
        }
    }

    /// Total configured hours for the day.
    #[must_use]
    pub fn total_hours(&self) -> Hours {
        self.intervals.iter().map(|i| i.hours).sum()
    }
}

/// Default weekly availability plus one-off per-date overrides.
///
/// The weekday schedules describe a repeating week (Monday through Sunday).
/// An override shadows the weekday schedule for that calendar date only;
/// an override with zero total hours turns a normally-working date off.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkPattern {
    /// Weekday schedules, Monday through Sunday.
    days: [DaySchedule; 7],

    /// Per-date overrides.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    overrides: BTreeMap<NaiveDate, DaySchedule>,
}

impl WorkPattern {
    /// A pattern with no availability at all.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Eight hours starting 09:00, Monday through Friday.
    #[must_use]
    pub fn standard_week() -> Self {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default();
        let eight = Hours::clamped(8.0);
        let mut pattern = Self::default();
        for weekday in [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ] {
            pattern.set_weekday(weekday, DaySchedule::block(nine, eight));
        }
        pattern
    }

    /// Replaces the schedule for a weekday.
    pub fn set_weekday(&mut self, weekday: Weekday, schedule: DaySchedule) {
        self.days[weekday.num_days_from_monday() as usize] = schedule;
    }

    /// Adds a one-off override for a specific date.
    pub fn set_override(&mut self, date: NaiveDate, schedule: DaySchedule) {
        self.overrides.insert(date, schedule);
    }

    /// The effective schedule for a date: override if present, else the
    /// weekday schedule.
    #[must_use]
    pub fn schedule_for(&self, date: NaiveDate) -> &DaySchedule {
        self.overrides
            .get(&date)
            .unwrap_or(&self.days[date.weekday().num_days_from_monday() as usize])
    }

    /// Total effective hours for a date.
    #[must_use]
    pub fn hours_on(&self, date: NaiveDate) -> Hours {
        self.schedule_for(date).total_hours()
    }

    /// Iterates overrides in date order, for fingerprinting.
    pub fn overrides(&self) -> impl Iterator<Item = (&NaiveDate, &DaySchedule)> {
        self.overrides.iter()
    }

    /// Weekday schedules in Monday-through-Sunday order, for fingerprinting.
    #[must_use]
    pub const fn weekday_schedules(&self) -> &[DaySchedule; 7] {
        &self.days
    }
}
