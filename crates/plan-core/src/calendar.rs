//! Calendar primitives: working-day determination and duration math.
//!
//! Everything here is a pure function over snapshot inputs. Malformed ranges
//! (end before start) produce empty or zero results rather than errors,
//! since callers build ranges programmatically during interactive edits.

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};

use crate::holiday::Holiday;
use crate::pattern::WorkPattern;

/// Milliseconds in an hour, for duration conversion.
const MS_PER_HOUR: f64 = 3_600_000.0;

/// Whether a date has working capacity.
///
/// True iff the date is not inside any holiday range and the effective
/// work-hour total for the date (override if present, else the weekday
/// schedule) is greater than zero.
#[must_use]
pub fn is_working_day(date: NaiveDate, pattern: &WorkPattern, holidays: &[Holiday]) -> bool {
    if holidays.iter().any(|h| h.covers(date)) {
        return false;
    }
    pattern.hours_on(date).value() > 0.0
}

/// All working days in the inclusive range `[start, end]`, in order.
///
/// An inverted range returns an empty list.
#[must_use]
pub fn working_days_between(
    start: NaiveDate,
    end: NaiveDate,
    pattern: &WorkPattern,
    holidays: &[Holiday],
) -> Vec<NaiveDate> {
    days_between(start, end)
        .filter(|&d| is_working_day(d, pattern, holidays))
        .collect()
}

/// Every date in the inclusive range `[start, end]`, empty when inverted.
pub fn days_between(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |&d| d <= end)
}

/// The portion of `[start, end)` falling on `date` (00:00-24:00 local), in
/// hours.
///
/// Summing this over every date an interval touches yields the interval's
/// total duration: the interval is clamped to each day's boundaries in
/// integer milliseconds, so nothing is double counted or lost across
/// midnight. An interval entirely outside the date, or with `end <= start`,
/// contributes zero.
#[must_use]
pub fn duration_hours_on_date(start: NaiveDateTime, end: NaiveDateTime, date: NaiveDate) -> f64 {
    let day_start = date.and_time(NaiveTime::MIN);
    let Some(day_end) = date
        .checked_add_days(Days::new(1))
        .map(|d| d.and_time(NaiveTime::MIN))
    else {
        return 0.0;
    };

    let clamped_start = start.max(day_start);
    let clamped_end = end.min(day_end);
    if clamped_end <= clamped_start {
        return 0.0;
    }

    #[expect(
        clippy::cast_precision_loss,
        reason = "durations are far below f64's 2^53 integer range"
    )]
    let ms = (clamped_end - clamped_start).num_milliseconds() as f64;
    ms / MS_PER_HOUR
}

/// Splits `total` into `count` shares that sum to `total` exactly.
///
/// Each share is the difference of consecutive cumulative fractions, so the
/// shares telescope: floating-point drift cannot accumulate across the
/// split. This is what keeps a 20h milestone from summing to 19.97h over
/// six working days.
#[must_use]
pub fn spread_evenly(total: f64, count: usize) -> Vec<f64> {
    if count == 0 || total <= 0.0 {
        return vec![0.0; count];
    }

    #[expect(
        clippy::cast_precision_loss,
        reason = "day counts are far below f64's 2^53 integer range"
    )]
    let denominator = count as f64;
    let mut shares = Vec::with_capacity(count);
    let mut previous = 0.0;
    for i in 1..=count {
        #[expect(
            clippy::cast_precision_loss,
            reason = "day counts are far below f64's 2^53 integer range"
        )]
        let cumulative = total * (i as f64) / denominator;
        shares.push(cumulative - previous);
        previous = cumulative;
    }
    shares
}
