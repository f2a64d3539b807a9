//! Recurrence rule expansion.
//!
//! Turns a recurrence rule (daily/weekly/monthly, interval, optional
//! selectors and termination) into a strictly increasing sequence of
//! occurrence dates within a query window. The expansion is a pure function
//! of its inputs: callers re-expand for different windows instead of seeking
//! a shared cursor.
//!
//! Occurrences are calendar dates. Callers that need timestamps reattach the
//! seed's local time-of-day, which keeps occurrence times at the same wall
//! clock across daylight-saving transitions.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::types::ValidationError;

/// Hard safety cap on occurrences produced by a single expansion.
pub const MAX_OCCURRENCES: usize = 1000;

/// How often a rule repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

/// Day selection for monthly rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MonthlyPattern {
    /// A specific date of the month (1-31). Months without that date are
    /// skipped, never rounded.
    DayOfMonth { day: u32 },
    /// The Nth occurrence of a weekday (1-5). Months without an Nth
    /// occurrence (e.g. a 5th Friday) are skipped.
    NthWeekday { nth: u32, weekday: Weekday },
}

/// When a rule stops producing occurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecurrenceEnd {
    /// Stop after this many occurrences, counted from the seed.
    Count { count: u32 },
    /// Stop after this date (inclusive).
    OnDate { date: NaiveDate },
}

/// A recurrence rule.
///
/// Absence of [`RecurrenceRule::end`] means indefinite recurrence, bounded
/// in practice by the query window and [`MAX_OCCURRENCES`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecurrenceRule {
    /// Base frequency.
    pub frequency: Frequency,

    /// Every N periods. Must be at least 1; zero is clamped to 1 during
    /// expansion since snapshots arrive from an external store.
    pub interval: u32,

    /// Weekday selector for weekly rules. When absent, the seed's weekday
    /// is used. Ignored for other frequencies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekdays: Option<Vec<Weekday>>,

    /// Day selection for monthly rules. When absent, the seed's
    /// day-of-month is used. Ignored for other frequencies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly: Option<MonthlyPattern>,

    /// Optional termination.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<RecurrenceEnd>,
}

impl RecurrenceRule {
    /// Creates a rule with the given frequency and interval.
    pub fn new(frequency: Frequency, interval: u32) -> Result<Self, ValidationError> {
        if interval == 0 {
            return Err(ValidationError::ZeroInterval);
        }
        Ok(Self {
            frequency,
            interval,
            weekdays: None,
            monthly: None,
            end: None,
        })
    }
}

/// Expands a rule into occurrence dates within `[window_start, window_end]`.
///
/// The sequence is strictly increasing and bounded by whichever of the
/// window end, the rule's own termination, or `max` comes first. Occurrences
/// before `window_start` still consume a count-based termination budget but
/// are not yielded, so a rule exhausted before the window produces nothing.
///
/// An inverted window (`window_end < window_start`) produces an empty
/// sequence rather than an error.
pub fn expand(
    rule: &RecurrenceRule,
    seed: NaiveDate,
    window_start: NaiveDate,
    window_end: NaiveDate,
    max: usize,
) -> Occurrences<'_> {
    let mut bound = window_end;
    if let Some(RecurrenceEnd::OnDate { date }) = rule.end {
        bound = bound.min(date);
    }

    Occurrences {
        rule,
        seed,
        window_start,
        bound,
        max: max.min(MAX_OCCURRENCES),
        interval: u64::from(rule.interval.max(1)),
        period: 0,
        week_buffer: Vec::new(),
        produced: 0,
        yielded: 0,
        done: window_end < window_start,
    }
}

/// Lazy occurrence sequence produced by [`expand`].
#[derive(Debug, Clone)]
pub struct Occurrences<'a> {
    rule: &'a RecurrenceRule,
    seed: NaiveDate,
    window_start: NaiveDate,
    /// Last date an occurrence may fall on (window end or rule end date).
    bound: NaiveDate,
    max: usize,
    interval: u64,
    /// Next period index to materialize.
    period: u64,
    /// Dates pending from the current weekly period, most recent last.
    week_buffer: Vec<NaiveDate>,
    /// Occurrences produced so far, counted from the seed.
    produced: u32,
    yielded: usize,
    done: bool,
}

impl Occurrences<'_> {
    /// Pulls the next rule-valid occurrence, ignoring the window start.
    fn next_occurrence(&mut self) -> Option<NaiveDate> {
        loop {
            match self.rule.frequency {
                Frequency::Daily => {
                    let date = self
                        .seed
                        .checked_add_days(Days::new(self.period * self.interval))?;
                    self.period += 1;
                    if date > self.bound {
                        return None;
                    }
                    return Some(date);
                }
                Frequency::Weekly => {
                    if self.week_buffer.is_empty() {
                        self.fill_week_buffer()?;
                        continue;
                    }
                    let date = self.week_buffer.remove(0);
                    if date > self.bound {
                        return None;
                    }
                    return Some(date);
                }
                Frequency::Monthly => {
                    let months = self.period * self.interval;
                    self.period += 1;
                    let (year, month) = month_offset(self.seed, months)?;
                    // Stop once even the first of the month is out of range
                    let month_start = NaiveDate::from_ymd_opt(year, month, 1)?;
                    if month_start > self.bound {
                        return None;
                    }
                    let date = match self.rule.monthly {
                        Some(MonthlyPattern::DayOfMonth { day }) => {
                            NaiveDate::from_ymd_opt(year, month, day)
                        }
                        Some(MonthlyPattern::NthWeekday { nth, weekday }) => {
                            nth_weekday_of_month(year, month, nth, weekday)
                        }
                        None => NaiveDate::from_ymd_opt(year, month, self.seed.day()),
                    };
                    match date {
                        Some(d) if d > self.bound => return None,
                        Some(d) if d >= self.seed => return Some(d),
                        // Nonexistent in this month, or before the seed: skip
                        _ => {}
                    }
                }
            }
        }
    }

    /// Materializes the next weekly period into the buffer.
    fn fill_week_buffer(&mut self) -> Option<()> {
        let week_start = self.seed
            - Days::new(u64::from(self.seed.weekday().num_days_from_monday()));
        let anchor = week_start.checked_add_days(Days::new(self.period * self.interval * 7))?;
        self.period += 1;
        if anchor > self.bound {
            return None;
        }

        let seed_weekday = self.seed.weekday();
        let selected = self.rule.weekdays.as_deref();
        let mut days: Vec<NaiveDate> = (0u64..7)
            .filter_map(|offset| anchor.checked_add_days(Days::new(offset)))
            .filter(|d| {
                selected.map_or_else(
                    || d.weekday() == seed_weekday,
                    |sel| sel.contains(&d.weekday()),
                )
            })
            .filter(|&d| d >= self.seed)
            .collect();
        days.sort_unstable();
        self.week_buffer = days;
        Some(())
    }
}

impl Iterator for Occurrences<'_> {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        loop {
            if self.done || self.yielded >= self.max {
                return None;
            }
            if let Some(RecurrenceEnd::Count { count }) = self.rule.end {
                if self.produced >= count {
                    self.done = true;
                    return None;
                }
            }

            let Some(date) = self.next_occurrence() else {
                self.done = true;
                return None;
            };
            self.produced += 1;

            if date < self.window_start {
                continue;
            }
            self.yielded += 1;
            return Some(date);
        }
    }
}

/// The year/month reached by stepping `months` months forward from `seed`.
fn month_offset(seed: NaiveDate, months: u64) -> Option<(i32, u32)> {
    let base = i64::from(seed.year()) * 12 + i64::from(seed.month0());
    let index = base.checked_add(i64::try_from(months).ok()?)?;
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    let month = u32::try_from(index.rem_euclid(12)).ok()? + 1;
    Some((year, month))
}

/// The Nth occurrence of `weekday` in the given month, if it exists.
///
/// `nth` is 1-based; months with no Nth occurrence (e.g. a 5th Friday)
/// return `None`.
pub fn nth_weekday_of_month(
    year: i32,
    month: u32,
    nth: u32,
    weekday: Weekday,
) -> Option<NaiveDate> {
    if nth == 0 {
        return None;
    }
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let offset = (7 + weekday.num_days_from_monday() - first.weekday().num_days_from_monday()) % 7;
    let date = first.checked_add_days(Days::new(u64::from(offset + (nth - 1) * 7)))?;
    if date.month() == month { Some(date) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    fn collect(
        rule: &RecurrenceRule,
        seed: NaiveDate,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<NaiveDate> {
        expand(rule, seed, start, end, MAX_OCCURRENCES).collect()
    }

    #[test]
    fn daily_every_other_day() {
        let rule = RecurrenceRule::new(Frequency::Daily, 2).unwrap();
        let dates = collect(&rule, date(2025, 3, 1), date(2025, 3, 1), date(2025, 3, 8));
        assert_eq!(
            dates,
            vec![
                date(2025, 3, 1),
                date(2025, 3, 3),
                date(2025, 3, 5),
                date(2025, 3, 7),
            ]
        );
    }

    #[test]
    fn weekly_with_day_selector() {
        // Seed on a Monday; select Mon + Thu
        let mut rule = RecurrenceRule::new(Frequency::Weekly, 1).unwrap();
        rule.weekdays = Some(vec![Weekday::Mon, Weekday::Thu]);
        let dates = collect(&rule, date(2025, 3, 3), date(2025, 3, 3), date(2025, 3, 14));
        assert_eq!(
            dates,
            vec![
                date(2025, 3, 3),  // Mon
                date(2025, 3, 6),  // Thu
                date(2025, 3, 10), // Mon
                date(2025, 3, 13), // Thu
            ]
        );
    }

    #[test]
    fn weekly_selector_skips_days_before_seed() {
        // Seed on a Thursday with Mon selected too: the Monday of the seed
        // week is before the seed and must not appear.
        let mut rule = RecurrenceRule::new(Frequency::Weekly, 1).unwrap();
        rule.weekdays = Some(vec![Weekday::Mon, Weekday::Thu]);
        let dates = collect(&rule, date(2025, 3, 6), date(2025, 3, 1), date(2025, 3, 12));
        assert_eq!(dates, vec![date(2025, 3, 6), date(2025, 3, 10)]);
    }

    #[test]
    fn biweekly_keeps_interval() {
        let rule = RecurrenceRule::new(Frequency::Weekly, 2).unwrap();
        let dates = collect(&rule, date(2025, 1, 7), date(2025, 1, 1), date(2025, 2, 10));
        assert_eq!(
            dates,
            vec![date(2025, 1, 7), date(2025, 1, 21), date(2025, 2, 4)]
        );
    }

    #[test]
    fn monthly_day_31_skips_short_months() {
        let mut rule = RecurrenceRule::new(Frequency::Monthly, 1).unwrap();
        rule.monthly = Some(MonthlyPattern::DayOfMonth { day: 31 });
        let dates = collect(&rule, date(2025, 1, 31), date(2025, 1, 1), date(2025, 5, 31));
        // February and April have no 31st
        assert_eq!(
            dates,
            vec![date(2025, 1, 31), date(2025, 3, 31), date(2025, 5, 31)]
        );
    }

    #[test]
    fn monthly_fifth_friday_skipped_when_absent() {
        let mut rule = RecurrenceRule::new(Frequency::Monthly, 1).unwrap();
        rule.monthly = Some(MonthlyPattern::NthWeekday {
            nth: 5,
            weekday: Weekday::Fri,
        });
        // 2025: January and May have five Fridays; Feb/Mar/Apr do not
        // (March 2025 has five Saturdays/Sundays but only four Fridays).
        let dates = collect(&rule, date(2025, 1, 1), date(2025, 1, 1), date(2025, 5, 31));
        assert_eq!(dates, vec![date(2025, 1, 31), date(2025, 5, 30)]);
    }

    #[test]
    fn count_termination_consumed_before_window() {
        let mut rule = RecurrenceRule::new(Frequency::Daily, 1).unwrap();
        rule.end = Some(RecurrenceEnd::Count { count: 3 });
        // All three occurrences (Mar 1-3) fall before the window
        let dates = collect(&rule, date(2025, 3, 1), date(2025, 3, 10), date(2025, 3, 20));
        assert!(dates.is_empty());
    }

    #[test]
    fn end_date_termination() {
        let mut rule = RecurrenceRule::new(Frequency::Daily, 1).unwrap();
        rule.end = Some(RecurrenceEnd::OnDate {
            date: date(2025, 3, 3),
        });
        let dates = collect(&rule, date(2025, 3, 1), date(2025, 3, 1), date(2025, 3, 31));
        assert_eq!(
            dates,
            vec![date(2025, 3, 1), date(2025, 3, 2), date(2025, 3, 3)]
        );
    }

    #[test]
    fn zero_interval_rejected_at_construction_clamped_in_expand() {
        assert_eq!(
            RecurrenceRule::new(Frequency::Daily, 0),
            Err(ValidationError::ZeroInterval)
        );

        // A zero interval arriving via deserialization is clamped to 1
        let rule = RecurrenceRule {
            frequency: Frequency::Daily,
            interval: 0,
            weekdays: None,
            monthly: None,
            end: None,
        };
        let dates = collect(&rule, date(2025, 3, 1), date(2025, 3, 1), date(2025, 3, 3));
        assert_eq!(
            dates,
            vec![date(2025, 3, 1), date(2025, 3, 2), date(2025, 3, 3)]
        );
    }

    #[test]
    fn inverted_window_is_empty() {
        let rule = RecurrenceRule::new(Frequency::Daily, 1).unwrap();
        let dates = collect(&rule, date(2025, 3, 1), date(2025, 3, 10), date(2025, 3, 1));
        assert!(dates.is_empty());
    }

    #[test]
    fn expansion_is_restartable() {
        let rule = RecurrenceRule::new(Frequency::Weekly, 1).unwrap();
        let first: Vec<_> = collect(&rule, date(2025, 3, 3), date(2025, 3, 1), date(2025, 3, 31));
        let second: Vec<_> = collect(&rule, date(2025, 3, 3), date(2025, 3, 1), date(2025, 3, 31));
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn sequence_is_strictly_increasing() {
        let mut rule = RecurrenceRule::new(Frequency::Weekly, 1).unwrap();
        rule.weekdays = Some(vec![Weekday::Fri, Weekday::Mon, Weekday::Wed]);
        let dates = collect(&rule, date(2025, 1, 1), date(2025, 1, 1), date(2025, 6, 30));
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn hard_cap_bounds_indefinite_rules() {
        let rule = RecurrenceRule::new(Frequency::Daily, 1).unwrap();
        let dates: Vec<_> =
            expand(&rule, date(2025, 1, 1), date(2025, 1, 1), date(2035, 1, 1), 50).collect();
        assert_eq!(dates.len(), 50);
    }

    #[test]
    fn nth_weekday_lookup() {
        // March 2025: Saturdays on 1, 8, 15, 22, 29
        assert_eq!(
            nth_weekday_of_month(2025, 3, 1, Weekday::Sat),
            Some(date(2025, 3, 1))
        );
        assert_eq!(
            nth_weekday_of_month(2025, 3, 5, Weekday::Sat),
            Some(date(2025, 3, 29))
        );
        assert_eq!(nth_weekday_of_month(2025, 3, 5, Weekday::Fri), None);
        assert_eq!(nth_weekday_of_month(2025, 3, 0, Weekday::Fri), None);
    }
}
