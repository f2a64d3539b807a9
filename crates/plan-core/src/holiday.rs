//! Holidays: global non-working date ranges.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::HolidayId;

/// An inclusive range of non-working dates.
///
/// Holidays are global: they apply to every project's capacity calculation
/// and are not owned by any project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Holiday {
    /// Unique identifier.
    pub id: HolidayId,
    /// Display title.
    pub title: String,
    /// First day of the holiday (inclusive).
    pub start: NaiveDate,
    /// Last day of the holiday (inclusive).
    pub end: NaiveDate,
}

impl Holiday {
    /// Returns whether the date falls inside this holiday.
    ///
    /// An inverted range (end before start) covers nothing.
    #[must_use]
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    fn holiday(start: NaiveDate, end: NaiveDate) -> Holiday {
        Holiday {
            id: HolidayId::new("h1").unwrap(),
            title: "Winter break".to_string(),
            start,
            end,
        }
    }

    #[test]
    fn covers_inclusive_range() {
        let h = holiday(date(2025, 12, 24), date(2025, 12, 26));
        assert!(!h.covers(date(2025, 12, 23)));
        assert!(h.covers(date(2025, 12, 24)));
        assert!(h.covers(date(2025, 12, 25)));
        assert!(h.covers(date(2025, 12, 26)));
        assert!(!h.covers(date(2025, 12, 27)));
    }

    #[test]
    fn inverted_range_covers_nothing() {
        let h = holiday(date(2025, 12, 26), date(2025, 12, 24));
        assert!(!h.covers(date(2025, 12, 25)));
    }
}
