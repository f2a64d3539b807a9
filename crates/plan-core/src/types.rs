//! Core type definitions with validation.

use std::fmt;

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// The hour value was negative or not finite.
    #[error("hours must be finite and non-negative, got {value}")]
    HoursOutOfRange { value: f64 },

    /// The recurrence interval was zero.
    #[error("recurrence interval must be at least 1")]
    ZeroInterval,
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated project identifier.
    ///
    /// Project IDs must be non-empty strings. Uniqueness is enforced by the
    /// host application's data store, not here.
    ProjectId, "project ID"
);

define_string_id!(
    /// A validated milestone identifier.
    MilestoneId, "milestone ID"
);

define_string_id!(
    /// A validated calendar event identifier.
    EventId, "event ID"
);

define_string_id!(
    /// A validated holiday identifier.
    HolidayId, "holiday ID"
);

/// A non-negative, finite hour quantity.
///
/// Used for time budgets, milestone allocations, and computed estimates.
/// Values are clamped during deserialization to be lenient with external
/// snapshots; validated construction is available via [`Hours::new`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Hours(f64);

impl Hours {
    /// Zero hours.
    pub const ZERO: Self = Self(0.0);

    /// Creates a new hour value after validation.
    ///
    /// Returns an error if the value is negative, NaN, or infinite.
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() || value < 0.0 {
            return Err(ValidationError::HoursOutOfRange { value });
        }
        Ok(Self(value))
    }

    /// Creates an hour value, clamping negatives and NaN to zero.
    #[must_use]
    pub const fn clamped(value: f64) -> Self {
        if value.is_nan() || value < 0.0 {
            Self(0.0)
        } else {
            Self(value)
        }
    }

    /// Returns the inner f64 value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Saturating subtraction: never goes below zero.
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self::clamped(self.0 - other.0)
    }
}

impl Default for Hours {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Hours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h", self.0)
    }
}

impl TryFrom<f64> for Hours {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Hours> for f64 {
    fn from(h: Hours) -> Self {
        h.0
    }
}

impl std::ops::Add for Hours {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl std::iter::Sum for Hours {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|h| h.0).sum())
    }
}

impl Serialize for Hours {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Hours {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        // Clamp on deserialization to be lenient with external data
        Ok(Self::clamped(value))
    }
}

/// Per-weekday inclusion flags, used for project auto-estimation.
///
/// Stored as seven booleans keyed Monday through Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeekdaySet([bool; 7]);

impl WeekdaySet {
    /// All seven days included.
    pub const ALL: Self = Self([true; 7]);

    /// Monday through Friday included.
    pub const WEEKDAYS: Self = Self([true, true, true, true, true, false, false]);

    /// Creates a set from flags ordered Monday through Sunday.
    #[must_use]
    pub const fn from_flags(flags: [bool; 7]) -> Self {
        Self(flags)
    }

    /// Returns whether the given weekday is included.
    #[must_use]
    pub fn contains(self, weekday: Weekday) -> bool {
        self.0[weekday.num_days_from_monday() as usize]
    }
}

impl Default for WeekdaySet {
    fn default() -> Self {
        Self::ALL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_id_rejects_empty() {
        assert!(ProjectId::new("").is_err());
        assert!(ProjectId::new("proj-1").is_ok());
    }

    #[test]
    fn milestone_id_serde_roundtrip() {
        let id = MilestoneId::new("ms-123").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"ms-123\"");
        let parsed: MilestoneId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn event_id_serde_rejects_empty() {
        let result: Result<EventId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn hours_validates_range() {
        assert!(Hours::new(0.0).is_ok());
        assert!(Hours::new(40.0).is_ok());
        assert!(Hours::new(-1.0).is_err());
        assert!(Hours::new(f64::NAN).is_err());
        assert!(Hours::new(f64::INFINITY).is_err());
    }

    #[test]
    #[expect(
        clippy::float_cmp,
        reason = "exact equality intended for boundary tests"
    )]
    fn hours_clamped_handles_edge_cases() {
        assert_eq!(Hours::clamped(-3.0).value(), 0.0);
        assert_eq!(Hours::clamped(f64::NAN).value(), 0.0);
        assert_eq!(Hours::clamped(7.5).value(), 7.5);
    }

    #[test]
    #[expect(
        clippy::float_cmp,
        reason = "exact equality intended for boundary tests"
    )]
    fn hours_serde_clamps_negative() {
        let parsed: Hours = serde_json::from_str("-2.5").unwrap();
        assert_eq!(parsed.value(), 0.0);

        let parsed: Hours = serde_json::from_str("2.5").unwrap();
        assert_eq!(parsed.value(), 2.5);
    }

    #[test]
    #[expect(
        clippy::float_cmp,
        reason = "exact equality intended for saturation test"
    )]
    fn hours_saturating_sub_floors_at_zero() {
        let a = Hours::new(2.0).unwrap();
        let b = Hours::new(5.0).unwrap();
        assert_eq!(a.saturating_sub(b).value(), 0.0);
        assert_eq!(b.saturating_sub(a).value(), 3.0);
    }

    #[test]
    fn weekday_set_contains() {
        use chrono::Weekday;

        assert!(WeekdaySet::ALL.contains(Weekday::Sun));
        assert!(WeekdaySet::WEEKDAYS.contains(Weekday::Fri));
        assert!(!WeekdaySet::WEEKDAYS.contains(Weekday::Sat));

        let custom = WeekdaySet::from_flags([true, false, true, false, true, false, false]);
        assert!(custom.contains(Weekday::Mon));
        assert!(!custom.contains(Weekday::Tue));
        assert!(custom.contains(Weekday::Wed));
    }
}
