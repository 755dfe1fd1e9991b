use std::num::NonZeroU32;

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::error::{Result, RuleError};

/// The unit a custom rule repeats in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatUnit {
    Day,
    Week,
    Month,
    Year,
}

impl RepeatUnit {
    /// Parses a unit name, accepting singular and plural forms.
    pub fn parse(value: &str) -> Result<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.trim_end_matches('s') {
            "day" => Ok(RepeatUnit::Day),
            "week" => Ok(RepeatUnit::Week),
            "month" => Ok(RepeatUnit::Month),
            "year" => Ok(RepeatUnit::Year),
            _ => Err(RuleError::UnknownUnit(value.to_string())),
        }
    }

    /// Returns the canonical lowercase name of this unit.
    pub fn as_str(&self) -> &'static str {
        match self {
            RepeatUnit::Day => "day",
            RepeatUnit::Week => "week",
            RepeatUnit::Month => "month",
            RepeatUnit::Year => "year",
        }
    }
}

/// A non-empty set of weekdays.
///
/// Stored as a bitmask where bit 0 is Sunday and bit 6 is Saturday, matching
/// the `0=Sunday..6=Saturday` indices used by persisted configs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    /// Monday through Friday.
    pub const MONDAY_TO_FRIDAY: WeekdaySet = WeekdaySet(0b0011_1110);

    /// Builds a set from weekday indices.
    ///
    /// Returns `Ok(None)` for an empty list: a custom rule without weekdays
    /// steps by its interval instead.
    pub fn from_indices(indices: &[u8]) -> Result<Option<Self>> {
        let mut mask = 0u8;
        for &index in indices {
            if index > 6 {
                return Err(RuleError::InvalidWeekday(index));
            }
            mask |= 1 << index;
        }
        Ok((mask != 0).then_some(Self(mask)))
    }

    /// Returns true if the given weekday is part of this set.
    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_sunday()) != 0
    }

    /// Number of weekdays in the set (1..=7).
    pub fn count(&self) -> u32 {
        self.0.count_ones()
    }

    /// Returns the sorted weekday indices (0=Sunday).
    pub fn indices(&self) -> Vec<u8> {
        (0..7u8).filter(|i| self.0 & (1 << i) != 0).collect()
    }
}

/// How a recurring event repeats.
///
/// Each variant carries only the fields relevant to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pattern {
    Daily {
        interval: NonZeroU32,
    },
    Weekly {
        interval: NonZeroU32,
    },
    Monthly {
        interval: NonZeroU32,
    },
    Yearly {
        interval: NonZeroU32,
    },
    /// Monday through Friday, every week.
    Weekdays,
    Custom {
        interval: NonZeroU32,
        unit: RepeatUnit,
        weekdays: Option<WeekdaySet>,
    },
}

impl Pattern {
    pub fn daily(interval: NonZeroU32) -> Self {
        Pattern::Daily { interval }
    }

    pub fn weekly(interval: NonZeroU32) -> Self {
        Pattern::Weekly { interval }
    }

    pub fn monthly(interval: NonZeroU32) -> Self {
        Pattern::Monthly { interval }
    }

    pub fn yearly(interval: NonZeroU32) -> Self {
        Pattern::Yearly { interval }
    }

    /// Returns the persisted type name for this pattern.
    pub fn type_name(&self) -> &'static str {
        match self {
            Pattern::Daily { .. } => "daily",
            Pattern::Weekly { .. } => "weekly",
            Pattern::Monthly { .. } => "monthly",
            Pattern::Yearly { .. } => "yearly",
            Pattern::Weekdays => "weekdays",
            Pattern::Custom { .. } => "custom",
        }
    }

    /// Returns the interval, if this pattern has one.
    pub fn interval(&self) -> Option<NonZeroU32> {
        match self {
            Pattern::Daily { interval }
            | Pattern::Weekly { interval }
            | Pattern::Monthly { interval }
            | Pattern::Yearly { interval }
            | Pattern::Custom { interval, .. } => Some(*interval),
            Pattern::Weekdays => None,
        }
    }
}

/// When a recurring series stops producing occurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Termination {
    #[default]
    Never,
    /// Last date (inclusive, in the event's zone) an occurrence may fall on.
    On(NaiveDate),
    /// Total number of occurrences in the series.
    After(NonZeroU32),
}

impl Termination {
    /// Returns the persisted end type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            Termination::Never => "never",
            Termination::On(_) => "on",
            Termination::After(_) => "after",
        }
    }
}

/// A validated recurrence rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecurrenceRule {
    pub pattern: Pattern,
    pub end: Termination,
}

impl RecurrenceRule {
    /// Creates a rule that never ends.
    pub fn new(pattern: Pattern) -> Self {
        Self {
            pattern,
            end: Termination::Never,
        }
    }

    /// Sets the termination policy for this rule.
    pub fn with_end(mut self, end: Termination) -> Self {
        self.end = end;
        self
    }

    /// The rule used when a stored config cannot be validated on a read path:
    /// daily, every day, never ending.
    pub fn fallback() -> Self {
        Self::new(Pattern::Daily {
            interval: NonZeroU32::MIN,
        })
    }
}
