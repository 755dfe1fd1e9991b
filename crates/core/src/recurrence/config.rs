//! The persisted, loosely-typed recurrence blob and its validation.

use std::num::NonZeroU32;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::{Result, RuleError};
use super::types::{Pattern, RecurrenceRule, RepeatUnit, Termination, WeekdaySet};

/// Recurrence configuration as stored alongside an event row.
///
/// Which fields matter depends on `type`. Use [`RecurrenceConfig::to_rule`]
/// to validate it into a [`RecurrenceRule`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceConfig {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_of_week: Option<Vec<u8>>,
    #[serde(default = "default_end_type")]
    pub end_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurrences: Option<u32>,
}

fn default_end_type() -> String {
    "never".to_string()
}

impl RecurrenceConfig {
    /// Validates this config.
    ///
    /// Returns `Ok(None)` for `type = "none"`.
    pub fn to_rule(&self) -> Result<Option<RecurrenceRule>> {
        let kind = self.kind.trim().to_ascii_lowercase();
        let pattern = match kind.as_str() {
            "none" | "" => return Ok(None),
            "daily" => Pattern::Daily {
                interval: self.interval()?,
            },
            "weekly" => Pattern::Weekly {
                interval: self.interval()?,
            },
            "monthly" => Pattern::Monthly {
                interval: self.interval()?,
            },
            "yearly" => Pattern::Yearly {
                interval: self.interval()?,
            },
            "weekdays" => Pattern::Weekdays,
            "custom" => {
                let unit = self.unit.as_deref().ok_or(RuleError::MissingUnit)?;
                let weekdays = match &self.days_of_week {
                    Some(days) => WeekdaySet::from_indices(days)?,
                    None => None,
                };
                Pattern::Custom {
                    interval: self.interval()?,
                    unit: RepeatUnit::parse(unit)?,
                    weekdays,
                }
            }
            _ => return Err(RuleError::UnknownType(self.kind.clone())),
        };

        Ok(Some(RecurrenceRule {
            pattern,
            end: self.termination()?,
        }))
    }

    /// Returns a copy of this config with its end fields replaced.
    pub fn with_termination(&self, end: Termination) -> Self {
        let mut config = self.clone();
        config.set_termination(end);
        config
    }

    fn set_termination(&mut self, end: Termination) {
        self.end_type = end.type_name().to_string();
        self.end_date = None;
        self.occurrences = None;
        match end {
            Termination::Never => {}
            Termination::On(date) => self.end_date = Some(date),
            Termination::After(count) => self.occurrences = Some(count.get()),
        }
    }

    fn interval(&self) -> Result<NonZeroU32> {
        match self.interval {
            None => Ok(NonZeroU32::MIN),
            Some(n) => NonZeroU32::new(n).ok_or(RuleError::InvalidInterval),
        }
    }

    fn termination(&self) -> Result<Termination> {
        match self.end_type.trim().to_ascii_lowercase().as_str() {
            "never" | "" => Ok(Termination::Never),
            "on" | "date" => self
                .end_date
                .map(Termination::On)
                .ok_or(RuleError::MissingEndDate),
            "after" | "count" => self
                .occurrences
                .and_then(NonZeroU32::new)
                .map(Termination::After)
                .ok_or(RuleError::MissingOccurrenceCount),
            _ => Err(RuleError::UnknownEndType(self.end_type.clone())),
        }
    }
}

impl From<&RecurrenceRule> for RecurrenceConfig {
    fn from(rule: &RecurrenceRule) -> Self {
        let (unit, days_of_week) = match rule.pattern {
            Pattern::Custom { unit, weekdays, .. } => (
                Some(unit.as_str().to_string()),
                weekdays.map(|set| set.indices()),
            ),
            _ => (None, None),
        };

        let mut config = Self {
            kind: rule.pattern.type_name().to_string(),
            interval: rule.pattern.interval().map(NonZeroU32::get),
            unit,
            days_of_week,
            end_type: default_end_type(),
            end_date: None,
            occurrences: None,
        };
        config.set_termination(rule.end);
        config
    }
}

impl From<RecurrenceRule> for RecurrenceConfig {
    fn from(rule: RecurrenceRule) -> Self {
        Self::from(&rule)
    }
}
