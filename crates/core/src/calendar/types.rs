use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::recurrence::{RecurrenceConfig, RecurrenceRule, Result as RuleResult};

/// Lifecycle status of a stored event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Confirmed,
    Tentative,
    Cancelled,
}

/// An event row as stored by the persistence layer.
///
/// A record is either standalone, a recurring parent (it carries a
/// `recurrence_config` and `is_recurring_parent` is set), or a materialized
/// child of a parent (`parent_event_id` is set).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// IANA time zone name, e.g. `Europe/Madrid`.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub is_recurring_parent: bool,
    #[serde(default)]
    pub parent_event_id: Option<Uuid>,
    #[serde(default)]
    pub recurrence_config: Option<RecurrenceConfig>,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl EventRecord {
    /// Creates a confirmed, non-recurring event in UTC.
    pub fn new(
        user_id: Uuid,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: title.into(),
            description: None,
            location: None,
            start,
            end,
            timezone: default_timezone(),
            all_day: false,
            status: EventStatus::Confirmed,
            is_deleted: false,
            is_recurring_parent: false,
            parent_event_id: None,
            recurrence_config: None,
        }
    }

    /// Sets a specific ID for this event (useful for testing).
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn all_day(mut self) -> Self {
        self.all_day = true;
        self
    }

    /// Makes this event the parent of a recurring series.
    pub fn with_recurrence(mut self, rule: RecurrenceRule) -> Self {
        self.recurrence_config = Some(RecurrenceConfig::from(rule));
        self.is_recurring_parent = true;
        self
    }

    /// Attaches a raw, unvalidated recurrence config.
    pub fn with_recurrence_config(mut self, config: RecurrenceConfig) -> Self {
        self.recurrence_config = Some(config);
        self.is_recurring_parent = true;
        self
    }

    /// Marks this event as a materialized child of `parent_id`.
    pub fn with_parent(mut self, parent_id: Uuid) -> Self {
        self.parent_event_id = Some(parent_id);
        self
    }

    /// Returns true if the event is neither deleted nor cancelled.
    pub fn is_active(&self) -> bool {
        !self.is_deleted && self.status != EventStatus::Cancelled
    }

    /// Returns true if this record defines a recurring series.
    pub fn is_recurring(&self) -> bool {
        self.is_recurring_parent && self.recurrence_config.is_some()
    }

    /// Validates the stored recurrence config.
    ///
    /// Returns `Ok(None)` for records that do not recur.
    pub fn recurrence_rule(&self) -> RuleResult<Option<RecurrenceRule>> {
        match &self.recurrence_config {
            Some(config) if self.is_recurring_parent => config.to_rule(),
            _ => Ok(None),
        }
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }
}

/// Read-only view of a recurring parent used for expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTemplate {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub timezone: String,
    pub all_day: bool,
    /// `None` means the template does not recur.
    pub rule: Option<RecurrenceRule>,
}

impl EventTemplate {
    /// Builds a template from a stored record and an already-validated rule.
    pub fn from_record(record: &EventRecord, rule: Option<RecurrenceRule>) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            title: record.title.clone(),
            description: record.description.clone(),
            location: record.location.clone(),
            start: record.start,
            end: record.end,
            timezone: record.timezone.clone(),
            all_day: record.all_day,
            rule,
        }
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    /// Builds the occurrence at series position `ordinal` starting at `start`.
    pub fn occurrence(&self, ordinal: u64, start: DateTime<Utc>) -> Occurrence {
        Occurrence {
            parent_id: self.id,
            user_id: self.user_id,
            title: self.title.clone(),
            description: self.description.clone(),
            location: self.location.clone(),
            timezone: self.timezone.clone(),
            all_day: self.all_day,
            start,
            end: start + self.duration(),
            ordinal,
            is_recurring_instance: true,
        }
    }
}

/// A single generated repetition of a recurring parent. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub parent_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub timezone: String,
    pub all_day: bool,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// 0-based position in the series.
    pub ordinal: u64,
    pub is_recurring_instance: bool,
}

impl Occurrence {
    /// Stable identifier for this occurrence, derived from its parent.
    pub fn instance_id(&self) -> String {
        format!("{}_{}", self.parent_id, self.ordinal)
    }
}

/// A public holiday shown alongside events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    pub id: Uuid,
    pub name: String,
    pub date: NaiveDate,
    pub is_active: bool,
}

impl Holiday {
    pub fn new(name: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            date,
            is_active: true,
        }
    }
}

/// One entry of a range query result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalendarItem {
    Standalone(EventRecord),
    /// A recurring parent returned without expansion.
    RecurringParent(EventRecord),
    Occurrence(Occurrence),
}

impl CalendarItem {
    pub fn start(&self) -> DateTime<Utc> {
        match self {
            CalendarItem::Standalone(record) | CalendarItem::RecurringParent(record) => {
                record.start
            }
            CalendarItem::Occurrence(occurrence) => occurrence.start,
        }
    }

    /// Returns the occurrence if this item is one.
    pub fn as_occurrence(&self) -> Option<&Occurrence> {
        match self {
            CalendarItem::Occurrence(occurrence) => Some(occurrence),
            _ => None,
        }
    }
}
