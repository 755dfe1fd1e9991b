use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::WindowError;
use crate::calendar::{EventRecord, EventStatus};
use crate::recurrence::{RecurrenceConfig, Termination};

/// A half-open instant range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a new window, validating that start <= end.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, WindowError> {
        if start > end {
            return Err(WindowError::InvalidRange);
        }
        Ok(Self { start, end })
    }

    /// Creates a window from midnight UTC of `start` to midnight UTC of `end`.
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Result<Self, WindowError> {
        Self::new(
            start.and_time(chrono::NaiveTime::MIN).and_utc(),
            end.and_time(chrono::NaiveTime::MIN).and_utc(),
        )
    }

    /// Returns true if `instant` lies in `[start, end)`.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// Returns true if `instant` lies in `[start, end]`.
    pub fn contains_closed(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// UTC date of the window start.
    pub fn start_date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    /// UTC date of the window end.
    pub fn end_date(&self) -> NaiveDate {
        self.end.date_naive()
    }

    /// UTC date of the last instant inside `[start, end)`.
    ///
    /// A window ending at midnight does not touch its end date. For an empty
    /// window ending at midnight this is the day before `start_date`.
    pub fn last_date(&self) -> NaiveDate {
        let end_date = self.end_date();
        if self.end.time() == chrono::NaiveTime::MIN {
            end_date.pred_opt().unwrap_or(end_date)
        } else {
            end_date
        }
    }
}

/// Which bounds the direct (non-recurring) event filter uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WindowBounds {
    /// `[start, end)`, the same as generated occurrences.
    #[default]
    HalfOpen,
    /// `[start, end]`.
    Closed,
}

impl FromStr for WindowBounds {
    type Err = WindowError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "half-open" | "half_open" | "halfopen" => Ok(WindowBounds::HalfOpen),
            "closed" => Ok(WindowBounds::Closed),
            _ => Err(WindowError::UnknownBounds(value.to_string())),
        }
    }
}

impl fmt::Display for WindowBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowBounds::HalfOpen => write!(f, "half-open"),
            WindowBounds::Closed => write!(f, "closed"),
        }
    }
}

/// A partial update to a stored event. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub location: Option<Option<String>>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub timezone: Option<String>,
    pub all_day: Option<bool>,
    /// `Some(None)` turns a recurring parent back into a standalone event.
    pub recurrence_config: Option<Option<RecurrenceConfig>>,
    /// Replaces only the end fields of the existing recurrence config.
    pub termination: Option<Termination>,
    pub status: Option<EventStatus>,
}

impl EventPatch {
    /// A patch that only rewrites the series termination.
    pub fn terminate(end: Termination) -> Self {
        Self {
            termination: Some(end),
            ..Self::default()
        }
    }

    /// Returns true if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies the patch to `record` in place.
    pub fn apply(&self, record: &mut EventRecord) {
        if let Some(title) = &self.title {
            record.title = title.clone();
        }
        if let Some(description) = &self.description {
            record.description = description.clone();
        }
        if let Some(location) = &self.location {
            record.location = location.clone();
        }
        if let Some(start) = self.start {
            record.start = start;
        }
        if let Some(end) = self.end {
            record.end = end;
        }
        if let Some(timezone) = &self.timezone {
            record.timezone = timezone.clone();
        }
        if let Some(all_day) = self.all_day {
            record.all_day = all_day;
        }
        if let Some(config) = &self.recurrence_config {
            record.is_recurring_parent = config.is_some();
            record.recurrence_config = config.clone();
        }
        if let Some(end) = self.termination {
            if let Some(config) = record.recurrence_config.as_mut() {
                *config = config.with_termination(end);
            }
        }
        if let Some(status) = self.status {
            record.status = status;
        }
    }
}

/// What kind of mutation an audit record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Updated,
    DeletedSingle,
    DeletedThisAndFuture,
    DeletedSeries,
}

/// A fire-and-forget record of a completed mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub action: AuditAction,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub recorded_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(action: AuditAction, event: &EventRecord) -> Self {
        Self {
            action,
            event_id: event.id,
            user_id: event.user_id,
            recorded_at: Utc::now(),
        }
    }
}
