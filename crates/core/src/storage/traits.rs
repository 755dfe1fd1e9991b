use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::calendar::{EventRecord, Holiday};

use super::{AuditRecord, EventPatch, Result};

/// Persistence for event rows.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Gets an event by its ID, including deleted ones.
    async fn get_event(&self, id: Uuid) -> Result<Option<EventRecord>>;

    /// Gets all active, non-deleted events of a user starting at or before
    /// `starts_before`.
    ///
    /// This is a loose filter: recurring parents far in the past are included.
    async fn fetch_active_for_user(
        &self,
        user_id: Uuid,
        starts_before: DateTime<Utc>,
    ) -> Result<Vec<EventRecord>>;

    /// Creates a new event.
    async fn create_event(&self, event: &EventRecord) -> Result<()>;

    /// Applies a partial update atomically and returns the updated event.
    async fn update_event(&self, id: Uuid, patch: &EventPatch) -> Result<EventRecord>;

    /// Soft-deletes a single event: marks it deleted and cancelled.
    async fn soft_delete(&self, id: Uuid) -> Result<()>;

    /// Soft-deletes an event and every event whose `parent_event_id` points
    /// at it. Returns the number of rows affected.
    async fn soft_delete_series(&self, parent_id: Uuid) -> Result<usize>;
}

/// Read access to holidays.
#[async_trait]
pub trait HolidayRepository: Send + Sync {
    /// Gets active holidays whose date falls within `[start, end]`.
    async fn holidays_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Holiday>>;
}

/// Receives a record of every completed mutation.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: &AuditRecord) -> Result<()>;
}
