//! In-memory repository implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use recurra_core::calendar::{EventRecord, EventStatus, Holiday};
use recurra_core::storage::{
    EventPatch, EventRepository, HolidayRepository, RepositoryError, Result,
};

/// In-memory storage backend.
///
/// Uses HashMaps wrapped in `Arc<RwLock<_>>` for thread-safe access. Every
/// mutation holds the write lock for its whole read-modify-write, so partial
/// updates are atomic.
#[derive(Debug, Clone)]
pub struct InMemoryRepository {
    events: Arc<RwLock<HashMap<Uuid, EventRecord>>>,
    holidays: Arc<RwLock<HashMap<Uuid, Holiday>>>,
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRepository {
    /// Creates a new empty in-memory repository.
    pub fn new() -> Self {
        Self {
            events: Arc::new(RwLock::new(HashMap::new())),
            holidays: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Adds or replaces a holiday.
    pub async fn insert_holiday(&self, holiday: Holiday) {
        let mut holidays = self.holidays.write().await;
        holidays.insert(holiday.id, holiday);
    }

    /// Returns every stored event referencing `parent_id`, deleted or not.
    pub async fn children_of(&self, parent_id: Uuid) -> Vec<EventRecord> {
        let events = self.events.read().await;
        events
            .values()
            .filter(|e| e.parent_event_id == Some(parent_id))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventRepository for InMemoryRepository {
    async fn get_event(&self, id: Uuid) -> Result<Option<EventRecord>> {
        let events = self.events.read().await;
        Ok(events.get(&id).cloned())
    }

    async fn fetch_active_for_user(
        &self,
        user_id: Uuid,
        starts_before: DateTime<Utc>,
    ) -> Result<Vec<EventRecord>> {
        let events = self.events.read().await;
        let mut found: Vec<EventRecord> = events
            .values()
            .filter(|e| e.user_id == user_id)
            .filter(|e| e.is_active())
            .filter(|e| e.start <= starts_before)
            .cloned()
            .collect();
        // HashMap order is arbitrary; keep results deterministic.
        found.sort_by_key(|e| (e.start, e.id));
        Ok(found)
    }

    async fn create_event(&self, event: &EventRecord) -> Result<()> {
        let mut events = self.events.write().await;
        if events.contains_key(&event.id) {
            return Err(RepositoryError::AlreadyExists {
                entity_type: "Event",
                id: event.id.to_string(),
            });
        }
        events.insert(event.id, event.clone());
        Ok(())
    }

    async fn update_event(&self, id: Uuid, patch: &EventPatch) -> Result<EventRecord> {
        let mut events = self.events.write().await;
        let event = events
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::event_not_found(id))?;
        patch.apply(event);
        Ok(event.clone())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<()> {
        let mut events = self.events.write().await;
        let event = events
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::event_not_found(id))?;
        event.is_deleted = true;
        event.status = EventStatus::Cancelled;
        Ok(())
    }

    async fn soft_delete_series(&self, parent_id: Uuid) -> Result<usize> {
        let mut events = self.events.write().await;
        if !events.contains_key(&parent_id) {
            return Err(RepositoryError::event_not_found(parent_id));
        }

        let mut affected = 0;
        for event in events
            .values_mut()
            .filter(|e| e.id == parent_id || e.parent_event_id == Some(parent_id))
        {
            event.is_deleted = true;
            event.status = EventStatus::Cancelled;
            affected += 1;
        }
        Ok(affected)
    }
}

#[async_trait]
impl HolidayRepository for InMemoryRepository {
    async fn holidays_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Holiday>> {
        let holidays = self.holidays.read().await;
        let mut found: Vec<Holiday> = holidays
            .values()
            .filter(|h| h.is_active)
            .filter(|h| start <= h.date && h.date <= end)
            .cloned()
            .collect();
        found.sort_by_key(|h| (h.date, h.id));
        Ok(found)
    }
}
