//! Writes to events and recurring series.
//!
//! Every mutation follows the same order: persist, invalidate the cached
//! expansions of the affected template, then record an audit entry. A failed
//! write returns before the cache is touched. A failed audit is only logged.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use recurra_core::cache::InstanceCache;
use recurra_core::calendar::{
    truncate_termination, truncation_date, validate_event, EventError, EventRecord,
};
use recurra_core::recurrence::RuleError;
use recurra_core::storage::{
    AuditAction, AuditRecord, AuditSink, EventPatch, EventRepository, RepositoryError,
};

/// Which part of a series a delete applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteScope {
    /// Only the targeted record. On a recurring parent this cancels the
    /// whole series.
    Single,
    /// The occurrence starting at `occurrence_start` and every later one.
    /// Degrades to [`DeleteScope::Single`] on records that do not recur.
    ThisAndFuture { occurrence_start: DateTime<Utc> },
    /// The parent and every record whose `parent_event_id` references it.
    All,
}

/// What a delete did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Cancelled,
    /// The series now ends on `until`; the parent is kept.
    Truncated { until: NaiveDate },
    SeriesDeleted { affected: usize },
}

/// Errors that can occur when mutating events.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MutationError {
    #[error("Event not found: {0}")]
    NotFound(Uuid),
    #[error("Invalid recurrence rule: {0}")]
    InvalidRule(RuleError),
    #[error("Invalid event: {0}")]
    InvalidEvent(EventError),
    #[error("Cannot cut series {event_id} at {occurrence_start}")]
    InvalidCutPoint {
        event_id: Uuid,
        occurrence_start: DateTime<Utc>,
    },
    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<EventError> for MutationError {
    fn from(err: EventError) -> Self {
        match err {
            EventError::InvalidRule(rule) => MutationError::InvalidRule(rule),
            other => MutationError::InvalidEvent(other),
        }
    }
}

/// Maps repository errors for event `id`, surfacing missing rows as
/// [`MutationError::NotFound`].
fn repository_error(id: Uuid) -> impl FnOnce(RepositoryError) -> MutationError {
    move |err| {
        if err.is_not_found() {
            MutationError::NotFound(id)
        } else {
            MutationError::Repository(err)
        }
    }
}

/// Applies creates, updates and scoped deletes, keeping the instance cache
/// consistent with what was written.
pub struct SeriesMutationCoordinator {
    events: Arc<dyn EventRepository>,
    cache: Arc<dyn InstanceCache>,
    audit: Arc<dyn AuditSink>,
}

impl SeriesMutationCoordinator {
    pub fn new(
        events: Arc<dyn EventRepository>,
        cache: Arc<dyn InstanceCache>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            events,
            cache,
            audit,
        }
    }

    /// Validates and stores a new event.
    pub async fn create_event(&self, event: EventRecord) -> Result<EventRecord, MutationError> {
        validate_event(&event)?;
        self.events
            .create_event(&event)
            .await
            .map_err(repository_error(event.id))?;

        self.cache.invalidate(event.id);
        self.audit(AuditAction::Created, &event).await;
        tracing::debug!(event_id = %event.id, recurring = event.is_recurring(), "Event created");
        Ok(event)
    }

    /// Validates and applies a partial update.
    pub async fn update_event(
        &self,
        id: Uuid,
        patch: EventPatch,
    ) -> Result<EventRecord, MutationError> {
        let mut candidate = self.load(id).await?;
        patch.apply(&mut candidate);
        validate_event(&candidate)?;

        let updated = self
            .events
            .update_event(id, &patch)
            .await
            .map_err(repository_error(id))?;

        self.cache.invalidate(id);
        self.audit(AuditAction::Updated, &updated).await;
        tracing::debug!(event_id = %id, "Event updated");
        Ok(updated)
    }

    /// Deletes an event, or part of a series, according to `scope`.
    pub async fn delete(
        &self,
        id: Uuid,
        scope: DeleteScope,
    ) -> Result<DeleteOutcome, MutationError> {
        let event = self.load(id).await?;

        match scope {
            DeleteScope::Single => self.delete_single(&event).await,
            DeleteScope::ThisAndFuture { occurrence_start } if event.is_recurring() => {
                self.truncate(&event, occurrence_start).await
            }
            DeleteScope::ThisAndFuture { .. } => {
                tracing::debug!(event_id = %id, "Not a recurring parent, deleting single event");
                self.delete_single(&event).await
            }
            DeleteScope::All => self.delete_series(&event).await,
        }
    }

    async fn delete_single(&self, event: &EventRecord) -> Result<DeleteOutcome, MutationError> {
        self.events
            .soft_delete(event.id)
            .await
            .map_err(repository_error(event.id))?;

        self.cache.invalidate(event.id);
        self.audit(AuditAction::DeletedSingle, event).await;
        tracing::debug!(event_id = %event.id, "Event cancelled");
        Ok(DeleteOutcome::Cancelled)
    }

    async fn truncate(
        &self,
        event: &EventRecord,
        occurrence_start: DateTime<Utc>,
    ) -> Result<DeleteOutcome, MutationError> {
        let until = truncation_date(event, occurrence_start).ok_or(
            MutationError::InvalidCutPoint {
                event_id: event.id,
                occurrence_start,
            },
        )?;
        let current = match event.recurrence_rule().map_err(MutationError::InvalidRule)? {
            Some(rule) => rule.end,
            // Stored config says "none": the record is read as standalone.
            None => return self.delete_single(event).await,
        };
        let end = truncate_termination(current, until);

        self.events
            .update_event(event.id, &EventPatch::terminate(end))
            .await
            .map_err(repository_error(event.id))?;

        self.cache.invalidate(event.id);
        self.audit(AuditAction::DeletedThisAndFuture, event).await;
        tracing::debug!(event_id = %event.id, %until, "Series truncated");
        Ok(DeleteOutcome::Truncated { until })
    }

    async fn delete_series(&self, event: &EventRecord) -> Result<DeleteOutcome, MutationError> {
        let affected = self
            .events
            .soft_delete_series(event.id)
            .await
            .map_err(repository_error(event.id))?;

        self.cache.invalidate(event.id);
        self.audit(AuditAction::DeletedSeries, event).await;
        tracing::debug!(event_id = %event.id, affected, "Series deleted");
        Ok(DeleteOutcome::SeriesDeleted { affected })
    }

    /// Loads a live event, treating deleted rows as missing.
    async fn load(&self, id: Uuid) -> Result<EventRecord, MutationError> {
        match self.events.get_event(id).await {
            Ok(Some(event)) if !event.is_deleted => Ok(event),
            Ok(_) => Err(MutationError::NotFound(id)),
            Err(err) => Err(repository_error(id)(err)),
        }
    }

    async fn audit(&self, action: AuditAction, event: &EventRecord) {
        let entry = AuditRecord::new(action, event);
        if let Err(err) = self.audit.record(&entry).await {
            tracing::warn!(
                event_id = %event.id,
                action = ?action,
                error = %err,
                "Failed to record audit entry"
            );
        }
    }
}
