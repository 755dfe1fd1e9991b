//! Shared collaborators for coordinator tests.

use std::num::{NonZeroU32, NonZeroUsize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeDelta, TimeZone, Utc};
use uuid::Uuid;

use recurra_core::cache::{FillTicket, InstanceCache};
use recurra_core::calendar::{EventRecord, EventTemplate, Holiday, Occurrence};
use recurra_core::recurrence::{GenerationLimits, RecurrenceRule};
use recurra_core::storage::{
    AuditRecord, AuditSink, EventPatch, EventRepository, HolidayRepository, RepositoryError,
    Result, TimeWindow, WindowBounds,
};

use super::{DeleteScope, RangeQueryCoordinator, SeriesMutationCoordinator};
use crate::cache::{CachedExpander, MemoryInstanceStore, NoopInstanceCache};
use crate::storage::{InMemoryAuditLog, InMemoryRepository};

pub fn at(month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, month, day, hour, minute, 0).unwrap()
}

pub fn every(n: u32) -> NonZeroU32 {
    NonZeroU32::new(n).unwrap()
}

pub fn year_2024() -> TimeWindow {
    TimeWindow::from_dates(
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
    )
    .unwrap()
}

pub fn expanding_cache() -> Arc<dyn InstanceCache> {
    let store = Arc::new(MemoryInstanceStore::new(NonZeroUsize::new(100).unwrap()));
    Arc::new(CachedExpander::new(
        store,
        Duration::from_secs(60),
        GenerationLimits::default(),
    ))
}

/// In-memory repository whose reads and writes can be switched to fail.
#[derive(Default)]
pub struct FlakyRepository {
    inner: InMemoryRepository,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FlakyRepository {
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Stores `event` directly, bypassing any coordinator.
    pub async fn create_event_now(&self, event: &EventRecord) {
        self.inner.create_event(event).await.unwrap();
    }

    pub async fn insert_holiday(&self, holiday: Holiday) {
        self.inner.insert_holiday(holiday).await;
    }

    fn check_read(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RepositoryError::ConnectionFailed("reads disabled".to_string()));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::QueryFailed("writes disabled".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl EventRepository for FlakyRepository {
    async fn get_event(&self, id: Uuid) -> Result<Option<EventRecord>> {
        self.check_read()?;
        self.inner.get_event(id).await
    }

    async fn fetch_active_for_user(
        &self,
        user_id: Uuid,
        starts_before: DateTime<Utc>,
    ) -> Result<Vec<EventRecord>> {
        self.check_read()?;
        self.inner.fetch_active_for_user(user_id, starts_before).await
    }

    async fn create_event(&self, event: &EventRecord) -> Result<()> {
        self.check_write()?;
        self.inner.create_event(event).await
    }

    async fn update_event(&self, id: Uuid, patch: &EventPatch) -> Result<EventRecord> {
        self.check_write()?;
        self.inner.update_event(id, patch).await
    }

    async fn soft_delete(&self, id: Uuid) -> Result<()> {
        self.check_write()?;
        self.inner.soft_delete(id).await
    }

    async fn soft_delete_series(&self, parent_id: Uuid) -> Result<usize> {
        self.check_write()?;
        self.inner.soft_delete_series(parent_id).await
    }
}

#[async_trait]
impl HolidayRepository for FlakyRepository {
    async fn holidays_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Holiday>> {
        self.inner.holidays_between(start, end).await
    }
}

pub struct FailingHolidays;

#[async_trait]
impl HolidayRepository for FailingHolidays {
    async fn holidays_between(&self, _start: NaiveDate, _end: NaiveDate) -> Result<Vec<Holiday>> {
        Err(RepositoryError::QueryFailed("holidays unavailable".to_string()))
    }
}

pub struct FailingAudit;

#[async_trait]
impl AuditSink for FailingAudit {
    async fn record(&self, _entry: &AuditRecord) -> Result<()> {
        Err(RepositoryError::ConnectionFailed("audit unavailable".to_string()))
    }
}

/// Event reads that run one delete after taking their snapshot and before
/// returning it, the way a mutation can land while a range query is between
/// its repository read and its cache fill.
pub struct DeleteDuringRead {
    inner: Arc<FlakyRepository>,
    mutations: Arc<SeriesMutationCoordinator>,
    pending: Mutex<Option<(Uuid, DeleteScope)>>,
}

impl DeleteDuringRead {
    pub fn new(harness: &Harness, id: Uuid, scope: DeleteScope) -> Self {
        Self {
            inner: harness.repository.clone(),
            mutations: harness.mutations.clone(),
            pending: Mutex::new(Some((id, scope))),
        }
    }

    /// Returns true once the delete has run.
    pub fn fired(&self) -> bool {
        self.pending.lock().unwrap().is_none()
    }
}

#[async_trait]
impl EventRepository for DeleteDuringRead {
    async fn get_event(&self, id: Uuid) -> Result<Option<EventRecord>> {
        self.inner.get_event(id).await
    }

    async fn fetch_active_for_user(
        &self,
        user_id: Uuid,
        starts_before: DateTime<Utc>,
    ) -> Result<Vec<EventRecord>> {
        let snapshot = self.inner.fetch_active_for_user(user_id, starts_before).await?;
        let pending = self.pending.lock().unwrap().take();
        if let Some((id, scope)) = pending {
            self.mutations.delete(id, scope).await.unwrap();
        }
        Ok(snapshot)
    }

    async fn create_event(&self, event: &EventRecord) -> Result<()> {
        self.inner.create_event(event).await
    }

    async fn update_event(&self, id: Uuid, patch: &EventPatch) -> Result<EventRecord> {
        self.inner.update_event(id, patch).await
    }

    async fn soft_delete(&self, id: Uuid) -> Result<()> {
        self.inner.soft_delete(id).await
    }

    async fn soft_delete_series(&self, parent_id: Uuid) -> Result<usize> {
        self.inner.soft_delete_series(parent_id).await
    }
}

/// Delegating cache that remembers every invalidated template id.
pub struct RecordingCache {
    inner: Arc<dyn InstanceCache>,
    invalidated: Mutex<Vec<Uuid>>,
}

impl RecordingCache {
    pub fn new(inner: Arc<dyn InstanceCache>) -> Self {
        Self {
            inner,
            invalidated: Mutex::new(Vec::new()),
        }
    }

    pub fn invalidated(&self) -> Vec<Uuid> {
        self.invalidated.lock().unwrap().clone()
    }

    pub fn forget(&self) {
        self.invalidated.lock().unwrap().clear();
    }
}

impl InstanceCache for RecordingCache {
    fn begin_read(&self) -> Option<FillTicket> {
        self.inner.begin_read()
    }

    fn get_or_generate(
        &self,
        template: &EventTemplate,
        window: &TimeWindow,
        ticket: Option<FillTicket>,
    ) -> Arc<Vec<Occurrence>> {
        self.inner.get_or_generate(template, window, ticket)
    }

    fn invalidate(&self, template_id: Uuid) {
        self.invalidated.lock().unwrap().push(template_id);
        self.inner.invalidate(template_id);
    }
}

/// Both coordinators wired over one flaky repository.
pub struct Harness {
    pub repository: Arc<FlakyRepository>,
    pub cache: Arc<RecordingCache>,
    pub audit: InMemoryAuditLog,
    pub queries: RangeQueryCoordinator,
    pub mutations: Arc<SeriesMutationCoordinator>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_bounds(WindowBounds::HalfOpen)
    }

    pub fn with_bounds(bounds: WindowBounds) -> Self {
        Self::build(expanding_cache(), bounds)
    }

    pub fn uncached() -> Self {
        Self::build(
            Arc::new(NoopInstanceCache::default()),
            WindowBounds::HalfOpen,
        )
    }

    fn build(cache: Arc<dyn InstanceCache>, bounds: WindowBounds) -> Self {
        let repository = Arc::new(FlakyRepository::default());
        let cache = Arc::new(RecordingCache::new(cache));
        let audit = InMemoryAuditLog::new();
        let queries = RangeQueryCoordinator::new(
            repository.clone(),
            repository.clone(),
            cache.clone(),
            bounds,
        );
        let mutations = Arc::new(SeriesMutationCoordinator::new(
            repository.clone(),
            cache.clone(),
            Arc::new(audit.clone()),
        ));
        Self {
            repository,
            cache,
            audit,
            queries,
            mutations,
        }
    }

    /// Creates a series starting Monday 2024-01-01 09:00-09:30 UTC.
    pub async fn weekly_standup(&self, rule: RecurrenceRule) -> EventRecord {
        let start = at(1, 1, 9, 0);
        let end = start + TimeDelta::minutes(30);
        let event = EventRecord::new(Uuid::new_v4(), "Standup", start, end).with_recurrence(rule);
        self.create(event).await
    }

    /// Creates a one-hour standalone event.
    pub async fn standalone(&self, user_id: Uuid, start: DateTime<Utc>) -> EventRecord {
        let event = EventRecord::new(user_id, "Lunch", start, start + TimeDelta::hours(1));
        self.create(event).await
    }

    /// Stores a materialized child row of `parent` starting at `start`.
    pub async fn child_of(&self, parent: &EventRecord, start: DateTime<Utc>) -> EventRecord {
        let end = start + parent.duration();
        let child = EventRecord::new(parent.user_id, &parent.title, start, end)
            .with_parent(parent.id);
        self.repository.create_event_now(&child).await;
        child
    }

    async fn create(&self, event: EventRecord) -> EventRecord {
        let created = self.mutations.create_event(event).await.unwrap();
        self.cache.forget();
        created
    }
}
