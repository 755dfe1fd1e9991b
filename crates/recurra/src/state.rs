//! Engine wiring.
//!
//! [`Engine`] owns the collaborators shared by every request: the repository,
//! the instance cache and the two coordinators built over them. Which cache
//! backs it is decided by [`Config`].

use std::num::NonZeroUsize;
use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use recurra_core::cache::InstanceCache;

use crate::cache::{CachedExpander, MemoryInstanceStore, NoopInstanceCache};
use crate::config::Config;
use crate::coordinator::{MutationError, RangeQueryCoordinator, SeriesMutationCoordinator};
use crate::mock_data::{generate_mock_events, generate_mock_holidays};
use crate::storage::{InMemoryRepository, TracingAuditSink};

/// Shared engine state.
///
/// Cheap to clone; every field is reference counted.
#[derive(Clone)]
pub struct Engine {
    pub repository: Arc<InMemoryRepository>,
    pub cache: Arc<dyn InstanceCache>,
    pub queries: Arc<RangeQueryCoordinator>,
    pub mutations: Arc<SeriesMutationCoordinator>,
}

impl Engine {
    /// Creates an engine over an empty in-memory repository.
    pub fn new(config: &Config) -> Self {
        let repository = Arc::new(InMemoryRepository::new());
        let cache = Self::build_cache(config);

        let queries = RangeQueryCoordinator::new(
            repository.clone(),
            repository.clone(),
            cache.clone(),
            config.standalone_bounds,
        );
        let mutations = SeriesMutationCoordinator::new(
            repository.clone(),
            cache.clone(),
            Arc::new(TracingAuditSink),
        );

        Self {
            repository,
            cache,
            queries: Arc::new(queries),
            mutations: Arc::new(mutations),
        }
    }

    /// Creates an engine seeded with demo events for `user_id` around
    /// `center_date`, plus that year's holidays.
    pub async fn with_demo_data(
        config: &Config,
        user_id: Uuid,
        center_date: NaiveDate,
    ) -> Result<Self, MutationError> {
        let engine = Self::new(config);

        for event in generate_mock_events(user_id, center_date) {
            engine.mutations.create_event(event).await?;
        }
        for holiday in generate_mock_holidays(center_date) {
            engine.repository.insert_holiday(holiday).await;
        }

        tracing::info!(%user_id, %center_date, "Seeded demo data");
        Ok(engine)
    }

    fn build_cache(config: &Config) -> Arc<dyn InstanceCache> {
        let capacity = NonZeroUsize::new(config.cache_max_entries);
        match capacity {
            Some(capacity) if config.cache_ttl_seconds > 0 => {
                tracing::debug!(
                    ttl_seconds = config.cache_ttl_seconds,
                    max_entries = config.cache_max_entries,
                    "Using in-memory instance cache"
                );
                let store = Arc::new(MemoryInstanceStore::new(capacity));
                Arc::new(CachedExpander::new(store, config.cache_ttl(), config.limits()))
            }
            _ => {
                tracing::debug!("Instance cache disabled, expanding on every read");
                Arc::new(NoopInstanceCache::new(config.limits()))
            }
        }
    }
}
