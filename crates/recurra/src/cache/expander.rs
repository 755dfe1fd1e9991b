//! Cache-aside expansion of recurring templates.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use recurra_core::cache::{FillTicket, InstanceCache, InstanceKey, InstanceStore, Lookup};
use recurra_core::calendar::{EventTemplate, Occurrence};
use recurra_core::recurrence::{generate, GenerationLimits};
use recurra_core::storage::TimeWindow;

/// [`InstanceCache`] backed by an [`InstanceStore`].
///
/// - **Reads**: look up the store first; on a miss generate and fill with
///   the ticket taken by [`InstanceCache::begin_read`].
/// - **Store errors**: logged and treated as a miss; the read never fails.
/// - **TTL of zero**: nothing is stored, every read regenerates.
pub struct CachedExpander<S>
where
    S: InstanceStore,
{
    store: Arc<S>,
    ttl: Duration,
    limits: GenerationLimits,
}

impl<S> CachedExpander<S>
where
    S: InstanceStore,
{
    /// Creates a new cached expander.
    ///
    /// # Arguments
    ///
    /// * `store` - Where generated lists are kept
    /// * `ttl` - Time-to-live for stored lists
    /// * `limits` - Caps applied to every generation call
    pub fn new(store: Arc<S>, ttl: Duration, limits: GenerationLimits) -> Self {
        Self { store, ttl, limits }
    }

    fn expand(&self, template: &EventTemplate, window: &TimeWindow) -> Arc<Vec<Occurrence>> {
        let occurrences = generate(template, window, &self.limits);
        if occurrences.len() >= self.limits.max_occurrences {
            tracing::debug!(
                template_id = %template.id,
                cap = self.limits.max_occurrences,
                "Occurrence cap reached, more occurrences may exist in window"
            );
        }
        Arc::new(occurrences)
    }
}

impl<S> InstanceCache for CachedExpander<S>
where
    S: InstanceStore,
{
    fn begin_read(&self) -> Option<FillTicket> {
        match self.store.ticket() {
            Ok(ticket) => Some(ticket),
            Err(err) => {
                tracing::warn!(error = %err, "Instance cache unavailable, read will not be cached");
                None
            }
        }
    }

    fn get_or_generate(
        &self,
        template: &EventTemplate,
        window: &TimeWindow,
        ticket: Option<FillTicket>,
    ) -> Arc<Vec<Occurrence>> {
        let key = InstanceKey::new(template.id, window);

        match self.store.lookup(&key) {
            Ok(Lookup::Hit(occurrences)) => {
                tracing::trace!(%key, count = occurrences.len(), "Cache hit for instances");
                return occurrences;
            }
            Ok(Lookup::Miss) => {
                tracing::trace!(%key, "Cache miss for instances");
            }
            Err(err) => {
                tracing::warn!(%key, error = %err, "Instance cache lookup failed, regenerating");
            }
        }

        let occurrences = self.expand(template, window);

        if let Some(ticket) = ticket.filter(|_| !self.ttl.is_zero()) {
            match self
                .store
                .fill(key, Arc::clone(&occurrences), self.ttl, ticket)
            {
                Ok(true) => {}
                Ok(false) => {
                    tracing::debug!(%key, "Discarded instances read before an invalidation");
                }
                Err(err) => {
                    tracing::warn!(%key, error = %err, "Failed to cache instances");
                }
            }
        }

        occurrences
    }

    fn invalidate(&self, template_id: Uuid) {
        match self.store.evict_template(template_id) {
            Ok(evicted) => {
                tracing::debug!(%template_id, evicted, "Invalidated cached instances");
            }
            // A store that cannot evict cannot serve lookups either, so reads
            // keep regenerating.
            Err(err) => {
                tracing::warn!(%template_id, error = %err, "Failed to invalidate cached instances");
            }
        }
    }
}
