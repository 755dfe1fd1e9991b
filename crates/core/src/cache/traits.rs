use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::calendar::{EventTemplate, Occurrence};
use crate::storage::TimeWindow;

use super::{InstanceKey, Result};

/// The store's invalidation epoch, taken when a read begins.
///
/// A fill presenting a ticket older than the latest invalidation is dropped,
/// so occurrences generated from templates loaded before an invalidation can
/// never be stored after it. Take the ticket before loading the templates,
/// not when the lookup misses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillTicket {
    epoch: u64,
}

impl FillTicket {
    pub fn new(epoch: u64) -> Self {
        Self { epoch }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// Result of a store lookup.
#[derive(Debug, Clone)]
pub enum Lookup {
    Hit(Arc<Vec<Occurrence>>),
    Miss,
}

/// Storage for generated occurrence lists.
///
/// Operations are synchronous: stores live in process memory and must not
/// be held across an `.await`.
pub trait InstanceStore: Send + Sync {
    /// Stamps the current invalidation epoch.
    fn ticket(&self) -> Result<FillTicket>;

    /// Looks up an unexpired entry.
    fn lookup(&self, key: &InstanceKey) -> Result<Lookup>;

    /// Stores `occurrences` under `key` for `ttl`.
    ///
    /// Returns `false` if an invalidation happened after `ticket` was taken;
    /// nothing is stored then.
    fn fill(
        &self,
        key: InstanceKey,
        occurrences: Arc<Vec<Occurrence>>,
        ttl: Duration,
        ticket: FillTicket,
    ) -> Result<bool>;

    /// Removes every entry for `template_id`, whatever its window.
    ///
    /// Returns the number of entries removed.
    fn evict_template(&self, template_id: Uuid) -> Result<usize>;
}

/// Memoized expansion of recurring templates.
pub trait InstanceCache: Send + Sync {
    /// Marks the start of a read. Call it before loading the templates that
    /// will be expanded and pass the result to every `get_or_generate` of
    /// that read.
    ///
    /// `None` means nothing generated during this read may be stored.
    fn begin_read(&self) -> Option<FillTicket>;

    /// Returns the occurrences of `template` in `window`, equal to what
    /// [`generate`](crate::recurrence::generate) returns for the same inputs.
    fn get_or_generate(
        &self,
        template: &EventTemplate,
        window: &TimeWindow,
        ticket: Option<FillTicket>,
    ) -> Arc<Vec<Occurrence>>;

    /// Drops every cached expansion of `template_id`. Once this returns, no
    /// later `get_or_generate` observes a value cached before the call, and
    /// reads that began before it can no longer store anything.
    fn invalidate(&self, template_id: Uuid);
}
