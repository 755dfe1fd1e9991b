use std::sync::Arc;

use uuid::Uuid;

use recurra_core::cache::{FillTicket, InstanceCache};
use recurra_core::calendar::{EventTemplate, Occurrence};
use recurra_core::recurrence::{generate, GenerationLimits};
use recurra_core::storage::TimeWindow;

/// An [`InstanceCache`] that stores nothing and regenerates on every call.
#[derive(Debug, Clone, Default)]
pub struct NoopInstanceCache {
    limits: GenerationLimits,
}

impl NoopInstanceCache {
    pub fn new(limits: GenerationLimits) -> Self {
        Self { limits }
    }
}

impl InstanceCache for NoopInstanceCache {
    fn begin_read(&self) -> Option<FillTicket> {
        None
    }

    fn get_or_generate(
        &self,
        template: &EventTemplate,
        window: &TimeWindow,
        _ticket: Option<FillTicket>,
    ) -> Arc<Vec<Occurrence>> {
        Arc::new(generate(template, window, &self.limits))
    }

    fn invalidate(&self, _template_id: Uuid) {}
}
