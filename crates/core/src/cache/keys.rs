use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::storage::TimeWindow;

/// Identifies one cached expansion: a template and the exact window it was
/// generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceKey {
    pub template_id: Uuid,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
}

impl InstanceKey {
    pub fn new(template_id: Uuid, window: &TimeWindow) -> Self {
        Self {
            template_id,
            window_start: window.start,
            window_end: window.end,
        }
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "instances:{}:{}:{}",
            self.template_id,
            self.window_start.to_rfc3339(),
            self.window_end.to_rfc3339()
        )
    }
}
