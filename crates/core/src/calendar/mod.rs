mod error;
mod operations;
mod types;

pub use error::EventError;
pub use operations::{
    filter_standalone_in_window, partition_events, sort_items_by_start, truncate_termination,
    truncation_date, validate_event,
};
pub use types::{CalendarItem, EventRecord, EventStatus, EventTemplate, Holiday, Occurrence};
