//! Range queries over a user's events.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use recurra_core::cache::InstanceCache;
use recurra_core::calendar::{
    filter_standalone_in_window, partition_events, sort_items_by_start, CalendarItem,
    EventRecord, EventTemplate, Holiday,
};
use recurra_core::recurrence::RecurrenceRule;
use recurra_core::storage::{EventRepository, HolidayRepository, Result, TimeWindow, WindowBounds};

/// Events and holidays for one window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RangeQueryResult {
    /// Standalone events, occurrences and (when not expanding) recurring
    /// parents, sorted by start.
    pub events: Vec<CalendarItem>,
    pub holidays: Vec<Holiday>,
}

impl RangeQueryResult {
    /// Iterates over the generated occurrences only.
    pub fn occurrences(&self) -> impl Iterator<Item = &recurra_core::calendar::Occurrence> {
        self.events.iter().filter_map(CalendarItem::as_occurrence)
    }
}

/// Answers "what is on this user's calendar between these instants".
pub struct RangeQueryCoordinator {
    events: Arc<dyn EventRepository>,
    holidays: Arc<dyn HolidayRepository>,
    cache: Arc<dyn InstanceCache>,
    standalone_bounds: WindowBounds,
}

impl RangeQueryCoordinator {
    pub fn new(
        events: Arc<dyn EventRepository>,
        holidays: Arc<dyn HolidayRepository>,
        cache: Arc<dyn InstanceCache>,
        standalone_bounds: WindowBounds,
    ) -> Self {
        Self {
            events,
            holidays,
            cache,
            standalone_bounds,
        }
    }

    /// Returns the user's events in `window` together with the holidays in it.
    ///
    /// Events and holidays are fetched concurrently. A failing event read is
    /// returned as an error; a failing holiday read only empties `holidays`.
    /// Holidays follow the same bounds as standalone events.
    ///
    /// With `include_recurring` unset, recurring parents are returned once,
    /// unexpanded.
    pub async fn get_events_in_range(
        &self,
        user_id: Uuid,
        window: TimeWindow,
        include_recurring: bool,
    ) -> Result<RangeQueryResult> {
        // Stamp the read before loading templates so a mutation that lands
        // while this read is in flight cannot have its invalidation undone.
        let ticket = self.cache.begin_read();
        let last_date = match self.standalone_bounds {
            WindowBounds::HalfOpen => window.last_date(),
            WindowBounds::Closed => window.end_date(),
        };
        let (records, holidays) = tokio::join!(
            self.events.fetch_active_for_user(user_id, window.end),
            self.holidays.holidays_between(window.start_date(), last_date),
        );
        let records = records?;
        let holidays = holidays.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "Failed to fetch holidays, returning none");
            Vec::new()
        });

        let (standalone, parents) = partition_events(records);
        let mut in_window = Vec::new();
        let mut events: Vec<CalendarItem> = Vec::new();

        if include_recurring {
            for parent in parents {
                match self.template_for(&parent) {
                    Some(template) => {
                        let occurrences = self.cache.get_or_generate(&template, &window, ticket);
                        events.extend(occurrences.iter().cloned().map(CalendarItem::Occurrence));
                    }
                    None => in_window.push(parent),
                }
            }
        } else {
            events.extend(parents.into_iter().map(CalendarItem::RecurringParent));
        }

        in_window.extend(standalone);
        let standalone = filter_standalone_in_window(in_window, &window, self.standalone_bounds);
        events.extend(standalone.into_iter().map(CalendarItem::Standalone));
        sort_items_by_start(&mut events);

        tracing::debug!(
            %user_id,
            start = %window.start,
            end = %window.end,
            events = events.len(),
            holidays = holidays.len(),
            "Range query"
        );

        Ok(RangeQueryResult { events, holidays })
    }

    /// Builds the expansion template for a parent.
    ///
    /// Returns `None` when the stored config says the event does not recur.
    /// Invalid configs fall back to a daily rule so reads never fail.
    fn template_for(&self, parent: &EventRecord) -> Option<EventTemplate> {
        let rule = match parent.recurrence_rule() {
            Ok(Some(rule)) => rule,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(
                    event_id = %parent.id,
                    error = %err,
                    "Invalid recurrence config, expanding with the fallback rule"
                );
                RecurrenceRule::fallback()
            }
        };
        Some(EventTemplate::from_record(parent, Some(rule)))
    }
}
