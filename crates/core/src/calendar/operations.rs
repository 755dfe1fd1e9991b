use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use super::error::EventError;
use super::types::{CalendarItem, EventRecord};
use crate::recurrence::{local_date, resolve_zone, Termination};
use crate::storage::{TimeWindow, WindowBounds};

/// Splits records into `(standalone, recurring_parents)`, preserving order.
///
/// Materialized children of a series count as standalone.
pub fn partition_events(records: Vec<EventRecord>) -> (Vec<EventRecord>, Vec<EventRecord>) {
    let (parents, standalone) = records.into_iter().partition(EventRecord::is_recurring);
    (standalone, parents)
}

/// Keeps the standalone records whose start falls inside `window`.
pub fn filter_standalone_in_window(
    records: Vec<EventRecord>,
    window: &TimeWindow,
    bounds: WindowBounds,
) -> Vec<EventRecord> {
    records
        .into_iter()
        .filter(|record| match bounds {
            WindowBounds::HalfOpen => window.contains(record.start),
            WindowBounds::Closed => window.contains_closed(record.start),
        })
        .collect()
}

/// Sorts items by start instant. Ties keep their relative order.
pub fn sort_items_by_start(items: &mut [CalendarItem]) {
    items.sort_by_key(CalendarItem::start);
}

/// The last date a series may still produce occurrences on when it is cut
/// at `occurrence_start`: the day before that occurrence, in the record's zone.
pub fn truncation_date(record: &EventRecord, occurrence_start: DateTime<Utc>) -> Option<NaiveDate> {
    let tz = resolve_zone(&record.timezone);
    local_date(occurrence_start, &tz).pred_opt()
}

/// The termination a series gets when it is cut after `until`.
///
/// An earlier `On` date is kept. `After(n)` is replaced, which assumes the cut
/// targets an occurrence that exists.
pub fn truncate_termination(current: Termination, until: NaiveDate) -> Termination {
    match current {
        Termination::On(date) if date <= until => Termination::On(date),
        _ => Termination::On(until),
    }
}

/// Validates an event before it is created or updated.
pub fn validate_event(record: &EventRecord) -> Result<(), EventError> {
    if record.title.trim().is_empty() {
        return Err(EventError::EmptyTitle);
    }
    if record.title.chars().count() > 200 {
        return Err(EventError::TitleTooLong);
    }
    if record.end < record.start {
        return Err(EventError::InvalidTimeRange);
    }
    if record.timezone.parse::<Tz>().is_err() {
        return Err(EventError::UnknownTimezone(record.timezone.clone()));
    }
    record.recurrence_rule()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{EventTemplate, Occurrence};
    use crate::recurrence::{Pattern, RecurrenceConfig, RecurrenceRule, RuleError};
    use chrono::{TimeDelta, TimeZone};
    use uuid::Uuid;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    fn event(title: &str, start: DateTime<Utc>) -> EventRecord {
        EventRecord::new(Uuid::nil(), title, start, start + TimeDelta::hours(1))
    }

    fn occurrence(start: DateTime<Utc>) -> Occurrence {
        EventTemplate::from_record(&event("Series", start), None).occurrence(0, start)
    }

    #[test]
    fn test_partition_events() {
        let records = vec![
            event("One", at(1, 9)),
            event("Two", at(2, 9)).with_recurrence(RecurrenceRule::new(Pattern::Weekdays)),
            event("Three", at(3, 9)).with_parent(Uuid::new_v4()),
        ];

        let (standalone, parents) = partition_events(records);

        let titles: Vec<&str> = standalone.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["One", "Three"]);
        assert_eq!(parents.len(), 1);
        assert_eq!(parents[0].title, "Two");
    }

    #[test]
    fn test_filter_standalone_half_open_excludes_end() {
        let window = TimeWindow::new(at(1, 0), at(3, 0)).unwrap();
        let records = vec![
            event("Before", at(1, 0) - TimeDelta::seconds(1)),
            event("AtStart", at(1, 0)),
            event("Inside", at(2, 12)),
            event("AtEnd", at(3, 0)),
        ];

        let kept = filter_standalone_in_window(records, &window, WindowBounds::HalfOpen);

        let titles: Vec<&str> = kept.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["AtStart", "Inside"]);
    }

    #[test]
    fn test_filter_standalone_closed_includes_end() {
        let window = TimeWindow::new(at(1, 0), at(3, 0)).unwrap();
        let records = vec![event("AtStart", at(1, 0)), event("AtEnd", at(3, 0))];

        let kept = filter_standalone_in_window(records, &window, WindowBounds::Closed);

        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_sort_items_is_stable() {
        let first = CalendarItem::Standalone(event("First", at(2, 9)));
        let second = CalendarItem::Occurrence(occurrence(at(2, 9)));
        let earliest = CalendarItem::Standalone(event("Earliest", at(1, 9)));
        let mut items = vec![first.clone(), second.clone(), earliest.clone()];

        sort_items_by_start(&mut items);

        assert_eq!(items, vec![earliest, first, second]);
    }

    #[test]
    fn test_truncation_date_is_day_before_occurrence() {
        let record = event("Weekly", at(1, 9));
        assert_eq!(
            truncation_date(&record, at(15, 9)),
            NaiveDate::from_ymd_opt(2024, 1, 14)
        );
    }

    #[test]
    fn test_truncation_date_uses_event_zone() {
        // 2024-01-15 03:00Z is still the 14th in Los Angeles.
        let record = event("Late call", at(1, 3)).with_timezone("America/Los_Angeles");
        assert_eq!(
            truncation_date(&record, at(15, 3)),
            NaiveDate::from_ymd_opt(2024, 1, 13)
        );
    }

    #[test]
    fn test_truncate_termination() {
        let until = NaiveDate::from_ymd_opt(2024, 1, 14).unwrap();
        let earlier = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let later = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        assert_eq!(truncate_termination(Termination::Never, until), Termination::On(until));
        assert_eq!(
            truncate_termination(Termination::On(earlier), until),
            Termination::On(earlier)
        );
        assert_eq!(truncate_termination(Termination::On(later), until), Termination::On(until));
        assert_eq!(
            truncate_termination(Termination::After(std::num::NonZeroU32::MIN), until),
            Termination::On(until)
        );
    }

    #[test]
    fn test_validate_event() {
        assert_eq!(validate_event(&event("Ok", at(1, 9))), Ok(()));
        assert_eq!(validate_event(&event("  ", at(1, 9))), Err(EventError::EmptyTitle));
        assert_eq!(
            validate_event(&event(&"x".repeat(201), at(1, 9))),
            Err(EventError::TitleTooLong)
        );

        let mut backwards = event("Backwards", at(2, 9));
        backwards.end = at(1, 9);
        assert_eq!(validate_event(&backwards), Err(EventError::InvalidTimeRange));

        let zoned = event("Zoned", at(1, 9)).with_timezone("Mars/Olympus");
        assert_eq!(
            validate_event(&zoned),
            Err(EventError::UnknownTimezone("Mars/Olympus".to_string()))
        );
    }

    #[test]
    fn test_validate_event_rejects_bad_rule() {
        let config: RecurrenceConfig =
            serde_json::from_str(r#"{"type": "daily", "end_type": "after"}"#).unwrap();
        let record = event("Broken", at(1, 9)).with_recurrence_config(config);

        assert_eq!(
            validate_event(&record),
            Err(EventError::InvalidRule(RuleError::MissingOccurrenceCount))
        );
    }
}
