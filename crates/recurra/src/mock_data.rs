use std::num::NonZeroU32;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use recurra_core::calendar::{EventRecord, Holiday};
use recurra_core::recurrence::{Pattern, RecurrenceRule, Termination};

/// Generates demo events for `user_id`, anchored around `center_date`.
///
/// Series start in the past so range queries around `center_date` show
/// expanded occurrences next to a few one-off events.
pub fn generate_mock_events(user_id: Uuid, center_date: NaiveDate) -> Vec<EventRecord> {
    let mut events = Vec::new();

    // Helper to create UTC instants
    let at = |date: NaiveDate, h: u32, m: u32| -> DateTime<Utc> {
        date.and_time(NaiveTime::from_hms_opt(h, m, 0).unwrap_or_default())
            .and_utc()
    };

    // Weekday standup, in New York time
    let standup_start = at(center_date - Duration::weeks(8), 14, 0);
    let standup = EventRecord::new(
        user_id,
        "Standup Meeting",
        standup_start,
        standup_start + Duration::minutes(15),
    )
    .with_timezone("America/New_York")
    .with_location("Zoom")
    .with_recurrence(RecurrenceRule::new(Pattern::Weekdays));

    // One standup moved to the afternoon, stored as a child row
    let moved_day = center_date + Duration::days(1);
    events.push(
        EventRecord::new(
            user_id,
            "Standup Meeting (moved)",
            at(moved_day, 18, 30),
            at(moved_day, 18, 45),
        )
        .with_location("Zoom")
        .with_parent(standup.id),
    );
    events.push(standup);

    // Fortnightly 1:1 that runs for six sessions
    let one_on_one_start = at(center_date - Duration::weeks(4), 16, 0);
    let fortnightly = Pattern::weekly(NonZeroU32::MIN.saturating_add(1));
    events.push(
        EventRecord::new(
            user_id,
            "1:1 with Alex",
            one_on_one_start,
            one_on_one_start + Duration::minutes(30),
        )
        .with_recurrence(
            RecurrenceRule::new(fortnightly)
                .with_end(Termination::After(NonZeroU32::MIN.saturating_add(5))),
        ),
    );

    // Month-end review anchored on January 31st
    let january_31 = NaiveDate::from_ymd_opt(center_date.year(), 1, 31).unwrap_or(center_date);
    events.push(
        EventRecord::new(
            user_id,
            "Month-end Review",
            at(january_31, 17, 0),
            at(january_31, 18, 0),
        )
        .with_description("Close the books")
        .with_recurrence(RecurrenceRule::new(Pattern::monthly(NonZeroU32::MIN))),
    );

    // Yearly all-day birthday
    let birthday = center_date + Duration::days(3) - Duration::days(365);
    events.push(
        EventRecord::new(
            user_id,
            "Sarah's Birthday",
            at(birthday, 0, 0),
            at(birthday + Duration::days(1), 0, 0),
        )
        .with_description("Don't forget the cake!")
        .all_day()
        .with_recurrence(RecurrenceRule::new(Pattern::yearly(NonZeroU32::MIN))),
    );

    // One-off events
    events.push(
        EventRecord::new(
            user_id,
            "Lunch with Alex",
            at(center_date, 12, 30),
            at(center_date, 13, 30),
        )
        .with_location("Cafe Bistro"),
    );

    let review_day = center_date + Duration::days(2);
    events.push(
        EventRecord::new(
            user_id,
            "Product Review",
            at(review_day, 15, 0),
            at(review_day, 16, 0),
        )
        .with_description("Q4 roadmap review"),
    );

    events
}

/// Generates the holidays of `center_date`'s year.
pub fn generate_mock_holidays(center_date: NaiveDate) -> Vec<Holiday> {
    let year = center_date.year();
    [
        ("New Year's Day", 1, 1),
        ("Labour Day", 5, 1),
        ("Independence Day", 7, 4),
        ("Christmas Day", 12, 25),
    ]
    .into_iter()
    .filter_map(|(name, month, day)| {
        NaiveDate::from_ymd_opt(year, month, day).map(|date| Holiday::new(name, date))
    })
    .collect()
}
