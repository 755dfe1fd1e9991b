//! Calendar arithmetic in an event's own time zone.

use chrono::{DateTime, Datelike, LocalResult, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

/// Resolves an IANA zone name, falling back to UTC for unknown names.
pub fn resolve_zone(name: &str) -> Tz {
    name.parse::<Tz>().unwrap_or(Tz::UTC)
}

/// Returns the calendar date of an instant in the given zone.
pub fn local_date(instant: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    instant.with_timezone(tz).date_naive()
}

/// Converts a wall-clock time in `tz` to an absolute instant.
///
/// Ambiguous times (DST fold) resolve to the earlier instant. Times that do
/// not exist (DST gap) are pushed forward by one hour.
pub fn resolve_local(tz: &Tz, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    let resolved = match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => {
            let shifted = local.checked_add_signed(TimeDelta::hours(1))?;
            tz.from_local_datetime(&shifted).earliest()
        }
    };
    resolved.map(|dt| dt.with_timezone(&Utc))
}

/// Returns the number of days in the given month.
pub fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }?;
    first_of_next.pred_opt().map(|d| d.day())
}

/// Adds calendar months, clamping the day to the end of the target month.
///
/// `2024-01-31 + 1 month` is `2024-02-29`; `2023-01-31 + 1 month` is
/// `2023-02-28`.
pub fn add_months_clamped(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let total = i64::from(date.year())
        .checked_mul(12)?
        .checked_add(i64::from(date.month0()))?
        .checked_add(months)?;
    let year = i32::try_from(total.div_euclid(12)).ok()?;
    let month = u32::try_from(total.rem_euclid(12)).ok()? + 1;
    let day = date.day().min(last_day_of_month(year, month)?);
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Whole calendar months from `from` to `to`, ignoring the day of month.
pub(crate) fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    let from_index = i64::from(from.year()) * 12 + i64::from(from.month0());
    let to_index = i64::from(to.year()) * 12 + i64::from(to.month0());
    to_index - from_index
}
