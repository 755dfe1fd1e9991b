//! Expansion of a recurring template into concrete occurrences.
//!
//! Generation is pure: the same template and window always produce the same
//! list. It never fails; degenerate inputs produce short or empty lists.

use std::ops::ControlFlow;

use chrono::{Datelike, NaiveDateTime, TimeDelta};
use chrono_tz::Tz;

use crate::calendar::{EventTemplate, Occurrence};
use crate::storage::TimeWindow;

use super::arithmetic::{add_months_clamped, months_between, resolve_local, resolve_zone};
use super::types::{Pattern, Termination, WeekdaySet};

/// Default cap on emitted occurrences per generation call.
pub const DEFAULT_MAX_OCCURRENCES: usize = 500;

/// Default cap on loop iterations per generation call.
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// Hard bounds enforced on every generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationLimits {
    pub max_occurrences: usize,
    pub max_iterations: usize,
}

impl Default for GenerationLimits {
    fn default() -> Self {
        Self {
            max_occurrences: DEFAULT_MAX_OCCURRENCES,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// How the walk advances between candidates.
#[derive(Debug, Clone, Copy)]
enum Cadence {
    /// Fixed calendar-day step, computed from the anchor.
    Days(u32),
    /// Fixed calendar-month step, computed from the anchor with end-of-month clamping.
    Months(u32),
    /// Next day whose weekday is in the set.
    OnWeekdays(WeekdaySet),
}

impl Cadence {
    fn of(pattern: &Pattern) -> Self {
        match *pattern {
            Pattern::Daily { interval } => Cadence::Days(interval.get()),
            Pattern::Weekly { interval } => Cadence::Days(interval.get().saturating_mul(7)),
            Pattern::Monthly { interval } => Cadence::Months(interval.get()),
            Pattern::Yearly { interval } => Cadence::Months(interval.get().saturating_mul(12)),
            Pattern::Weekdays => Cadence::OnWeekdays(WeekdaySet::MONDAY_TO_FRIDAY),
            Pattern::Custom {
                weekdays: Some(set),
                ..
            } => Cadence::OnWeekdays(set),
            Pattern::Custom {
                interval,
                weekdays: None,
                ..
            } => Cadence::Days(interval.get()),
        }
    }
}

/// Expands `template` into the occurrences starting inside `window`.
///
/// The walk starts at the template's own start and advances in the
/// template's time zone, so occurrences keep their wall-clock time across
/// DST changes. Every occurrence lasts exactly as long as the template.
///
/// Returns an empty list for non-recurring templates. The result is ordered
/// by start and never exceeds `limits.max_occurrences`; reaching that length
/// means more occurrences may exist in the window.
pub fn generate(
    template: &EventTemplate,
    window: &TimeWindow,
    limits: &GenerationLimits,
) -> Vec<Occurrence> {
    let Some(rule) = template.rule.as_ref() else {
        return Vec::new();
    };

    let walk = Walk::new(template, window, limits, rule.end);
    match Cadence::of(&rule.pattern) {
        Cadence::Days(days) => walk.fixed(Step::Days(days)),
        Cadence::Months(months) => walk.fixed(Step::Months(months)),
        Cadence::OnWeekdays(set) => walk.on_weekdays(set),
    }
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Days(u32),
    Months(u32),
}

impl Step {
    /// The `position`-th candidate after `anchor`, computed directly so that
    /// month clamping never drifts (Jan 31, Feb 29, Mar 31, ...).
    fn nth(self, anchor: NaiveDateTime, position: u64) -> Option<NaiveDateTime> {
        match self {
            Step::Days(days) => {
                let offset = i64::try_from(position)
                    .ok()?
                    .checked_mul(i64::from(days))?;
                anchor.checked_add_signed(TimeDelta::try_days(offset)?)
            }
            Step::Months(months) => {
                let offset = i64::try_from(position)
                    .ok()?
                    .checked_mul(i64::from(months))?;
                add_months_clamped(anchor.date(), offset).map(|d| d.and_time(anchor.time()))
            }
        }
    }

    /// Number of whole steps between the anchor and `target`, keeping one
    /// step of slack for time-of-day and zone offsets.
    fn steps_before(self, anchor: NaiveDateTime, target: NaiveDateTime) -> u64 {
        let (elapsed, size) = match self {
            Step::Days(days) => ((target.date() - anchor.date()).num_days(), days),
            Step::Months(months) => (months_between(anchor.date(), target.date()), months),
        };
        let steps = elapsed / i64::from(size.max(1));
        u64::try_from(steps - 1).unwrap_or(0)
    }
}

struct Walk<'a> {
    template: &'a EventTemplate,
    window: &'a TimeWindow,
    limits: &'a GenerationLimits,
    end: Termination,
    tz: Tz,
    anchor: NaiveDateTime,
    iterations: usize,
    out: Vec<Occurrence>,
}

impl<'a> Walk<'a> {
    fn new(
        template: &'a EventTemplate,
        window: &'a TimeWindow,
        limits: &'a GenerationLimits,
        end: Termination,
    ) -> Self {
        let tz = resolve_zone(&template.timezone);
        let anchor = template.start.with_timezone(&tz).naive_local();
        Self {
            template,
            window,
            limits,
            end,
            tz,
            anchor,
            iterations: 0,
            out: Vec::new(),
        }
    }

    /// The window start as wall-clock time in the template's zone.
    fn window_start_local(&self) -> NaiveDateTime {
        self.window.start.with_timezone(&self.tz).naive_local()
    }

    /// Checks one candidate, emitting it if it starts inside the window.
    fn visit(&mut self, position: u64, local: NaiveDateTime) -> ControlFlow<()> {
        if self.iterations >= self.limits.max_iterations
            || self.out.len() >= self.limits.max_occurrences
        {
            return ControlFlow::Break(());
        }
        match self.end {
            Termination::After(count) if position >= u64::from(count.get()) => {
                return ControlFlow::Break(());
            }
            Termination::On(until) if local.date() > until => {
                return ControlFlow::Break(());
            }
            _ => {}
        }
        self.iterations += 1;

        let Some(start) = resolve_local(&self.tz, local) else {
            return ControlFlow::Continue(());
        };
        if start >= self.window.end {
            return ControlFlow::Break(());
        }
        if start >= self.window.start {
            self.out.push(self.template.occurrence(position, start));
        }
        ControlFlow::Continue(())
    }

    fn fixed(mut self, step: Step) -> Vec<Occurrence> {
        let mut position = step.steps_before(self.anchor, self.window_start_local());

        while let Some(local) = step.nth(self.anchor, position) {
            if self.visit(position, local).is_break() {
                break;
            }
            position += 1;
        }
        self.out
    }

    fn on_weekdays(mut self, set: WeekdaySet) -> Vec<Occurrence> {
        // The anchor is always a candidate, even when its weekday is not in the set.
        if self.visit(0, self.anchor).is_break() {
            return self.out;
        }

        let mut local = next_on_weekdays(self.anchor, set);
        let mut position: u64 = 1;

        // From a day in the set, every seven days advance exactly `set.count()` positions.
        if set.contains(local.weekday()) {
            let days = (self.window_start_local().date() - local.date()).num_days();
            let weeks = days / 7 - 1;
            if weeks > 0 {
                if let Some(skipped) = TimeDelta::try_weeks(weeks)
                    .and_then(|delta| local.checked_add_signed(delta))
                {
                    local = skipped;
                    position += u64::try_from(weeks).unwrap_or(0) * u64::from(set.count());
                }
            }
        }

        while self.visit(position, local).is_continue() {
            local = next_on_weekdays(local, set);
            position += 1;
        }
        self.out
    }
}

/// Advances day by day (at most seven times) to the next weekday in `set`,
/// falling back to the same weekday one week later.
fn next_on_weekdays(from: NaiveDateTime, set: WeekdaySet) -> NaiveDateTime {
    let mut candidate = from;
    for _ in 0..7 {
        match candidate.checked_add_signed(TimeDelta::days(1)) {
            Some(next) => candidate = next,
            None => return from,
        }
        if set.contains(candidate.weekday()) {
            return candidate;
        }
    }
    from.checked_add_signed(TimeDelta::weeks(1)).unwrap_or(from)
}
