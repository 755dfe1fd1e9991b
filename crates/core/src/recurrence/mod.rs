//! Recurrence rules and the instance generator.
//!
//! A persisted event carries a loosely-typed [`RecurrenceConfig`]. It is
//! validated into a [`RecurrenceRule`] at the CRUD boundary, and expanded
//! into concrete [`Occurrence`](crate::calendar::Occurrence)s by [`generate`].

mod arithmetic;
mod config;
mod error;
mod generator;
mod types;

pub use arithmetic::{
    add_months_clamped, last_day_of_month, local_date, resolve_local, resolve_zone,
};
pub use config::RecurrenceConfig;
pub use error::{Result, RuleError};
pub use generator::{
    generate, GenerationLimits, DEFAULT_MAX_ITERATIONS, DEFAULT_MAX_OCCURRENCES,
};
pub use types::{Pattern, RecurrenceRule, RepeatUnit, Termination, WeekdaySet};
