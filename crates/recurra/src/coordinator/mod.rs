//! Request-level orchestration over the repositories and the instance cache.
//!
//! - [`RangeQueryCoordinator`]: merges standalone events, expanded
//!   occurrences and holidays for one window
//! - [`SeriesMutationCoordinator`]: writes events and keeps the cache
//!   consistent with them

mod range;
mod series;

#[cfg(test)]
mod fixtures;

pub use range::{RangeQueryCoordinator, RangeQueryResult};
pub use series::{DeleteOutcome, DeleteScope, MutationError, SeriesMutationCoordinator};
