//! Functional core of the recurrence engine.
//!
//! Nothing here performs I/O or holds shared state. Storage and caching are
//! expressed as traits; the `recurra` crate implements and wires them.

pub mod cache;
pub mod calendar;
pub mod recurrence;
pub mod storage;
