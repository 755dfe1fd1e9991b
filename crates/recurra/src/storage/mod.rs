//! Collaborator implementations.
//!
//! This module provides in-process implementations of the storage traits
//! defined in `recurra_core::storage`: an in-memory event and holiday
//! repository and two audit sinks.

mod audit;
pub mod inmemory;

pub use audit::{InMemoryAuditLog, TracingAuditSink};
pub use inmemory::InMemoryRepository;
