//! Instance cache implementations.
//!
//! Concrete implementations of the cache traits defined in
//! `recurra_core::cache`:
//!
//! - [`MemoryInstanceStore`]: LRU + TTL store with a per-template index
//! - [`CachedExpander`]: cache-aside [`InstanceCache`] over any store
//! - [`NoopInstanceCache`]: regenerates on every call (TTL = 0)

mod expander;
mod memory;
mod noop;

pub use expander::CachedExpander;
pub use memory::MemoryInstanceStore;
pub use noop::NoopInstanceCache;
