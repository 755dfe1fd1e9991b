mod error;
mod keys;
mod traits;

pub use error::{CacheError, Result};
pub use keys::InstanceKey;
pub use traits::{FillTicket, InstanceCache, InstanceStore, Lookup};
