mod error;
mod traits;
mod types;

pub use error::{RepositoryError, Result, WindowError};
pub use traits::{AuditSink, EventRepository, HolidayRepository};
pub use types::{AuditAction, AuditRecord, EventPatch, TimeWindow, WindowBounds};
