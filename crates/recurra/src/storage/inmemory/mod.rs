//! In-memory storage backend.
//!
//! Stores events and holidays in HashMaps wrapped in `Arc<RwLock<_>>`. Data
//! is not persisted and is lost when the repository is dropped.
//!
//! # Example
//!
//! ```rust,ignore
//! use recurra::storage::inmemory::InMemoryRepository;
//!
//! let repo = InMemoryRepository::new();
//! repo.create_event(&event).await?;
//! ```

mod repository;

pub use repository::InMemoryRepository;
