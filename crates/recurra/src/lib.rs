//! Recurring calendar event expansion.
//!
//! The pure model and generator live in `recurra_core`. This crate provides
//! the stateful pieces: the instance cache, in-memory collaborators, the
//! range query and series mutation coordinators, and their wiring.

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod mock_data;
pub mod state;
pub mod storage;
