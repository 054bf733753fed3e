//! Storage module for archive operations

pub mod core;
pub mod impact_storage;
pub mod log_event_storage;
pub mod maintenance;
pub mod purge_run_storage;
pub mod tables;
pub mod transactions;

// Re-export the main trait and implementation
pub use self::core::{ArchiveStorage, RedbStorage};
pub use tables::*;
