//! Store accessor for the impact archive
//!
//! Persists lightning impacts, the application event log and the purge
//! history in a single `redb` embedded database. The store carries no
//! business logic; it offers time-range queries, transactional deletes and
//! purge-record bookkeeping to the retention engine.

pub mod config;
pub mod error;
pub mod storage;
pub mod types;

pub use config::DatabaseConfig;
pub use error::{DatabaseError, DatabaseResult};
pub use storage::{ArchiveStorage, RedbStorage};
pub use types::{
	ArchiveStats, Collection, Impact, LogEvent, PurgeMode, PurgeRunRecord, TimeRange,
};
