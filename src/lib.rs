mod config;
mod error;
mod retry;

pub mod coordinator;
pub mod database;
pub mod retention;

pub use config::{AppConfig, RetentionSettings, UpdateSettings};
pub use coordinator::{
	CommandUpdate, CoordinationReport, CoordinatorState, NoUpdate, PurgeOutcome, RedbStorageProvider,
	RunCoordinator, StorageProvider, UpdateOutcome, UpdateRoutine, UpdateStatus,
};
pub use database::{
	ArchiveStats, ArchiveStorage, Collection, DatabaseConfig, DatabaseError, Impact, LogEvent,
	PurgeMode, PurgeRunRecord, RedbStorage, TimeRange,
};
pub use error::{ArchiveError, Result};
pub use retention::{
	parse_timestamp, PurgeOrchestrator, PurgeResult, PurgeWindow, RetentionEngine, RetentionPolicy,
};
pub use retry::{RetryConfig, RetryConfigBuilder, RetryManager};
