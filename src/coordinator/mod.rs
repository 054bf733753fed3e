//! Periodic coordination: update attempt followed by a gated purge

pub mod gate;
pub mod provider;
pub mod run;
pub mod update;

pub use gate::{should_purge, should_update};
pub use provider::{RedbStorageProvider, StorageProvider};
pub use run::{CoordinationReport, CoordinatorState, PurgeOutcome, RunCoordinator};
pub use update::{CommandUpdate, NoUpdate, UpdateOutcome, UpdateRoutine, UpdateStatus};
