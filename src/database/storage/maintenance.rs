//! Maintenance and statistics operations

use crate::database::{error::DatabaseResult, types::ArchiveStats};
use redb::Database;
use std::sync::Arc;
use tracing::debug;

/// Row counts for both collections plus purge bookkeeping
pub async fn get_database_stats(database: &Arc<Database>) -> DatabaseResult<ArchiveStats> {
	Ok(ArchiveStats {
		total_impacts: super::impact_storage::count_impacts(database).await?,
		total_log_events: super::log_event_storage::count_log_events(database).await?,
		purge_runs: super::purge_run_storage::count_purge_runs(database).await?,
		last_purge: super::purge_run_storage::read_last_purge_record(database).await?,
	})
}

/// Reclaim space freed by deletions.
///
/// redb needs exclusive access to compact; when another handle shares the
/// database the call is skipped and reports `false`.
pub async fn compact_database(database: &mut Arc<Database>) -> DatabaseResult<bool> {
	match Arc::get_mut(database) {
		Some(database) => {
			let compacted = database.compact()?;
			debug!(compacted, "Database compaction finished");
			Ok(compacted)
		}
		None => {
			debug!("Database handle is shared, skipping compaction");
			Ok(false)
		}
	}
}
