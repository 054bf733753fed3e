//! Table definitions for ReDB storage
//!
//! Impacts and log events are keyed by `(timestamp_micros, id)` so that every
//! time-window query or delete is a single ordered range scan.

use crate::database::error::DatabaseResult;
use redb::{Database, TableDefinition};
use std::sync::Arc;

/// Time-ordered key: microseconds since the epoch, then the record id
pub type TimeKey = (i64, u64);

/// Lightning impacts (detected_at, id) -> serialized Impact
pub const IMPACTS_TABLE: TableDefinition<TimeKey, &[u8]> = TableDefinition::new("impacts");

/// Application log events (created_at, id) -> serialized LogEvent
pub const LOG_EVENTS_TABLE: TableDefinition<TimeKey, &[u8]> = TableDefinition::new("log_events");

/// Append-only purge history (sequence -> serialized PurgeRunRecord)
pub const PURGE_RUNS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("purge_runs");

/// Counters and sequences
///
/// Key format:
///   - b"impact_sequence"     => next impact id (u64)
///   - b"log_event_sequence"  => next log event id (u64)
///   - b"purge_run_sequence"  => next purge history key (u64)
///
/// Sequences are read and advanced inside the same write transaction as the insert.
pub const STATS_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("stats");

pub const IMPACT_SEQUENCE_KEY: &[u8] = b"impact_sequence";
pub const LOG_EVENT_SEQUENCE_KEY: &[u8] = b"log_event_sequence";
pub const PURGE_RUN_SEQUENCE_KEY: &[u8] = b"purge_run_sequence";

/// Initialize all database tables
pub async fn initialize_tables(database: &Arc<Database>) -> DatabaseResult<()> {
	let write_txn = database.begin_write()?;
	{
		let _impacts_table = write_txn.open_table(IMPACTS_TABLE)?;
		let _log_events_table = write_txn.open_table(LOG_EVENTS_TABLE)?;
		let _purge_runs_table = write_txn.open_table(PURGE_RUNS_TABLE)?;
		let _stats_table = write_txn.open_table(STATS_TABLE)?;
	}
	write_txn.commit()?;
	Ok(())
}
