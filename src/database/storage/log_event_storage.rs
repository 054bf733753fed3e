//! Log event storage operations
//!
//! The events collection is the application's audit trail. Every component
//! appends to it; only the retention engine removes from it.

use super::tables::{LOG_EVENTS_TABLE, LOG_EVENT_SEQUENCE_KEY, STATS_TABLE};
use super::transactions::TransactionUtils;
use crate::database::{
	error::DatabaseResult,
	types::{LogEvent, TimeRange},
};
use redb::{Database, ReadableTable, ReadableTableMetadata};
use std::sync::Arc;

/// Append a log event, returning its assigned id
pub async fn insert_log_event(database: &Arc<Database>, event: &LogEvent) -> DatabaseResult<u64> {
	TransactionUtils::with_write_txn(database, |txn| {
		let mut events_table = txn.open_table(LOG_EVENTS_TABLE)?;
		let mut stats_table = txn.open_table(STATS_TABLE)?;
		let id = TransactionUtils::allocate_sequence(&mut stats_table, LOG_EVENT_SEQUENCE_KEY, 1)?;

		let mut record = event.clone();
		record.id = id;
		let record_bytes = TransactionUtils::serialize(&record)?;
		events_table.insert(
			TransactionUtils::time_key(record.created_at, id),
			record_bytes.as_slice(),
		)?;
		Ok(id)
	})
}

/// Log events created inside `range`, oldest first
pub async fn query_log_events(
	database: &Arc<Database>, range: &TimeRange,
) -> DatabaseResult<Vec<LogEvent>> {
	TransactionUtils::with_read_txn(database, |txn| {
		let events_table = txn.open_table(LOG_EVENTS_TABLE)?;
		TransactionUtils::decode_range(&events_table, range)
	})
}

/// Newest log event of the given category, if any
pub async fn last_log_event(
	database: &Arc<Database>, category: &str,
) -> DatabaseResult<Option<LogEvent>> {
	TransactionUtils::with_read_txn(database, |txn| {
		let events_table = txn.open_table(LOG_EVENTS_TABLE)?;
		for entry in events_table.iter()?.rev() {
			let (_key, value) = entry?;
			let event: LogEvent = TransactionUtils::deserialize(value.value())?;
			if event.category == category {
				return Ok(Some(event));
			}
		}
		Ok(None)
	})
}

/// Delete every log event created inside `range`; all or nothing
pub async fn delete_log_events(database: &Arc<Database>, range: &TimeRange) -> DatabaseResult<usize> {
	TransactionUtils::with_write_txn(database, |txn| {
		let mut events_table = txn.open_table(LOG_EVENTS_TABLE)?;
		TransactionUtils::delete_range(&mut events_table, range)
	})
}

pub async fn count_log_events(database: &Arc<Database>) -> DatabaseResult<u64> {
	TransactionUtils::with_read_txn(database, |txn| {
		let events_table = txn.open_table(LOG_EVENTS_TABLE)?;
		Ok(events_table.len()?)
	})
}
