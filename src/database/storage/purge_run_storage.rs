//! Purge history storage
//!
//! Purge run records are the only state shared between independent
//! invocations. They are appended, never rewritten; the newest entry is the
//! "last purge".

use super::tables::{PURGE_RUNS_TABLE, PURGE_RUN_SEQUENCE_KEY, STATS_TABLE};
use super::transactions::TransactionUtils;
use crate::database::{error::DatabaseResult, types::PurgeRunRecord};
use redb::{Database, ReadableTable, ReadableTableMetadata};
use std::sync::Arc;

/// Append a purge record durably
pub async fn write_purge_record(database: &Arc<Database>, record: &PurgeRunRecord) -> DatabaseResult<()> {
	TransactionUtils::with_write_txn(database, |txn| {
		let mut runs_table = txn.open_table(PURGE_RUNS_TABLE)?;
		let mut stats_table = txn.open_table(STATS_TABLE)?;
		let sequence =
			TransactionUtils::allocate_sequence(&mut stats_table, PURGE_RUN_SEQUENCE_KEY, 1)?;
		let record_bytes = TransactionUtils::serialize(record)?;
		runs_table.insert(sequence, record_bytes.as_slice())?;
		Ok(())
	})
}

/// Most recently written purge record
pub async fn read_last_purge_record(database: &Arc<Database>) -> DatabaseResult<Option<PurgeRunRecord>> {
	TransactionUtils::with_read_txn(database, |txn| {
		let runs_table = txn.open_table(PURGE_RUNS_TABLE)?;
		let last = match runs_table.last()? {
			Some((_sequence, value)) => Some(TransactionUtils::deserialize(value.value())?),
			None => None,
		};
		Ok(last)
	})
}

/// Up to `limit` purge records, newest first
pub async fn purge_history(database: &Arc<Database>, limit: usize) -> DatabaseResult<Vec<PurgeRunRecord>> {
	TransactionUtils::with_read_txn(database, |txn| {
		let runs_table = txn.open_table(PURGE_RUNS_TABLE)?;
		let mut records = Vec::new();
		for entry in runs_table.iter()?.rev().take(limit) {
			let (_sequence, value) = entry?;
			records.push(TransactionUtils::deserialize(value.value())?);
		}
		Ok(records)
	})
}

pub async fn count_purge_runs(database: &Arc<Database>) -> DatabaseResult<u64> {
	TransactionUtils::with_read_txn(database, |txn| {
		let runs_table = txn.open_table(PURGE_RUNS_TABLE)?;
		Ok(runs_table.len()?)
	})
}
