//! Impact storage operations
//!
//! Insertion, time-window queries and transactional deletes for lightning
//! impacts.

use super::tables::{IMPACTS_TABLE, IMPACT_SEQUENCE_KEY, STATS_TABLE};
use super::transactions::TransactionUtils;
use crate::database::{
	error::DatabaseResult,
	types::{Impact, TimeRange},
};
use redb::{Database, ReadableTableMetadata};
use std::sync::Arc;

/// Insert a batch of impacts in one transaction, assigning consecutive ids
pub async fn insert_impacts(database: &Arc<Database>, impacts: &[Impact]) -> DatabaseResult<Vec<u64>> {
	if impacts.is_empty() {
		return Ok(Vec::new());
	}
	TransactionUtils::with_write_txn(database, |txn| {
		let mut impacts_table = txn.open_table(IMPACTS_TABLE)?;
		let mut stats_table = txn.open_table(STATS_TABLE)?;
		let first_id = TransactionUtils::allocate_sequence(
			&mut stats_table,
			IMPACT_SEQUENCE_KEY,
			impacts.len() as u64,
		)?;

		let mut ids = Vec::with_capacity(impacts.len());
		for (offset, impact) in impacts.iter().enumerate() {
			let mut record = impact.clone();
			record.id = first_id + offset as u64;
			let record_bytes = TransactionUtils::serialize(&record)?;
			impacts_table.insert(
				TransactionUtils::time_key(record.detected_at, record.id),
				record_bytes.as_slice(),
			)?;
			ids.push(record.id);
		}
		Ok(ids)
	})
}

/// Impacts detected inside `range`, oldest first
pub async fn query_impacts(database: &Arc<Database>, range: &TimeRange) -> DatabaseResult<Vec<Impact>> {
	TransactionUtils::with_read_txn(database, |txn| {
		let impacts_table = txn.open_table(IMPACTS_TABLE)?;
		TransactionUtils::decode_range(&impacts_table, range)
	})
}

/// Delete every impact detected inside `range`; all or nothing
pub async fn delete_impacts(database: &Arc<Database>, range: &TimeRange) -> DatabaseResult<usize> {
	TransactionUtils::with_write_txn(database, |txn| {
		let mut impacts_table = txn.open_table(IMPACTS_TABLE)?;
		TransactionUtils::delete_range(&mut impacts_table, range)
	})
}

pub async fn count_impacts(database: &Arc<Database>) -> DatabaseResult<u64> {
	TransactionUtils::with_read_txn(database, |txn| {
		let impacts_table = txn.open_table(IMPACTS_TABLE)?;
		Ok(impacts_table.len()?)
	})
}
