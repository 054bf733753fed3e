//! Transaction management utilities
//!
//! Common transaction patterns shared by every table module: scoped
//! read/write transactions, bincode encoding and sequence allocation.

use super::tables::TimeKey;
use crate::database::error::{DatabaseError, DatabaseResult};
use crate::database::types::TimeRange;
use redb::{Database, ReadTransaction, ReadableTable, Table, WriteTransaction};
use std::sync::Arc;

/// Transaction helper utilities
pub struct TransactionUtils;

impl TransactionUtils {
	/// Execute a read operation with proper error handling
	pub fn with_read_txn<F, R>(database: &Arc<Database>, operation: F) -> DatabaseResult<R>
	where F: FnOnce(&ReadTransaction) -> DatabaseResult<R> {
		let read_txn = database.begin_read()?;
		operation(&read_txn)
	}

	/// Execute a write operation and commit it only if it succeeded.
	///
	/// On error the transaction is dropped uncommitted, which redb aborts, so
	/// none of the operation's changes become visible.
	pub fn with_write_txn<F, R>(database: &Arc<Database>, operation: F) -> DatabaseResult<R>
	where F: FnOnce(&WriteTransaction) -> DatabaseResult<R> {
		let write_txn = database.begin_write()?;
		let result = operation(&write_txn)?;
		write_txn.commit()?;
		Ok(result)
	}

	/// Serialize data with consistent error handling
	pub fn serialize<T>(data: &T) -> DatabaseResult<Vec<u8>>
	where T: serde::Serialize {
		bincode::serialize(data).map_err(|e| DatabaseError::Serialization(e.to_string()))
	}

	/// Deserialize data with consistent error handling
	pub fn deserialize<T>(bytes: &[u8]) -> DatabaseResult<T>
	where T: serde::de::DeserializeOwned {
		bincode::deserialize(bytes).map_err(|e| DatabaseError::Deserialization(e.to_string()))
	}

	/// Reserve `count` consecutive values of a sequence, returning the first one
	pub fn allocate_sequence(
		stats_table: &mut Table<'_, &'static [u8], &'static [u8]>, key: &[u8], count: u64,
	) -> DatabaseResult<u64> {
		let current = stats_table
			.get(key)?
			.map(|v| u64::from_le_bytes(v.value().try_into().unwrap_or([0u8; 8])))
			.unwrap_or(0);
		let next = current.saturating_add(count);
		stats_table.insert(key, &next.to_le_bytes()[..])?;
		Ok(current)
	}

	/// Microsecond timestamp used as the leading component of time keys
	pub fn time_key(timestamp: chrono::DateTime<chrono::Utc>, id: u64) -> TimeKey {
		(timestamp.timestamp_micros(), id)
	}

	/// Decode every record of a time-keyed table whose timestamp lies in `range`
	pub fn decode_range<T, R>(table: &R, range: &TimeRange) -> DatabaseResult<Vec<T>>
	where
		T: serde::de::DeserializeOwned,
		R: ReadableTable<TimeKey, &'static [u8]>,
	{
		let (start, end) = range.micros_bounds();
		if start >= end {
			return Ok(Vec::new());
		}
		let mut records = Vec::new();
		// (end, 0) is the smallest key at `end`, so the upper bound stays exclusive
		for entry in table.range((start, 0u64)..(end, 0u64))? {
			let (_key, value) = entry?;
			records.push(Self::deserialize(value.value())?);
		}
		Ok(records)
	}

	/// Remove every row of a time-keyed table whose timestamp lies in `range`
	pub fn delete_range(
		table: &mut Table<'_, TimeKey, &'static [u8]>, range: &TimeRange,
	) -> DatabaseResult<usize> {
		let (start, end) = range.micros_bounds();
		if start >= end {
			return Ok(0);
		}
		let keys = table
			.range((start, 0u64)..(end, 0u64))?
			.map(|entry| entry.map(|(key, _)| key.value()))
			.collect::<Result<Vec<TimeKey>, redb::StorageError>>()?;
		for key in &keys {
			table.remove(key)?;
		}
		Ok(keys.len())
	}
}
