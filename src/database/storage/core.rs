//! Core archive storage trait and implementation
//!
//! This module defines the store accessor used by the retention engine and
//! provides the primary RedbStorage implementation that coordinates all
//! table modules.

use crate::database::{
	config::DatabaseConfig,
	error::DatabaseResult,
	types::{ArchiveStats, Collection, Impact, LogEvent, PurgeRunRecord, TimeRange},
};
use redb::Database;
use std::sync::Arc;
use tracing::debug;

/// Main trait for archive storage operations
#[async_trait::async_trait]
pub trait ArchiveStorage: Send + Sync {
	/// Initialize the database
	async fn initialize(&mut self) -> DatabaseResult<()>;

	/// Insert impacts, returning their assigned ids
	async fn insert_impacts(&mut self, impacts: &[Impact]) -> DatabaseResult<Vec<u64>>;

	/// Append a log event, returning its assigned id
	async fn insert_log_event(&mut self, event: &LogEvent) -> DatabaseResult<u64>;

	/// Impacts detected inside the range
	async fn query_impacts(&self, range: &TimeRange) -> DatabaseResult<Vec<Impact>>;

	/// Log events created inside the range
	async fn query_log_events(&self, range: &TimeRange) -> DatabaseResult<Vec<LogEvent>>;

	/// Newest log event of a category
	async fn last_log_event(&self, category: &str) -> DatabaseResult<Option<LogEvent>>;

	/// Delete every row of `collection` inside the range.
	///
	/// Runs as one transaction: either all matching rows are removed and the
	/// count is exact, or nothing is removed and the error is returned.
	async fn delete(&mut self, collection: Collection, range: &TimeRange) -> DatabaseResult<usize>;

	/// Number of rows in a collection
	async fn count(&self, collection: Collection) -> DatabaseResult<u64>;

	/// Newest purge record, if any purge was ever attempted
	async fn read_last_purge_record(&self) -> DatabaseResult<Option<PurgeRunRecord>>;

	/// Persist the outcome of one purge attempt
	async fn write_purge_record(&mut self, record: &PurgeRunRecord) -> DatabaseResult<()>;

	/// Up to `limit` purge records, newest first
	async fn purge_history(&self, limit: usize) -> DatabaseResult<Vec<PurgeRunRecord>>;

	/// Get database statistics
	async fn get_stats(&self) -> DatabaseResult<ArchiveStats>;

	/// Compact database, returning whether any space was reclaimed
	async fn compact(&mut self) -> DatabaseResult<bool>;
}

/// Primary ReDB implementation that coordinates all storage modules
pub struct RedbStorage {
	database: Arc<Database>,
	config: DatabaseConfig,
}

impl RedbStorage {
	/// Open (or create) the archive file and make sure every table exists
	pub async fn new(config: DatabaseConfig) -> DatabaseResult<Self> {
		if let Some(parent) = config.path.parent() {
			if !parent.as_os_str().is_empty() && !parent.exists() {
				std::fs::create_dir_all(parent)?;
			}
		}
		let database = Database::create(&config.path)?;
		let database = Arc::new(database);
		debug!(path = %config.path.display(), "Opened archive database");

		let mut storage = Self { database, config };
		storage.initialize().await?;
		Ok(storage)
	}

	/// Get reference to the configuration
	pub fn config(&self) -> &DatabaseConfig {
		&self.config
	}
}

#[async_trait::async_trait]
impl ArchiveStorage for RedbStorage {
	async fn initialize(&mut self) -> DatabaseResult<()> {
		super::tables::initialize_tables(&self.database).await
	}

	async fn insert_impacts(&mut self, impacts: &[Impact]) -> DatabaseResult<Vec<u64>> {
		super::impact_storage::insert_impacts(&self.database, impacts).await
	}

	async fn insert_log_event(&mut self, event: &LogEvent) -> DatabaseResult<u64> {
		super::log_event_storage::insert_log_event(&self.database, event).await
	}

	async fn query_impacts(&self, range: &TimeRange) -> DatabaseResult<Vec<Impact>> {
		super::impact_storage::query_impacts(&self.database, range).await
	}

	async fn query_log_events(&self, range: &TimeRange) -> DatabaseResult<Vec<LogEvent>> {
		super::log_event_storage::query_log_events(&self.database, range).await
	}

	async fn last_log_event(&self, category: &str) -> DatabaseResult<Option<LogEvent>> {
		super::log_event_storage::last_log_event(&self.database, category).await
	}

	async fn delete(&mut self, collection: Collection, range: &TimeRange) -> DatabaseResult<usize> {
		match collection {
			Collection::Impacts => super::impact_storage::delete_impacts(&self.database, range).await,
			Collection::LogEvents => {
				super::log_event_storage::delete_log_events(&self.database, range).await
			}
		}
	}

	async fn count(&self, collection: Collection) -> DatabaseResult<u64> {
		match collection {
			Collection::Impacts => super::impact_storage::count_impacts(&self.database).await,
			Collection::LogEvents => super::log_event_storage::count_log_events(&self.database).await,
		}
	}

	async fn read_last_purge_record(&self) -> DatabaseResult<Option<PurgeRunRecord>> {
		super::purge_run_storage::read_last_purge_record(&self.database).await
	}

	async fn write_purge_record(&mut self, record: &PurgeRunRecord) -> DatabaseResult<()> {
		super::purge_run_storage::write_purge_record(&self.database, record).await
	}

	async fn purge_history(&self, limit: usize) -> DatabaseResult<Vec<PurgeRunRecord>> {
		super::purge_run_storage::purge_history(&self.database, limit).await
	}

	async fn get_stats(&self) -> DatabaseResult<ArchiveStats> {
		super::maintenance::get_database_stats(&self.database).await
	}

	async fn compact(&mut self) -> DatabaseResult<bool> {
		super::maintenance::compact_database(&mut self.database).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::database::types::PurgeMode;
	use chrono::{DateTime, Duration, TimeZone, Utc};
	use tempfile::tempdir;

	async fn create_test_storage(dir: &tempfile::TempDir, test_name: &str) -> RedbStorage {
		let config = DatabaseConfig::with_path(dir.path().join(format!("{test_name}.redb")));
		RedbStorage::new(config).await.unwrap()
	}

	fn base() -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2025, 6, 26, 18, 0, 0).unwrap()
	}

	#[tokio::test]
	async fn test_storage_initialization() {
		let temp_dir = tempdir().unwrap();
		let storage = create_test_storage(&temp_dir, "init").await;
		let stats = storage.get_stats().await.unwrap();
		assert_eq!(stats.total_impacts, 0);
		assert_eq!(stats.total_log_events, 0);
		assert!(stats.last_purge.is_none());
	}

	#[tokio::test]
	async fn test_creates_missing_parent_directory() {
		let temp_dir = tempdir().unwrap();
		let path = temp_dir.path().join("nested").join("data").join("archive.redb");
		let storage = RedbStorage::new(DatabaseConfig::with_path(path.clone())).await.unwrap();
		assert_eq!(storage.config().path, path);
		assert!(path.exists());
	}

	#[tokio::test]
	async fn test_insert_assigns_sequential_ids() {
		let temp_dir = tempdir().unwrap();
		let mut storage = create_test_storage(&temp_dir, "ids").await;

		let first = storage
			.insert_impacts(&[Impact::new(base(), 45.0, 5.0), Impact::new(base(), 45.1, 5.1)])
			.await
			.unwrap();
		let second = storage.insert_impacts(&[Impact::new(base(), 45.2, 5.2)]).await.unwrap();

		assert_eq!(first, vec![0, 1]);
		assert_eq!(second, vec![2]);
		assert_eq!(storage.count(Collection::Impacts).await.unwrap(), 3);
	}

	#[tokio::test]
	async fn test_query_and_delete_respect_half_open_range() {
		let temp_dir = tempdir().unwrap();
		let mut storage = create_test_storage(&temp_dir, "range").await;
		let impacts: Vec<Impact> = (0..5)
			.map(|day| Impact::new(base() - Duration::days(day), 44.0, 4.0).with_mcg(120))
			.collect();
		storage.insert_impacts(&impacts).await.unwrap();

		let range = TimeRange::new(Some(base() - Duration::days(3)), base() - Duration::days(1));
		let found = storage.query_impacts(&range).await.unwrap();
		assert_eq!(found.len(), 2);
		assert!(found.iter().all(|impact| range.contains(impact.detected_at)));
		assert!(found[0].detected_at < found[1].detected_at);

		let removed = storage.delete(Collection::Impacts, &range).await.unwrap();
		assert_eq!(removed, 2);
		assert_eq!(storage.count(Collection::Impacts).await.unwrap(), 3);
		assert!(storage.query_impacts(&range).await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_last_log_event_by_category() {
		let temp_dir = tempdir().unwrap();
		let mut storage = create_test_storage(&temp_dir, "events").await;
		for hours in [30, 20, 10] {
			let event = LogEvent::new(base() - Duration::hours(hours), "update_succeeded", "ok");
			storage.insert_log_event(&event).await.unwrap();
		}
		storage
			.insert_log_event(&LogEvent::new(base(), "update_failed", "network down"))
			.await
			.unwrap();

		let last = storage.last_log_event("update_succeeded").await.unwrap().unwrap();
		assert_eq!(last.created_at, base() - Duration::hours(10));
		assert!(storage.last_log_event("purge_succeeded").await.unwrap().is_none());
	}

	#[tokio::test]
	async fn test_purge_records_are_append_only() {
		let temp_dir = tempdir().unwrap();
		let mut storage = create_test_storage(&temp_dir, "runs").await;
		let range = TimeRange::before(base() - Duration::days(15));

		let failed = PurgeRunRecord::failure(
			PurgeMode::Automatic,
			&range,
			false,
			"store unreachable".to_string(),
			base() - Duration::days(1),
		);
		let succeeded = PurgeRunRecord::success(PurgeMode::Automatic, &range, false, 4, 1, base());
		storage.write_purge_record(&failed).await.unwrap();
		storage.write_purge_record(&succeeded).await.unwrap();

		let last = storage.read_last_purge_record().await.unwrap().unwrap();
		assert_eq!(last, succeeded);

		let history = storage.purge_history(10).await.unwrap();
		assert_eq!(history, vec![succeeded, failed]);
		assert_eq!(storage.get_stats().await.unwrap().purge_runs, 2);
	}

	#[tokio::test]
	async fn test_records_survive_reopen() {
		let temp_dir = tempdir().unwrap();
		let path = temp_dir.path().join("durable.redb");
		let record = PurgeRunRecord::success(
			PurgeMode::Manual,
			&TimeRange::new(Some(base() - Duration::days(20)), base() - Duration::days(5)),
			true,
			7,
			0,
			base(),
		);
		{
			let mut storage = RedbStorage::new(DatabaseConfig::with_path(path.clone())).await.unwrap();
			storage.write_purge_record(&record).await.unwrap();
		}
		let storage = RedbStorage::new(DatabaseConfig::with_path(path)).await.unwrap();
		assert_eq!(storage.read_last_purge_record().await.unwrap(), Some(record));
	}

	#[tokio::test]
	async fn test_compact_after_deletes() {
		let temp_dir = tempdir().unwrap();
		let mut storage = create_test_storage(&temp_dir, "compact").await;
		let impacts: Vec<Impact> =
			(0..200).map(|i| Impact::new(base() - Duration::minutes(i), 43.0, 3.0)).collect();
		storage.insert_impacts(&impacts).await.unwrap();
		storage.delete(Collection::Impacts, &TimeRange::all()).await.unwrap();

		assert!(storage.compact().await.is_ok());

		let _shared = storage.database.clone();
		assert!(!storage.compact().await.unwrap());
	}
}
