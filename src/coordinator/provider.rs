//! Scoped store acquisition
//!
//! The coordinator opens the store for the duration of one step and drops it
//! afterwards, so a crashed or failed step never keeps the file locked.

use crate::database::{ArchiveStorage, DatabaseConfig, DatabaseResult, RedbStorage};

#[async_trait::async_trait]
pub trait StorageProvider: Send + Sync {
	type Storage: ArchiveStorage;

	/// Open a fresh handle to the store
	async fn open(&self) -> DatabaseResult<Self::Storage>;
}

/// Opens the redb archive described by a [`DatabaseConfig`]
#[derive(Debug, Clone)]
pub struct RedbStorageProvider {
	config: DatabaseConfig,
}

impl RedbStorageProvider {
	pub fn new(config: DatabaseConfig) -> Self {
		Self { config }
	}

	pub fn config(&self) -> &DatabaseConfig {
		&self.config
	}
}

#[async_trait::async_trait]
impl StorageProvider for RedbStorageProvider {
	type Storage = RedbStorage;

	async fn open(&self) -> DatabaseResult<RedbStorage> {
		RedbStorage::new(self.config.clone()).await
	}
}
