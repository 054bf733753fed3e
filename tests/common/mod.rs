//! Common test utilities for the lightning-archive library

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use lightning_archive::database::{
	ArchiveStorage, DatabaseConfig, Impact, LogEvent, RedbStorage,
};
use tempfile::TempDir;

/// Reference instant used by the purge scenarios
pub fn scenario_now() -> DateTime<Utc> {
	utc(2025, 6, 26, 18)
}

pub fn utc(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
	Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
}

/// Database config pointing into a fresh temporary directory
pub fn temp_database() -> (TempDir, DatabaseConfig) {
	let temp_dir = TempDir::new().expect("Failed to create temp directory");
	let config = DatabaseConfig::with_path(temp_dir.path().join("archive.redb"));
	(temp_dir, config)
}

/// Open a store and insert one impact per timestamp
pub async fn seed_impacts(config: &DatabaseConfig, detected: &[DateTime<Utc>]) -> Vec<u64> {
	let mut storage = RedbStorage::new(config.clone()).await.expect("Failed to open storage");
	let impacts: Vec<Impact> = detected
		.iter()
		.enumerate()
		.map(|(i, at)| Impact::new(*at, 43.0 + i as f64 * 0.01, 1.4).with_mcg(90))
		.collect();
	storage.insert_impacts(&impacts).await.expect("Failed to insert impacts")
}

/// Open a store and append one event per timestamp
pub async fn seed_events(config: &DatabaseConfig, created: &[DateTime<Utc>], category: &str) {
	let mut storage = RedbStorage::new(config.clone()).await.expect("Failed to open storage");
	for at in created {
		storage
			.insert_log_event(&LogEvent::new(*at, category, "seeded"))
			.await
			.expect("Failed to insert event");
	}
}
