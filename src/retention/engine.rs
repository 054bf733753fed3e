//! Retention engine
//!
//! Decides which impacts and log events fall inside a deletion window and
//! removes them. The grace period is an unconditional floor: nothing newer
//! than `now - grace` is ever deleted, whatever window the caller asked for.
//! Log events are anchored on their own `created_at`.
//!
//! The engine performs no logging of its own beyond debug traces; reporting
//! the outcome is the caller's job.

use super::window::{PurgeWindow, RetentionPolicy};
use crate::database::{ArchiveStorage, Collection, TimeRange};
use crate::error::{ArchiveError, Result};
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// Rows removed by one purge call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeResult {
	pub impacts_deleted: u64,
	pub events_deleted: u64,
}

impl PurgeResult {
	pub fn total(&self) -> u64 {
		self.impacts_deleted + self.events_deleted
	}
}

#[derive(Debug, Clone, Copy)]
pub struct RetentionEngine {
	grace: Duration,
}

impl RetentionEngine {
	pub fn new(policy: &RetentionPolicy) -> Self {
		Self { grace: policy.grace() }
	}

	/// The part of `window` that may actually be deleted at `now`
	pub fn eligible_range(&self, window: &PurgeWindow, now: DateTime<Utc>) -> TimeRange {
		window.clip_to(now - self.grace)
	}

	/// Delete every qualifying impact (and log event, unless `protect_events`).
	///
	/// Each collection is deleted in its own transaction. A storage failure is
	/// returned as-is; the failing collection is left untouched.
	pub async fn purge<S>(
		&self, storage: &mut S, window: &PurgeWindow, protect_events: bool, now: DateTime<Utc>,
	) -> Result<PurgeResult>
	where S: ArchiveStorage + ?Sized {
		if let Some(start) = window.start {
			if start > window.end {
				return Err(ArchiveError::configuration(
					"window",
					format!("start {} is after end {}", start.to_rfc3339(), window.end.to_rfc3339()),
				));
			}
		}

		let range = self.eligible_range(window, now);
		if range.is_empty() {
			debug!(
				window_end = %window.end,
				grace_floor = %(now - self.grace),
				"Purge window lies entirely inside the grace period, nothing to delete"
			);
			return Ok(PurgeResult::default());
		}

		let impacts_deleted = storage.delete(Collection::Impacts, &range).await? as u64;
		let events_deleted = if protect_events {
			0
		} else {
			storage.delete(Collection::LogEvents, &range).await? as u64
		};

		debug!(
			impacts_deleted,
			events_deleted,
			protect_events,
			range_end = %range.end,
			"Retention engine pass finished"
		);
		Ok(PurgeResult { impacts_deleted, events_deleted })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::database::{DatabaseConfig, Impact, LogEvent, RedbStorage};
	use chrono::TimeZone;
	use tempfile::tempdir;

	fn now() -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2025, 6, 26, 18, 0, 0).unwrap()
	}

	async fn seeded_storage(dir: &tempfile::TempDir) -> RedbStorage {
		let mut storage =
			RedbStorage::new(DatabaseConfig::with_path(dir.path().join("engine.redb"))).await.unwrap();
		// one impact and one event per day, 0..=20 days old
		let impacts: Vec<Impact> =
			(0..=20).map(|age| Impact::new(now() - Duration::days(age), 48.8, 2.3)).collect();
		storage.insert_impacts(&impacts).await.unwrap();
		for age in 0..=20 {
			let event = LogEvent::new(now() - Duration::days(age), "update_succeeded", "ok");
			storage.insert_log_event(&event).await.unwrap();
		}
		storage
	}

	#[tokio::test]
	async fn test_automatic_window_deletes_only_expired_rows() {
		let temp_dir = tempdir().unwrap();
		let mut storage = seeded_storage(&temp_dir).await;
		let policy = RetentionPolicy::default();
		let engine = RetentionEngine::new(&policy);

		let window = PurgeWindow::automatic(&policy, now());
		let result = engine.purge(&mut storage, &window, false, now()).await.unwrap();

		// ages 16..=20 are older than now - 15 days
		assert_eq!(result, PurgeResult { impacts_deleted: 5, events_deleted: 5 });
		let remaining = storage.query_impacts(&TimeRange::all()).await.unwrap();
		assert!(remaining.iter().all(|impact| impact.detected_at >= now() - Duration::days(15)));
	}

	#[tokio::test]
	async fn test_grace_floor_overrides_manual_window() {
		let temp_dir = tempdir().unwrap();
		let mut storage = seeded_storage(&temp_dir).await;
		let engine = RetentionEngine::new(&RetentionPolicy::default());

		// a window reaching up to `now` must still spare the last two days
		let window = PurgeWindow::manual(now() - Duration::days(30), now()).unwrap();
		let result = engine.purge(&mut storage, &window, false, now()).await.unwrap();

		// ages 3..=20 deleted; 0, 1 and 2 (exactly at the floor) kept
		assert_eq!(result.impacts_deleted, 18);
		assert_eq!(result.events_deleted, 18);
		let remaining = storage.query_impacts(&TimeRange::all()).await.unwrap();
		assert_eq!(remaining.len(), 3);
		assert!(remaining.iter().all(|impact| impact.detected_at >= now() - Duration::days(2)));
	}

	#[tokio::test]
	async fn test_protect_events_keeps_event_log_intact() {
		let temp_dir = tempdir().unwrap();
		let mut storage = seeded_storage(&temp_dir).await;
		let policy = RetentionPolicy::default();
		let engine = RetentionEngine::new(&policy);
		let events_before = storage.count(Collection::LogEvents).await.unwrap();

		let window = PurgeWindow::automatic(&policy, now());
		let result = engine.purge(&mut storage, &window, true, now()).await.unwrap();

		assert_eq!(result.impacts_deleted, 5);
		assert_eq!(result.events_deleted, 0);
		assert_eq!(storage.count(Collection::LogEvents).await.unwrap(), events_before);
	}

	#[tokio::test]
	async fn test_window_inside_grace_period_is_a_no_op() {
		let temp_dir = tempdir().unwrap();
		let mut storage = seeded_storage(&temp_dir).await;
		let engine = RetentionEngine::new(&RetentionPolicy::default());

		let window = PurgeWindow::manual(now() - Duration::hours(36), now()).unwrap();
		let result = engine.purge(&mut storage, &window, false, now()).await.unwrap();

		assert_eq!(result.total(), 0);
		assert_eq!(storage.count(Collection::Impacts).await.unwrap(), 21);
	}

	#[tokio::test]
	async fn test_second_pass_is_idempotent() {
		let temp_dir = tempdir().unwrap();
		let mut storage = seeded_storage(&temp_dir).await;
		let policy = RetentionPolicy::default();
		let engine = RetentionEngine::new(&policy);
		let window = PurgeWindow::automatic(&policy, now());

		let first = engine.purge(&mut storage, &window, false, now()).await.unwrap();
		let second = engine.purge(&mut storage, &window, false, now()).await.unwrap();

		assert!(first.total() > 0);
		assert_eq!(second, PurgeResult::default());
	}

	#[tokio::test]
	async fn test_inverted_window_is_rejected() {
		let temp_dir = tempdir().unwrap();
		let mut storage = seeded_storage(&temp_dir).await;
		let engine = RetentionEngine::new(&RetentionPolicy::default());
		let window = PurgeWindow { start: Some(now()), end: now() - Duration::days(10) };

		let error = engine.purge(&mut storage, &window, false, now()).await.unwrap_err();
		assert!(error.is_configuration_error());
		assert_eq!(storage.count(Collection::Impacts).await.unwrap(), 21);
	}
}
