//! Purge orchestrator
//!
//! Builds the deletion window (automatic or manual), runs the retention
//! engine and writes exactly one [`PurgeRunRecord`] per invocation, after the
//! deletions have finished or definitively failed. Every run that reaches the
//! engine also leaves a `purge_succeeded` or `purge_failed` entry in the event
//! log, whichever entry point started it.

use super::engine::{PurgeResult, RetentionEngine};
use super::window::{PurgeWindow, RetentionPolicy};
use crate::database::{ArchiveStorage, LogEvent, PurgeMode, PurgeRunRecord};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{error, info, warn};

pub const EVENT_PURGE_SUCCEEDED: &str = "purge_succeeded";
pub const EVENT_PURGE_FAILED: &str = "purge_failed";

#[derive(Debug, Clone)]
pub struct PurgeOrchestrator {
	policy: RetentionPolicy,
	engine: RetentionEngine,
	compact_after_purge: bool,
}

impl PurgeOrchestrator {
	pub fn new(policy: RetentionPolicy) -> Self {
		Self { policy, engine: RetentionEngine::new(&policy), compact_after_purge: false }
	}

	/// Reclaim file space after each successful purge
	pub fn with_compaction(mut self, enabled: bool) -> Self {
		self.compact_after_purge = enabled;
		self
	}

	pub fn policy(&self) -> &RetentionPolicy {
		&self.policy
	}

	/// Purge everything older than the rolling retention window
	pub async fn run_automatic<S>(&self, storage: &mut S, now: DateTime<Utc>) -> Result<PurgeRunRecord>
	where S: ArchiveStorage + ?Sized {
		let window = PurgeWindow::automatic(&self.policy, now);
		self.execute(storage, PurgeMode::Automatic, window, false, now).await
	}

	/// Purge a caller-supplied window.
	///
	/// An inverted or empty window is rejected before the store is touched and
	/// leaves no purge record behind.
	pub async fn run_manual<S>(
		&self, storage: &mut S, window_start: DateTime<Utc>, window_end: DateTime<Utc>,
		disable_events_purge: bool, now: DateTime<Utc>,
	) -> Result<PurgeRunRecord>
	where
		S: ArchiveStorage + ?Sized,
	{
		let window = PurgeWindow::manual(window_start, window_end)?;
		self.run_window(storage, window, disable_events_purge, now).await
	}

	/// Manual purge of a window built elsewhere, e.g. by [`PurgeWindow::from_bounds`]
	pub async fn run_window<S>(
		&self, storage: &mut S, window: PurgeWindow, disable_events_purge: bool, now: DateTime<Utc>,
	) -> Result<PurgeRunRecord>
	where
		S: ArchiveStorage + ?Sized,
	{
		if let Some(start) = window.start {
			PurgeWindow::manual(start, window.end)?;
		}
		self.execute(storage, PurgeMode::Manual, window, disable_events_purge, now).await
	}

	async fn execute<S>(
		&self, storage: &mut S, mode: PurgeMode, window: PurgeWindow, protect_events: bool,
		now: DateTime<Utc>,
	) -> Result<PurgeRunRecord>
	where
		S: ArchiveStorage + ?Sized,
	{
		// the record describes what was actually eligible, after the grace floor
		let applied = self.engine.eligible_range(&window, now);
		match self.engine.purge(storage, &window, protect_events, now).await {
			Ok(PurgeResult { impacts_deleted, events_deleted }) => {
				let record = PurgeRunRecord::success(
					mode,
					&applied,
					protect_events,
					impacts_deleted,
					events_deleted,
					now,
				);
				storage.write_purge_record(&record).await?;
				info!(
					mode = %mode,
					impacts_deleted,
					events_deleted,
					events_protected = protect_events,
					"{}",
					record.summary()
				);
				record_purge_event(storage, &record).await;

				if self.compact_after_purge && (impacts_deleted > 0 || events_deleted > 0) {
					if let Err(e) = storage.compact().await {
						warn!("Compaction after purge failed: {}", e);
					}
				}
				Ok(record)
			}
			Err(purge_error) => {
				let record = PurgeRunRecord::failure(
					mode,
					&applied,
					protect_events,
					purge_error.to_string(),
					now,
				);
				error!(category = purge_error.category(), "{}", record.summary());
				if let Err(record_error) = storage.write_purge_record(&record).await {
					warn!("Could not record failed purge run: {}", record_error);
				}
				record_purge_event(storage, &record).await;
				Err(purge_error)
			}
		}
	}
}

/// Append the audit entry for a finished purge; failures are only logged
async fn record_purge_event<S>(storage: &mut S, record: &PurgeRunRecord)
where S: ArchiveStorage + ?Sized {
	let category = if record.succeeded {
		EVENT_PURGE_SUCCEEDED
	} else {
		EVENT_PURGE_FAILED
	};
	let event = LogEvent::new(record.attempted_at, category, record.summary()).with_details(&json!({
		"run_id": record.run_id.to_string(),
		"mode": record.mode.to_string(),
		"window_start": record.window_start.map(|start| start.to_rfc3339()),
		"window_end": record.window_end.to_rfc3339(),
		"impacts_deleted": record.impacts_deleted,
		"events_deleted": record.events_deleted,
		"events_protected": record.events_protected,
		"error": record.error,
	}));
	if let Err(e) = storage.insert_log_event(&event).await {
		warn!("Could not record {} event: {}", category, e);
	}
}
