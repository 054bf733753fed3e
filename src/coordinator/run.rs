//! Run coordinator
//!
//! One coordination run attempts the update, then decides from the persisted
//! purge history whether an automatic purge is due. Neither step can abort the
//! other: every failure is logged, written to the event log when the store is
//! reachable, and the run always ends back in [`CoordinatorState::Idle`].

use super::gate::{should_purge, should_update};
use super::provider::StorageProvider;
use super::update::{UpdateOutcome, UpdateRoutine, UpdateStatus};
use crate::database::{ArchiveStorage, LogEvent, PurgeRunRecord};
use crate::retention::PurgeOrchestrator;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info, warn};

pub const EVENT_UPDATE_SUCCEEDED: &str = "update_succeeded";
pub const EVENT_UPDATE_FAILED: &str = "update_failed";
pub const EVENT_UPDATE_SKIPPED: &str = "update_skipped";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
	Idle,
	Updating,
	UpdateSucceeded,
	UpdateFailed,
	UpdateSkipped,
	EvaluatingPurge,
	PurgeSkipped,
	Purging,
	PurgeSucceeded,
	PurgeFailed,
}

impl std::fmt::Display for CoordinatorState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let name = match self {
			CoordinatorState::Idle => "idle",
			CoordinatorState::Updating => "updating",
			CoordinatorState::UpdateSucceeded => "update_succeeded",
			CoordinatorState::UpdateFailed => "update_failed",
			CoordinatorState::UpdateSkipped => "update_skipped",
			CoordinatorState::EvaluatingPurge => "evaluating_purge",
			CoordinatorState::PurgeSkipped => "purge_skipped",
			CoordinatorState::Purging => "purging",
			CoordinatorState::PurgeSucceeded => "purge_succeeded",
			CoordinatorState::PurgeFailed => "purge_failed",
		};
		f.write_str(name)
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum PurgeOutcome {
	/// The last successful purge is recent enough
	Skipped { last_completed_at: Option<DateTime<Utc>> },
	Succeeded(PurgeRunRecord),
	Failed { reason: String },
}

/// Everything one coordination run did
#[derive(Debug, Clone)]
pub struct CoordinationReport {
	pub update: UpdateOutcome,
	pub purge: PurgeOutcome,
	/// States visited, in order, starting and ending with `Idle`
	pub transitions: Vec<CoordinatorState>,
}

impl CoordinationReport {
	pub fn visited(&self, state: CoordinatorState) -> bool {
		self.transitions.contains(&state)
	}

	pub fn final_state(&self) -> CoordinatorState {
		self.transitions.last().copied().unwrap_or(CoordinatorState::Idle)
	}

	pub fn summary(&self) -> String {
		let purge = match &self.purge {
			PurgeOutcome::Skipped { last_completed_at: Some(at) } => {
				format!("purge skipped, last success at {}", at.to_rfc3339())
			}
			PurgeOutcome::Skipped { last_completed_at: None } => "purge skipped".to_string(),
			PurgeOutcome::Succeeded(record) => record.summary(),
			PurgeOutcome::Failed { reason } => format!("purge failed: {reason}"),
		};
		format!("update {:?}: {}; {}", self.update.status, self.update.summary, purge)
	}
}

pub struct RunCoordinator<P: StorageProvider> {
	provider: P,
	orchestrator: PurgeOrchestrator,
	update_min_interval: Option<Duration>,
}

impl<P: StorageProvider> RunCoordinator<P> {
	pub fn new(provider: P, orchestrator: PurgeOrchestrator) -> Self {
		Self { provider, orchestrator, update_min_interval: None }
	}

	/// Skip the update while the last successful one is younger than `interval`
	pub fn with_update_interval(mut self, interval: Option<Duration>) -> Self {
		self.update_min_interval = interval;
		self
	}

	/// One full coordination run at `now`
	pub async fn run_cycle<U>(&self, update: &mut U, now: DateTime<Utc>) -> CoordinationReport
	where U: UpdateRoutine + ?Sized {
		let mut transitions = vec![CoordinatorState::Idle];

		let update_outcome = self.update_step(update, now, &mut transitions).await;

		transitions.push(CoordinatorState::EvaluatingPurge);
		let purge_outcome = self.purge_step(now, &mut transitions).await;

		transitions.push(CoordinatorState::Idle);
		let report = CoordinationReport { update: update_outcome, purge: purge_outcome, transitions };
		info!(at = %now.to_rfc3339(), "Coordination run finished: {}", report.summary());
		report
	}

	async fn update_step<U>(
		&self, update: &mut U, now: DateTime<Utc>, transitions: &mut Vec<CoordinatorState>,
	) -> UpdateOutcome
	where
		U: UpdateRoutine + ?Sized,
	{
		if let Some(interval) = self.update_min_interval {
			let last_success = self.last_event(EVENT_UPDATE_SUCCEEDED).await;
			if !should_update(last_success.as_ref(), now, Some(interval)) {
				let last_at = last_success.map(|event| event.created_at.to_rfc3339()).unwrap_or_default();
				let outcome = UpdateOutcome::skipped(format!("last successful update at {last_at}"));
				info!("Update skipped: {}", outcome.summary);
				transitions.push(CoordinatorState::UpdateSkipped);
				self.append_event(LogEvent::new(now, EVENT_UPDATE_SKIPPED, outcome.summary.clone()))
					.await;
				return outcome;
			}
		}

		transitions.push(CoordinatorState::Updating);
		let outcome = update.run().await;
		let (state, category) = match outcome.status {
			UpdateStatus::Succeeded => {
				info!("Update succeeded: {}", outcome.summary);
				(CoordinatorState::UpdateSucceeded, EVENT_UPDATE_SUCCEEDED)
			}
			UpdateStatus::Failed => {
				warn!("Update failed, continuing with purge evaluation: {}", outcome.summary);
				(CoordinatorState::UpdateFailed, EVENT_UPDATE_FAILED)
			}
			UpdateStatus::Skipped => {
				info!("Update skipped: {}", outcome.summary);
				(CoordinatorState::UpdateSkipped, EVENT_UPDATE_SKIPPED)
			}
		};
		transitions.push(state);
		self.append_event(LogEvent::new(now, category, outcome.summary.clone())).await;
		outcome
	}

	async fn purge_step(
		&self, now: DateTime<Utc>, transitions: &mut Vec<CoordinatorState>,
	) -> PurgeOutcome {
		let mut storage = match self.provider.open().await {
			Ok(storage) => storage,
			Err(e) => {
				error!(category = "storage", "Store unreachable, purge not attempted: {}", e);
				transitions.push(CoordinatorState::PurgeFailed);
				return PurgeOutcome::Failed { reason: e.to_string() };
			}
		};

		let last = match storage.read_last_purge_record().await {
			Ok(last) => last,
			Err(e) => {
				warn!("Could not read purge history, purging anyway: {}", e);
				None
			}
		};

		let interval = self.orchestrator.policy().purge_interval();
		if !should_purge(last.as_ref(), now, interval) {
			let last_completed_at = last.and_then(|record| record.completed_at);
			debug!(?last_completed_at, "Purge not due yet");
			info!("Purge skipped, last successful purge is within {} hours", interval.num_hours());
			transitions.push(CoordinatorState::PurgeSkipped);
			return PurgeOutcome::Skipped { last_completed_at };
		}

		transitions.push(CoordinatorState::Purging);
		// the orchestrator records the run and its audit event either way
		match self.orchestrator.run_automatic(&mut storage, now).await {
			Ok(record) => {
				transitions.push(CoordinatorState::PurgeSucceeded);
				PurgeOutcome::Succeeded(record)
			}
			Err(e) => {
				transitions.push(CoordinatorState::PurgeFailed);
				PurgeOutcome::Failed { reason: e.to_string() }
			}
		}
	}

	async fn last_event(&self, category: &str) -> Option<LogEvent> {
		let storage = match self.provider.open().await {
			Ok(storage) => storage,
			Err(e) => {
				warn!("Store unreachable while reading {} events: {}", category, e);
				return None;
			}
		};
		match storage.last_log_event(category).await {
			Ok(event) => event,
			Err(e) => {
				warn!("Could not read {} events: {}", category, e);
				None
			}
		}
	}

	async fn append_event(&self, event: LogEvent) {
		match self.provider.open().await {
			Ok(mut storage) => insert_best_effort(&mut storage, &event).await,
			Err(e) => warn!("Store unreachable, {} event not recorded: {}", event.category, e),
		}
	}
}

async fn insert_best_effort<S: ArchiveStorage + ?Sized>(storage: &mut S, event: &LogEvent) {
	if let Err(e) = storage.insert_log_event(event).await {
		warn!("Could not record {} event: {}", event.category, e);
	}
}
