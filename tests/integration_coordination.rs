//! Integration tests for coordination runs driven against an on-disk archive

mod common;

use common::{seed_impacts, temp_database, utc};
use lightning_archive::database::{ArchiveStorage, RedbStorage};
use lightning_archive::{
	CoordinatorState, NoUpdate, PurgeOrchestrator, PurgeOutcome, RedbStorageProvider,
	RetentionPolicy, RunCoordinator, UpdateOutcome, UpdateRoutine, UpdateStatus,
};

struct FlakyUpdate {
	failures_left: u32,
}

#[async_trait::async_trait]
impl UpdateRoutine for FlakyUpdate {
	async fn run(&mut self) -> UpdateOutcome {
		if self.failures_left > 0 {
			self.failures_left -= 1;
			UpdateOutcome::failed("blitzortung archive unreachable")
		} else {
			UpdateOutcome::succeeded("new impacts stored")
		}
	}
}

fn coordinator(
	config: &lightning_archive::DatabaseConfig,
) -> RunCoordinator<RedbStorageProvider> {
	RunCoordinator::new(
		RedbStorageProvider::new(config.clone()),
		PurgeOrchestrator::new(RetentionPolicy::default()),
	)
}

#[tokio::test]
async fn test_daily_gate_scenario() {
	let (_temp_dir, config) = temp_database();
	seed_impacts(&config, &[utc(2025, 6, 1, 0), utc(2025, 6, 20, 0)]).await;
	let coordinator = coordinator(&config);
	let mut update = NoUpdate;

	let first = coordinator.run_cycle(&mut update, utc(2025, 6, 25, 18)).await;
	assert!(first.visited(CoordinatorState::PurgeSucceeded));

	// 16 hours later
	let morning = coordinator.run_cycle(&mut update, utc(2025, 6, 26, 10)).await;
	assert!(morning.visited(CoordinatorState::PurgeSkipped));
	assert_eq!(
		morning.purge,
		PurgeOutcome::Skipped { last_completed_at: Some(utc(2025, 6, 25, 18)) }
	);

	// 25 hours later
	let evening = coordinator.run_cycle(&mut update, utc(2025, 6, 26, 19)).await;
	assert!(evening.visited(CoordinatorState::Purging));
	assert_eq!(evening.final_state(), CoordinatorState::Idle);

	let storage = RedbStorage::new(config).await.unwrap();
	assert_eq!(storage.purge_history(10).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_update_failures_never_block_maintenance() {
	let (_temp_dir, config) = temp_database();
	seed_impacts(&config, &[utc(2025, 5, 1, 0)]).await;
	let coordinator = coordinator(&config);
	let mut update = FlakyUpdate { failures_left: 1 };

	let failed = coordinator.run_cycle(&mut update, utc(2025, 6, 26, 18)).await;
	assert_eq!(failed.update.status, UpdateStatus::Failed);
	match &failed.purge {
		PurgeOutcome::Succeeded(record) => assert_eq!(record.impacts_deleted, 1),
		other => panic!("expected the purge to run despite the failed update, got {other:?}"),
	}

	let recovered = coordinator.run_cycle(&mut update, utc(2025, 6, 26, 19)).await;
	assert!(recovered.update.is_success());
	assert!(recovered.visited(CoordinatorState::PurgeSkipped));
}

#[tokio::test]
async fn test_every_run_starts_and_ends_idle() {
	let (_temp_dir, config) = temp_database();
	let coordinator = coordinator(&config);
	let mut update = NoUpdate;

	for hour in [0, 6, 12, 18] {
		let report = coordinator.run_cycle(&mut update, utc(2025, 6, 26, hour)).await;
		assert_eq!(report.transitions.first(), Some(&CoordinatorState::Idle));
		assert_eq!(report.final_state(), CoordinatorState::Idle);
		assert!(report.visited(CoordinatorState::EvaluatingPurge));
	}
}
