//! Update routine contract
//!
//! The download itself lives outside this crate. The coordinator only needs a
//! zero-argument operation that reports success or failure plus a summary.

use crate::error::{ArchiveError, Result};
use crate::retry::{RetryConfig, RetryManager};
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateStatus {
	Succeeded,
	Failed,
	/// Not attempted this cycle (no routine configured, or debounced)
	Skipped,
}

/// What the update step reports back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
	pub status: UpdateStatus,
	pub summary: String,
}

impl UpdateOutcome {
	pub fn succeeded(summary: impl Into<String>) -> Self {
		Self { status: UpdateStatus::Succeeded, summary: summary.into() }
	}

	pub fn failed(summary: impl Into<String>) -> Self {
		Self { status: UpdateStatus::Failed, summary: summary.into() }
	}

	pub fn skipped(summary: impl Into<String>) -> Self {
		Self { status: UpdateStatus::Skipped, summary: summary.into() }
	}

	pub fn is_success(&self) -> bool {
		self.status == UpdateStatus::Succeeded
	}
}

/// Something that refreshes the archive with new impacts
#[async_trait::async_trait]
pub trait UpdateRoutine: Send {
	/// Run once. Failures are reported in the outcome, never raised.
	async fn run(&mut self) -> UpdateOutcome;
}

/// Used when no update command is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct NoUpdate;

#[async_trait::async_trait]
impl UpdateRoutine for NoUpdate {
	async fn run(&mut self) -> UpdateOutcome {
		UpdateOutcome::skipped("no update routine configured")
	}
}

/// Runs an external program, retrying on non-zero exit
#[derive(Debug)]
pub struct CommandUpdate {
	program: Vec<String>,
	retry: RetryManager,
}

impl CommandUpdate {
	pub fn new(program: Vec<String>, retry: RetryConfig) -> Self {
		Self { program, retry: RetryManager::new(retry) }
	}

	async fn run_once(program: &[String]) -> Result<String> {
		let (executable, args) = program
			.split_first()
			.ok_or_else(|| ArchiveError::configuration("update.command", "must not be empty"))?;

		debug!(command = %program.join(" "), "Starting update command");
		let output = Command::new(executable).args(args).kill_on_drop(true).output().await?;

		if !output.status.success() {
			let stderr = String::from_utf8_lossy(&output.stderr);
			return Err(ArchiveError::UpdateFailed {
				command: program.join(" "),
				cause: last_line(&stderr).unwrap_or("no error output").to_string(),
				exit_code: output.status.code(),
			});
		}

		let stdout = String::from_utf8_lossy(&output.stdout);
		Ok(last_line(&stdout).unwrap_or("update command completed").to_string())
	}
}

#[async_trait::async_trait]
impl UpdateRoutine for CommandUpdate {
	async fn run(&mut self) -> UpdateOutcome {
		let program = &self.program;
		match self.retry.execute("update", || Self::run_once(program)).await {
			Ok((summary, 1)) => UpdateOutcome::succeeded(summary),
			Ok((summary, attempts)) => {
				UpdateOutcome::succeeded(format!("{summary} (after {attempts} attempts)"))
			}
			Err(e) => UpdateOutcome::failed(e.to_string()),
		}
	}
}

fn last_line(text: &str) -> Option<&str> {
	text.lines().map(str::trim).filter(|line| !line.is_empty()).last()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::retry::RetryConfigBuilder;
	use std::time::Duration;

	fn quick_retries(max_retries: u32) -> RetryConfig {
		RetryConfigBuilder::new()
			.max_retries(max_retries)
			.initial_delay(Duration::from_millis(1))
			.exponential_backoff(false)
			.build()
	}

	fn shell(script: &str) -> Vec<String> {
		vec!["sh".to_string(), "-c".to_string(), script.to_string()]
	}

	#[tokio::test]
	async fn test_no_update_is_skipped() {
		let outcome = NoUpdate.run().await;
		assert_eq!(outcome.status, UpdateStatus::Skipped);
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn test_command_summary_is_last_output_line() {
		let mut update =
			CommandUpdate::new(shell("echo downloading; echo 42 impacts inserted"), quick_retries(0));

		let outcome = update.run().await;
		assert!(outcome.is_success());
		assert_eq!(outcome.summary, "42 impacts inserted");
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn test_failing_command_is_retried_then_reported() {
		let mut update = CommandUpdate::new(shell("echo 'remote unavailable' >&2; exit 3"), quick_retries(2));

		let outcome = update.run().await;
		assert_eq!(outcome.status, UpdateStatus::Failed);
		assert!(outcome.summary.contains("3 attempts"));
		assert!(outcome.summary.contains("remote unavailable"));
	}

	#[tokio::test]
	async fn test_empty_command_fails_without_retry() {
		let mut update = CommandUpdate::new(Vec::new(), quick_retries(5));

		let outcome = update.run().await;
		assert_eq!(outcome.status, UpdateStatus::Failed);
		assert!(outcome.summary.contains("update.command"));
	}
}
