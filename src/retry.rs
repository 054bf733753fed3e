//! Retry mechanism for handling transient errors
//!
//! Provides fixed-delay or exponential-backoff retries for operations that
//! talk to the outside world, such as the external update routine.

use crate::error::{ArchiveError, Result};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
	/// Maximum number of retry attempts after the first failure
	pub max_retries: u32,
	/// Delay before the first retry
	pub initial_retry_delay: Duration,
	/// Upper bound on any single delay
	pub max_retry_delay: Duration,
	/// Exponential backoff multiplier
	pub backoff_multiplier: f64,
	/// Whether to enable exponential backoff
	pub exponential_backoff: bool,
}

impl Default for RetryConfig {
	fn default() -> Self {
		Self {
			max_retries: 3,
			initial_retry_delay: Duration::from_millis(100),
			max_retry_delay: Duration::from_secs(30),
			backoff_multiplier: 2.0,
			exponential_backoff: true,
		}
	}
}

impl RetryConfig {
	/// Calculate the delay for a given retry attempt
	pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
		if !self.exponential_backoff {
			return self.initial_retry_delay;
		}

		let delay_ms = self.initial_retry_delay.as_millis() as f64
			* self.backoff_multiplier.powi(attempt as i32);

		let delay = Duration::from_millis(delay_ms as u64);
		std::cmp::min(delay, self.max_retry_delay)
	}
}

/// Retry manager that handles the retry logic
#[derive(Debug, Default)]
pub struct RetryManager {
	config: RetryConfig,
}

impl RetryManager {
	/// Create a new retry manager with the given configuration
	pub fn new(config: RetryConfig) -> Self {
		Self { config }
	}

	/// Execute an async closure with retry logic, returning the value and the
	/// number of attempts it took
	pub async fn execute<T, F, Fut>(&self, operation_name: &str, mut operation_fn: F) -> Result<(T, u32)>
	where
		F: FnMut() -> Fut + Send,
		Fut: Future<Output = Result<T>> + Send,
	{
		let mut attempt = 0;
		let start_time = std::time::Instant::now();

		loop {
			match operation_fn().await {
				Ok(result) => {
					if attempt > 0 {
						debug!(
							"Operation '{}' succeeded after {} attempts in {:?}",
							operation_name,
							attempt + 1,
							start_time.elapsed()
						);
					}
					return Ok((result, attempt + 1));
				}
				Err(error) => {
					if !error.is_retryable() {
						debug!(
							"Operation '{}' failed with non-retryable error: {}",
							operation_name, error
						);
						return Err(error);
					}

					if attempt >= self.config.max_retries {
						warn!(
							"Operation '{}' failed after {} attempts over {:?}, giving up",
							operation_name,
							attempt + 1,
							start_time.elapsed()
						);
						return Err(ArchiveError::RecoveryFailed {
							operation: operation_name.to_string(),
							attempts: attempt + 1,
							total_duration: start_time.elapsed(),
							last_error: error.to_string(),
						});
					}

					let delay = self.config.delay_for_attempt(attempt);
					warn!(
						"Operation '{}' failed (attempt {}), retrying in {:?}: {}",
						operation_name,
						attempt + 1,
						delay,
						error
					);

					tokio::time::sleep(delay).await;
					attempt += 1;
				}
			}
		}
	}
}

/// A builder for creating retry configurations
#[derive(Debug)]
pub struct RetryConfigBuilder {
	config: RetryConfig,
}

impl RetryConfigBuilder {
	/// Create a new builder with default configuration
	pub fn new() -> Self {
		Self { config: RetryConfig::default() }
	}

	/// Set the maximum number of retry attempts
	pub fn max_retries(mut self, max_retries: u32) -> Self {
		self.config.max_retries = max_retries;
		self
	}

	/// Set the initial retry delay
	pub fn initial_delay(mut self, delay: Duration) -> Self {
		self.config.initial_retry_delay = delay;
		self
	}

	/// Set the maximum retry delay
	pub fn max_delay(mut self, delay: Duration) -> Self {
		self.config.max_retry_delay = delay;
		self
	}

	/// Set the backoff multiplier
	pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
		self.config.backoff_multiplier = multiplier;
		self
	}

	/// Enable or disable exponential backoff
	pub fn exponential_backoff(mut self, enabled: bool) -> Self {
		self.config.exponential_backoff = enabled;
		self
	}

	/// Build the configuration
	pub fn build(self) -> RetryConfig {
		self.config
	}
}

impl Default for RetryConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}
