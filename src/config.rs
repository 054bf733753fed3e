//! Application configuration
//!
//! ```toml
//! [database]
//! path = "data/archive.redb"
//! compact_after_purge = true
//!
//! [retention]
//! retention_days = 15
//! grace_days = 2
//! purge_interval_hours = 24
//!
//! [update]
//! command = ["python3", "update_blitz.py"]
//! min_interval_hours = 8
//! max_retries = 3
//! retry_delay_secs = 3600
//! ```
//!
//! Every section and field is optional. A missing file yields the defaults.

use crate::database::DatabaseConfig;
use crate::error::{ArchiveError, Result};
use crate::retention::window::{
	DEFAULT_GRACE_DAYS, DEFAULT_PURGE_INTERVAL_HOURS, DEFAULT_RETENTION_DAYS,
};
use crate::retention::RetentionPolicy;
use crate::retry::{RetryConfig, RetryConfigBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
	#[serde(default)]
	pub database: DatabaseConfig,

	#[serde(default)]
	pub retention: RetentionSettings,

	#[serde(default)]
	pub update: UpdateSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetentionSettings {
	/// Impacts older than this many days are purged automatically
	#[serde(default = "default_retention_days")]
	pub retention_days: u32,

	/// Nothing younger than this many days is ever purged
	#[serde(default = "default_grace_days")]
	pub grace_days: u32,

	/// Minimum time between two successful automatic purges
	#[serde(default = "default_purge_interval_hours")]
	pub purge_interval_hours: u32,
}

impl Default for RetentionSettings {
	fn default() -> Self {
		Self {
			retention_days: default_retention_days(),
			grace_days: default_grace_days(),
			purge_interval_hours: default_purge_interval_hours(),
		}
	}
}

fn default_retention_days() -> u32 {
	DEFAULT_RETENTION_DAYS
}

fn default_grace_days() -> u32 {
	DEFAULT_GRACE_DAYS
}

fn default_purge_interval_hours() -> u32 {
	DEFAULT_PURGE_INTERVAL_HOURS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateSettings {
	/// Program and arguments of the external update routine.
	/// No command means the update step is skipped.
	#[serde(default)]
	pub command: Option<Vec<String>>,

	/// Skip the update while the last successful one is younger than this
	#[serde(default)]
	pub min_interval_hours: Option<u32>,

	#[serde(default = "default_max_retries")]
	pub max_retries: u32,

	/// Fixed delay between update attempts
	#[serde(default = "default_retry_delay_secs")]
	pub retry_delay_secs: u64,
}

impl Default for UpdateSettings {
	fn default() -> Self {
		Self {
			command: None,
			min_interval_hours: None,
			max_retries: default_max_retries(),
			retry_delay_secs: default_retry_delay_secs(),
		}
	}
}

fn default_max_retries() -> u32 {
	3
}

fn default_retry_delay_secs() -> u64 {
	3600
}

impl AppConfig {
	/// Load from `path`, falling back to defaults when the file does not exist
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		if !path.exists() {
			debug!(path = %path.display(), "No configuration file, using defaults");
			return Ok(Self::default());
		}
		let contents = std::fs::read_to_string(path).map_err(|e| ArchiveError::ConfigFile {
			path: path.display().to_string(),
			reason: e.to_string(),
		})?;
		Self::from_str(&contents).map_err(|e| match e {
			ArchiveError::ConfigFile { reason, .. } => {
				ArchiveError::ConfigFile { path: path.display().to_string(), reason }
			}
			other => other,
		})
	}

	/// Parse TOML text and validate it
	#[allow(clippy::should_implement_trait)]
	pub fn from_str(contents: &str) -> Result<Self> {
		let config: AppConfig = toml::from_str(contents).map_err(|e| ArchiveError::ConfigFile {
			path: "<inline>".to_string(),
			reason: e.to_string(),
		})?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<()> {
		self.database
			.validate()
			.map_err(|reason| ArchiveError::configuration("database.path", reason))?;
		self.retention_policy()?;
		if let Some(command) = &self.update.command {
			if command.is_empty() || command[0].trim().is_empty() {
				return Err(ArchiveError::configuration("update.command", "must name a program"));
			}
		}
		if self.update.min_interval_hours == Some(0) {
			return Err(ArchiveError::configuration(
				"update.min_interval_hours",
				"must be positive when set",
			));
		}
		Ok(())
	}

	pub fn retention_policy(&self) -> Result<RetentionPolicy> {
		RetentionPolicy::new(
			self.retention.retention_days,
			self.retention.grace_days,
			chrono::Duration::hours(i64::from(self.retention.purge_interval_hours)),
		)
	}

	/// Fixed-delay retries for the update command
	pub fn retry_config(&self) -> RetryConfig {
		let delay = Duration::from_secs(self.update.retry_delay_secs);
		RetryConfigBuilder::new()
			.max_retries(self.update.max_retries)
			.initial_delay(delay)
			.max_delay(delay)
			.exponential_backoff(false)
			.build()
	}

	pub fn update_min_interval(&self) -> Option<chrono::Duration> {
		self.update.min_interval_hours.map(|hours| chrono::Duration::hours(i64::from(hours)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::path::PathBuf;

	#[test]
	fn test_empty_config_uses_defaults() {
		let config = AppConfig::from_str("").unwrap();
		assert_eq!(config.retention.retention_days, 15);
		assert_eq!(config.retention.grace_days, 2);
		assert_eq!(config.retention.purge_interval_hours, 24);
		assert!(config.update.command.is_none());
		assert!(config.update_min_interval().is_none());
		assert_eq!(config.retention_policy().unwrap(), RetentionPolicy::default());
	}

	#[test]
	fn test_full_config() {
		let config = AppConfig::from_str(
			r#"
			[database]
			path = "/var/lib/blitz/archive.redb"
			compact_after_purge = false

			[retention]
			retention_days = 30
			grace_days = 3
			purge_interval_hours = 12

			[update]
			command = ["python3", "update_blitz.py"]
			min_interval_hours = 8
			max_retries = 1
			retry_delay_secs = 60
			"#,
		)
		.unwrap();

		assert_eq!(config.database.path, PathBuf::from("/var/lib/blitz/archive.redb"));
		assert!(!config.database.compact_after_purge);
		let policy = config.retention_policy().unwrap();
		assert_eq!(policy.retention_days(), 30);
		assert_eq!(policy.purge_interval(), chrono::Duration::hours(12));
		assert_eq!(config.update_min_interval(), Some(chrono::Duration::hours(8)));

		let retry = config.retry_config();
		assert_eq!(retry.max_retries, 1);
		assert_eq!(retry.delay_for_attempt(3), Duration::from_secs(60));
	}

	#[test]
	fn test_grace_not_shorter_than_retention_is_rejected() {
		let error = AppConfig::from_str("[retention]\nretention_days = 2\ngrace_days = 2\n").unwrap_err();
		assert!(error.is_configuration_error());
	}

	#[test]
	fn test_unknown_field_is_rejected() {
		let error = AppConfig::from_str("[retention]\nretention = 15\n").unwrap_err();
		assert!(matches!(error, ArchiveError::ConfigFile { .. }));
	}

	#[test]
	fn test_empty_update_command_is_rejected() {
		assert!(AppConfig::from_str("[update]\ncommand = []\n").is_err());
	}

	#[test]
	fn test_missing_file_means_defaults() {
		let dir = tempfile::tempdir().unwrap();
		let config = AppConfig::load(dir.path().join("absent.toml")).unwrap();
		assert_eq!(config.retention.retention_days, 15);
	}

	#[test]
	fn test_load_reports_path_on_parse_error() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("broken.toml");
		std::fs::write(&path, "[retention\n").unwrap();

		match AppConfig::load(&path).unwrap_err() {
			ArchiveError::ConfigFile { path: reported, .. } => {
				assert_eq!(reported, path.display().to_string())
			}
			other => panic!("expected a config file error, got {other}"),
		}
	}
}
