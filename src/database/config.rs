//! Store location and maintenance settings

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the archive store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
	/// Path of the redb file holding impacts, events and purge history
	#[serde(default = "default_database_path")]
	pub path: PathBuf,

	/// Reclaim file space after every successful purge
	#[serde(default = "default_compact_after_purge")]
	pub compact_after_purge: bool,
}

fn default_database_path() -> PathBuf {
	PathBuf::from("data").join("archive.redb")
}

fn default_compact_after_purge() -> bool {
	true
}

impl DatabaseConfig {
	/// Default settings pointing at a custom file
	pub fn with_path(path: PathBuf) -> Self {
		Self { path, ..Self::default() }
	}

	/// Validate configuration parameters
	pub fn validate(&self) -> Result<(), String> {
		if self.path.as_os_str().is_empty() {
			return Err("Database path must not be empty".to_string());
		}
		if self.path.is_dir() {
			return Err(format!("Database path {} is a directory", self.path.display()));
		}
		Ok(())
	}
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		Self { path: default_database_path(), compact_after_purge: default_compact_after_purge() }
	}
}
