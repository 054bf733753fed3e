use std::time::Duration;
use thiserror::Error;

/// Archive maintenance error types
///
/// Store-level failures are defined in `crate::database::DatabaseError` and
/// wrapped here as [`ArchiveError::Storage`].
#[derive(Error, Debug)]
pub enum ArchiveError {
	#[error("Configuration error: {parameter} - {reason}")]
	Configuration { parameter: String, reason: String },

	#[error("Invalid timestamp: {value} - {reason}")]
	InvalidTimestamp { value: String, reason: String },

	#[error("Storage error: {0}")]
	Storage(#[from] Box<crate::database::DatabaseError>),

	#[error("Update routine failed: {command} - {cause}")]
	UpdateFailed { command: String, cause: String, exit_code: Option<i32> },

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Config file error: {path} - {reason}")]
	ConfigFile { path: String, reason: String },

	#[error("Recovery failed: {operation} after {attempts} attempts over {total_duration:?} - {last_error}")]
	RecoveryFailed {
		operation: String,
		attempts: u32,
		total_duration: Duration,
		last_error: String,
	},
}

impl ArchiveError {
	/// Check if this error indicates that the operation should be retried
	pub fn is_retryable(&self) -> bool {
		match self {
			ArchiveError::Io(io_err) => matches!(
				io_err.kind(),
				std::io::ErrorKind::TimedOut
					| std::io::ErrorKind::ConnectionRefused
					| std::io::ErrorKind::ConnectionAborted
					| std::io::ErrorKind::Interrupted
					| std::io::ErrorKind::WouldBlock
			),
			ArchiveError::Storage(db_err) => db_err.is_retryable(),

			// A failed download usually means the remote side was unavailable
			ArchiveError::UpdateFailed { .. } => true,

			ArchiveError::Configuration { .. } => false,
			ArchiveError::InvalidTimestamp { .. } => false,
			ArchiveError::ConfigFile { .. } => false,
			ArchiveError::RecoveryFailed { .. } => false,
		}
	}

	/// Check if this error is related to configuration issues
	pub fn is_configuration_error(&self) -> bool {
		matches!(
			self,
			ArchiveError::Configuration { .. }
				| ArchiveError::InvalidTimestamp { .. }
				| ArchiveError::ConfigFile { .. }
		)
	}

	/// Check if this error comes from the underlying store
	pub fn is_storage_error(&self) -> bool {
		matches!(self, ArchiveError::Storage(_))
	}

	/// Get error category for logging
	pub fn category(&self) -> &'static str {
		match self {
			ArchiveError::Configuration { .. } => "configuration",
			ArchiveError::InvalidTimestamp { .. } => "configuration",
			ArchiveError::Storage(_) => "storage",
			ArchiveError::UpdateFailed { .. } => "update",
			ArchiveError::Io(_) => "io",
			ArchiveError::ConfigFile { .. } => "configuration",
			ArchiveError::RecoveryFailed { .. } => "recovery",
		}
	}

	/// Create a configuration error
	pub fn configuration(parameter: &str, reason: impl Into<String>) -> Self {
		ArchiveError::Configuration { parameter: parameter.to_string(), reason: reason.into() }
	}

	/// Create a timestamp parsing error
	pub fn invalid_timestamp(value: &str, reason: impl Into<String>) -> Self {
		ArchiveError::InvalidTimestamp { value: value.to_string(), reason: reason.into() }
	}
}

// Custom From implementation for boxed database errors
impl From<crate::database::DatabaseError> for ArchiveError {
	fn from(err: crate::database::DatabaseError) -> Self {
		ArchiveError::Storage(Box::new(err))
	}
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
