//! Error types for archive store operations

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
	#[error("Database connection failed: {0}")]
	ConnectionFailed(String),

	#[error("Serialization error: {0}")]
	Serialization(String),

	#[error("Deserialization error: {0}")]
	Deserialization(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),

	#[error("Transaction failed: {0}")]
	TransactionError(String),

	#[error("Compaction failed: {0}")]
	CompactionFailed(String),

	#[error("redb database error: {0}")]
	RedbError(#[from] redb::Error),

	#[error("redb transaction error: {0}")]
	RedbTransactionError(#[from] redb::TransactionError),

	#[error("redb commit error: {0}")]
	RedbCommitError(#[from] redb::CommitError),

	#[error("redb table error: {0}")]
	RedbTableError(#[from] redb::TableError),

	#[error("redb storage error: {0}")]
	RedbStorageError(#[from] redb::StorageError),
}

impl DatabaseError {
	/// Check if this error indicates that the operation should be retried
	pub fn is_retryable(&self) -> bool {
		matches!(
			self,
			DatabaseError::TransactionError(_)
				| DatabaseError::ConnectionFailed(_)
				| DatabaseError::RedbTransactionError(_)
		)
	}
}

impl From<redb::DatabaseError> for DatabaseError {
	fn from(e: redb::DatabaseError) -> Self {
		match e {
			redb::DatabaseError::DatabaseAlreadyOpen => DatabaseError::ConnectionFailed(
				"database file is already open by another handle".to_string(),
			),
			other => DatabaseError::RedbError(redb::Error::from(other)),
		}
	}
}

impl From<redb::CompactionError> for DatabaseError {
	fn from(e: redb::CompactionError) -> Self {
		DatabaseError::CompactionFailed(e.to_string())
	}
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;
