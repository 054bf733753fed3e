//! Persisted-timestamp gates deciding whether a step runs this cycle

use crate::database::{LogEvent, PurgeRunRecord};
use chrono::{DateTime, Duration, Utc};

/// Whether a purge is due at `now`.
///
/// True when no purge was ever attempted, when the last attempt failed, or
/// when strictly more than `interval` elapsed since the last success.
pub fn should_purge(last: Option<&PurgeRunRecord>, now: DateTime<Utc>, interval: Duration) -> bool {
	let Some(record) = last else {
		return true;
	};
	if !record.succeeded {
		return true;
	}
	match record.completed_at {
		Some(completed_at) => now - completed_at > interval,
		None => true,
	}
}

/// Whether the update routine should run at `now`.
///
/// Without a minimum interval the update runs every cycle. Otherwise it runs
/// only once strictly more than the interval elapsed since the last success.
pub fn should_update(
	last_success: Option<&LogEvent>, now: DateTime<Utc>, min_interval: Option<Duration>,
) -> bool {
	match (min_interval, last_success) {
		(None, _) | (_, None) => true,
		(Some(interval), Some(event)) => now - event.created_at > interval,
	}
}
