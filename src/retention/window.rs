//! Purge windows, the retention policy and manual timestamp parsing
//!
//! A [`PurgeWindow`] is always a *deletion range*. The automatic rolling
//! window `[now - retention_days, now)` is what the archive keeps, so an
//! automatic purge deletes everything before its start.

use crate::database::TimeRange;
use crate::error::{ArchiveError, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

pub const DEFAULT_RETENTION_DAYS: u32 = 15;
pub const DEFAULT_GRACE_DAYS: u32 = 2;
pub const DEFAULT_PURGE_INTERVAL_HOURS: u32 = 24;

/// Retention, grace and purge cadence settings, validated on construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
	retention_days: u32,
	grace_days: u32,
	purge_interval: Duration,
}

impl RetentionPolicy {
	/// Build a policy, rejecting combinations that would make purges a no-op
	pub fn new(retention_days: u32, grace_days: u32, purge_interval: Duration) -> Result<Self> {
		if retention_days == 0 {
			return Err(ArchiveError::configuration(
				"retention_days",
				"must be at least 1 day",
			));
		}
		if grace_days >= retention_days {
			return Err(ArchiveError::configuration(
				"grace_days",
				format!(
					"grace period ({grace_days} days) must be shorter than retention ({retention_days} days)"
				),
			));
		}
		if purge_interval <= Duration::zero() {
			return Err(ArchiveError::configuration("purge_interval", "must be positive"));
		}
		Ok(Self { retention_days, grace_days, purge_interval })
	}

	pub fn retention_days(&self) -> u32 {
		self.retention_days
	}

	pub fn grace_days(&self) -> u32 {
		self.grace_days
	}

	pub fn retention(&self) -> Duration {
		Duration::days(i64::from(self.retention_days))
	}

	pub fn grace(&self) -> Duration {
		Duration::days(i64::from(self.grace_days))
	}

	pub fn purge_interval(&self) -> Duration {
		self.purge_interval
	}

	/// Range kept by an automatic purge: `[now - retention, now)`
	pub fn rolling_window(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
		(now - self.retention(), now)
	}

	/// Instant before which data may be deleted at all
	pub fn grace_floor(&self, now: DateTime<Utc>) -> DateTime<Utc> {
		now - self.grace()
	}
}

impl Default for RetentionPolicy {
	fn default() -> Self {
		Self {
			retention_days: DEFAULT_RETENTION_DAYS,
			grace_days: DEFAULT_GRACE_DAYS,
			purge_interval: Duration::hours(i64::from(DEFAULT_PURGE_INTERVAL_HOURS)),
		}
	}
}

/// Deletion range requested for one purge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeWindow {
	/// Inclusive lower bound, None = from the beginning of the archive
	pub start: Option<DateTime<Utc>>,
	/// Exclusive upper bound
	pub end: DateTime<Utc>,
}

impl PurgeWindow {
	/// Everything older than the policy's rolling window
	pub fn automatic(policy: &RetentionPolicy, now: DateTime<Utc>) -> Self {
		let (kept_from, _) = policy.rolling_window(now);
		Self { start: None, end: kept_from }
	}

	/// Caller-supplied window; `start` must be strictly before `end`
	pub fn manual(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
		if start >= end {
			return Err(ArchiveError::configuration(
				"manual_start",
				format!(
					"window start {} must be before window end {}",
					start.to_rfc3339(),
					end.to_rfc3339()
				),
			));
		}
		Ok(Self { start: Some(start), end })
	}

	/// Pair optional manual bounds as given on the command line.
	///
	/// Both bounds give a manual window and neither gives `None` (automatic
	/// purge). A single bound is a configuration error.
	pub fn from_bounds(start: Option<&str>, end: Option<&str>) -> Result<Option<Self>> {
		match (start, end) {
			(Some(start), Some(end)) => {
				Self::manual(parse_timestamp(start)?, parse_timestamp(end)?).map(Some)
			}
			(None, None) => Ok(None),
			(Some(_), None) => Err(ArchiveError::configuration(
				"manual_end",
				"required when manual_start is given",
			)),
			(None, Some(_)) => Err(ArchiveError::configuration(
				"manual_start",
				"required when manual_end is given",
			)),
		}
	}

	/// The requested range, before the grace floor is applied
	pub fn as_range(&self) -> TimeRange {
		TimeRange::new(self.start, self.end)
	}

	/// The range actually eligible for deletion: the window clipped to end no
	/// later than `floor`
	pub fn clip_to(&self, floor: DateTime<Utc>) -> TimeRange {
		TimeRange::new(self.start, self.end.min(floor))
	}
}

/// Parse a manual window bound.
///
/// Accepts RFC 3339 (`2025-06-01T00:00:00Z`, any offset), naive date-times
/// (`2025-06-01T12:30`, `2025-06-01 12:30:00`) read as UTC, and bare dates
/// (`2025-06-01`, midnight UTC).
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
	let trimmed = value.trim();
	if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
		return Ok(parsed.with_timezone(&Utc));
	}
	const NAIVE_FORMATS: &[&str] =
		&["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"];
	for format in NAIVE_FORMATS {
		if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
			return Ok(parsed.and_utc());
		}
	}
	if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
		if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
			return Ok(midnight.and_utc());
		}
	}
	Err(ArchiveError::invalid_timestamp(value, "expected an ISO-8601 date or date-time"))
}
