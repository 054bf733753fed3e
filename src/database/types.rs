//! Type definitions for archive storage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One detected lightning strike
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Impact {
	/// Assigned by the store at insertion
	pub id: u64,

	/// Physical occurrence time of the strike
	pub detected_at: DateTime<Utc>,

	pub latitude: f64,

	pub longitude: f64,

	/// Maximal circular gap of the detecting stations (location quality)
	pub mcg: Option<u32>,
}

impl Impact {
	/// Create an impact awaiting insertion; the store assigns its id
	pub fn new(detected_at: DateTime<Utc>, latitude: f64, longitude: f64) -> Self {
		Self { id: 0, detected_at, latitude, longitude, mcg: None }
	}

	pub fn with_mcg(mut self, mcg: u32) -> Self {
		self.mcg = Some(mcg);
		self
	}
}

/// One application-level audit entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
	/// Assigned by the store at insertion
	pub id: u64,

	/// When the entry was written
	pub created_at: DateTime<Utc>,

	pub category: String,

	pub message: String,

	/// Free-form JSON context, kept as text so the record stays self-describing
	pub details: Option<String>,
}

impl LogEvent {
	pub fn new(created_at: DateTime<Utc>, category: &str, message: impl Into<String>) -> Self {
		Self {
			id: 0,
			created_at,
			category: category.to_string(),
			message: message.into(),
			details: None,
		}
	}

	/// Attach structured context serialized as JSON
	pub fn with_details(mut self, details: &serde_json::Value) -> Self {
		self.details = Some(details.to_string());
		self
	}

	/// Parse the attached context back into JSON
	pub fn details_json(&self) -> Option<serde_json::Value> {
		self.details.as_deref().and_then(|raw| serde_json::from_str(raw).ok())
	}
}

/// How a purge window was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurgeMode {
	/// Rolling window derived from the reference instant
	Automatic,
	/// Window supplied by the caller
	Manual,
}

impl std::fmt::Display for PurgeMode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			PurgeMode::Automatic => write!(f, "automatic"),
			PurgeMode::Manual => write!(f, "manual"),
		}
	}
}

/// Outcome of one purge attempt, persisted once per attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurgeRunRecord {
	pub run_id: Uuid,

	pub mode: PurgeMode,

	/// Reference instant the attempt was evaluated against
	pub attempted_at: DateTime<Utc>,

	/// Set only when the purge succeeded
	pub completed_at: Option<DateTime<Utc>>,

	/// Lower bound of the applied deletion range (None = unbounded)
	pub window_start: Option<DateTime<Utc>>,

	/// Exclusive upper bound of the applied deletion range
	pub window_end: DateTime<Utc>,

	pub impacts_deleted: u64,

	pub events_deleted: u64,

	/// Whether log events were excluded from this purge
	pub events_protected: bool,

	pub succeeded: bool,

	/// Failure description for unsuccessful attempts
	pub error: Option<String>,
}

impl PurgeRunRecord {
	/// Record for a purge that removed rows and completed at `now`
	pub fn success(
		mode: PurgeMode, range: &TimeRange, events_protected: bool, impacts_deleted: u64,
		events_deleted: u64, now: DateTime<Utc>,
	) -> Self {
		Self {
			run_id: Uuid::new_v4(),
			mode,
			attempted_at: now,
			completed_at: Some(now),
			window_start: range.start,
			window_end: range.end,
			impacts_deleted,
			events_deleted,
			events_protected,
			succeeded: true,
			error: None,
		}
	}

	/// Record for a purge that failed; counts are zero by construction
	pub fn failure(
		mode: PurgeMode, range: &TimeRange, events_protected: bool, error: String,
		now: DateTime<Utc>,
	) -> Self {
		Self {
			run_id: Uuid::new_v4(),
			mode,
			attempted_at: now,
			completed_at: None,
			window_start: range.start,
			window_end: range.end,
			impacts_deleted: 0,
			events_deleted: 0,
			events_protected,
			succeeded: false,
			error: Some(error),
		}
	}

	/// One-line human-readable summary
	pub fn summary(&self) -> String {
		let range = match self.window_start {
			Some(start) => format!("[{}, {})", start.to_rfc3339(), self.window_end.to_rfc3339()),
			None => format!("before {}", self.window_end.to_rfc3339()),
		};
		if !self.succeeded {
			return format!(
				"{} purge of {} failed: {}",
				capitalize(&self.mode.to_string()),
				range,
				self.error.as_deref().unwrap_or("unknown error")
			);
		}
		let events = if self.events_protected {
			"events kept".to_string()
		} else {
			format!("{} events deleted", self.events_deleted)
		};
		format!(
			"{} purge: {} impacts deleted {}, {}",
			capitalize(&self.mode.to_string()),
			self.impacts_deleted,
			range,
			events
		)
	}
}

fn capitalize(word: &str) -> String {
	let mut chars = word.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}

/// The two time-stamped collections held by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
	Impacts,
	LogEvents,
}

impl std::fmt::Display for Collection {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Collection::Impacts => write!(f, "impacts"),
			Collection::LogEvents => write!(f, "log_events"),
		}
	}
}

/// Half-open time predicate `[start, end)` over a collection's timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
	/// Inclusive lower bound, None = unbounded
	pub start: Option<DateTime<Utc>>,
	/// Exclusive upper bound
	pub end: DateTime<Utc>,
}

impl TimeRange {
	pub fn new(start: Option<DateTime<Utc>>, end: DateTime<Utc>) -> Self {
		Self { start, end }
	}

	/// Everything strictly before `end`
	pub fn before(end: DateTime<Utc>) -> Self {
		Self { start: None, end }
	}

	/// Every representable instant
	pub fn all() -> Self {
		Self { start: None, end: DateTime::<Utc>::MAX_UTC }
	}

	pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
		self.start.map_or(true, |start| timestamp >= start) && timestamp < self.end
	}

	pub fn is_empty(&self) -> bool {
		self.start.is_some_and(|start| start >= self.end)
	}

	/// Key bounds in microseconds since the epoch, used for table range scans
	pub fn micros_bounds(&self) -> (i64, i64) {
		let start = self.start.map_or(i64::MIN, |start| start.timestamp_micros());
		(start, self.end.timestamp_micros())
	}
}

/// Row counts and purge bookkeeping
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchiveStats {
	pub total_impacts: u64,
	pub total_log_events: u64,
	pub purge_runs: u64,
	pub last_purge: Option<PurgeRunRecord>,
}
