//! Retention and purge logic
//!
//! - [`window`]: deletion windows, the retention policy and timestamp parsing
//! - [`engine`]: selects and deletes qualifying rows under the grace floor
//! - [`orchestrator`]: automatic and manual purge runs with persisted outcome

pub mod engine;
pub mod orchestrator;
pub mod window;

pub use engine::{PurgeResult, RetentionEngine};
pub use orchestrator::{PurgeOrchestrator, EVENT_PURGE_FAILED, EVENT_PURGE_SUCCEEDED};
pub use window::{parse_timestamp, PurgeWindow, RetentionPolicy};
