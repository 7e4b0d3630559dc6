//! Sync pipeline for moving unread mail into a sheet
//!
//! Runs are idempotent: they can be repeated or retried after a failure
//! without appending any message twice.

mod filter;
pub mod memory;
mod pipeline;
mod traits;

pub use filter::SubjectFilter;
pub use pipeline::{CommittedMessage, RunStatus, SyncOrchestrator, SyncReport, SyncStep};
pub use traits::{MessageSource, RecordSink};
