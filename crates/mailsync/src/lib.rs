//! Mailsync - unread Gmail messages to Google Sheets rows
//!
//! This crate provides:
//! - Domain models (MessageRecord, SheetRow, SyncState)
//! - Gmail and Sheets API clients behind the MessageSource / RecordSink traits
//! - JSON file and in-memory state storage
//! - The idempotent sync pipeline and its run report
//!
//! Everything is synchronous; a run is a strictly sequential sequence of
//! blocking calls.

pub mod config;
pub mod error;
pub mod gmail;
pub mod google;
pub mod models;
pub mod retry;
pub mod sheets;
pub mod storage;
pub mod sync;

pub use config::{GoogleCredentials, StatePersistence, SyncConfig};
pub use error::SyncError;
pub use gmail::GmailClient;
pub use google::GoogleAuth;
pub use models::{MessageId, MessageRecord, SheetRow, SyncState};
pub use retry::RetryPolicy;
pub use sheets::SheetsClient;
pub use storage::{InMemoryStateStore, JsonStateStore, StateStore};
pub use sync::{
    CommittedMessage, MessageSource, RecordSink, RunStatus, SubjectFilter, SyncOrchestrator,
    SyncReport, SyncStep,
};
