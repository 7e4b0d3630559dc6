//! Collaborator traits for the sync pipeline
//!
//! The pipeline only sees a mailbox and a sheet through these traits, so the
//! Google adapters and the in-memory test doubles are interchangeable.

use crate::error::SyncError;
use crate::models::{MessageId, MessageRecord, SheetRow};

/// A mailbox that can be polled for unread messages
pub trait MessageSource {
    /// Up to `limit` unread message IDs, in the order the service reports them
    ///
    /// Fails with [`SyncError::SourceUnavailable`] once the retry budget is spent.
    fn list_unread_ids(&self, limit: usize) -> Result<Vec<MessageId>, SyncError>;

    /// Fetch one message and normalize it
    ///
    /// [`SyncError::MessageFetch`] means only this message is affected;
    /// [`SyncError::SourceUnavailable`] means the mailbox itself is unreachable.
    fn fetch_and_parse(&self, id: &MessageId) -> Result<MessageRecord, SyncError>;

    /// Mark a message as processed (read). Repeating it is a no-op.
    fn mark_processed(&self, id: &MessageId) -> Result<(), SyncError>;
}

/// A tabular destination for message rows
pub trait RecordSink {
    /// Append all rows as one batch, in order. Empty input is a no-op.
    ///
    /// On error no row may be considered committed.
    fn append_batch(&self, rows: &[SheetRow]) -> Result<(), SyncError>;
}
