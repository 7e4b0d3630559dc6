//! In-memory mailbox and sheet
//!
//! Stand-ins for Gmail and Sheets with failure injection and call
//! recording, used to exercise the pipeline without a network.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use super::{MessageSource, RecordSink};
use crate::error::SyncError;
use crate::models::{MessageId, MessageRecord, SheetRow};

/// How a fetch for a given message should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchFailure {
    /// Only this message is affected
    Message,
    /// The whole mailbox is unreachable
    Unavailable,
}

/// In-memory implementation of MessageSource
pub struct InMemoryMailbox {
    /// Unread message IDs, most recent first
    unread: RwLock<Vec<MessageId>>,
    messages: RwLock<HashMap<MessageId, MessageRecord>>,
    list_fails: RwLock<bool>,
    fetch_failures: RwLock<HashMap<MessageId, FetchFailure>>,
    mark_failures: RwLock<HashSet<MessageId>>,
    fetched: RwLock<Vec<MessageId>>,
    mark_attempts: RwLock<Vec<MessageId>>,
}

impl InMemoryMailbox {
    pub fn new() -> Self {
        Self {
            unread: RwLock::new(Vec::new()),
            messages: RwLock::new(HashMap::new()),
            list_fails: RwLock::new(false),
            fetch_failures: RwLock::new(HashMap::new()),
            mark_failures: RwLock::new(HashSet::new()),
            fetched: RwLock::new(Vec::new()),
            mark_attempts: RwLock::new(Vec::new()),
        }
    }

    /// Create a mailbox whose unread list is `records`, in order
    pub fn with_unread(records: impl IntoIterator<Item = MessageRecord>) -> Self {
        let mailbox = Self::new();
        for record in records {
            mailbox.deliver(record);
        }
        mailbox
    }

    /// Add a new unread message at the end of the unread list
    pub fn deliver(&self, record: MessageRecord) {
        let id = record.id.clone();
        self.messages.write().unwrap().insert(id.clone(), record);
        let mut unread = self.unread.write().unwrap();
        if !unread.contains(&id) {
            unread.push(id);
        }
    }

    /// Make `list_unread_ids` fail
    pub fn fail_listing(&self, fail: bool) {
        *self.list_fails.write().unwrap() = fail;
    }

    /// Make fetching `id` fail
    pub fn fail_fetch(&self, id: impl Into<MessageId>, failure: FetchFailure) {
        self.fetch_failures.write().unwrap().insert(id.into(), failure);
    }

    /// Make marking `id` as read fail
    pub fn fail_mark(&self, id: impl Into<MessageId>) {
        self.mark_failures.write().unwrap().insert(id.into());
    }

    /// Clear every injected failure
    pub fn heal(&self) {
        *self.list_fails.write().unwrap() = false;
        self.fetch_failures.write().unwrap().clear();
        self.mark_failures.write().unwrap().clear();
    }

    /// Currently unread message IDs
    pub fn unread_ids(&self) -> Vec<MessageId> {
        self.unread.read().unwrap().clone()
    }

    /// Every ID passed to `fetch_and_parse`, in call order
    pub fn fetched(&self) -> Vec<MessageId> {
        self.fetched.read().unwrap().clone()
    }

    /// Every ID passed to `mark_processed`, in call order
    pub fn mark_attempts(&self) -> Vec<MessageId> {
        self.mark_attempts.read().unwrap().clone()
    }
}

impl Default for InMemoryMailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageSource for InMemoryMailbox {
    fn list_unread_ids(&self, limit: usize) -> Result<Vec<MessageId>, SyncError> {
        if *self.list_fails.read().unwrap() {
            return Err(SyncError::SourceUnavailable(anyhow::anyhow!(
                "mailbox offline"
            )));
        }
        Ok(self.unread.read().unwrap().iter().take(limit).cloned().collect())
    }

    fn fetch_and_parse(&self, id: &MessageId) -> Result<MessageRecord, SyncError> {
        self.fetched.write().unwrap().push(id.clone());

        match self.fetch_failures.read().unwrap().get(id) {
            Some(FetchFailure::Message) => {
                return Err(SyncError::MessageFetch {
                    id: id.clone(),
                    source: anyhow::anyhow!("message could not be decoded"),
                });
            }
            Some(FetchFailure::Unavailable) => {
                return Err(SyncError::SourceUnavailable(anyhow::anyhow!(
                    "mailbox offline"
                )));
            }
            None => {}
        }

        self.messages
            .read()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| SyncError::MessageFetch {
                id: id.clone(),
                source: anyhow::anyhow!("message not found"),
            })
    }

    fn mark_processed(&self, id: &MessageId) -> Result<(), SyncError> {
        self.mark_attempts.write().unwrap().push(id.clone());

        if self.mark_failures.read().unwrap().contains(id) {
            return Err(SyncError::MarkProcessed {
                id: id.clone(),
                source: anyhow::anyhow!("modify request timed out"),
            });
        }
        self.unread.write().unwrap().retain(|unread| unread != id);
        Ok(())
    }
}

/// In-memory implementation of RecordSink
pub struct InMemorySheet {
    rows: RwLock<Vec<SheetRow>>,
    batches: RwLock<Vec<usize>>,
    append_fails: RwLock<bool>,
}

impl InMemorySheet {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            batches: RwLock::new(Vec::new()),
            append_fails: RwLock::new(false),
        }
    }

    /// Make `append_batch` fail
    pub fn fail_appends(&self, fail: bool) {
        *self.append_fails.write().unwrap() = fail;
    }

    /// All committed rows, in append order
    pub fn rows(&self) -> Vec<SheetRow> {
        self.rows.read().unwrap().clone()
    }

    /// Size of every `append_batch` call, including failed ones
    pub fn batches(&self) -> Vec<usize> {
        self.batches.read().unwrap().clone()
    }
}

impl Default for InMemorySheet {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordSink for InMemorySheet {
    fn append_batch(&self, rows: &[SheetRow]) -> Result<(), SyncError> {
        self.batches.write().unwrap().push(rows.len());

        if *self.append_fails.read().unwrap() {
            return Err(SyncError::SinkUnavailable(anyhow::anyhow!(
                "sheet returned HTTP 503"
            )));
        }
        self.rows.write().unwrap().extend_from_slice(rows);
        Ok(())
    }
}
