//! Normalized message records and the sheet rows projected from them

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a message (mailbox message ID)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One unread message, reduced to the fields the sheet cares about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Mailbox message ID
    pub id: MessageId,
    /// Raw `From` header value
    pub sender: String,
    /// Subject line (empty when the header is missing)
    pub subject: String,
    /// RFC 3339 date, or empty when the `Date` header could not be parsed
    pub iso_date: String,
    /// Plain-text body
    pub body: String,
}

impl MessageRecord {
    pub fn new(id: impl Into<MessageId>) -> Self {
        Self {
            id: id.into(),
            sender: String::new(),
            subject: String::new(),
            iso_date: String::new(),
            body: String::new(),
        }
    }

    pub fn sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = sender.into();
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn iso_date(mut self, iso_date: impl Into<String>) -> Self {
        self.iso_date = iso_date.into();
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }
}

/// A single destination row: sender, subject, date, body, in that order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    pub sender: String,
    pub subject: String,
    pub date: String,
    pub body: String,
}

impl SheetRow {
    /// Number of columns every appended row occupies
    pub const COLUMNS: usize = 4;

    /// Largest value a single Sheets cell accepts
    pub const MAX_CELL_CHARS: usize = 50_000;

    /// Cell values in column order
    pub fn values(&self) -> [&str; Self::COLUMNS] {
        [
            self.sender.as_str(),
            self.subject.as_str(),
            self.date.as_str(),
            self.body.as_str(),
        ]
    }
}

impl From<&MessageRecord> for SheetRow {
    fn from(record: &MessageRecord) -> Self {
        Self {
            sender: fit_cell(&record.sender),
            subject: fit_cell(&record.subject),
            date: record.iso_date.clone(),
            body: fit_cell(&record.body),
        }
    }
}

/// Cut a value down to the cell limit, on a char boundary
fn fit_cell(value: &str) -> String {
    match value.char_indices().nth(SheetRow::MAX_CELL_CHARS) {
        Some((end, _)) => value[..end].to_string(),
        None => value.to_string(),
    }
}
