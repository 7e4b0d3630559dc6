//! Persisted de-duplication state between pipeline runs

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

use super::MessageId;

/// Tracks which messages have already been committed to the sheet
///
/// Membership in `processed_ids` is authoritative: an ID in this set is never
/// appended again, even if the mailbox still reports the message unread.
///
/// Serialized as `{ "processedIds": [...], "lastRun": "..." | null }`. The
/// snake_case keys written by older releases are still accepted on load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    /// Message IDs already committed to the sink
    #[serde(default, alias = "processed_ids")]
    pub processed_ids: BTreeSet<MessageId>,
    /// When the last run reached its finalize step
    #[serde(default, alias = "last_run", deserialize_with = "lenient_timestamp")]
    pub last_run: Option<DateTime<Utc>>,
}

impl SyncState {
    /// Check whether a message has already been committed
    pub fn contains(&self, id: &MessageId) -> bool {
        self.processed_ids.contains(id)
    }

    /// Record a committed message; returns false if it was already tracked
    pub fn record_committed(&mut self, id: MessageId) -> bool {
        self.processed_ids.insert(id)
    }

    /// Number of tracked message IDs
    pub fn tracked(&self) -> usize {
        self.processed_ids.len()
    }

    /// Stamp the run time
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_run = Some(now);
    }
}

/// Accept RFC 3339 timestamps as well as naive ISO-8601 ones (read as UTC).
/// Anything else becomes `None` instead of failing the whole state file.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
