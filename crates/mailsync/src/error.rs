//! Error taxonomy for a pipeline run

use std::path::PathBuf;

use crate::models::MessageId;

/// Errors surfaced by the sync pipeline and its collaborators
///
/// `Config`, `SourceUnavailable`, `SinkUnavailable` and `StatePersist` end
/// the run. The remaining kinds are logged and the run continues.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("mail source unavailable: {0:#}")]
    SourceUnavailable(anyhow::Error),

    #[error("sheet unavailable: {0:#}")]
    SinkUnavailable(anyhow::Error),

    #[error("failed to fetch message {id}: {source:#}")]
    MessageFetch { id: MessageId, source: anyhow::Error },

    #[error("failed to mark message {id} as processed: {source:#}")]
    MarkProcessed { id: MessageId, source: anyhow::Error },

    #[error("state file {} is unreadable: {source:#}", .path.display())]
    StateCorrupt { path: PathBuf, source: anyhow::Error },

    #[error("failed to persist state to {}: {source:#}", .path.display())]
    StatePersist { path: PathBuf, source: anyhow::Error },
}

impl SyncError {
    /// Whether this error stops the run
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::SourceUnavailable(_)
                | Self::SinkUnavailable(_)
                | Self::StatePersist { .. }
        )
    }
}
