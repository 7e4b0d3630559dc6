//! Storage trait definitions

use crate::error::SyncError;
use crate::models::SyncState;

/// Durable home of the [`SyncState`]
pub trait StateStore {
    /// Load the state of the previous run
    ///
    /// Missing or unreadable state is not an error: it yields an empty state.
    fn load(&self) -> SyncState;

    /// Persist the state, creating any storage location needed
    ///
    /// Saving an unchanged state is allowed.
    fn save(&self, state: &SyncState) -> Result<(), SyncError>;
}
