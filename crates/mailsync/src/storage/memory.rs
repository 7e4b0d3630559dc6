//! In-memory state storage
//!
//! Used by tests to observe exactly when and what the pipeline persists.

use std::sync::RwLock;

use super::StateStore;
use crate::error::SyncError;
use crate::models::SyncState;

/// In-memory implementation of StateStore
pub struct InMemoryStateStore {
    state: RwLock<Option<SyncState>>,
    saves: RwLock<usize>,
}

impl InMemoryStateStore {
    /// Create an empty store (as if no previous run happened)
    pub fn new() -> Self {
        Self {
            state: RwLock::new(None),
            saves: RwLock::new(0),
        }
    }

    /// Create a store holding the state of a previous run
    pub fn with_state(state: SyncState) -> Self {
        Self {
            state: RwLock::new(Some(state)),
            saves: RwLock::new(0),
        }
    }

    /// Last saved (or seeded) state
    pub fn snapshot(&self) -> Option<SyncState> {
        self.state.read().unwrap().clone()
    }

    /// Number of times `save` was called
    pub fn save_count(&self) -> usize {
        *self.saves.read().unwrap()
    }
}

impl Default for InMemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for InMemoryStateStore {
    fn load(&self) -> SyncState {
        self.snapshot().unwrap_or_default()
    }

    fn save(&self, state: &SyncState) -> Result<(), SyncError> {
        *self.state.write().unwrap() = Some(state.clone());
        *self.saves.write().unwrap() += 1;
        Ok(())
    }
}
