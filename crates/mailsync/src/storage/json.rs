//! Local JSON file state storage

use anyhow::Context;
use log::{info, warn};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::StateStore;
use crate::error::SyncError;
use crate::models::SyncState;

/// State kept in a single JSON file
///
/// Saves go through a sibling temporary file that is renamed over the
/// target, so an interrupted save leaves the previous state intact.
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the state file
    ///
    /// Returns `Ok(None)` when there is no file yet and
    /// [`SyncError::StateCorrupt`] when it cannot be read or parsed.
    pub fn try_load(&self) -> Result<Option<SyncState>, SyncError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SyncError::StateCorrupt {
                    path: self.path.clone(),
                    source: e.into(),
                });
            }
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| SyncError::StateCorrupt {
                path: self.path.clone(),
                source: e.into(),
            })
    }

    fn write(&self, state: &SyncState) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create state directory: {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(state)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

impl StateStore for JsonStateStore {
    fn load(&self) -> SyncState {
        match self.try_load() {
            Ok(Some(state)) => state,
            Ok(None) => {
                info!("No state file at {}, starting fresh", self.path.display());
                SyncState::default()
            }
            Err(e) => {
                warn!("{}; starting fresh", e);
                SyncState::default()
            }
        }
    }

    fn save(&self, state: &SyncState) -> Result<(), SyncError> {
        self.write(state).map_err(|source| SyncError::StatePersist {
            path: self.path.clone(),
            source,
        })?;
        info!(
            "State saved to {} ({} processed IDs)",
            self.path.display(),
            state.tracked()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageId;
    use chrono::Utc;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> JsonStateStore {
        JsonStateStore::new(dir.path().join("nested").join("state.json"))
    }

    #[test]
    fn test_missing_file_is_empty_state() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(store.try_load().unwrap().is_none());
        assert_eq!(store.load(), SyncState::default());
    }

    #[test]
    fn test_save_creates_directories_and_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let mut state = SyncState::default();
        state.record_committed(MessageId::new("m2"));
        state.record_committed(MessageId::new("m1"));
        state.touch(Utc::now());
        store.save(&state).unwrap();

        assert!(store.path().exists());
        assert!(!store.path().with_extension("json.tmp").exists());
        let loaded = store.load();
        assert_eq!(loaded.processed_ids, state.processed_ids);
        assert_eq!(loaded.last_run, state.last_run);
    }

    #[test]
    fn test_corrupt_file_reported_then_treated_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{ not valid json").unwrap();

        assert!(matches!(
            store.try_load(),
            Err(SyncError::StateCorrupt { .. })
        ));
        assert_eq!(store.load(), SyncState::default());
    }

    #[test]
    fn test_save_unchanged_state_twice() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let state = SyncState::default();
        store.save(&state).unwrap();
        store.save(&state).unwrap();
        assert_eq!(store.load(), state);
    }

    #[test]
    fn test_save_into_unwritable_location_fails() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file, not a directory").unwrap();

        let store = JsonStateStore::new(blocker.join("state.json"));
        assert!(matches!(
            store.save(&SyncState::default()),
            Err(SyncError::StatePersist { .. })
        ));
    }
}
