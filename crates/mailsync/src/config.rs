//! Configuration loading for the sync pipeline
//!
//! Two things are loaded here:
//! - [`SyncConfig`]: what to sync and where (JSON file plus env overrides)
//! - [`GoogleCredentials`]: the OAuth client used for Gmail and Sheets
//!
//! Both are built once at startup and passed down explicitly.

use anyhow::{Context, Result};
use log::warn;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::SyncError;
use crate::retry::RetryPolicy;

/// Settings filename in the mailsheet config directory
const SETTINGS_FILE: &str = "mailsheet.json";

/// Credentials filename in the mailsheet config directory
const CREDENTIALS_FILE: &str = "google-credentials.json";

/// Largest page the Gmail list endpoint accepts
const MAX_LIST_RESULTS: usize = 500;

/// How sync state is persisted between runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatePersistence {
    /// JSON file on the local filesystem
    Local,
}

impl StatePersistence {
    /// Resolve a configured mode name. Only `local` is implemented; anything
    /// else falls back to it with a warning.
    pub fn resolve(mode: &str) -> Self {
        if !mode.eq_ignore_ascii_case("local") {
            warn!(
                "state_persistence '{}' is not supported, keeping local JSON state",
                mode
            );
        }
        Self::Local
    }
}

/// Pipeline settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Destination spreadsheet (required)
    pub spreadsheet_id: String,
    /// Destination tab
    pub sheet_name: String,
    /// Where processed message IDs are stored
    pub state_path: PathBuf,
    /// Where OAuth tokens are cached
    pub token_path: PathBuf,
    /// Google Cloud Console client file; the config directory copy is used if unset
    pub credentials_path: Option<PathBuf>,
    /// Only messages whose subject contains this (case-insensitive) are synced
    pub subject_filter: Option<String>,
    /// State persistence mode name
    pub state_persistence: String,
    /// Unread messages considered per run
    pub max_results: usize,
    /// Retry budget for every Gmail and Sheets call
    pub retry: RetryPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            sheet_name: "Sheet1".to_string(),
            state_path: config::config_path_or_local("state.json"),
            token_path: config::config_path_or_local("google-tokens.json"),
            credentials_path: None,
            subject_filter: None,
            state_persistence: "local".to_string(),
            max_results: 100,
            retry: RetryPolicy::default(),
        }
    }
}

impl SyncConfig {
    /// Load settings from `$MAILSHEET_CONFIG`, or the config directory copy,
    /// then apply environment overrides. Without either file, defaults are used.
    pub fn load() -> Result<Self> {
        let mut cfg = match std::env::var_os("MAILSHEET_CONFIG") {
            // An explicit path must exist
            Some(path) => Self::from_file(Path::new(&path))?,
            None => match config::config_path(SETTINGS_FILE) {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    /// Load settings from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        config::load_json_file(path)
    }

    /// Parse settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse settings JSON")
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(id) = std::env::var("MAILSHEET_SPREADSHEET_ID") {
            self.spreadsheet_id = id;
        }
        if let Ok(name) = std::env::var("MAILSHEET_SHEET_NAME") {
            self.sheet_name = name;
        }
        if let Ok(filter) = std::env::var("MAILSHEET_SUBJECT_FILTER") {
            self.subject_filter = Some(filter);
        }
    }

    /// Check the settings a run cannot start without
    pub fn validate(&self) -> Result<(), SyncError> {
        let id = self.spreadsheet_id.trim();
        if id.is_empty() || id.contains("REPLACE_WITH") {
            return Err(SyncError::Config(
                "spreadsheet_id is not set".to_string(),
            ));
        }
        if self.sheet_name.trim().is_empty() {
            return Err(SyncError::Config("sheet_name is empty".to_string()));
        }
        Ok(())
    }

    /// Resolved persistence mode (warns on unknown values)
    pub fn persistence(&self) -> StatePersistence {
        StatePersistence::resolve(&self.state_persistence)
    }

    /// Unread page size, clamped to what Gmail accepts
    pub fn list_limit(&self) -> usize {
        self.max_results.clamp(1, MAX_LIST_RESULTS)
    }
}

/// OAuth client credentials for the Google APIs
#[derive(Debug, Clone)]
pub struct GoogleCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Google Cloud Console credential file format (installed app)
#[derive(Deserialize)]
struct GoogleCredentialFile {
    installed: Option<InstalledCredentials>,
    web: Option<InstalledCredentials>,
}

#[derive(Deserialize)]
struct InstalledCredentials {
    client_id: String,
    client_secret: String,
}

impl GoogleCredentials {
    /// Load credentials using the following priority:
    /// 1. Compile-time embedded credentials
    /// 2. The configured credentials file
    /// 3. ~/.config/mailsheet/google-credentials.json
    /// 4. Runtime environment variables
    pub fn load(configured: Option<&Path>) -> Result<Self> {
        if let Some(creds) = Self::from_compile_time() {
            return Ok(creds);
        }

        if let Some(path) = configured {
            return Self::from_file(path);
        }

        if config::config_exists(CREDENTIALS_FILE) {
            let creds: GoogleCredentialFile = config::load_json(CREDENTIALS_FILE)?;
            return Self::from_credential_file(creds);
        }

        Self::from_env()
    }

    /// Build with: GOOGLE_CLIENT_ID=xxx GOOGLE_CLIENT_SECRET=yyy cargo build --release
    pub fn from_compile_time() -> Option<Self> {
        let client_id = option_env!("GOOGLE_CLIENT_ID")?;
        let client_secret = option_env!("GOOGLE_CLIENT_SECRET")?;

        if client_id.is_empty() || client_secret.is_empty() {
            return None;
        }

        Some(Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        })
    }

    /// Load credentials from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let creds: GoogleCredentialFile = config::load_json_file(path)?;
        Self::from_credential_file(creds)
    }

    fn from_credential_file(creds: GoogleCredentialFile) -> Result<Self> {
        // Support both "installed" (desktop) and "web" credential types
        let installed = creds
            .installed
            .or(creds.web)
            .context("Credentials file missing 'installed' or 'web' section")?;

        Ok(Self {
            client_id: installed.client_id,
            client_secret: installed.client_secret,
        })
    }

    /// Parse credentials from JSON string (Google Cloud Console format)
    pub fn from_json(json: &str) -> Result<Self> {
        let creds: GoogleCredentialFile =
            serde_json::from_str(json).context("Failed to parse credentials JSON")?;
        Self::from_credential_file(creds)
    }

    /// Load credentials from environment variables
    pub fn from_env() -> Result<Self> {
        let client_id = std::env::var("GOOGLE_CLIENT_ID")
            .context("GOOGLE_CLIENT_ID environment variable not set")?;
        let client_secret = std::env::var("GOOGLE_CLIENT_SECRET")
            .context("GOOGLE_CLIENT_SECRET environment variable not set")?;

        Ok(Self {
            client_id,
            client_secret,
        })
    }

    /// Default credentials file path (~/.config/mailsheet/google-credentials.json)
    pub fn default_credentials_path() -> Option<PathBuf> {
        config::config_path(CREDENTIALS_FILE)
    }
}
