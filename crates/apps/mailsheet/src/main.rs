//! mailsheet - copy unread Gmail messages into a Google Sheet
//!
//! Takes no arguments. Settings come from ~/.config/mailsheet/mailsheet.json
//! (or `$MAILSHEET_CONFIG`). Exits 0 when the run completes, even if some
//! messages could not be marked read, and 1 when it aborts.

use log::{error, info, warn};
use mailsync::{
    GmailClient, GoogleAuth, GoogleCredentials, JsonStateStore, RunStatus, SheetsClient,
    StatePersistence, StateStore, SyncConfig, SyncOrchestrator, SyncReport,
};
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    // Bootstrap config directory
    if let Err(e) = config::init() {
        warn!("Failed to initialize config directory: {:#}", e);
    }

    ExitCode::from(run().exit_code())
}

fn run() -> RunStatus {
    let cfg = match SyncConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load settings: {:#}", e);
            SyncReport::aborted_early(0).log_aborted();
            return RunStatus::Aborted;
        }
    };

    let store = match cfg.persistence() {
        StatePersistence::Local => JsonStateStore::new(&cfg.state_path),
    };

    // Reject bad settings before any browser window or network call
    if let Err(e) = cfg.validate() {
        error!("{}", e);
        if let Some(path) = config::config_path("mailsheet.json") {
            error!("Set spreadsheet_id in {} or MAILSHEET_SPREADSHEET_ID", path.display());
        }
        return abort_early(&store);
    }

    let auth = match authenticate(&cfg) {
        Ok(auth) => Arc::new(auth),
        Err(e) => {
            error!("Authentication failed: {:#}", e);
            return abort_early(&store);
        }
    };

    let gmail = GmailClient::new(Arc::clone(&auth), cfg.retry.clone());
    let sheets = SheetsClient::new(
        auth,
        cfg.spreadsheet_id.as_str(),
        cfg.sheet_name.as_str(),
        cfg.retry.clone(),
    );

    let result = SyncOrchestrator::new(&cfg, &gmail, &sheets, &store).run();
    let status = RunStatus::of(&result);
    if let Ok(report) = &result {
        info!(
            "Finished in {} ms: {} unread, {} new, {} filtered, {} fetch errors",
            report.duration_ms,
            report.unread,
            report.candidates,
            report.filtered,
            report.fetch_failures
        );
    }
    status
}

/// Log the aborted-run summary for a failure before the pipeline started
fn abort_early(store: &dyn StateStore) -> RunStatus {
    SyncReport::aborted_early(store.load().tracked()).log_aborted();
    RunStatus::Aborted
}

/// Load OAuth client credentials and make sure a usable token exists
fn authenticate(cfg: &SyncConfig) -> anyhow::Result<GoogleAuth> {
    let creds = GoogleCredentials::load(cfg.credentials_path.as_deref()).inspect_err(|_| {
        if let Some(path) = GoogleCredentials::default_credentials_path() {
            warn!(
                "To configure Google access, either:\n\
                 1. Place your Google OAuth credentials at: {}\n\
                 2. Or set environment variables: GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET",
                path.display()
            );
        }
    })?;

    let auth = GoogleAuth::new(creds, cfg.token_path.clone());
    auth.get_access_token()?;
    info!("Google client authenticated");
    Ok(auth)
}
