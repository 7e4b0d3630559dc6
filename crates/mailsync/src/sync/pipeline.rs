//! The idempotent mailbox-to-sheet pipeline
//!
//! One run walks these steps in order:
//! 1. Init: validate settings, load state
//! 2. Discover: list unread message IDs
//! 3. Dedup: drop IDs already in the processed set
//! 4. Fetch: fetch and normalize each candidate, apply the subject filter
//! 5. Commit: append the surviving rows as one batch
//! 6. Mark: mark each committed message read (best effort)
//! 7. Finalize: stamp `last_run` and persist state
//!
//! A failure before step 5 completes aborts the run without persisting
//! anything, so the next run starts from the same state and re-discovers
//! the same messages. After a successful commit the IDs become part of the
//! processed set whether or not marking them read worked, which is what
//! keeps a later run from appending them twice.

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use std::collections::HashSet;
use std::fmt;
use std::time::Instant;

use super::{MessageSource, RecordSink, SubjectFilter};
use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::models::{MessageId, MessageRecord, SheetRow, SyncState};
use crate::storage::StateStore;

/// Pipeline step, used to label log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStep {
    Init,
    Discover,
    Fetch,
    Commit,
    Mark,
    Finalize,
}

impl fmt::Display for SyncStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Discover => "discover",
            Self::Fetch => "fetch",
            Self::Commit => "commit",
            Self::Mark => "mark",
            Self::Finalize => "finalize",
        };
        f.write_str(name)
    }
}

/// Outcome of a committed message
///
/// `committed` drives the processed set; `acknowledged` (marked read at the
/// source) only drives logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedMessage {
    pub id: MessageId,
    pub acknowledged: bool,
}

/// Terminal state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    /// Rows were committed but some messages could not be marked read
    PartialFailure,
    Aborted,
}

impl RunStatus {
    /// Classify the result of [`SyncOrchestrator::run`]
    pub fn of(result: &Result<SyncReport, SyncError>) -> Self {
        match result {
            Ok(report) => report.status(),
            Err(_) => Self::Aborted,
        }
    }

    /// Process exit code: only aborted runs are failures
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Success | Self::PartialFailure => 0,
            Self::Aborted => 1,
        }
    }
}

/// Statistics from a pipeline run
#[derive(Debug, Default, Clone)]
pub struct SyncReport {
    /// Unread IDs reported by the source
    pub unread: usize,
    /// Unread IDs not yet processed
    pub candidates: usize,
    /// Candidates skipped because they could not be fetched
    pub fetch_failures: usize,
    /// Candidates skipped by the subject filter
    pub filtered: usize,
    /// Messages appended to the sheet, in row order
    pub committed: Vec<CommittedMessage>,
    /// Size of the processed set at the end of the run
    pub tracked_ids: usize,
    /// Timestamp persisted by this run
    pub last_run: Option<DateTime<Utc>>,
    /// Duration of the run
    pub duration_ms: u64,
}

impl SyncReport {
    pub fn rows_appended(&self) -> usize {
        self.committed.len()
    }

    /// Committed messages that are still unread at the source
    pub fn unacknowledged(&self) -> impl Iterator<Item = &MessageId> {
        self.committed
            .iter()
            .filter(|c| !c.acknowledged)
            .map(|c| &c.id)
    }

    /// Report for a run that aborted before any mail was looked at
    pub fn aborted_early(tracked_ids: usize) -> Self {
        Self {
            tracked_ids,
            ..Self::default()
        }
    }

    /// Closing summary line of an aborted run
    pub fn log_aborted(&self) {
        info!(
            "Run aborted. Appended {} rows. Tracking {} processed IDs.",
            self.rows_appended(),
            self.tracked_ids
        );
    }

    pub fn status(&self) -> RunStatus {
        if self.committed.iter().all(|c| c.acknowledged) {
            RunStatus::Success
        } else {
            RunStatus::PartialFailure
        }
    }
}

/// Drives one pipeline run against a mailbox, a sheet and a state store
pub struct SyncOrchestrator<'a> {
    config: &'a SyncConfig,
    source: &'a dyn MessageSource,
    sink: &'a dyn RecordSink,
    store: &'a dyn StateStore,
}

impl<'a> SyncOrchestrator<'a> {
    pub fn new(
        config: &'a SyncConfig,
        source: &'a dyn MessageSource,
        sink: &'a dyn RecordSink,
        store: &'a dyn StateStore,
    ) -> Self {
        Self {
            config,
            source,
            sink,
            store,
        }
    }

    /// Execute one run
    ///
    /// Returns `Err` for aborted runs (nothing persisted unless the failure
    /// was in persisting itself). `Ok` covers both full success and runs
    /// where some committed messages could not be marked read.
    pub fn run(&self) -> Result<SyncReport, SyncError> {
        let start = Instant::now();
        let mut report = SyncReport::default();

        // 1. Init
        self.config
            .validate()
            .map_err(|e| abort(SyncStep::Init, &report, e))?;
        let mut state = self.store.load();
        report.tracked_ids = state.tracked();
        let filter = SubjectFilter::new(self.config.subject_filter.as_deref());
        if filter.is_active() {
            info!(
                "Subject filter active: {:?}",
                self.config.subject_filter.as_deref().unwrap_or_default()
            );
        }

        // 2. Discover
        let unread = self
            .source
            .list_unread_ids(self.config.list_limit())
            .map_err(|e| abort(SyncStep::Discover, &report, e))?;
        report.unread = unread.len();

        // 3. Dedup
        let candidates = select_candidates(&unread, &state);
        report.candidates = candidates.len();
        info!(
            "{} total unread; {} new after de-duplication",
            report.unread, report.candidates
        );

        // 4. Fetch + filter
        let mut batch: Vec<(MessageId, MessageRecord)> = Vec::with_capacity(candidates.len());
        for id in candidates {
            let record = match self.source.fetch_and_parse(&id) {
                Ok(record) => record,
                Err(e) if e.is_fatal() => return Err(abort(SyncStep::Fetch, &report, e)),
                Err(e) => {
                    warn!("[{}] Skipping message {}: {}", SyncStep::Fetch, id, e);
                    report.fetch_failures += 1;
                    continue;
                }
            };

            if !filter.matches(&record.subject) {
                info!("Skipping message {} due to subject filter", id);
                report.filtered += 1;
                continue;
            }

            batch.push((id, record));
        }

        // 5. Commit, then 6. Mark
        if batch.is_empty() {
            info!("No new messages to append");
        } else {
            let rows: Vec<SheetRow> = batch.iter().map(|(_, record)| record.into()).collect();
            self.sink
                .append_batch(&rows)
                .map_err(|e| abort(SyncStep::Commit, &report, e))?;
            info!("Appended {} rows to sheet", rows.len());

            report.committed = self.mark_committed(batch, &mut state);
            report.tracked_ids = state.tracked();
        }

        // 7. Finalize
        let now = Utc::now();
        state.touch(now);
        self.store
            .save(&state)
            .map_err(|e| abort(SyncStep::Finalize, &report, e))?;
        report.last_run = Some(now);
        report.duration_ms = start.elapsed().as_millis() as u64;

        let unacknowledged = report.unacknowledged().count();
        if unacknowledged > 0 {
            warn!(
                "{} committed messages could not be marked read; they stay tracked and will not be appended again",
                unacknowledged
            );
        }
        info!(
            "Run complete. Appended {} rows. Tracking {} processed IDs.",
            report.rows_appended(),
            report.tracked_ids
        );
        Ok(report)
    }

    /// Mark every committed message read and add it to the processed set.
    /// A mark failure for one message does not affect the others.
    fn mark_committed(
        &self,
        batch: Vec<(MessageId, MessageRecord)>,
        state: &mut SyncState,
    ) -> Vec<CommittedMessage> {
        batch
            .into_iter()
            .map(|(id, _)| {
                let acknowledged = match self.source.mark_processed(&id) {
                    Ok(()) => true,
                    Err(e) => {
                        error!("[{}] {}", SyncStep::Mark, e);
                        false
                    }
                };
                state.record_committed(id.clone());
                CommittedMessage { id, acknowledged }
            })
            .collect()
    }
}

/// Unread IDs that are not yet processed, in discovery order, without
/// duplicates or empty IDs
fn select_candidates(unread: &[MessageId], state: &SyncState) -> Vec<MessageId> {
    let mut seen = HashSet::new();
    unread
        .iter()
        .filter(|id| {
            if id.is_empty() {
                warn!("Ignoring empty message ID reported by the mailbox");
                return false;
            }
            !state.contains(id) && seen.insert(*id)
        })
        .cloned()
        .collect()
}

/// Log an aborted run with its summary line and hand the error back
fn abort(step: SyncStep, report: &SyncReport, err: SyncError) -> SyncError {
    error!("[{}] Run aborted: {}", step, err);
    report.log_aborted();
    err
}
