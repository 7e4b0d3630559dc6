//! Integration tests for the mailsync crate
//!
//! These tests drive complete pipeline runs against the in-memory mailbox
//! and sheet, with state persisted to a real JSON file.

use mailsync::sync::memory::{InMemoryMailbox, InMemorySheet};
use mailsync::{
    JsonStateStore, MessageId, MessageRecord, RunStatus, StateStore, SyncConfig, SyncError,
    SyncOrchestrator, SyncReport,
};
use tempfile::TempDir;

/// Helper to create test messages
fn make_record(id: &str, subject: &str) -> MessageRecord {
    MessageRecord::new(id)
        .sender(format!("Sender {} <{}@example.com>", id, id.to_lowercase()))
        .subject(subject)
        .iso_date("2024-03-05T09:30:00+00:00")
        .body(format!("This is the body of message {}", id))
}

struct Harness {
    _dir: TempDir,
    config: SyncConfig,
    store: JsonStateStore,
    mailbox: InMemoryMailbox,
    sheet: InMemorySheet,
}

impl Harness {
    fn new(records: Vec<MessageRecord>) -> Self {
        let dir = TempDir::new().unwrap();
        let state_path = dir.path().join("state").join("state.json");
        let config = SyncConfig {
            spreadsheet_id: "test-spreadsheet".to_string(),
            state_path: state_path.clone(),
            ..SyncConfig::default()
        };
        Self {
            _dir: dir,
            config,
            store: JsonStateStore::new(state_path),
            mailbox: InMemoryMailbox::with_unread(records),
            sheet: InMemorySheet::new(),
        }
    }

    fn with_filter(mut self, filter: &str) -> Self {
        self.config.subject_filter = Some(filter.to_string());
        self
    }

    fn run(&self) -> Result<SyncReport, SyncError> {
        SyncOrchestrator::new(&self.config, &self.mailbox, &self.sheet, &self.store).run()
    }

    fn processed(&self) -> Vec<String> {
        self.store
            .load()
            .processed_ids
            .into_iter()
            .map(|id| id.0)
            .collect()
    }

    fn appended_subjects(&self) -> Vec<String> {
        self.sheet.rows().into_iter().map(|r| r.subject).collect()
    }
}

#[test]
fn test_second_run_is_idempotent() {
    let harness = Harness::new(vec![make_record("m1", "First"), make_record("m2", "Second")]);

    let first = harness.run().unwrap();
    assert_eq!(first.rows_appended(), 2);
    let after_first = harness.processed();
    let first_run_at = harness.store.load().last_run.unwrap();

    let second = harness.run().unwrap();
    assert_eq!(second.rows_appended(), 0);
    assert_eq!(second.candidates, 0);
    assert_eq!(harness.sheet.rows().len(), 2);
    assert_eq!(harness.processed(), after_first);
    assert!(harness.store.load().last_run.unwrap() >= first_run_at);
}

#[test]
fn test_processed_ids_never_reappended_when_still_unread() {
    let harness = Harness::new(vec![make_record("m1", "Stuck"), make_record("m2", "Fine")]);
    harness.mailbox.fail_mark("m1");

    let first = harness.run().unwrap();
    assert_eq!(first.status(), RunStatus::PartialFailure);
    assert_eq!(harness.mailbox.unread_ids(), vec![MessageId::new("m1")]);

    // m1 is still unread at the source, but it is already tracked
    harness.mailbox.heal();
    let second = harness.run().unwrap();
    assert_eq!(second.unread, 1);
    assert_eq!(second.candidates, 0);
    assert_eq!(harness.sheet.batches(), vec![2]);
    assert_eq!(harness.appended_subjects(), vec!["Stuck", "Fine"]);
}

#[test]
fn test_failed_append_commits_nothing_and_is_retried() {
    let harness = Harness::new(vec![make_record("E", "Retry me")]);
    harness.sheet.fail_appends(true);

    let result = harness.run();
    assert!(matches!(result, Err(SyncError::SinkUnavailable(_))));
    assert_eq!(RunStatus::of(&result).exit_code(), 1);
    assert!(harness.mailbox.mark_attempts().is_empty());
    // Finalize was skipped: not even lastRun was written
    assert!(!harness.config.state_path.exists());
    assert!(harness.processed().is_empty());

    harness.sheet.fail_appends(false);
    let retry = harness.run().unwrap();
    assert_eq!(retry.rows_appended(), 1);
    assert_eq!(harness.appended_subjects(), vec!["Retry me"]);
    assert_eq!(harness.processed(), vec!["E"]);
}

#[test]
fn test_mark_failure_does_not_block_state() {
    let harness = Harness::new(vec![make_record("X", "Report")]);
    harness.mailbox.fail_mark("X");

    let result = harness.run();
    assert_eq!(RunStatus::of(&result), RunStatus::PartialFailure);
    assert_eq!(RunStatus::of(&result).exit_code(), 0);
    assert_eq!(harness.processed(), vec!["X"]);
}

#[test]
fn test_filtered_message_is_revisited() {
    let harness = Harness::new(vec![make_record("D", "Lunch")]).with_filter("Invoice");

    let first = harness.run().unwrap();
    assert_eq!(first.filtered, 1);
    assert!(harness.processed().is_empty());
    assert!(harness.sheet.batches().is_empty());

    let second = harness.run().unwrap();
    assert_eq!(second.candidates, 1);
    assert_eq!(second.filtered, 1);
    assert_eq!(harness.mailbox.fetched(), vec![MessageId::new("D"), MessageId::new("D")]);
    assert_eq!(harness.mailbox.unread_ids(), vec![MessageId::new("D")]);
}

#[test]
fn test_scenario_skip_processed_and_keep_order() {
    let harness = Harness::new(vec![
        make_record("A", "Alpha"),
        make_record("B", "Beta"),
        make_record("C", "Gamma"),
    ]);
    let mut seeded = harness.store.load();
    seeded.record_committed(MessageId::new("B"));
    harness.store.save(&seeded).unwrap();

    let report = harness.run().unwrap();
    assert_eq!(report.status(), RunStatus::Success);
    assert_eq!(harness.appended_subjects(), vec!["Alpha", "Gamma"]);
    assert_eq!(harness.processed(), vec!["A", "B", "C"]);
}

#[test]
fn test_scenario_filter_mismatch_appends_nothing() {
    let harness = Harness::new(vec![make_record("D", "Lunch")]).with_filter("Invoice");

    let result = harness.run();
    assert_eq!(RunStatus::of(&result).exit_code(), 0);
    assert!(harness.sheet.batches().is_empty());
    assert!(harness.processed().is_empty());
}

#[test]
fn test_filter_is_case_insensitive() {
    let harness = Harness::new(vec![
        make_record("I1", "Your INVOICE #12"),
        make_record("L1", "Lunch on Friday"),
        make_record("I2", "invoice reminder"),
    ])
    .with_filter("Invoice");

    harness.run().unwrap();
    assert_eq!(
        harness.appended_subjects(),
        vec!["Your INVOICE #12", "invoice reminder"]
    );
    assert_eq!(harness.mailbox.unread_ids(), vec![MessageId::new("L1")]);
}

#[test]
fn test_scenario_corrupt_state_file_starts_fresh() {
    let harness = Harness::new(vec![make_record("N", "New")]);
    std::fs::create_dir_all(harness.config.state_path.parent().unwrap()).unwrap();
    std::fs::write(&harness.config.state_path, "{ this is not json").unwrap();

    let report = harness.run().unwrap();
    assert_eq!(report.rows_appended(), 1);
    assert_eq!(harness.processed(), vec!["N"]);
}

#[test]
fn test_state_file_format() {
    let harness = Harness::new(vec![make_record("m1", "One")]);
    harness.run().unwrap();

    let content = std::fs::read_to_string(&harness.config.state_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(value["processedIds"], serde_json::json!(["m1"]));
    assert!(value["lastRun"].is_string());
}

#[test]
fn test_legacy_state_file_is_honoured() {
    let harness = Harness::new(vec![make_record("old", "Seen before"), make_record("new", "Fresh")]);
    std::fs::create_dir_all(harness.config.state_path.parent().unwrap()).unwrap();
    std::fs::write(
        &harness.config.state_path,
        r#"{ "processed_ids": ["old"], "last_run": "2024-01-01T08:00:00.000001" }"#,
    )
    .unwrap();

    harness.run().unwrap();
    assert_eq!(harness.appended_subjects(), vec!["Fresh"]);
    assert_eq!(harness.processed(), vec!["new", "old"]);
}

#[test]
fn test_new_mail_between_runs() {
    let harness = Harness::new(vec![make_record("m1", "First")]);
    harness.run().unwrap();

    harness.mailbox.deliver(make_record("m2", "Second"));
    let report = harness.run().unwrap();
    assert_eq!(report.rows_appended(), 1);
    assert_eq!(harness.appended_subjects(), vec!["First", "Second"]);
    assert_eq!(harness.sheet.batches(), vec![1, 1]);
}

#[test]
fn test_listing_limit_respected() {
    let mut harness = Harness::new(vec![
        make_record("m1", "One"),
        make_record("m2", "Two"),
        make_record("m3", "Three"),
    ]);
    harness.config.max_results = 2;

    let report = harness.run().unwrap();
    assert_eq!(report.unread, 2);
    assert_eq!(harness.appended_subjects(), vec!["One", "Two"]);

    let report = harness.run().unwrap();
    assert_eq!(report.rows_appended(), 1);
    assert_eq!(harness.appended_subjects(), vec!["One", "Two", "Three"]);
}

#[test]
fn test_rows_have_four_columns_in_order() {
    let harness = Harness::new(vec![make_record("m1", "Subject line")]);
    harness.run().unwrap();

    let rows = harness.sheet.rows();
    assert_eq!(
        rows[0].values(),
        [
            "Sender m1 <m1@example.com>",
            "Subject line",
            "2024-03-05T09:30:00+00:00",
            "This is the body of message m1",
        ]
    );
}
