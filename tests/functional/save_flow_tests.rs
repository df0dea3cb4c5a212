//! Save flow: diff check, confirmation, one overwrite statement

use crate::common::sample_data::{order, orders, orders_columns, orders_table};
use crate::common::{FakeExecutor, TestFixture};
use chrono::NaiveDate;
use std::fs;
use ucedit::commands::store_saved;
use ucedit::data::GridReader;
use ucedit::diff::{self, RowDiff};
use ucedit::orchestrator::{run_save, AutoConfirm, Confirmer, SaveOutcome, SaveSession, SaveState};
use ucedit::output::{NoticeLevel, RecordingNotifier};
use ucedit::snapshot::{Column, TableSnapshot};
use ucedit::value::{ColumnType, ScalarValue};
use ucedit::{Result, TableName};

struct Decline;

impl Confirmer for Decline {
    fn confirm(&self, _table: &TableName, _diff: &RowDiff) -> Result<bool> {
        Ok(false)
    }
}

fn edited_orders() -> TableSnapshot {
    TableSnapshot::new(
        orders_columns(),
        vec![
            order(1, "Ada", 19.5, true, 1),
            order(2, "Grace", 5.25, true, 2),
            order(3, "Linus", 100.0, false, 3),
        ],
    )
    .unwrap()
}

#[test]
fn test_save_writes_full_overwrite() {
    let executor = FakeExecutor::new();
    let notifier = RecordingNotifier::default();
    let mut session = SaveSession::new(orders_table(), orders(), edited_orders()).unwrap();

    let outcome = run_save(&mut session, &executor, &AutoConfirm, &notifier).unwrap();

    assert_eq!(outcome, SaveOutcome::Saved { rows: 3 });
    assert_eq!(
        executor.executed(),
        vec![
            "INSERT OVERWRITE main.sales.orders VALUES \
             (1,'Ada',19.5,TRUE,'2024-03-01'),\
             (2,'Grace',5.25,TRUE,'2024-03-02'),\
             (3,'Linus',100.0,FALSE,'2024-03-03');"
                .to_string()
        ]
    );
    assert_eq!(notifier.messages(NoticeLevel::Success), vec!["Changes saved"]);
    assert_eq!(session.state(), &SaveState::Succeeded);
}

#[test]
fn test_unchanged_edit_runs_nothing() {
    let executor = FakeExecutor::new();
    let notifier = RecordingNotifier::default();
    let mut session = SaveSession::new(orders_table(), orders(), orders()).unwrap();

    let outcome = run_save(&mut session, &executor, &AutoConfirm, &notifier).unwrap();

    assert_eq!(outcome, SaveOutcome::Unchanged);
    assert!(executor.executed().is_empty());
    assert!(notifier.messages(NoticeLevel::Progress).is_empty());
}

#[test]
fn test_declined_save_runs_nothing() {
    let executor = FakeExecutor::new();
    let notifier = RecordingNotifier::default();
    let mut session = SaveSession::new(orders_table(), orders(), edited_orders()).unwrap();

    let outcome = run_save(&mut session, &executor, &Decline, &notifier).unwrap();

    assert_eq!(outcome, SaveOutcome::Declined);
    assert!(executor.executed().is_empty());
    assert_eq!(session.state(), &SaveState::Idle);
    assert_eq!(session.edited(), &edited_orders());
}

#[test]
fn test_warehouse_error_is_reported_verbatim() {
    let message = "[INSUFFICIENT_PERMISSIONS] User does not have MODIFY on Table 'main.sales.orders'.";
    let executor = FakeExecutor::failing(message);
    let notifier = RecordingNotifier::default();
    let mut session = SaveSession::new(orders_table(), orders(), edited_orders()).unwrap();

    let outcome = run_save(&mut session, &executor, &AutoConfirm, &notifier).unwrap();

    assert_eq!(
        outcome,
        SaveOutcome::Failed {
            message: message.to_string()
        }
    );
    assert_eq!(notifier.messages(NoticeLevel::Error), vec![message]);
    assert!(notifier.messages(NoticeLevel::Success).is_empty());
    // edits survive for a retry
    assert_eq!(session.edited(), &edited_orders());
    assert_eq!(session.original(), &orders());
}

#[test]
fn test_retry_after_failure_and_resave() {
    let notifier = RecordingNotifier::default();
    let mut session = SaveSession::new(orders_table(), orders(), edited_orders()).unwrap();

    let failing = FakeExecutor::failing("TEMPORARILY_UNAVAILABLE");
    run_save(&mut session, &failing, &AutoConfirm, &notifier).unwrap();

    let working = FakeExecutor::new();
    let outcome = run_save(&mut session, &working, &AutoConfirm, &notifier).unwrap();
    assert_eq!(outcome, SaveOutcome::Saved { rows: 3 });
    assert_eq!(working.executed().len(), 1);

    // a second save with no further edits has nothing to do
    let outcome = run_save(&mut session, &working, &AutoConfirm, &notifier).unwrap();
    assert_eq!(outcome, SaveOutcome::Unchanged);
    assert_eq!(working.executed().len(), 1);
}

#[test]
fn test_saved_grid_becomes_new_baseline() {
    let fixture = TestFixture::new().unwrap();
    let table = orders_table();
    let grid_path = fixture.checkout(&table, &orders()).unwrap();

    let content = fs::read_to_string(&grid_path).unwrap();
    fixture
        .edit_grid(
            &grid_path,
            &content.replace("5.25,false,2024-03-02", "5.25,true,2024-03-02"),
        )
        .unwrap();

    let (metadata, original) = fixture.workspace.load_session(&table).unwrap();
    let edited = GridReader::new()
        .unwrap()
        .read_grid(&metadata.grid_path, &metadata.columns)
        .unwrap();
    assert_eq!(edited, edited_orders());

    let executor = FakeExecutor::new();
    let notifier = RecordingNotifier::default();
    let mut session = SaveSession::new(table.clone(), original, edited).unwrap();
    let outcome = run_save(&mut session, &executor, &AutoConfirm, &notifier).unwrap();
    assert_eq!(outcome, SaveOutcome::Saved { rows: 3 });

    store_saved(&fixture.workspace, &metadata, session.original()).unwrap();
    let (updated, baseline) = fixture.workspace.load_session(&table).unwrap();
    assert_eq!(baseline, edited_orders());
    assert_eq!(updated.session_id, metadata.session_id);
}

#[test]
fn test_subsecond_timestamps_are_stored_as_written() {
    let fixture = TestFixture::new().unwrap();
    let table = TableName::parse("main.ops.events").unwrap();
    let columns = vec![
        Column::new("id", ColumnType::Integer),
        Column::new("seen_at", ColumnType::Timestamp),
    ];
    let at = |micros: u32| {
        ScalarValue::Timestamp(
            NaiveDate::from_ymd_opt(2024, 3, 5)
                .unwrap()
                .and_hms_micro_opt(9, 30, 0, micros)
                .unwrap(),
        )
    };
    let original = TableSnapshot::new(columns.clone(), vec![vec![ScalarValue::Int(1), at(0)]]).unwrap();
    let grid_path = fixture.checkout(&table, &original).unwrap();
    fixture
        .edit_grid(&grid_path, "\"id\",\"seen_at\"\n1,2024-03-05 09:30:00\n2,2024-03-05 09:30:00.123\n")
        .unwrap();

    let (metadata, baseline) = fixture.workspace.load_session(&table).unwrap();
    let edited = GridReader::new()
        .unwrap()
        .read_grid(&metadata.grid_path, &metadata.columns)
        .unwrap();
    assert_eq!(edited.rows()[1][1], at(123_000));

    let executor = FakeExecutor::new();
    let notifier = RecordingNotifier::default();
    let mut session = SaveSession::new(table.clone(), baseline, edited).unwrap();
    run_save(&mut session, &executor, &AutoConfirm, &notifier).unwrap();
    assert_eq!(
        executor.executed(),
        vec!["INSERT OVERWRITE main.ops.events VALUES (1,'2024-03-05 09:30:00'),(2,'2024-03-05 09:30:00');"]
    );

    store_saved(&fixture.workspace, &metadata, session.original()).unwrap();
    let written = TableSnapshot::new(
        columns.clone(),
        vec![vec![ScalarValue::Int(1), at(0)], vec![ScalarValue::Int(2), at(0)]],
    )
    .unwrap();
    let (_, stored) = fixture.workspace.load_session(&table).unwrap();
    assert_eq!(stored, written);

    // the rewritten grid matches the table, so there is nothing left to save
    let reread = GridReader::new()
        .unwrap()
        .read_grid(&metadata.grid_path, &columns)
        .unwrap();
    assert!(!diff::differs(&stored, &reread));
}
