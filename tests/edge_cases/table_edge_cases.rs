//! Edge case tests for table shapes and statement text

use crate::common::FakeExecutor;
use crate::common::sample_data::people_result;
use ucedit::client::{QueryResult, ResultColumn};
use ucedit::diff;
use ucedit::literal;
use ucedit::orchestrator::{run_save, AutoConfirm, SaveOutcome, SaveSession};
use ucedit::output::RecordingNotifier;
use ucedit::snapshot::{Column, TableSnapshot};
use ucedit::statement::{build_overwrite, TableName};
use ucedit::value::{ColumnType, ScalarValue};
use ucedit::EditorError;

fn people() -> TableSnapshot {
    TableSnapshot::from_query_result(&people_result()).unwrap()
}

#[test]
fn test_deleting_every_row_empties_the_table() {
    let table = TableName::parse("main.hr.people").unwrap();
    let empty = TableSnapshot::empty(people().columns().to_vec());
    let executor = FakeExecutor::new();
    let notifier = RecordingNotifier::default();

    let mut session = SaveSession::new(table, people(), empty).unwrap();
    let outcome = run_save(&mut session, &executor, &AutoConfirm, &notifier).unwrap();

    assert_eq!(outcome, SaveOutcome::Saved { rows: 0 });
    assert_eq!(executor.executed(), vec!["DELETE FROM main.hr.people;"]);
}

#[test]
fn test_unsupported_column_types_are_rejected_at_load() {
    for type_text in ["array<int>", "map<string,int>", "struct<a:int>", "binary", "interval day"] {
        let result = QueryResult {
            columns: vec![
                ResultColumn::new("id", "INT", "int"),
                ResultColumn::new("payload", "", type_text),
            ],
            rows: Vec::new(),
        };
        let err = TableSnapshot::from_query_result(&result).unwrap_err();
        assert!(
            matches!(err, EditorError::UnsupportedType { ref column, .. } if column == "payload"),
            "{} should be rejected",
            type_text
        );
    }
}

#[test]
fn test_duplicate_rows_count_in_diff() {
    let columns = vec![Column::new("k", ColumnType::Integer)];
    let one = |n: usize| {
        TableSnapshot::new(columns.clone(), vec![vec![ScalarValue::Int(1)]; n]).unwrap()
    };

    assert!(diff::differs(&one(2), &one(1)));
    let summary = diff::summarize(&one(3), &one(1));
    assert_eq!(summary.removed_rows(), 2);
    assert_eq!(summary.added_rows(), 0);
}

#[test]
fn test_nan_is_written_as_null() {
    assert_eq!(literal::encode(&ScalarValue::Float(f64::NAN)), "NULL");

    let table = TableName::parse("c.s.t").unwrap();
    let snapshot = TableSnapshot::new(
        vec![Column::new("x", ColumnType::Float)],
        vec![vec![ScalarValue::Float(f64::NAN)], vec![ScalarValue::Float(-0.5)]],
    )
    .unwrap();
    assert_eq!(
        build_overwrite(&table, &snapshot),
        "INSERT OVERWRITE c.s.t VALUES (NULL),(-0.5);"
    );
}

#[test]
fn test_awkward_names_and_text_are_escaped() {
    let table = TableName::new("main", "my schema", "odd`name").unwrap();
    let snapshot = TableSnapshot::new(
        vec![Column::new("note", ColumnType::Text)],
        vec![vec![ScalarValue::Text("it's a \\ test".to_string())]],
    )
    .unwrap();

    assert_eq!(
        build_overwrite(&table, &snapshot),
        "INSERT OVERWRITE main.`my schema`.`odd``name` VALUES ('it\\'s a \\\\ test');"
    );
}

#[test]
fn test_empty_table_name_parts() {
    assert!(matches!(
        TableName::parse("main..orders"),
        Err(EditorError::EmptySelection { ref field }) if field == "schema"
    ));
    assert!(matches!(
        TableName::parse("main.sales.orders.extra"),
        Err(EditorError::InvalidInput { .. })
    ));
}

#[test]
fn test_edited_snapshot_with_other_columns_is_refused() {
    let other = TableSnapshot::empty(vec![Column::new("id", ColumnType::Text)]);
    let table = TableName::parse("main.hr.people").unwrap();
    let err = SaveSession::new(table, people(), other).unwrap_err();
    assert!(matches!(err, EditorError::SchemaMismatch { .. }));
}
