//! Edge case tests for grid files

use crate::common::TestFixture;
use chrono::NaiveDate;
use std::fs;
use ucedit::data::{create_csv_content, write_grid, GridReader};
use ucedit::snapshot::{Column, TableSnapshot};
use ucedit::value::{ColumnType, ScalarValue};
use ucedit::EditorError;

fn text_columns() -> Vec<Column> {
    vec![
        Column::new("id", ColumnType::Integer),
        Column::new("note", ColumnType::Text),
    ]
}

fn text_row(id: i64, note: Option<&str>) -> Vec<ScalarValue> {
    vec![
        ScalarValue::Int(id),
        note.map_or(ScalarValue::Null, |n| ScalarValue::Text(n.to_string())),
    ]
}

fn round_trip(snapshot: &TableSnapshot) -> TableSnapshot {
    let fixture = TestFixture::new().unwrap();
    let path = fixture.root().join("grid.csv");
    write_grid(snapshot, &path).unwrap();
    GridReader::new()
        .unwrap()
        .read_grid(&path, snapshot.columns())
        .unwrap()
}

#[test]
fn test_empty_text_and_null_stay_distinct() {
    let snapshot = TableSnapshot::new(
        text_columns(),
        vec![text_row(1, Some("")), text_row(2, None)],
    )
    .unwrap();

    let content = create_csv_content(&snapshot);
    assert_eq!(content, "\"id\",\"note\"\n1,\"\"\n2,\n");
    assert_eq!(round_trip(&snapshot), snapshot);
}

#[test]
fn test_quotes_commas_and_newlines_in_text() {
    let snapshot = TableSnapshot::new(
        text_columns(),
        vec![
            text_row(1, Some("say \"hi\"")),
            text_row(2, Some("a, b")),
            text_row(3, Some("line one\nline two")),
            text_row(4, Some("O'Brien \\ backslash")),
            text_row(5, Some("北京 ☕")),
        ],
    )
    .unwrap();

    assert_eq!(round_trip(&snapshot), snapshot);
}

#[test]
fn test_text_that_looks_like_null() {
    let snapshot = TableSnapshot::new(
        text_columns(),
        vec![text_row(1, Some("NULL")), text_row(2, Some("null"))],
    )
    .unwrap();

    assert_eq!(round_trip(&snapshot), snapshot);
}

#[test]
fn test_typed_values_round_trip() {
    let columns = vec![
        Column::new("price", ColumnType::Decimal { precision: 10, scale: 2 }),
        Column::new("ratio", ColumnType::Float),
        Column::new("seen_at", ColumnType::Timestamp),
        Column::new("day", ColumnType::Date),
        Column::new("flag", ColumnType::Boolean),
    ];
    let snapshot = TableSnapshot::new(
        columns,
        vec![
            vec![
                ScalarValue::Decimal("-12.30".to_string()),
                ScalarValue::Float(0.1),
                ScalarValue::Timestamp(
                    NaiveDate::from_ymd_opt(2024, 2, 29)
                        .unwrap()
                        .and_hms_micro_opt(23, 59, 58, 123_456)
                        .unwrap(),
                ),
                ScalarValue::Date(NaiveDate::from_ymd_opt(1969, 12, 31).unwrap()),
                ScalarValue::Bool(false),
            ],
            vec![
                ScalarValue::Null,
                ScalarValue::Null,
                ScalarValue::Null,
                ScalarValue::Null,
                ScalarValue::Null,
            ],
        ],
    )
    .unwrap();

    assert_eq!(round_trip(&snapshot), snapshot);
}

#[test]
fn test_grid_with_only_header() {
    let snapshot = TableSnapshot::empty(text_columns());
    let read = round_trip(&snapshot);
    assert!(read.is_empty());
    assert_eq!(read.columns(), snapshot.columns());
}

#[test]
fn test_bad_value_in_typed_column() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture.root().join("grid.csv");
    fs::write(&path, "\"id\",\"note\"\nnot-a-number,\"x\"\n").unwrap();

    let err = GridReader::new()
        .unwrap()
        .read_grid(&path, &text_columns())
        .unwrap_err();
    assert!(matches!(err, EditorError::InvalidInput { .. }));
}

#[test]
fn test_reordered_header_is_rejected() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture.root().join("grid.csv");
    fs::write(&path, "\"note\",\"id\"\n\"x\",1\n").unwrap();

    let err = GridReader::new()
        .unwrap()
        .read_grid(&path, &text_columns())
        .unwrap_err();
    assert!(matches!(err, EditorError::SchemaMismatch { .. }));
}

#[test]
fn test_added_column_is_rejected() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture.root().join("grid.csv");
    fs::write(&path, "\"id\",\"note\",\"extra\"\n1,\"x\",2\n").unwrap();

    let err = GridReader::new()
        .unwrap()
        .read_grid(&path, &text_columns())
        .unwrap_err();
    assert!(matches!(err, EditorError::SchemaMismatch { .. }));
}
