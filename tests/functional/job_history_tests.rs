//! Job run history lookups

use crate::common::FakeExecutor;
use chrono::NaiveDate;
use ucedit::client::{QueryResult, ResultColumn};
use ucedit::history::{build_job_history_query, fetch_job_history, JobId, HISTORY_COLUMNS};
use ucedit::value::{ColumnType, ScalarValue};
use ucedit::EditorError;

fn history_result() -> QueryResult {
    let types = [
        ("BIGINT", "bigint"),
        ("BIGINT", "bigint"),
        ("BIGINT", "bigint"),
        ("STRING", "string"),
        ("STRING", "string"),
        ("STRING", "string"),
        ("TIMESTAMP", "timestamp"),
        ("TIMESTAMP", "timestamp"),
    ];
    QueryResult {
        columns: HISTORY_COLUMNS
            .iter()
            .zip(types)
            .map(|(name, (type_name, type_text))| ResultColumn::new(*name, type_name, type_text))
            .collect(),
        rows: vec![
            vec![
                Some("42".into()),
                Some("1060426922965246".into()),
                Some("900".into()),
                Some("nightly".into()),
                Some("JOB_RUN".into()),
                Some("SUCCEEDED".into()),
                Some("2024-03-05T02:00:00.000Z".into()),
                Some("2024-03-05T02:12:30.000Z".into()),
            ],
            vec![
                Some("42".into()),
                Some("1060426922965246".into()),
                Some("901".into()),
                Some("nightly".into()),
                Some("JOB_RUN".into()),
                None,
                Some("2024-03-06T02:00:00.000Z".into()),
                None,
            ],
        ],
    }
}

#[test]
fn test_history_query_filters_by_job() {
    let job_id = JobId::parse("1060426922965246").unwrap();
    let sql = build_job_history_query(job_id);

    assert!(sql.contains("FROM system.lakeflow.job_run_timeline"));
    assert!(sql.contains("WHERE job_id = 1060426922965246"));
    assert!(sql.ends_with("ORDER BY run_start_time DESC"));
}

#[test]
fn test_fetch_history_types_the_runs() {
    let executor = FakeExecutor::with_result(history_result());
    let job_id = JobId::parse("1060426922965246").unwrap();

    let runs = fetch_job_history(&executor, job_id).unwrap();

    assert_eq!(executor.queries.borrow().len(), 1);
    assert_eq!(runs.column_names(), HISTORY_COLUMNS.to_vec());
    assert_eq!(runs.columns()[6].column_type, ColumnType::Timestamp);
    assert_eq!(runs.row_count(), 2);
    assert_eq!(runs.rows()[0][2], ScalarValue::Int(900));
    assert_eq!(
        runs.rows()[0][6],
        ScalarValue::Timestamp(
            NaiveDate::from_ymd_opt(2024, 3, 5)
                .unwrap()
                .and_hms_opt(2, 0, 0)
                .unwrap()
        )
    );
    // a run still in progress has no result or end time
    assert!(runs.rows()[1][5].is_null());
    assert!(runs.rows()[1][7].is_null());
}

#[test]
fn test_job_without_runs() {
    let executor = FakeExecutor::with_result(QueryResult {
        columns: history_result().columns,
        rows: Vec::new(),
    });
    let runs = fetch_job_history(&executor, JobId::parse("7").unwrap()).unwrap();
    assert!(runs.is_empty());
}

#[test]
fn test_invalid_job_ids() {
    assert!(matches!(JobId::parse("  "), Err(EditorError::EmptySelection { .. })));
    assert!(matches!(JobId::parse("12a"), Err(EditorError::InvalidInput { .. })));
    assert!(matches!(JobId::parse("-5"), Err(EditorError::InvalidInput { .. })));
}

#[test]
fn test_warehouse_failure_propagates() {
    let executor = FakeExecutor::failing("TABLE_OR_VIEW_NOT_FOUND");
    let err = fetch_job_history(&executor, JobId::parse("7").unwrap()).unwrap_err();
    assert!(matches!(err, EditorError::Statement { ref message } if message == "TABLE_OR_VIEW_NOT_FOUND"));
}
