//! Job run history from `system.lakeflow.job_run_timeline`

use crate::client::SqlExecutor;
use crate::error::{EditorError, Result};
use crate::snapshot::TableSnapshot;
use std::fmt;
use std::str::FromStr;

/// Columns returned by the history query, in order
pub const HISTORY_COLUMNS: [&str; 8] = [
    "workspace_id",
    "job_id",
    "run_id",
    "run_name",
    "run_type",
    "result_state",
    "run_start_time",
    "run_end_time",
];

/// Numeric job identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(u64);

impl JobId {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EditorError::empty_selection("job id"));
        }
        trimmed.parse::<u64>().map(Self).map_err(|_| {
            EditorError::invalid_input(format!("Job id must be a number, got '{}'", raw))
        })
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// One row per run of the job, newest first
pub fn build_job_history_query(job_id: JobId) -> String {
    format!(
        "SELECT workspace_id, job_id, run_id, run_name, run_type, result_state, \
         MIN(period_start_time) AS run_start_time, MAX(period_end_time) AS run_end_time \
         FROM system.lakeflow.job_run_timeline WHERE job_id = {} \
         GROUP BY workspace_id, job_id, run_id, run_name, run_type, result_state \
         ORDER BY run_start_time DESC",
        job_id
    )
}

pub fn fetch_job_history(executor: &dyn SqlExecutor, job_id: JobId) -> Result<TableSnapshot> {
    let result = executor.query(&build_job_history_query(job_id))?;
    TableSnapshot::from_query_result(&result)
}
