//! Statement Execution API client
//!
//! Statements are submitted with `INLINE` disposition and `JSON_ARRAY`
//! format, polled until they reach a terminal state, and their result chunks
//! are followed through `next_chunk_internal_link` until exhausted.

use super::http::DatabricksHttpClient;
use super::{QueryResult, ResultColumn, SqlExecutor};
use crate::error::{EditorError, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::sleep;
use std::time::{Duration, Instant};

const STATEMENTS_PATH: &str = "/api/2.0/sql/statements";
const SESSIONS_PATH: &str = "/api/2.0/sql/sessions";

/// Polling behavior for submitted statements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementConfig {
    /// Server-side wait before the submit call returns, e.g. `30s`
    pub wait_timeout: String,
    pub poll_interval: Duration,
    /// Give up polling after this long. `None` waits until the warehouse
    /// reports a terminal state.
    pub poll_timeout: Option<Duration>,
}

impl Default for StatementConfig {
    fn default() -> Self {
        Self {
            wait_timeout: "30s".to_string(),
            poll_interval: Duration::from_millis(500),
            poll_timeout: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecuteStatementRequest {
    pub warehouse_id: String,
    pub statement: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub disposition: String,
    pub format: String,
    pub wait_timeout: String,
    pub on_wait_timeout: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatementResponse {
    pub statement_id: String,
    pub status: StatementStatus,
    #[serde(default)]
    pub manifest: Option<ResultManifest>,
    #[serde(default)]
    pub result: Option<ResultData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatementStatus {
    pub state: StatementState,
    #[serde(default)]
    pub error: Option<ServiceError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatementState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Canceled,
    Closed,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceError {
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultManifest {
    pub schema: ResultSchema,
    #[serde(default)]
    pub total_row_count: Option<i64>,
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultSchema {
    #[serde(default)]
    pub columns: Vec<ColumnInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(default)]
    pub type_name: String,
    #[serde(default)]
    pub type_text: String,
    #[serde(default)]
    pub position: i32,
}

/// One inline chunk of rows
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultData {
    #[serde(default)]
    pub chunk_index: Option<i64>,
    #[serde(default)]
    pub row_count: Option<i64>,
    #[serde(default)]
    pub next_chunk_internal_link: Option<String>,
    #[serde(default)]
    pub data_array: Option<Vec<Vec<Option<String>>>>,
}

#[derive(Debug, Clone, Serialize)]
struct CreateSessionRequest {
    warehouse_id: String,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    session_configuration: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
struct CreateSessionResponse {
    session_id: String,
}

/// Submits statements to one warehouse
#[derive(Debug, Clone)]
pub struct StatementClient {
    http: Arc<DatabricksHttpClient>,
    warehouse_id: String,
    config: StatementConfig,
}

impl StatementClient {
    pub fn new(
        http: Arc<DatabricksHttpClient>,
        warehouse_id: impl Into<String>,
        config: StatementConfig,
    ) -> Self {
        Self {
            http,
            warehouse_id: warehouse_id.into(),
            config,
        }
    }

    pub fn create_session(&self) -> Result<String> {
        let request = CreateSessionRequest {
            warehouse_id: self.warehouse_id.clone(),
            session_configuration: session_configuration(),
        };
        let response: CreateSessionResponse = self.http.post_json(SESSIONS_PATH, &request)?;
        debug!("Created session {} on warehouse {}", response.session_id, self.warehouse_id);
        Ok(response.session_id)
    }

    /// Best effort; failures are only logged
    pub fn delete_session(&self, session_id: &str) {
        match self.http.delete(&format!("{}/{}", SESSIONS_PATH, session_id)) {
            Ok(()) => debug!("Deleted session {}", session_id),
            Err(e) => debug!("Failed to delete session {}: {}", session_id, e),
        }
    }

    /// Run one statement to completion and collect every result chunk
    pub fn run(&self, session_id: Option<&str>, sql: &str) -> Result<QueryResult> {
        let request = ExecuteStatementRequest {
            warehouse_id: self.warehouse_id.clone(),
            statement: sql.to_string(),
            session_id: session_id.map(str::to_string),
            disposition: "INLINE".to_string(),
            format: "JSON_ARRAY".to_string(),
            wait_timeout: self.config.wait_timeout.clone(),
            on_wait_timeout: "CONTINUE".to_string(),
        };

        debug!("Executing statement: {}", sql);
        let response: StatementResponse = self.http.post_json(STATEMENTS_PATH, &request)?;
        debug!(
            "Statement {} is {:?}",
            response.statement_id, response.status.state
        );

        let finished = self.wait_for_completion(response)?;
        self.collect_rows(finished)
    }

    fn get_status(&self, statement_id: &str) -> Result<StatementResponse> {
        self.http
            .get_json(&format!("{}/{}", STATEMENTS_PATH, statement_id), &[])
    }

    fn wait_for_completion(&self, response: StatementResponse) -> Result<StatementResponse> {
        let start = Instant::now();
        let mut current = response;

        loop {
            match current.status.state {
                StatementState::Succeeded => return Ok(current),
                StatementState::Closed if current.result.is_some() => return Ok(current),
                StatementState::Failed => {
                    return Err(EditorError::statement(failure_message(&current.status)))
                }
                StatementState::Canceled => {
                    return Err(EditorError::statement("Statement was canceled"))
                }
                StatementState::Closed => {
                    return Err(EditorError::statement("Statement was closed"))
                }
                StatementState::Pending | StatementState::Running => {
                    if let Some(limit) = self.config.poll_timeout {
                        if start.elapsed() > limit {
                            return Err(EditorError::statement(format!(
                                "Statement {} did not finish within {:?}",
                                current.statement_id, limit
                            )));
                        }
                    }

                    sleep(self.config.poll_interval);
                    debug!("Polling statement {}", current.statement_id);
                    current = self.get_status(&current.statement_id)?;
                }
            }
        }
    }

    fn collect_rows(&self, response: StatementResponse) -> Result<QueryResult> {
        let columns = response
            .manifest
            .map(|manifest| {
                let mut columns = manifest.schema.columns;
                columns.sort_by_key(|c| c.position);
                columns
                    .into_iter()
                    .map(|c| ResultColumn::new(c.name, c.type_name, c.type_text))
                    .collect()
            })
            .unwrap_or_default();

        let mut result = QueryResult {
            columns,
            rows: Vec::new(),
        };

        let mut chunk = response.result;
        while let Some(data) = chunk.take() {
            if let Some(rows) = data.data_array {
                result.rows.extend(rows);
            }
            if let Some(link) = data.next_chunk_internal_link {
                debug!("Fetching result chunk {}", link);
                chunk = Some(self.http.get_json(&link, &[])?);
            }
        }

        debug!(
            "Statement returned {} rows in {} columns",
            result.rows.len(),
            result.columns.len()
        );
        Ok(result)
    }
}

/// Sessions run in UTC so `TIMESTAMP` values read as UTC are written back
/// unchanged
fn session_configuration() -> HashMap<String, String> {
    HashMap::from([("TIMEZONE".to_string(), "UTC".to_string())])
}

/// Message reported by the warehouse for a failed statement, verbatim
fn failure_message(status: &StatementStatus) -> String {
    status
        .error
        .as_ref()
        .and_then(|e| e.message.clone().or_else(|| e.error_code.clone()))
        .unwrap_or_else(|| "Unknown error".to_string())
}

/// A statement-execution session bound to one warehouse
#[derive(Debug)]
pub struct WarehouseSession {
    client: StatementClient,
    session_id: String,
    http_path: String,
}

impl WarehouseSession {
    pub fn open(client: StatementClient, http_path: impl Into<String>) -> Result<Self> {
        let session_id = client.create_session()?;
        Ok(Self {
            client,
            session_id,
            http_path: http_path.into(),
        })
    }

    pub fn http_path(&self) -> &str {
        &self.http_path
    }

    pub fn close(&self) {
        self.client.delete_session(&self.session_id);
    }
}

impl SqlExecutor for WarehouseSession {
    fn query(&self, sql: &str) -> Result<QueryResult> {
        self.client.run(Some(&self.session_id), sql)
    }

    fn execute(&self, sql: &str) -> Result<()> {
        self.client.run(Some(&self.session_id), sql)?;
        Ok(())
    }
}
