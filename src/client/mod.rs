//! Clients for the Databricks workspace REST APIs
//!
//! The rest of the crate only talks to the warehouse and the catalog through
//! the [`SqlExecutor`] and [`CatalogApi`] traits, so tests can swap in
//! in-memory fakes.

pub mod http;
pub mod sea;
pub mod workspace;

#[cfg(test)]
pub(crate) mod test_server;

use crate::error::{EditorError, Result};
use serde::{Deserialize, Serialize};

pub use http::{DatabricksHttpClient, HttpClientConfig};
pub use sea::{StatementClient, StatementConfig};
pub use workspace::WorkspaceClient;

/// Column of a statement result as described by the result manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultColumn {
    pub name: String,
    /// Short type name, e.g. `LONG` or `DECIMAL`
    pub type_name: String,
    /// Full type text, e.g. `bigint` or `decimal(10,2)`
    pub type_text: String,
}

impl ResultColumn {
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        type_text: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            type_text: type_text.into(),
        }
    }
}

/// Rows of a finished statement in `JSON_ARRAY` form: every cell is the
/// warehouse's string rendering, or `None` for SQL NULL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    pub columns: Vec<ResultColumn>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl QueryResult {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// SQL warehouse as listed by the workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: String,
    pub name: String,
    /// `/sql/1.0/warehouses/<id>`
    pub http_path: String,
}

/// Runs SQL on one warehouse
pub trait SqlExecutor {
    /// Run a statement that returns rows
    fn query(&self, sql: &str) -> Result<QueryResult>;

    /// Run a statement for its effect only
    fn execute(&self, sql: &str) -> Result<()>;
}

/// Read-only view of warehouses and the catalog hierarchy.
///
/// Every list is sorted by name.
pub trait CatalogApi {
    fn list_warehouses(&self) -> Result<Vec<Warehouse>>;
    fn list_catalogs(&self) -> Result<Vec<String>>;
    fn list_schemas(&self, catalog: &str) -> Result<Vec<String>>;
    fn list_tables(&self, catalog: &str, schema: &str) -> Result<Vec<String>>;
}

/// Pull the warehouse id out of an HTTP path like `/sql/1.0/warehouses/abc123`
pub fn extract_warehouse_id(http_path: &str) -> Result<String> {
    let trimmed = http_path.trim().trim_end_matches('/');
    let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();

    match segments.as_slice() {
        [.., "warehouses" | "endpoints", id] => Ok(id.to_string()),
        _ => Err(EditorError::config(format!(
            "Cannot find a warehouse id in HTTP path '{}'",
            http_path
        ))),
    }
}
