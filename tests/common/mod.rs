//! Common test utilities and helpers

use chrono::NaiveDate;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use ucedit::client::{CatalogApi, QueryResult, ResultColumn, SqlExecutor, Warehouse};
use ucedit::snapshot::{Column, TableSnapshot};
use ucedit::value::{ColumnType, ScalarValue};
use ucedit::{EditorError, EditorWorkspace, Result, TableName};

pub const HTTP_PATH: &str = "/sql/1.0/warehouses/abc123";

/// Test fixture manager for creating temporary test environments
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub workspace: EditorWorkspace,
}

impl TestFixture {
    /// Create a new test fixture with initialized workspace
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let workspace = EditorWorkspace::create_new(temp_dir.path().to_path_buf())?;

        Ok(Self {
            temp_dir,
            workspace,
        })
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Check out a snapshot as if it had been read from the warehouse
    pub fn checkout(&self, table: &TableName, snapshot: &TableSnapshot) -> Result<PathBuf> {
        let grid_path = self.workspace.default_grid_path(table);
        ucedit::data::write_grid(snapshot, &grid_path)?;
        self.workspace
            .create_session(table, "Shared", HTTP_PATH, snapshot, grid_path.clone())?;
        Ok(grid_path)
    }

    /// Replace the grid file content
    pub fn edit_grid(&self, path: &Path, content: &str) -> Result<()> {
        fs::write(path, content)?;
        Ok(())
    }
}

/// Helper for running CLI commands that need no warehouse
pub struct CliTestRunner {
    fixture: TestFixture,
}

impl CliTestRunner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            fixture: TestFixture::new()?,
        })
    }

    pub fn fixture(&self) -> &TestFixture {
        &self.fixture
    }

    pub fn run_command(&self, args: &[&str]) -> Result<()> {
        use clap::Parser;
        use ucedit::cli::Cli;
        use ucedit::commands::{execute_command, GlobalOptions};

        let mut cmd_args = vec!["ucedit"];
        cmd_args.extend(args);

        let cli = Cli::try_parse_from(cmd_args)
            .map_err(|e| EditorError::invalid_input(e.to_string()))?;

        let options = GlobalOptions {
            workspace: cli
                .workspace
                .or_else(|| Some(self.fixture.root().to_path_buf())),
            host: cli.host,
        };
        execute_command(cli.command, &options)
    }

    pub fn expect_success(&self, args: &[&str]) {
        self.run_command(args).expect("Command should succeed");
    }

    pub fn expect_failure(&self, args: &[&str]) -> EditorError {
        self.run_command(args).expect_err("Command should fail")
    }
}

/// Records statements and answers queries from a queue
#[derive(Default)]
pub struct FakeExecutor {
    pub executed: RefCell<Vec<String>>,
    pub queries: RefCell<Vec<String>>,
    pub results: RefCell<VecDeque<QueryResult>>,
    pub fail_with: Option<String>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn with_result(result: QueryResult) -> Self {
        let executor = Self::default();
        executor.results.borrow_mut().push_back(result);
        executor
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.borrow().clone()
    }
}

impl SqlExecutor for FakeExecutor {
    fn query(&self, sql: &str) -> Result<QueryResult> {
        self.queries.borrow_mut().push(sql.to_string());
        if let Some(message) = &self.fail_with {
            return Err(EditorError::statement(message.clone()));
        }
        Ok(self.results.borrow_mut().pop_front().unwrap_or_default())
    }

    fn execute(&self, sql: &str) -> Result<()> {
        self.executed.borrow_mut().push(sql.to_string());
        match &self.fail_with {
            Some(message) => Err(EditorError::statement(message.clone())),
            None => Ok(()),
        }
    }
}

/// In-memory catalog tree
#[derive(Default)]
pub struct FakeCatalog {
    pub warehouses: Vec<Warehouse>,
    pub tree: HashMap<String, HashMap<String, Vec<String>>>,
    pub calls: RefCell<Vec<String>>,
}

impl FakeCatalog {
    pub fn sample() -> Self {
        let mut tree = HashMap::new();
        let mut main = HashMap::new();
        main.insert(
            "sales".to_string(),
            vec!["orders".to_string(), "customers".to_string()],
        );
        main.insert("hr".to_string(), vec!["staff".to_string()]);
        tree.insert("main".to_string(), main);
        tree.insert("dev".to_string(), HashMap::new());

        Self {
            warehouses: vec![Warehouse {
                id: "abc123".to_string(),
                name: "Shared".to_string(),
                http_path: HTTP_PATH.to_string(),
            }],
            tree,
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl CatalogApi for FakeCatalog {
    fn list_warehouses(&self) -> Result<Vec<Warehouse>> {
        self.calls.borrow_mut().push("warehouses".to_string());
        Ok(self.warehouses.clone())
    }

    fn list_catalogs(&self) -> Result<Vec<String>> {
        self.calls.borrow_mut().push("catalogs".to_string());
        let mut names: Vec<String> = self.tree.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn list_schemas(&self, catalog: &str) -> Result<Vec<String>> {
        self.calls.borrow_mut().push(format!("schemas {}", catalog));
        let mut names: Vec<String> = self
            .tree
            .get(catalog)
            .map(|schemas| schemas.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        Ok(names)
    }

    fn list_tables(&self, catalog: &str, schema: &str) -> Result<Vec<String>> {
        self.calls
            .borrow_mut()
            .push(format!("tables {}.{}", catalog, schema));
        let mut names = self
            .tree
            .get(catalog)
            .and_then(|schemas| schemas.get(schema))
            .cloned()
            .unwrap_or_default();
        names.sort();
        Ok(names)
    }
}

/// Sample data generators for testing
pub mod sample_data {
    use super::*;

    pub fn orders_table() -> TableName {
        TableName::parse("main.sales.orders").unwrap()
    }

    pub fn orders_columns() -> Vec<Column> {
        vec![
            Column::new("id", ColumnType::Integer),
            Column::new("customer", ColumnType::Text),
            Column::new("amount", ColumnType::Float),
            Column::new("shipped", ColumnType::Boolean),
            Column::new("order_date", ColumnType::Date),
        ]
    }

    pub fn order(id: i64, customer: &str, amount: f64, shipped: bool, day: u32) -> Vec<ScalarValue> {
        vec![
            ScalarValue::Int(id),
            ScalarValue::Text(customer.to_string()),
            ScalarValue::Float(amount),
            ScalarValue::Bool(shipped),
            ScalarValue::Date(NaiveDate::from_ymd_opt(2024, 3, day).unwrap()),
        ]
    }

    pub fn orders() -> TableSnapshot {
        TableSnapshot::new(
            orders_columns(),
            vec![
                order(1, "Ada", 19.5, true, 1),
                order(2, "Grace", 5.25, false, 2),
                order(3, "Linus", 100.0, false, 3),
            ],
        )
        .unwrap()
    }

    /// Two-column table from the warehouse, as its JSON_ARRAY result
    pub fn people_result() -> QueryResult {
        QueryResult {
            columns: vec![
                ResultColumn::new("id", "INT", "int"),
                ResultColumn::new("name", "STRING", "string"),
            ],
            rows: vec![
                vec![Some("1".to_string()), Some("a".to_string())],
                vec![Some("2".to_string()), None],
            ],
        }
    }
}
