//! Command implementations for ucedit CLI

use crate::cli::{Commands, OutputFormat};
use crate::client::{CatalogApi, DatabricksHttpClient, SqlExecutor, Warehouse, WorkspaceClient};
use crate::config::{AppConfig, ConfigOverrides};
use crate::data::{self, GridReader};
use crate::diff;
use crate::error::{EditorError, Result};
use crate::history::{self, JobId};
use crate::orchestrator::{self, AutoConfirm, Confirmer, SaveOutcome, SaveSession, StdinConfirm};
use crate::output::{ConsoleNotifier, JsonFormatter, Notifier, PrettyPrinter};
use crate::pool::{ConnectionPool, SessionConnector};
use crate::progress::with_spinner;
use crate::selection::Selection;
use crate::snapshot::TableSnapshot;
use crate::statement::{self, TableName};
use crate::workspace::{EditorWorkspace, SessionMetadata};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Options shared by every command
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub workspace: Option<PathBuf>,
    pub host: Option<String>,
}

/// Execute a command
pub fn execute_command(command: Commands, options: &GlobalOptions) -> Result<()> {
    match command {
        Commands::Warehouses { format } => warehouses_command(options, &format),
        Commands::Catalogs { format } => catalogs_command(options, &format),
        Commands::Schemas { catalog, format } => schemas_command(options, &catalog, &format),
        Commands::Tables {
            catalog,
            schema,
            format,
        } => tables_command(options, &catalog, &schema, &format),
        Commands::Show {
            table,
            warehouse,
            format,
        } => show_command(options, &table, warehouse.as_deref(), &format),
        Commands::Checkout {
            table,
            warehouse,
            output,
            force,
        } => checkout_command(options, &table, warehouse.as_deref(), output, force),
        Commands::Status { table, format } => status_command(options, &table, &format),
        Commands::Save { table, yes } => save_command(options, &table, yes),
        Commands::Sessions { format } => sessions_command(options, &format),
        Commands::Discard { table } => discard_command(options, &table),
        Commands::Browse { warehouse } => browse_command(options, warehouse.as_deref()),
        Commands::JobHistory {
            job_id,
            warehouse,
            format,
        } => job_history_command(options, &job_id, warehouse.as_deref(), &format),
    }
}

/// Catalog client and warehouse connections for one run
struct Remote {
    config: AppConfig,
    catalog: WorkspaceClient,
    pool: ConnectionPool,
}

impl Remote {
    fn connect(options: &GlobalOptions, warehouse: Option<&str>) -> Result<Self> {
        let workspace = open_workspace(options)?;
        let settings = workspace.settings()?;
        let overrides = ConfigOverrides {
            host: options.host.clone(),
            warehouse: warehouse.map(str::to_string),
        };
        let config = AppConfig::from_env(&overrides)?;
        log::debug!("Connecting to {}", config.host);

        let http = Arc::new(DatabricksHttpClient::new(
            &config.host,
            &config.token,
            settings.http_config(),
        )?);
        let catalog = WorkspaceClient::new(http.clone());
        let pool = ConnectionPool::new(Box::new(SessionConnector::new(
            http,
            settings.statement_config(),
        )));

        Ok(Self {
            config,
            catalog,
            pool,
        })
    }

    /// The configured warehouse, looked up by name. An HTTP path is used as is.
    /// Without a configured name, a workspace with a single warehouse uses that one.
    fn warehouse(&self) -> Result<Warehouse> {
        if let Some(name) = self.config.warehouse.as_deref() {
            return self.find_warehouse(name);
        }

        let mut warehouses =
            with_spinner("Listing warehouses...", || self.catalog.list_warehouses())?;
        if warehouses.len() == 1 {
            Ok(warehouses.remove(0))
        } else {
            Err(EditorError::empty_selection("warehouse"))
        }
    }

    fn find_warehouse(&self, name: &str) -> Result<Warehouse> {
        if name.starts_with("/sql/") {
            return Ok(Warehouse {
                id: crate::client::extract_warehouse_id(name)?,
                name: name.to_string(),
                http_path: name.to_string(),
            });
        }

        let warehouses = with_spinner("Listing warehouses...", || self.catalog.list_warehouses())?;
        warehouses
            .into_iter()
            .find(|w| w.name == name)
            .ok_or_else(|| EditorError::invalid_input(format!("No SQL warehouse named '{}'", name)))
    }

    fn executor(&self, warehouse: &Warehouse) -> Result<Arc<dyn crate::pool::Connection>> {
        with_spinner("Connecting to warehouse...", || {
            self.pool.get_or_open(&warehouse.http_path)
        })
    }
}

impl Drop for Remote {
    fn drop(&mut self) {
        self.pool.close_all();
    }
}

fn open_workspace(options: &GlobalOptions) -> Result<EditorWorkspace> {
    EditorWorkspace::find_or_create(options.workspace.as_deref())
}

fn parse_format(format: &str) -> Result<OutputFormat> {
    OutputFormat::parse(format).map_err(|e| EditorError::invalid_input(e))
}

/// Read a whole table through the warehouse
pub fn load_table(executor: &dyn SqlExecutor, table: &TableName) -> Result<TableSnapshot> {
    let result = with_spinner(&format!("Reading {}...", table), || {
        executor.query(&statement::build_select(table))
    })?;
    TableSnapshot::from_query_result(&result)
}

fn print_names(title: &str, names: &[String], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Pretty => PrettyPrinter::print_name_list(title, names),
        OutputFormat::Json => println!("{}", JsonFormatter::format(names)?),
    }
    Ok(())
}

fn print_snapshot(snapshot: &TableSnapshot, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Pretty => PrettyPrinter::print_table(snapshot),
        OutputFormat::Json => println!("{}", JsonFormatter::format_table(snapshot)?),
    }
    Ok(())
}

fn warehouses_command(options: &GlobalOptions, format: &str) -> Result<()> {
    let format = parse_format(format)?;
    let remote = Remote::connect(options, None)?;
    let warehouses = with_spinner("Listing warehouses...", || remote.catalog.list_warehouses())?;

    match format {
        OutputFormat::Pretty => PrettyPrinter::print_warehouses(&warehouses),
        OutputFormat::Json => println!("{}", JsonFormatter::format(&warehouses)?),
    }
    Ok(())
}

fn catalogs_command(options: &GlobalOptions, format: &str) -> Result<()> {
    let format = parse_format(format)?;
    let remote = Remote::connect(options, None)?;
    let catalogs = with_spinner("Listing catalogs...", || remote.catalog.list_catalogs())?;
    print_names("Catalogs", &catalogs, format)
}

fn schemas_command(options: &GlobalOptions, catalog: &str, format: &str) -> Result<()> {
    let format = parse_format(format)?;
    let mut selection = Selection::new();
    selection.set_catalog(catalog);
    if selection.catalog().is_none() {
        return Err(EditorError::empty_selection("catalog"));
    }

    let remote = Remote::connect(options, None)?;
    let schemas = with_spinner("Listing schemas...", || {
        selection.schema_options(&remote.catalog)
    })?;
    print_names("Schemas", &schemas, format)
}

fn tables_command(options: &GlobalOptions, catalog: &str, schema: &str, format: &str) -> Result<()> {
    let format = parse_format(format)?;
    let mut selection = Selection::new();
    selection.set_catalog(catalog);
    selection.set_schema(schema);
    if selection.catalog().is_none() {
        return Err(EditorError::empty_selection("catalog"));
    }
    if selection.schema().is_none() {
        return Err(EditorError::empty_selection("schema"));
    }

    let remote = Remote::connect(options, None)?;
    let tables = with_spinner("Listing tables...", || {
        selection.table_options(&remote.catalog)
    })?;
    print_names("Tables", &tables, format)
}

fn show_command(
    options: &GlobalOptions,
    table: &str,
    warehouse: Option<&str>,
    format: &str,
) -> Result<()> {
    let format = parse_format(format)?;
    let table = TableName::parse(table)?;

    let remote = Remote::connect(options, warehouse)?;
    let warehouse = remote.warehouse()?;
    let executor = remote.executor(&warehouse)?;
    let snapshot = load_table(&executor, &table)?;

    print_snapshot(&snapshot, format)
}

fn checkout_command(
    options: &GlobalOptions,
    table: &str,
    warehouse: Option<&str>,
    output: Option<PathBuf>,
    force: bool,
) -> Result<()> {
    let table = TableName::parse(table)?;
    let remote = Remote::connect(options, warehouse)?;
    let warehouse = remote.warehouse()?;
    let metadata = checkout_table(options, &remote, &table, &warehouse, output, force)?;
    PrettyPrinter::print_checkout(&metadata);
    Ok(())
}

/// Read the table, write its grid and store the baseline
fn checkout_table(
    options: &GlobalOptions,
    remote: &Remote,
    table: &TableName,
    warehouse: &Warehouse,
    output: Option<PathBuf>,
    force: bool,
) -> Result<SessionMetadata> {
    let workspace = open_workspace(options)?;
    if workspace.session_exists(table) && !force {
        return Err(EditorError::workspace(format!(
            "{} is already checked out. Use --force to replace the checkout.",
            table
        )));
    }

    let grid_path = match output {
        Some(path) if path.is_relative() => std::env::current_dir()?.join(path),
        Some(path) => path,
        None => workspace.default_grid_path(table),
    };
    if grid_path.exists() && !force {
        return Err(EditorError::workspace(format!(
            "Grid file already exists: {}. Use --force to overwrite it.",
            grid_path.display()
        )));
    }

    let executor = remote.executor(warehouse)?;
    let snapshot = load_table(&executor, table)?;

    data::write_grid(&snapshot, &grid_path)?;
    workspace.create_session(
        table,
        &warehouse.name,
        &warehouse.http_path,
        &snapshot,
        grid_path,
    )
}

/// Baseline and edited grid for a checked-out table
fn load_edit(
    workspace: &EditorWorkspace,
    table: &TableName,
) -> Result<(SessionMetadata, TableSnapshot, TableSnapshot)> {
    let (metadata, original) = workspace.load_session(table)?;
    let reader = GridReader::new()?;
    let edited = reader.read_grid(&metadata.grid_path, &metadata.columns)?;
    diff::ensure_compatible(&original, &edited)?;
    Ok((metadata, original, edited))
}

fn status_command(options: &GlobalOptions, table: &str, format: &str) -> Result<()> {
    let format = parse_format(format)?;
    let table = TableName::parse(table)?;
    let workspace = open_workspace(options)?;
    let (_, original, edited) = load_edit(&workspace, &table)?;

    let summary = diff::summarize(&original, &edited);
    match format {
        OutputFormat::Pretty => PrettyPrinter::print_row_diff(&table, &edited, &summary),
        OutputFormat::Json => println!("{}", JsonFormatter::format_row_diff(&table, &summary)?),
    }
    Ok(())
}

fn save_command(options: &GlobalOptions, table: &str, yes: bool) -> Result<()> {
    let table = TableName::parse(table)?;
    let workspace = open_workspace(options)?;
    let (metadata, original, edited) = load_edit(&workspace, &table)?;
    let notifier = ConsoleNotifier::new();

    if !diff::differs(&original, &edited) {
        notifier.info(&format!("No changes to save for {}", table));
        return Ok(());
    }

    if !yes {
        PrettyPrinter::print_row_diff(&table, &edited, &diff::summarize(&original, &edited));
    }

    let remote = Remote::connect(options, None)?;
    let warehouse = Warehouse {
        id: crate::client::extract_warehouse_id(&metadata.http_path)?,
        name: metadata.warehouse.clone(),
        http_path: metadata.http_path.clone(),
    };
    let executor = remote.executor(&warehouse)?;

    let confirmer: &dyn Confirmer = if yes { &AutoConfirm } else { &StdinConfirm };
    let mut session = SaveSession::new(table, original, edited)?;
    let outcome = orchestrator::run_save(&mut session, &executor, confirmer, &notifier)?;

    match outcome {
        SaveOutcome::Saved { .. } => {
            store_saved(&workspace, &metadata, session.original())?;
            Ok(())
        }
        SaveOutcome::Failed { message } => Err(EditorError::statement(message)),
        SaveOutcome::Declined | SaveOutcome::Unchanged => Ok(()),
    }
}

/// Make the rows just written the new baseline and rewrite the grid to match
pub fn store_saved(
    workspace: &EditorWorkspace,
    metadata: &SessionMetadata,
    saved: &TableSnapshot,
) -> Result<SessionMetadata> {
    let updated = workspace.update_baseline(metadata, saved)?;
    data::write_grid(saved, &updated.grid_path)?;
    Ok(updated)
}

fn sessions_command(options: &GlobalOptions, format: &str) -> Result<()> {
    let format = parse_format(format)?;
    let workspace = open_workspace(options)?;
    let sessions = workspace.list_sessions()?;

    match format {
        OutputFormat::Pretty => PrettyPrinter::print_sessions(&sessions),
        OutputFormat::Json => println!("{}", JsonFormatter::format(&sessions)?),
    }
    Ok(())
}

fn discard_command(options: &GlobalOptions, table: &str) -> Result<()> {
    let table = TableName::parse(table)?;
    let workspace = open_workspace(options)?;
    workspace.remove_session(&table)?;
    println!("🗑️  Discarded checkout of {}", table);
    Ok(())
}

fn browse_command(options: &GlobalOptions, warehouse: Option<&str>) -> Result<()> {
    let remote = Remote::connect(options, warehouse)?;
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut selection = Selection::new();

    let chosen = match remote.config.warehouse.as_deref() {
        Some(name) => remote.find_warehouse(name)?,
        None => {
            let warehouses = with_spinner("Listing warehouses...", || remote.catalog.list_warehouses())?;
            let names: Vec<String> = warehouses.iter().map(|w| w.name.clone()).collect();
            let name = prompt_choice(&mut input, "SQL warehouse", &names)?;
            warehouses
                .into_iter()
                .find(|w| w.name == name)
                .ok_or_else(|| EditorError::empty_selection("warehouse"))?
        }
    };
    selection.set_warehouse(chosen);

    let catalogs = with_spinner("Listing catalogs...", || remote.catalog.list_catalogs())?;
    selection.set_catalog(&prompt_choice(&mut input, "catalog", &catalogs)?);

    let schemas = with_spinner("Listing schemas...", || selection.schema_options(&remote.catalog))?;
    selection.set_schema(&prompt_choice(&mut input, "schema", &schemas)?);

    let tables = with_spinner("Listing tables...", || selection.table_options(&remote.catalog))?;
    selection.set_table(&prompt_choice(&mut input, "table", &tables)?);

    let table = selection.table_name()?;
    let metadata = checkout_table(options, &remote, &table, selection.warehouse()?, None, false)?;
    PrettyPrinter::print_checkout(&metadata);
    Ok(())
}

/// Numbered menu on the terminal. Empty input cancels.
fn prompt_choice(input: &mut impl BufRead, label: &str, options: &[String]) -> Result<String> {
    if options.is_empty() {
        return Err(EditorError::empty_selection(label));
    }

    println!("\nSelect a {}:", label);
    for (i, option) in options.iter().enumerate() {
        println!("  {:>3}) {}", i + 1, option);
    }

    loop {
        print!("{} number (empty to cancel): ", label);
        std::io::stdout().flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(EditorError::Cancelled);
        }

        match parse_choice(&line, options.len()) {
            Ok(Some(index)) => return Ok(options[index].clone()),
            Ok(None) => return Err(EditorError::Cancelled),
            Err(message) => println!("{}", message),
        }
    }
}

/// `Ok(None)` for empty input, `Ok(Some(index))` for a valid 1-based number
fn parse_choice(line: &str, count: usize) -> std::result::Result<Option<usize>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    match trimmed.parse::<usize>() {
        Ok(n) if (1..=count).contains(&n) => Ok(Some(n - 1)),
        _ => Err(format!("Enter a number between 1 and {}", count)),
    }
}

fn job_history_command(
    options: &GlobalOptions,
    job_id: &str,
    warehouse: Option<&str>,
    format: &str,
) -> Result<()> {
    let format = parse_format(format)?;
    let job_id = JobId::parse(job_id)?;

    let remote = Remote::connect(options, warehouse)?;
    let warehouse = remote.warehouse()?;
    let executor = remote.executor(&warehouse)?;
    let runs = with_spinner(&format!("Fetching history for job {}...", job_id), || {
        history::fetch_job_history(&executor, job_id)
    })?;

    if runs.is_empty() && format == OutputFormat::Pretty {
        println!("No runs found for job {}.", job_id);
        return Ok(());
    }
    print_snapshot(&runs, format)
}
