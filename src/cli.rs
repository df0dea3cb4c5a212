//! Command-line interface for ucedit

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ucedit")]
#[command(about = "Browse Unity Catalog tables, edit them locally and write them back")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override workspace location
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Workspace URL (overrides DATABRICKS_HOST)
    #[arg(long, global = true)]
    pub host: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List SQL warehouses
    Warehouses {
        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// List catalogs
    Catalogs {
        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// List schemas in a catalog
    Schemas {
        catalog: String,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// List tables in a schema
    Tables {
        catalog: String,
        schema: String,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// Print a table's rows
    Show {
        /// Table as catalog.schema.table
        table: String,

        /// Warehouse name (overrides UCEDIT_WAREHOUSE)
        #[arg(long)]
        warehouse: Option<String>,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// Read a table into an editable grid file
    Checkout {
        /// Table as catalog.schema.table
        table: String,

        /// Warehouse name (overrides UCEDIT_WAREHOUSE)
        #[arg(long)]
        warehouse: Option<String>,

        /// Grid file to write (defaults to <catalog.schema.table>.csv in the workspace root)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Replace an existing checkout and its grid
        #[arg(long)]
        force: bool,
    },

    /// Compare the edited grid with the checked-out rows
    Status {
        /// Table as catalog.schema.table
        table: String,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// Overwrite the table with the edited grid
    Save {
        /// Table as catalog.schema.table
        table: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// List checked-out tables
    Sessions {
        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// Forget a checked-out table (the grid file is kept)
    Discard {
        /// Table as catalog.schema.table
        table: String,
    },

    /// Pick warehouse, catalog, schema and table from menus, then check it out
    Browse {
        /// Warehouse name (skips the warehouse menu)
        #[arg(long)]
        warehouse: Option<String>,
    },

    /// Show the run history of a job
    JobHistory {
        /// Numeric job id
        job_id: String,

        /// Warehouse name (overrides UCEDIT_WAREHOUSE)
        #[arg(long)]
        warehouse: Option<String>,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },
}

/// Parse output format string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pretty,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {}. Use 'pretty' or 'json'", s)),
        }
    }
}
