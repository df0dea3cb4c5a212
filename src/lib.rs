//! # ucedit
//!
//! Browse Unity Catalog tables through a Databricks SQL warehouse, edit a
//! table as a local grid and write the edited rows back as a full overwrite.

pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod data;
pub mod diff;
pub mod error;
pub mod history;
pub mod literal;
pub mod orchestrator;
pub mod output;
pub mod pool;
pub mod progress;
pub mod selection;
pub mod snapshot;
pub mod statement;
pub mod value;
pub mod workspace;

pub use error::{EditorError, Result};
pub use snapshot::TableSnapshot;
pub use statement::TableName;
pub use workspace::EditorWorkspace;

/// Current format version for workspace files
pub const FORMAT_VERSION: &str = "1.0.0";
