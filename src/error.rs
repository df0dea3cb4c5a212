//! Error types for ucedit operations

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EditorError>;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Request failed: {message}")]
    Http { message: String },

    #[error("Statement failed: {message}")]
    Statement { message: String },

    #[error("Workspace error: {0}")]
    Workspace(String),

    #[error("No checked-out session for table: {name}")]
    SessionNotFound { name: String },

    #[error("Unsupported column type '{type_name}' in column '{column}'")]
    UnsupportedType { column: String, type_name: String },

    #[error("Schema mismatch: {message}")]
    SchemaMismatch { message: String },

    #[error("Nothing selected for {field}")]
    EmptySelection { field: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Operation cancelled by user")]
    Cancelled,

    #[error("Walkdir error: {0}")]
    WalkDir(#[from] walkdir::Error),
}

impl EditorError {
    pub fn workspace(msg: impl Into<String>) -> Self {
        Self::Workspace(msg.into())
    }

    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http {
            message: msg.into(),
        }
    }

    pub fn statement(msg: impl Into<String>) -> Self {
        Self::Statement {
            message: msg.into(),
        }
    }

    pub fn session_not_found(name: impl Into<String>) -> Self {
        Self::SessionNotFound { name: name.into() }
    }

    pub fn unsupported_type(column: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::UnsupportedType {
            column: column.into(),
            type_name: type_name.into(),
        }
    }

    pub fn schema_mismatch(msg: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            message: msg.into(),
        }
    }

    pub fn empty_selection(field: impl Into<String>) -> Self {
        Self::EmptySelection {
            field: field.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }
}
