//! Workspace management for checked-out tables
//!
//! ```text
//! <root>/
//!   .ucedit/
//!     config.json
//!     sessions/
//!       <catalog.schema.table>.json      session metadata
//!       <catalog.schema.table>.snapshot  baseline rows (zstd JSON)
//!   <catalog.schema.table>.csv           editable grid
//! ```

use crate::config::WorkspaceSettings;
use crate::error::{EditorError, Result};
use crate::snapshot::{Column, TableSnapshot};
use crate::statement::TableName;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;
use walkdir::WalkDir;

const WORKSPACE_DIR: &str = ".ucedit";
const GITIGNORE_ENTRY: &str = ".ucedit/sessions/";

/// Everything needed to pick up a checked-out table again
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub session_id: Uuid,
    pub table: TableName,
    /// Warehouse name the table was read through
    pub warehouse: String,
    pub http_path: String,
    pub created: DateTime<Utc>,
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<Column>,
    /// Fingerprint of the stored baseline snapshot
    pub fingerprint: String,
    pub grid_path: PathBuf,
}

/// Manages the .ucedit workspace directory
#[derive(Debug, Clone)]
pub struct EditorWorkspace {
    /// Project root directory (where .ucedit/ lives)
    pub root: PathBuf,
    /// .ucedit/ directory path
    pub ucedit_dir: PathBuf,
    /// .ucedit/sessions/ directory path
    pub sessions_dir: PathBuf,
}

impl EditorWorkspace {
    /// Find existing workspace or create a new one
    pub fn find_or_create(start_dir: Option<&Path>) -> Result<Self> {
        let current_dir = std::env::current_dir()?;
        let start = start_dir.unwrap_or(&current_dir);

        if let Some(workspace) = Self::find_existing(start)? {
            return Ok(workspace);
        }

        Self::create_new(start.to_path_buf())
    }

    /// Find existing .ucedit workspace by walking up the directory tree
    pub fn find_existing(start_dir: &Path) -> Result<Option<Self>> {
        let mut current = start_dir;

        loop {
            let ucedit_dir = current.join(WORKSPACE_DIR);
            if ucedit_dir.is_dir() {
                return Ok(Some(Self::from_root(current.to_path_buf())));
            }

            // stop at a repository root
            if current.join(".git").exists() {
                break;
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        Ok(None)
    }

    /// Create a new workspace in the specified root directory
    pub fn create_new(root: PathBuf) -> Result<Self> {
        let workspace = Self::from_root(root);

        fs::create_dir_all(&workspace.sessions_dir)?;
        workspace.create_config_with_force(false)?;
        workspace.ensure_gitignore()?;

        log::info!("Created ucedit workspace at: {}", workspace.root.display());
        Ok(workspace)
    }

    pub fn from_root(root: PathBuf) -> Self {
        let ucedit_dir = root.join(WORKSPACE_DIR);
        let sessions_dir = ucedit_dir.join("sessions");

        Self {
            root,
            ucedit_dir,
            sessions_dir,
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.ucedit_dir.join("config.json")
    }

    /// Write default settings unless a config exists and `force` is false
    pub fn create_config_with_force(&self, force: bool) -> Result<()> {
        let config_path = self.config_path();
        if config_path.exists() && !force {
            return Ok(());
        }

        fs::create_dir_all(&self.ucedit_dir)?;
        WorkspaceSettings::default().save(&config_path)
    }

    /// Settings from config.json, or defaults when there is none
    pub fn settings(&self) -> Result<WorkspaceSettings> {
        let config_path = self.config_path();
        if config_path.exists() {
            WorkspaceSettings::load(&config_path)
        } else {
            Ok(WorkspaceSettings::default())
        }
    }

    /// Keep stored baselines out of version control
    pub fn ensure_gitignore(&self) -> Result<()> {
        let gitignore_path = self.root.join(".gitignore");
        let ignore_block = format!("# ucedit table baselines\n{}\n", GITIGNORE_ENTRY);

        if gitignore_path.exists() {
            let content = fs::read_to_string(&gitignore_path)?;
            if !content.contains(GITIGNORE_ENTRY) {
                let separator = if content.ends_with('\n') { "\n" } else { "\n\n" };
                fs::write(&gitignore_path, format!("{}{}{}", content, separator, ignore_block))?;
                log::info!("Updated .gitignore with ucedit entries");
            }
        } else {
            fs::write(&gitignore_path, ignore_block)?;
            log::info!("Created .gitignore with ucedit entries");
        }

        Ok(())
    }

    /// Metadata and baseline paths for a table
    pub fn session_paths(&self, table: &TableName) -> (PathBuf, PathBuf) {
        let key = file_key(table);
        (
            self.sessions_dir.join(format!("{}.json", key)),
            self.sessions_dir.join(format!("{}.snapshot", key)),
        )
    }

    /// Where the editable grid goes when no path is given
    pub fn default_grid_path(&self, table: &TableName) -> PathBuf {
        self.root.join(format!("{}.csv", file_key(table)))
    }

    pub fn session_exists(&self, table: &TableName) -> bool {
        self.session_paths(table).0.exists()
    }

    /// Store a freshly read table as the baseline for later edits
    pub fn create_session(
        &self,
        table: &TableName,
        warehouse: &str,
        http_path: &str,
        snapshot: &TableSnapshot,
        grid_path: PathBuf,
    ) -> Result<SessionMetadata> {
        let metadata = SessionMetadata {
            session_id: Uuid::new_v4(),
            table: table.clone(),
            warehouse: warehouse.to_string(),
            http_path: http_path.to_string(),
            created: Utc::now(),
            row_count: 0,
            column_count: 0,
            columns: Vec::new(),
            fingerprint: String::new(),
            grid_path,
        };
        self.store_baseline(metadata, snapshot)
    }

    /// Replace the baseline after a successful save
    pub fn update_baseline(
        &self,
        metadata: &SessionMetadata,
        snapshot: &TableSnapshot,
    ) -> Result<SessionMetadata> {
        self.store_baseline(metadata.clone(), snapshot)
    }

    fn store_baseline(
        &self,
        mut metadata: SessionMetadata,
        snapshot: &TableSnapshot,
    ) -> Result<SessionMetadata> {
        fs::create_dir_all(&self.sessions_dir)?;
        let (json_path, snapshot_path) = self.session_paths(&metadata.table);

        metadata.row_count = snapshot.row_count();
        metadata.column_count = snapshot.column_count();
        metadata.columns = snapshot.columns().to_vec();
        metadata.fingerprint = snapshot.fingerprint()?;

        snapshot.write_compressed(&snapshot_path)?;
        fs::write(&json_path, serde_json::to_string_pretty(&metadata)?)?;

        log::debug!(
            "Stored baseline for {} ({} rows) at {}",
            metadata.table,
            metadata.row_count,
            snapshot_path.display()
        );
        Ok(metadata)
    }

    pub fn load_metadata(&self, table: &TableName) -> Result<SessionMetadata> {
        let (json_path, _) = self.session_paths(table);
        if !json_path.exists() {
            return Err(EditorError::session_not_found(table.to_string()));
        }

        let content = fs::read_to_string(&json_path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Metadata and baseline snapshot, checked against the stored fingerprint
    pub fn load_session(&self, table: &TableName) -> Result<(SessionMetadata, TableSnapshot)> {
        let metadata = self.load_metadata(table)?;
        let (_, snapshot_path) = self.session_paths(table);
        if !snapshot_path.exists() {
            return Err(EditorError::workspace(format!(
                "Baseline for {} is missing: {}",
                table,
                snapshot_path.display()
            )));
        }

        let snapshot = TableSnapshot::read_compressed(&snapshot_path)?;
        if snapshot.fingerprint()? != metadata.fingerprint {
            return Err(EditorError::workspace(format!(
                "Baseline for {} does not match its metadata; check the table out again",
                table
            )));
        }

        Ok((metadata, snapshot))
    }

    /// All checked-out tables, sorted by name
    pub fn list_sessions(&self) -> Result<Vec<SessionMetadata>> {
        let mut sessions = Vec::new();
        if !self.sessions_dir.exists() {
            return Ok(sessions);
        }

        for entry in WalkDir::new(&self.sessions_dir).max_depth(1) {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some("json")
            {
                continue;
            }

            let content = fs::read_to_string(path)?;
            match serde_json::from_str::<SessionMetadata>(&content) {
                Ok(metadata) => sessions.push(metadata),
                Err(e) => log::warn!("Skipping unreadable session {}: {}", path.display(), e),
            }
        }

        sessions.sort_by_key(|s| s.table.to_string());
        Ok(sessions)
    }

    /// Forget a checked-out table; the grid file is left alone
    pub fn remove_session(&self, table: &TableName) -> Result<()> {
        let (json_path, snapshot_path) = self.session_paths(table);
        if !json_path.exists() {
            return Err(EditorError::session_not_found(table.to_string()));
        }

        fs::remove_file(json_path)?;
        if snapshot_path.exists() {
            fs::remove_file(snapshot_path)?;
        }
        Ok(())
    }
}

/// File-system-safe form of a table name
fn file_key(table: &TableName) -> String {
    format!("{}.{}.{}", table.catalog, table.schema, table.table)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
