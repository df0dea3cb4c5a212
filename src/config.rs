//! Connection settings and workspace configuration

use crate::client::{HttpClientConfig, StatementConfig};
use crate::error::{EditorError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const HOST_VAR: &str = "DATABRICKS_HOST";
pub const TOKEN_VAR: &str = "DATABRICKS_TOKEN";
pub const WAREHOUSE_VAR: &str = "UCEDIT_WAREHOUSE";

/// Contents of `.ucedit/config.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSettings {
    pub version: String,
    pub created: DateTime<Utc>,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub poll_interval_ms: u64,
    /// Unset means poll until the warehouse finishes
    #[serde(default)]
    pub poll_timeout_secs: Option<u64>,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        let http = HttpClientConfig::default();
        let statement = StatementConfig::default();
        Self {
            version: crate::FORMAT_VERSION.to_string(),
            created: Utc::now(),
            connect_timeout_secs: http.connect_timeout.as_secs(),
            read_timeout_secs: http.read_timeout.as_secs(),
            max_retries: http.max_retries,
            retry_delay_ms: http.retry_delay.as_millis() as u64,
            poll_interval_ms: statement.poll_interval.as_millis() as u64,
            poll_timeout_secs: statement.poll_timeout.map(|d| d.as_secs()),
        }
    }
}

impl WorkspaceSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            EditorError::config(format!("Invalid settings in {}: {}", path.display(), e))
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn http_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            read_timeout: Duration::from_secs(self.read_timeout_secs),
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            ..HttpClientConfig::default()
        }
    }

    pub fn statement_config(&self) -> StatementConfig {
        StatementConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            poll_timeout: self.poll_timeout_secs.map(Duration::from_secs),
            ..StatementConfig::default()
        }
    }
}

/// Values given on the command line, which win over the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub warehouse: Option<String>,
}

/// Where to connect and as whom
#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub token: String,
    /// Default warehouse name
    pub warehouse: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("token", &"<redacted>")
            .field("warehouse", &self.warehouse)
            .finish()
    }
}

impl AppConfig {
    /// Resolve from the process environment
    pub fn from_env(overrides: &ConfigOverrides) -> Result<Self> {
        Self::resolve_with(|name| std::env::var(name).ok(), overrides)
    }

    /// Resolve using `lookup` for environment variables
    pub fn resolve_with(
        lookup: impl Fn(&str) -> Option<String>,
        overrides: &ConfigOverrides,
    ) -> Result<Self> {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        let raw_host = non_empty(overrides.host.clone())
            .or_else(|| non_empty(lookup(HOST_VAR)))
            .ok_or_else(|| {
                EditorError::config(format!(
                    "{} is not set. Set it in your environment or .env file, or pass --host.",
                    HOST_VAR
                ))
            })?;

        let token = non_empty(lookup(TOKEN_VAR)).ok_or_else(|| {
            EditorError::config(format!(
                "{} is not set. Set it in your environment or .env file.",
                TOKEN_VAR
            ))
        })?;

        Ok(Self {
            host: normalize_host(&raw_host)?,
            token: token.trim().to_string(),
            warehouse: non_empty(overrides.warehouse.clone())
                .or_else(|| non_empty(lookup(WAREHOUSE_VAR))),
        })
    }
}

/// `adb-123.azuredatabricks.net/` becomes `https://adb-123.azuredatabricks.net`
pub fn normalize_host(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(EditorError::config("Workspace host is empty"));
    }

    if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("https://{}", trimmed))
    }
}

/// Load `.env` from the current directory if there is one
pub fn load_env_file() -> Result<()> {
    if Path::new(".env").exists() {
        dotenv::dotenv()
            .map_err(|e| EditorError::config(format!("Failed to load .env file: {}", e)))?;
    }

    Ok(())
}
