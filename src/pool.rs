//! Warehouse connections cached by HTTP path
//!
//! The pool is built once per process and passed by reference to whatever
//! needs a warehouse. The first request for a path opens a session; later
//! requests reuse it. `close_all` tears every session down.

use crate::client::sea::WarehouseSession;
use crate::client::{
    extract_warehouse_id, DatabricksHttpClient, QueryResult, SqlExecutor, StatementClient,
    StatementConfig,
};
use crate::error::{EditorError, Result};
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// An open handle to one warehouse
pub trait Connection: SqlExecutor + Send + Sync {
    fn http_path(&self) -> &str;

    /// Release server-side resources; best effort
    fn close(&self);
}

/// Opens connections for the pool
pub trait Connector: Send + Sync {
    fn open(&self, http_path: &str) -> Result<Arc<dyn Connection>>;
}

impl SqlExecutor for Arc<dyn Connection> {
    fn query(&self, sql: &str) -> Result<QueryResult> {
        (**self).query(sql)
    }

    fn execute(&self, sql: &str) -> Result<()> {
        (**self).execute(sql)
    }
}

impl Connection for WarehouseSession {
    fn http_path(&self) -> &str {
        WarehouseSession::http_path(self)
    }

    fn close(&self) {
        WarehouseSession::close(self)
    }
}

/// Opens Statement Execution API sessions
#[derive(Debug, Clone)]
pub struct SessionConnector {
    http: Arc<DatabricksHttpClient>,
    config: StatementConfig,
}

impl SessionConnector {
    pub fn new(http: Arc<DatabricksHttpClient>, config: StatementConfig) -> Self {
        Self { http, config }
    }
}

impl Connector for SessionConnector {
    fn open(&self, http_path: &str) -> Result<Arc<dyn Connection>> {
        let warehouse_id = extract_warehouse_id(http_path)?;
        let client = StatementClient::new(self.http.clone(), warehouse_id, self.config.clone());
        let session = WarehouseSession::open(client, http_path)?;
        Ok(Arc::new(session))
    }
}

pub struct ConnectionPool {
    connector: Box<dyn Connector>,
    connections: Mutex<HashMap<String, Arc<dyn Connection>>>,
}

impl ConnectionPool {
    pub fn new(connector: Box<dyn Connector>) -> Self {
        Self {
            connector,
            connections: Mutex::new(HashMap::new()),
        }
    }

    /// Cached connection for `http_path`, opened on first use
    pub fn get_or_open(&self, http_path: &str) -> Result<Arc<dyn Connection>> {
        let mut connections = self
            .connections
            .lock()
            .map_err(|_| EditorError::config("connection pool lock poisoned"))?;

        if let Some(connection) = connections.get(http_path) {
            debug!("Reusing connection for {}", http_path);
            return Ok(connection.clone());
        }

        debug!("Opening connection for {}", http_path);
        let connection = self.connector.open(http_path)?;
        connections.insert(http_path.to_string(), connection.clone());
        Ok(connection)
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Close and forget every cached connection
    pub fn close_all(&self) {
        let drained: Vec<(String, Arc<dyn Connection>)> = self.guard().drain().collect();
        for (http_path, connection) in drained {
            debug!("Closing connection for {}", http_path);
            connection.close();
        }
    }

    fn guard(&self) -> MutexGuard<'_, HashMap<String, Arc<dyn Connection>>> {
        match self.connections.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Drop for ConnectionPool {
    fn drop(&mut self) {
        self.close_all();
    }
}
