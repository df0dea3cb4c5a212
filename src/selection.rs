//! Cascading warehouse / catalog / schema / table selection
//!
//! Choosing a catalog clears the schema and table; choosing a schema clears
//! the table. Nothing can be loaded until every level is set.

use crate::client::{CatalogApi, Warehouse};
use crate::error::{EditorError, Result};
use crate::statement::TableName;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    warehouse: Option<Warehouse>,
    catalog: Option<String>,
    schema: Option<String>,
    table: Option<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_warehouse(&mut self, warehouse: Warehouse) {
        self.warehouse = Some(warehouse);
    }

    /// Select a catalog; an empty name clears it. Resets schema and table.
    pub fn set_catalog(&mut self, catalog: &str) {
        let catalog = non_empty(catalog);
        if catalog != self.catalog {
            self.schema = None;
            self.table = None;
        }
        self.catalog = catalog;
    }

    /// Select a schema; an empty name clears it. Resets the table.
    pub fn set_schema(&mut self, schema: &str) {
        let schema = non_empty(schema);
        if schema != self.schema {
            self.table = None;
        }
        self.schema = schema;
    }

    pub fn set_table(&mut self, table: &str) {
        self.table = non_empty(table);
    }

    pub fn warehouse(&self) -> Result<&Warehouse> {
        self.warehouse
            .as_ref()
            .ok_or_else(|| EditorError::empty_selection("warehouse"))
    }

    pub fn catalog(&self) -> Option<&str> {
        self.catalog.as_deref()
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Schemas to offer: empty until a catalog is chosen
    pub fn schema_options(&self, api: &dyn CatalogApi) -> Result<Vec<String>> {
        match &self.catalog {
            Some(catalog) => api.list_schemas(catalog),
            None => Ok(Vec::new()),
        }
    }

    /// Tables to offer: empty until a schema is chosen
    pub fn table_options(&self, api: &dyn CatalogApi) -> Result<Vec<String>> {
        match (&self.catalog, &self.schema) {
            (Some(catalog), Some(schema)) => api.list_tables(catalog, schema),
            _ => Ok(Vec::new()),
        }
    }

    /// Whether a table can be loaded
    pub fn is_complete(&self) -> bool {
        self.warehouse.is_some() && self.table_name().is_ok()
    }

    /// The chosen table, or `EmptySelection` naming the first missing level
    pub fn table_name(&self) -> Result<TableName> {
        let catalog = self
            .catalog
            .as_deref()
            .ok_or_else(|| EditorError::empty_selection("catalog"))?;
        let schema = self
            .schema
            .as_deref()
            .ok_or_else(|| EditorError::empty_selection("schema"))?;
        let table = self
            .table
            .as_deref()
            .ok_or_else(|| EditorError::empty_selection("table"))?;
        TableName::new(catalog, schema, table)
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
