//! Warehouse and Unity Catalog listing

use super::http::DatabricksHttpClient;
use super::{CatalogApi, Warehouse};
use crate::error::Result;
use log::debug;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;

const WAREHOUSES_PATH: &str = "/api/2.0/sql/warehouses";
const CATALOGS_PATH: &str = "/api/2.1/unity-catalog/catalogs";
const SCHEMAS_PATH: &str = "/api/2.1/unity-catalog/schemas";
const TABLES_PATH: &str = "/api/2.1/unity-catalog/tables";

#[derive(Debug, Deserialize)]
struct WarehouseList {
    #[serde(default)]
    warehouses: Vec<WarehouseInfo>,
}

#[derive(Debug, Deserialize)]
struct WarehouseInfo {
    id: String,
    name: String,
    #[serde(default)]
    odbc_params: Option<OdbcParams>,
}

#[derive(Debug, Deserialize)]
struct OdbcParams {
    #[serde(default)]
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedItem {
    name: String,
}

/// One page of a Unity Catalog list call; the item array's key differs per
/// endpoint.
#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default, alias = "catalogs", alias = "schemas", alias = "tables")]
    items: Vec<NamedItem>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WorkspaceClient {
    http: Arc<DatabricksHttpClient>,
}

impl WorkspaceClient {
    pub fn new(http: Arc<DatabricksHttpClient>) -> Self {
        Self { http }
    }

    /// Follow `next_page_token` until the listing is exhausted
    fn list_names(&self, path: &str, params: &[(&str, &str)]) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query: Vec<(&str, &str)> = params.to_vec();
            if let Some(ref token) = page_token {
                query.push(("page_token", token.as_str()));
            }

            let page: Page = self.get(path, &query)?;
            names.extend(page.items.into_iter().map(|item| item.name));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!("Listed {} entries from {}", names.len(), path);
        names.sort();
        Ok(names)
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        self.http.get_json(path, query)
    }
}

impl CatalogApi for WorkspaceClient {
    fn list_warehouses(&self) -> Result<Vec<Warehouse>> {
        let list: WarehouseList = self.get(WAREHOUSES_PATH, &[])?;
        let mut warehouses: Vec<Warehouse> = list
            .warehouses
            .into_iter()
            .map(|info| {
                let http_path = info
                    .odbc_params
                    .and_then(|p| p.path)
                    .unwrap_or_else(|| format!("/sql/1.0/warehouses/{}", info.id));
                Warehouse {
                    id: info.id,
                    name: info.name,
                    http_path,
                }
            })
            .collect();
        warehouses.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(warehouses)
    }

    fn list_catalogs(&self) -> Result<Vec<String>> {
        self.list_names(CATALOGS_PATH, &[])
    }

    fn list_schemas(&self, catalog: &str) -> Result<Vec<String>> {
        self.list_names(SCHEMAS_PATH, &[("catalog_name", catalog)])
    }

    fn list_tables(&self, catalog: &str, schema: &str) -> Result<Vec<String>> {
        self.list_names(
            TABLES_PATH,
            &[("catalog_name", catalog), ("schema_name", schema)],
        )
    }
}
