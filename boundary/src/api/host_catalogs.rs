use serde::{Deserialize, Serialize};

use super::common::{BoundaryApiResource, ItemMeta};

#[derive(Debug, Clone, Deserialize)]
pub struct HostCatalog {
    #[serde(flatten)]
    pub meta: ItemMeta,
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl BoundaryApiResource for HostCatalog {
    const COLLECTION: &'static str = "host-catalogs";
}

#[derive(Debug, Serialize)]
pub struct CreateHostCatalogRequest {
    pub scope_id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
