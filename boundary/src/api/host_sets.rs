use serde::{Deserialize, Serialize};

use super::common::{BoundaryApiResource, ItemMeta};

#[derive(Debug, Clone, Deserialize)]
pub struct HostSet {
    #[serde(flatten)]
    pub meta: ItemMeta,
    pub host_catalog_id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub host_ids: Vec<String>,
}

impl BoundaryApiResource for HostSet {
    const COLLECTION: &'static str = "host-sets";
    const PARENT_PARAM: &'static str = "host_catalog_id";
}

#[derive(Debug, Serialize)]
pub struct CreateHostSetRequest {
    pub host_catalog_id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SetHostsRequest {
    pub version: u32,
    pub host_ids: Vec<String>,
}
