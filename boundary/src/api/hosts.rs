use serde::{Deserialize, Serialize};

use super::common::{BoundaryApiResource, ItemMeta};

#[derive(Debug, Clone, Deserialize)]
pub struct Host {
    #[serde(flatten)]
    pub meta: ItemMeta,
    pub host_catalog_id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub attributes: StaticHostAttributes,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticHostAttributes {
    #[serde(default)]
    pub address: Option<String>,
}

impl BoundaryApiResource for Host {
    const COLLECTION: &'static str = "hosts";
    const PARENT_PARAM: &'static str = "host_catalog_id";
}

#[derive(Debug, Serialize)]
pub struct CreateHostRequest {
    pub host_catalog_id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub attributes: StaticHostAttributes,
}
