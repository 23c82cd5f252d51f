use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::common::{BoundaryApiResource, ItemMeta};

#[derive(Debug, Clone, Deserialize)]
pub struct StorageBucket {
    #[serde(flatten)]
    pub meta: ItemMeta,
    pub plugin_name: Option<String>,
    #[serde(default)]
    pub bucket_name: String,
    #[serde(default)]
    pub bucket_prefix: Option<String>,
    #[serde(default)]
    pub worker_filter: Option<String>,
    #[serde(default)]
    pub attributes: Option<Map<String, Value>>,
}

impl BoundaryApiResource for StorageBucket {
    const COLLECTION: &'static str = "storage-buckets";
}

#[derive(Debug, Serialize)]
pub struct CreateStorageBucketRequest {
    pub scope_id: String,
    pub plugin_name: String,
    pub bucket_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_prefix: Option<String>,
    pub worker_filter: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secrets: Option<Map<String, Value>>,
}
