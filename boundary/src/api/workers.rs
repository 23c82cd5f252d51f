use serde::{Deserialize, Serialize};

use super::common::{BoundaryApiResource, ItemMeta};

#[derive(Debug, Clone, Deserialize)]
pub struct Worker {
    #[serde(flatten)]
    pub meta: ItemMeta,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub release_version: Option<String>,
    /// Only present in the response to a controller-led create
    #[serde(default)]
    pub controller_generated_activation_token: Option<String>,
}

impl BoundaryApiResource for Worker {
    const COLLECTION: &'static str = "workers";
}

#[derive(Debug, Serialize)]
pub struct CreateWorkerRequest {
    pub scope_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Set for worker-led registration only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_generated_auth_token: Option<String>,
}
