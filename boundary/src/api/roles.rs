use serde::{Deserialize, Serialize};

use super::common::{BoundaryApiResource, ItemMeta};

#[derive(Debug, Clone, Deserialize)]
pub struct Role {
    #[serde(flatten)]
    pub meta: ItemMeta,
    #[serde(default)]
    pub grant_scope_ids: Vec<String>,
    #[serde(default)]
    pub principal_ids: Vec<String>,
    #[serde(default)]
    pub grant_strings: Vec<String>,
}

impl BoundaryApiResource for Role {
    const COLLECTION: &'static str = "roles";
}

#[derive(Debug, Serialize)]
pub struct CreateRoleRequest {
    pub scope_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SetPrincipalsRequest {
    pub version: u32,
    pub principal_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SetGrantsRequest {
    pub version: u32,
    pub grant_strings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SetGrantScopesRequest {
    pub version: u32,
    pub grant_scope_ids: Vec<String>,
}
