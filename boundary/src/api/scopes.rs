use serde::{Deserialize, Serialize};

use super::common::{BoundaryApiResource, ItemMeta};

#[derive(Debug, Clone, Deserialize)]
pub struct Scope {
    #[serde(flatten)]
    pub meta: ItemMeta,
    /// `global`, `org` or `project`
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub primary_auth_method_id: Option<String>,
}

impl BoundaryApiResource for Scope {
    const COLLECTION: &'static str = "scopes";
}

#[derive(Debug, Serialize)]
pub struct CreateScopeRequest {
    pub scope_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub skip_admin_role_creation: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub skip_default_role_creation: bool,
}
