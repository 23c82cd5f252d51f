use serde::{Deserialize, Serialize};

use super::common::{BoundaryApiResource, ItemMeta};

#[derive(Debug, Clone, Deserialize)]
pub struct Group {
    #[serde(flatten)]
    pub meta: ItemMeta,
    #[serde(default)]
    pub member_ids: Vec<String>,
}

impl BoundaryApiResource for Group {
    const COLLECTION: &'static str = "groups";
}

#[derive(Debug, Serialize)]
pub struct CreateGroupRequest {
    pub scope_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SetMembersRequest {
    pub version: u32,
    pub member_ids: Vec<String>,
}
