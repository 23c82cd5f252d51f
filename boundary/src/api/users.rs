use serde::{Deserialize, Serialize};

use super::common::{BoundaryApiResource, ItemMeta};

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    #[serde(flatten)]
    pub meta: ItemMeta,
    #[serde(default)]
    pub account_ids: Vec<String>,
    #[serde(default)]
    pub primary_account_id: Option<String>,
    #[serde(default)]
    pub login_name: Option<String>,
}

impl BoundaryApiResource for User {
    const COLLECTION: &'static str = "users";
}

#[derive(Debug, Serialize)]
pub struct CreateUserRequest {
    pub scope_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SetAccountsRequest {
    pub version: u32,
    pub account_ids: Vec<String>,
}
