use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::{decode_attributes, BoundaryApiResource, ItemMeta};
use super::error::ApiError;

#[derive(Debug, Clone, Deserialize)]
pub struct ManagedGroup {
    #[serde(flatten)]
    pub meta: ItemMeta,
    pub auth_method_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Value,
    #[serde(default)]
    pub member_ids: Vec<String>,
}

impl ManagedGroup {
    pub fn variant(&self) -> Result<ManagedGroupAttributes, ApiError> {
        decode_attributes(&self.kind, &self.attributes)
    }
}

impl BoundaryApiResource for ManagedGroup {
    const COLLECTION: &'static str = "managed-groups";
    const PARENT_PARAM: &'static str = "auth_method_id";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "attributes", rename_all = "lowercase")]
pub enum ManagedGroupAttributes {
    Oidc(OidcManagedGroupAttributes),
    Ldap(LdapManagedGroupAttributes),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OidcManagedGroupAttributes {
    #[serde(default)]
    pub filter: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LdapManagedGroupAttributes {
    #[serde(default)]
    pub group_names: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateManagedGroupRequest {
    pub auth_method_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub attributes: ManagedGroupAttributes,
}
