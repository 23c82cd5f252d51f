use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::common::{decode_attributes, BoundaryApiResource, ItemMeta};
use super::error::ApiError;

#[derive(Debug, Clone, Deserialize)]
pub struct Credential {
    #[serde(flatten)]
    pub meta: ItemMeta,
    pub credential_store_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Value,
}

impl Credential {
    pub fn variant(&self) -> Result<CredentialAttributes, ApiError> {
        decode_attributes(&self.kind, &self.attributes)
    }
}

impl BoundaryApiResource for Credential {
    const COLLECTION: &'static str = "credentials";
    const PARENT_PARAM: &'static str = "credential_store_id";
}

/// Secret fields are only ever sent; responses carry HMACs instead
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "attributes", rename_all = "snake_case")]
pub enum CredentialAttributes {
    UsernamePassword(UsernamePasswordAttributes),
    SshPrivateKey(SshPrivateKeyAttributes),
    Json(JsonCredentialAttributes),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsernamePasswordAttributes {
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SshPrivateKeyAttributes {
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_passphrase: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonCredentialAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize)]
pub struct CreateCredentialRequest {
    pub credential_store_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub attributes: CredentialAttributes,
}
