use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use super::common::{decode_attributes, BoundaryApiResource, ItemMeta};
use super::error::ApiError;

#[derive(Debug, Clone, Deserialize)]
pub struct CredentialLibrary {
    #[serde(flatten)]
    pub meta: ItemMeta,
    pub credential_store_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub credential_type: Option<String>,
    #[serde(default)]
    pub attributes: Value,
}

impl CredentialLibrary {
    pub fn variant(&self) -> Result<CredentialLibraryAttributes, ApiError> {
        decode_attributes(&self.kind, &self.attributes)
    }
}

impl BoundaryApiResource for CredentialLibrary {
    const COLLECTION: &'static str = "credential-libraries";
    const PARENT_PARAM: &'static str = "credential_store_id";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "attributes", rename_all = "kebab-case")]
pub enum CredentialLibraryAttributes {
    VaultGeneric(VaultGenericAttributes),
    VaultSshCertificate(VaultSshCertificateAttributes),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VaultGenericAttributes {
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_request_body: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VaultSshCertificateAttributes {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_bits: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub critical_options: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extensions: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct CreateCredentialLibraryRequest {
    pub credential_store_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_type: Option<String>,
    #[serde(flatten)]
    pub attributes: CredentialLibraryAttributes,
}
