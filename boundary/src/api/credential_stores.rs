use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::{decode_attributes, BoundaryApiResource, ItemMeta};
use super::error::ApiError;

#[derive(Debug, Clone, Deserialize)]
pub struct CredentialStore {
    #[serde(flatten)]
    pub meta: ItemMeta,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Value,
}

impl CredentialStore {
    pub fn variant(&self) -> Result<CredentialStoreAttributes, ApiError> {
        decode_attributes(&self.kind, &self.attributes)
    }
}

impl BoundaryApiResource for CredentialStore {
    const COLLECTION: &'static str = "credential-stores";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "attributes", rename_all = "lowercase")]
pub enum CredentialStoreAttributes {
    Vault(VaultCredentialStoreAttributes),
    Static {},
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VaultCredentialStoreAttributes {
    #[serde(default)]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_server_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_skip_verify: Option<bool>,
    /// Write-only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_certificate: Option<String>,
    /// Write-only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_certificate_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_filter: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateCredentialStoreRequest {
    pub scope_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub attributes: CredentialStoreAttributes,
}
