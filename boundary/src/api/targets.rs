use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::{decode_attributes, BoundaryApiResource, ItemMeta};
use super::error::ApiError;

#[derive(Debug, Clone, Deserialize)]
pub struct Target {
    #[serde(flatten)]
    pub meta: ItemMeta,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Value,
    #[serde(default)]
    pub host_source_ids: Vec<String>,
    #[serde(default)]
    pub brokered_credential_source_ids: Vec<String>,
    #[serde(default)]
    pub injected_application_credential_source_ids: Vec<String>,
    #[serde(default)]
    pub session_max_seconds: Option<u32>,
    #[serde(default)]
    pub session_connection_limit: Option<i32>,
    #[serde(default)]
    pub egress_worker_filter: Option<String>,
    #[serde(default)]
    pub ingress_worker_filter: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl Target {
    pub fn variant(&self) -> Result<TargetAttributes, ApiError> {
        decode_attributes(&self.kind, &self.attributes)
    }
}

impl BoundaryApiResource for Target {
    const COLLECTION: &'static str = "targets";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "attributes", rename_all = "lowercase")]
pub enum TargetAttributes {
    Tcp(TcpTargetAttributes),
    Ssh(SshTargetAttributes),
}

impl TargetAttributes {
    pub fn default_port(&self) -> Option<u32> {
        match self {
            TargetAttributes::Tcp(attrs) => attrs.default_port,
            TargetAttributes::Ssh(attrs) => attrs.default_port,
        }
    }

    pub fn default_client_port(&self) -> Option<u32> {
        match self {
            TargetAttributes::Tcp(attrs) => attrs.default_client_port,
            TargetAttributes::Ssh(attrs) => attrs.default_client_port,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TcpTargetAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_port: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_client_port: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SshTargetAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_port: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_client_port: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_session_recording: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_bucket_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateTargetRequest {
    pub scope_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_max_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_connection_limit: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub egress_worker_filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingress_worker_filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(flatten)]
    pub attributes: TargetAttributes,
}

#[derive(Debug, Serialize)]
pub struct SetHostSourcesRequest {
    pub version: u32,
    pub host_source_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SetCredentialSourcesRequest {
    pub version: u32,
    pub brokered_credential_source_ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub injected_application_credential_source_ids: Vec<String>,
}
