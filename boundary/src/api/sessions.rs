use serde::Deserialize;

use super::common::BoundaryApiResource;

/// Sessions are read-only from the provider's point of view
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub id: String,
    #[serde(default)]
    pub scope_id: Option<String>,
    #[serde(default)]
    pub target_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub host_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub expiration_time: Option<String>,
}

impl BoundaryApiResource for Session {
    const COLLECTION: &'static str = "sessions";
}
