use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::{decode_attributes, BoundaryApiResource, ItemMeta};
use super::error::ApiError;

#[derive(Debug, Clone, Deserialize)]
pub struct AuthMethod {
    #[serde(flatten)]
    pub meta: ItemMeta,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Value,
    #[serde(default)]
    pub is_primary: bool,
}

impl AuthMethod {
    pub fn variant(&self) -> Result<AuthMethodAttributes, ApiError> {
        decode_attributes(&self.kind, &self.attributes)
    }
}

impl BoundaryApiResource for AuthMethod {
    const COLLECTION: &'static str = "auth-methods";
}

/// Type-specific settings, keyed by the auth method's `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "attributes", rename_all = "lowercase")]
pub enum AuthMethodAttributes {
    Password(PasswordAuthMethodAttributes),
    Oidc(OidcAuthMethodAttributes),
    Ldap(LdapAuthMethodAttributes),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PasswordAuthMethodAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_login_name_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_password_length: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OidcAuthMethodAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Write-only; the server answers with `client_secret_hmac` instead
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signing_algorithms: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_audiences: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub claims_scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub account_claim_maps: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub idp_ca_certs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_discovered_config_validation: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LdapAuthMethodAttributes {
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_tls: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure_tls: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discover_dn: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anon_group_search: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upn_domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_dn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_attr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_groups: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_dn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_attr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_filter: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub certificates: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind_dn: Option<String>,
    /// Write-only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateAuthMethodRequest {
    pub scope_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub attributes: AuthMethodAttributes,
}

/// Body of `:change-state`
#[derive(Debug, Serialize)]
pub struct ChangeStateRequest {
    pub version: u32,
    pub attributes: ChangeStateAttributes,
}

#[derive(Debug, Serialize)]
pub struct ChangeStateAttributes {
    pub state: String,
}

/// Promote an auth method to primary for its scope
#[derive(Debug, Serialize)]
pub struct PrimaryAuthMethodRequest {
    pub version: u32,
    pub primary_auth_method_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_variant_from_item() {
        let item: AuthMethod = serde_json::from_value(json!({
            "id": "ampw_1234567890",
            "scope_id": "global",
            "type": "password",
            "version": 1,
            "attributes": {"min_login_name_length": 3, "min_password_length": 8}
        }))
        .unwrap();

        match item.variant().unwrap() {
            AuthMethodAttributes::Password(attrs) => {
                assert_eq!(attrs.min_login_name_length, Some(3));
                assert_eq!(attrs.min_password_length, Some(8));
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn create_request_flattens_variant() {
        let request = CreateAuthMethodRequest {
            scope_id: "o_1234567890".to_string(),
            name: None,
            description: None,
            attributes: AuthMethodAttributes::Password(PasswordAuthMethodAttributes {
                min_login_name_length: None,
                min_password_length: Some(12),
            }),
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "scope_id": "o_1234567890",
                "type": "password",
                "attributes": {"min_password_length": 12}
            })
        );
    }

    #[test]
    fn unknown_type_is_a_parse_error() {
        let item: AuthMethod = serde_json::from_value(json!({
            "id": "amx_1234567890",
            "type": "saml",
            "version": 1
        }))
        .unwrap();
        assert!(matches!(item.variant(), Err(ApiError::ParseError(_))));
    }
}
