use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::{decode_attributes, BoundaryApiResource, ItemMeta};
use super::error::ApiError;

#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    #[serde(flatten)]
    pub meta: ItemMeta,
    pub auth_method_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Value,
}

impl Account {
    pub fn variant(&self) -> Result<AccountAttributes, ApiError> {
        decode_attributes(&self.kind, &self.attributes)
    }

    /// Login name of password and LDAP accounts
    pub fn login_name(&self) -> Option<String> {
        match self.variant().ok()? {
            AccountAttributes::Password(attrs) => attrs.login_name,
            AccountAttributes::Ldap(attrs) => attrs.login_name,
            AccountAttributes::Oidc(_) => None,
        }
    }
}

impl BoundaryApiResource for Account {
    const COLLECTION: &'static str = "accounts";
    const PARENT_PARAM: &'static str = "auth_method_id";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "attributes", rename_all = "lowercase")]
pub enum AccountAttributes {
    Password(PasswordAccountAttributes),
    Oidc(OidcAccountAttributes),
    Ldap(LdapAccountAttributes),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PasswordAccountAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_name: Option<String>,
    /// Only ever sent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OidcAccountAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LdapAccountAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateAccountRequest {
    pub auth_method_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub attributes: AccountAttributes,
}

/// Body of `:set-password`
#[derive(Debug, Serialize)]
pub struct SetPasswordRequest {
    pub version: u32,
    pub password: String,
}
