//! Pieces shared by the auth method resources: primary-for-scope handling
//! and the OIDC/LDAP activation state.

use serde_json::Value;
use tfplug::plan_modifier::UseStateForUnknown;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType};
use tfplug::validator::OneOfValidator;
use tracing::info;

use super::flag_attribute;
use crate::api::auth_methods::{
    AuthMethod, ChangeStateAttributes, ChangeStateRequest, PrimaryAuthMethodRequest,
};
use crate::api::{ApiError, Client, UpdateBody};

pub(crate) const STATES: &[&str] = &["inactive", "active-private", "active-public"];

pub(crate) fn is_primary_attribute() -> Attribute {
    flag_attribute(
        "is_primary_for_scope",
        "Make this the primary auth method of its scope; users logging in through it are created automatically",
    )
}

pub(crate) fn state_attribute() -> Attribute {
    AttributeBuilder::new("state", AttributeType::String)
        .description("Activation state: inactive, active-private or active-public")
        .optional()
        .computed()
        .validator(OneOfValidator::create(STATES))
        .plan_modifier(UseStateForUnknown::create())
        .build()
}

/// Bring the scope's primary auth method in line with `wanted`.
/// Returns true when the scope was changed.
pub(crate) async fn sync_primary(
    client: &Client,
    scope_id: &str,
    auth_method_id: &str,
    currently_primary: bool,
    wanted: Option<bool>,
) -> Result<bool, ApiError> {
    match wanted {
        Some(true) if !currently_primary => {
            let scope = client.scopes().read(scope_id).await?;
            let request = PrimaryAuthMethodRequest {
                version: scope.meta.version,
                primary_auth_method_id: auth_method_id.to_string(),
            };
            client.scopes().update(scope_id, &request).await?;
            info!(scope_id, auth_method_id, "set primary auth method");
            Ok(true)
        }
        Some(false) if currently_primary => {
            let scope = client.scopes().read(scope_id).await?;
            let mut body = UpdateBody::new(scope.meta.version);
            body.set("primary_auth_method_id", Value::Null);
            client.scopes().update(scope_id, &body.into_value()).await?;
            info!(scope_id, auth_method_id, "cleared primary auth method");
            Ok(true)
        }
        _ => Ok(false),
    }
}

pub(crate) async fn change_state(
    client: &Client,
    id: &str,
    version: u32,
    state: &str,
) -> Result<AuthMethod, ApiError> {
    let request = ChangeStateRequest {
        version,
        attributes: ChangeStateAttributes {
            state: state.to_string(),
        },
    };
    client.auth_methods().action(id, "change-state", &request).await
}
