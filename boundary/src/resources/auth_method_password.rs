//! boundary_auth_method_password

use async_trait::async_trait;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType};

use super::primary::{is_primary_attribute, sync_primary};
use super::{
    description_attribute, name_attribute, optional_computed, parent_attribute, BoundaryResource,
    Secrets, StateModel, StateReader, StateWriter, Tracked,
};
use crate::api::auth_methods::{
    AuthMethod, AuthMethodAttributes, CreateAuthMethodRequest, PasswordAuthMethodAttributes,
};
use crate::api::{ApiError, Client, UpdateBody};
use crate::validators::BoundaryIdValidator;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PasswordAuthMethodModel {
    pub scope_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub min_login_name_length: Option<u32>,
    pub min_password_length: Option<u32>,
    pub is_primary_for_scope: Option<bool>,
}

impl StateModel for PasswordAuthMethodModel {
    fn from_state(state: &StateReader<'_>) -> Result<Self, ApiError> {
        Ok(Self {
            scope_id: state.required_string("scope_id")?,
            name: state.string("name")?,
            description: state.string("description")?,
            min_login_name_length: state.number("min_login_name_length")?,
            min_password_length: state.number("min_password_length")?,
            is_primary_for_scope: state.bool("is_primary_for_scope")?,
        })
    }

    fn write_state(&self, state: &mut StateWriter) {
        state
            .string("scope_id", Some(&self.scope_id))
            .string("name", self.name.as_deref())
            .string("description", self.description.as_deref())
            .string("type", Some("password"))
            .number("min_login_name_length", self.min_login_name_length)
            .number("min_password_length", self.min_password_length)
            .bool("is_primary_for_scope", self.is_primary_for_scope);
    }
}

impl TryFrom<AuthMethod> for Tracked<PasswordAuthMethodModel> {
    type Error = ApiError;

    fn try_from(method: AuthMethod) -> Result<Self, ApiError> {
        let AuthMethodAttributes::Password(attrs) = method.variant()? else {
            return Err(ApiError::ParseError(format!(
                "auth method {} is of type \"{}\", not password",
                method.meta.id, method.kind
            )));
        };
        Ok(Tracked {
            model: PasswordAuthMethodModel {
                scope_id: method.meta.scope_id.clone().unwrap_or_default(),
                name: method.meta.name.clone(),
                description: method.meta.description.clone(),
                min_login_name_length: attrs.min_login_name_length,
                min_password_length: attrs.min_password_length,
                is_primary_for_scope: Some(method.is_primary),
            },
            meta: method.meta,
        })
    }
}

#[derive(Default)]
pub struct AuthMethodPasswordResource;

#[async_trait]
impl BoundaryResource for AuthMethodPasswordResource {
    type Model = PasswordAuthMethodModel;

    const TYPE_NAME: &'static str = "boundary_auth_method_password";
    const DESCRIPTION: &'static str = "A password auth method in the global scope or an org";

    fn attributes(&self) -> Vec<Attribute> {
        vec![
            parent_attribute(
                "scope_id",
                "The scope the auth method belongs to",
                BoundaryIdValidator::new(&["o"]).or_literal("global"),
            ),
            name_attribute(),
            description_attribute(),
            AttributeBuilder::new("type", AttributeType::String)
                .description("Always `password`")
                .computed()
                .build(),
            optional_computed(
                "min_login_name_length",
                AttributeType::Number,
                "Minimum length of login names",
            ),
            optional_computed(
                "min_password_length",
                AttributeType::Number,
                "Minimum length of passwords",
            ),
            is_primary_attribute(),
        ]
    }

    async fn create(
        &self,
        client: &Client,
        plan: &PasswordAuthMethodModel,
        _secrets: &Secrets,
    ) -> Result<Tracked<PasswordAuthMethodModel>, ApiError> {
        let request = CreateAuthMethodRequest {
            scope_id: plan.scope_id.clone(),
            name: plan.name.clone(),
            description: plan.description.clone(),
            attributes: AuthMethodAttributes::Password(PasswordAuthMethodAttributes {
                min_login_name_length: plan.min_login_name_length,
                min_password_length: plan.min_password_length,
            }),
        };
        let method = client.auth_methods().create(&request).await?;

        if sync_primary(client, &plan.scope_id, &method.meta.id, method.is_primary, plan.is_primary_for_scope).await? {
            return self.read(client, &method.meta.id).await;
        }
        method.try_into()
    }

    async fn read(
        &self,
        client: &Client,
        id: &str,
    ) -> Result<Tracked<PasswordAuthMethodModel>, ApiError> {
        client.auth_methods().read(id).await?.try_into()
    }

    async fn update(
        &self,
        client: &Client,
        prior: &Tracked<PasswordAuthMethodModel>,
        plan: &PasswordAuthMethodModel,
        _secrets: &Secrets,
    ) -> Result<Tracked<PasswordAuthMethodModel>, ApiError> {
        let id = &prior.meta.id;
        let mut body = UpdateBody::new(prior.meta.version);
        body.optional("name", &prior.model.name, &plan.name)
            .optional("description", &prior.model.description, &plan.description)
            .attribute_computed(
                "min_login_name_length",
                &prior.model.min_login_name_length,
                &plan.min_login_name_length,
            )
            .attribute_computed(
                "min_password_length",
                &prior.model.min_password_length,
                &plan.min_password_length,
            );
        if body.has_changes() {
            client.auth_methods().update(id, &body.into_value()).await?;
        }

        let currently_primary = prior.model.is_primary_for_scope == Some(true);
        sync_primary(client, &plan.scope_id, id, currently_primary, plan.is_primary_for_scope).await?;
        self.read(client, id).await
    }

    async fn delete(&self, client: &Client, id: &str) -> Result<(), ApiError> {
        client.auth_methods().delete(id).await
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[tokio::test]
    async fn create_sends_password_attributes() {
        let mut server = Server::new_async().await;
        let create = server
            .mock("POST", "/v1/auth-methods")
            .match_body(Matcher::Json(json!({
                "scope_id": "global",
                "name": "password",
                "type": "password",
                "attributes": {"min_password_length": 12}
            })))
            .with_body(
                r#"{"id":"ampw_1234567890","scope_id":"global","name":"password","version":1,"type":"password","attributes":{"min_login_name_length":3,"min_password_length":12}}"#,
            )
            .create_async()
            .await;

        let client = Client::new(&server.url(), false).unwrap();
        let plan = PasswordAuthMethodModel {
            scope_id: "global".to_string(),
            name: Some("password".to_string()),
            min_password_length: Some(12),
            ..Default::default()
        };
        let method = AuthMethodPasswordResource
            .create(&client, &plan, &Secrets::default())
            .await
            .unwrap();

        create.assert_async().await;
        assert_eq!(method.model.min_login_name_length, Some(3));
        assert_eq!(method.model.is_primary_for_scope, Some(false));
    }

    #[tokio::test]
    async fn rejects_other_auth_method_types() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v1/auth-methods/amoidc_1234567890")
            .with_body(r#"{"id":"amoidc_1234567890","scope_id":"global","version":1,"type":"oidc","attributes":{}}"#)
            .create_async()
            .await;

        let client = Client::new(&server.url(), false).unwrap();
        let result = AuthMethodPasswordResource.read(&client, "amoidc_1234567890").await;
        assert!(matches!(result, Err(ApiError::ParseError(_))));
    }
}
