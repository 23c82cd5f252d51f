//! boundary_auth_method_oidc

use async_trait::async_trait;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType};
use tfplug::validator::NumberRangeValidator;

use super::primary::{change_state, is_primary_attribute, state_attribute, sync_primary};
use super::{
    description_attribute, name_attribute, non_empty, optional_computed, parent_attribute,
    string_set, BoundaryResource, Secret, Secrets, StateModel, StateReader, StateWriter, Tracked,
};
use crate::api::auth_methods::{
    AuthMethod, AuthMethodAttributes, CreateAuthMethodRequest, OidcAuthMethodAttributes,
};
use crate::api::{ApiError, Client, UpdateBody};
use crate::validators::BoundaryIdValidator;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OidcAuthMethodModel {
    pub scope_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub issuer: Option<String>,
    pub client_id: Option<String>,
    pub max_age: Option<u32>,
    pub api_url_prefix: Option<String>,
    pub callback_url: Option<String>,
    pub signing_algorithms: Vec<String>,
    pub allowed_audiences: Vec<String>,
    pub claims_scopes: Vec<String>,
    pub account_claim_maps: Vec<String>,
    pub idp_ca_certs: Vec<String>,
    pub disable_discovered_config_validation: Option<bool>,
    pub is_primary_for_scope: Option<bool>,
    pub state: Option<String>,
}

impl StateModel for OidcAuthMethodModel {
    fn from_state(state: &StateReader<'_>) -> Result<Self, ApiError> {
        Ok(Self {
            scope_id: state.required_string("scope_id")?,
            name: state.string("name")?,
            description: state.string("description")?,
            issuer: state.string("issuer")?,
            client_id: state.string("client_id")?,
            max_age: state.number("max_age")?,
            api_url_prefix: state.string("api_url_prefix")?,
            callback_url: state.string("callback_url")?,
            signing_algorithms: state.strings("signing_algorithms")?,
            allowed_audiences: state.strings("allowed_audiences")?,
            claims_scopes: state.strings("claims_scopes")?,
            account_claim_maps: state.strings("account_claim_maps")?,
            idp_ca_certs: state.strings("idp_ca_certs")?,
            disable_discovered_config_validation: state
                .bool("disable_discovered_config_validation")?,
            is_primary_for_scope: state.bool("is_primary_for_scope")?,
            state: state.string("state")?,
        })
    }

    fn write_state(&self, state: &mut StateWriter) {
        state
            .string("scope_id", Some(&self.scope_id))
            .string("name", self.name.as_deref())
            .string("description", self.description.as_deref())
            .string("issuer", self.issuer.as_deref())
            .string("client_id", self.client_id.as_deref())
            .number("max_age", self.max_age)
            .string("api_url_prefix", self.api_url_prefix.as_deref())
            .string("callback_url", self.callback_url.as_deref())
            .strings("signing_algorithms", &self.signing_algorithms)
            .strings("allowed_audiences", &self.allowed_audiences)
            .strings("claims_scopes", &self.claims_scopes)
            .strings("account_claim_maps", &self.account_claim_maps)
            .strings("idp_ca_certs", &self.idp_ca_certs)
            .bool(
                "disable_discovered_config_validation",
                self.disable_discovered_config_validation,
            )
            .bool("is_primary_for_scope", self.is_primary_for_scope)
            .string("state", self.state.as_deref());
    }
}

impl TryFrom<AuthMethod> for Tracked<OidcAuthMethodModel> {
    type Error = ApiError;

    fn try_from(method: AuthMethod) -> Result<Self, ApiError> {
        let AuthMethodAttributes::Oidc(attrs) = method.variant()? else {
            return Err(ApiError::ParseError(format!(
                "auth method {} is of type \"{}\", not oidc",
                method.meta.id, method.kind
            )));
        };
        Ok(Tracked {
            model: OidcAuthMethodModel {
                scope_id: method.meta.scope_id.clone().unwrap_or_default(),
                name: method.meta.name.clone(),
                description: method.meta.description.clone(),
                issuer: attrs.issuer,
                client_id: attrs.client_id,
                max_age: attrs.max_age,
                api_url_prefix: attrs.api_url_prefix,
                callback_url: attrs.callback_url,
                signing_algorithms: attrs.signing_algorithms,
                allowed_audiences: attrs.allowed_audiences,
                claims_scopes: attrs.claims_scopes,
                account_claim_maps: attrs.account_claim_maps,
                idp_ca_certs: attrs.idp_ca_certs,
                disable_discovered_config_validation: None,
                is_primary_for_scope: Some(method.is_primary),
                state: attrs.state,
            },
            meta: method.meta,
        })
    }
}

#[derive(Default)]
pub struct AuthMethodOidcResource;

impl AuthMethodOidcResource {
    /// Activation and primary status are separate calls after the main write
    async fn finish(
        &self,
        client: &Client,
        method: AuthMethod,
        prior_primary: bool,
        plan: &OidcAuthMethodModel,
    ) -> Result<Tracked<OidcAuthMethodModel>, ApiError> {
        let id = method.meta.id.clone();
        let mut tracked: Tracked<OidcAuthMethodModel> = method.try_into()?;

        if let Some(state) = &plan.state {
            if tracked.model.state.as_ref() != Some(state) {
                tracked = change_state(client, &id, tracked.meta.version, state)
                    .await?
                    .try_into()?;
            }
        }
        if sync_primary(client, &plan.scope_id, &id, prior_primary, plan.is_primary_for_scope).await? {
            tracked = self.read(client, &id).await?;
        }

        tracked.model.disable_discovered_config_validation =
            plan.disable_discovered_config_validation;
        Ok(tracked)
    }
}

#[async_trait]
impl BoundaryResource for AuthMethodOidcResource {
    type Model = OidcAuthMethodModel;

    const TYPE_NAME: &'static str = "boundary_auth_method_oidc";
    const DESCRIPTION: &'static str = "An OpenID Connect auth method";
    const SECRETS: &'static [Secret] = &[Secret::new("client_secret")];
    const PRESERVED: &'static [&'static str] = &["disable_discovered_config_validation"];

    fn attributes(&self) -> Vec<Attribute> {
        let string = |name: &str, description: &str| {
            AttributeBuilder::new(name, AttributeType::String)
                .description(description)
                .optional()
                .build()
        };
        vec![
            parent_attribute(
                "scope_id",
                "The scope the auth method belongs to",
                BoundaryIdValidator::new(&["o"]).or_literal("global"),
            ),
            name_attribute(),
            description_attribute(),
            string("issuer", "The provider's issuer URL"),
            string("client_id", "OAuth client id"),
            AttributeBuilder::new("client_secret", AttributeType::String)
                .description("OAuth client secret")
                .optional()
                .sensitive()
                .write_only()
                .build(),
            AttributeBuilder::new("max_age", AttributeType::Number)
                .description("Seconds since the user last authenticated before re-authentication is required")
                .optional()
                .validator(NumberRangeValidator::create(Some(0.0), None))
                .build(),
            string("api_url_prefix", "Base URL of the Boundary API, used to build the callback URL"),
            AttributeBuilder::new("callback_url", AttributeType::String)
                .description("Redirect URL to register with the provider")
                .computed()
                .build(),
            optional_computed(
                "signing_algorithms",
                AttributeType::Set(Box::new(AttributeType::String)),
                "Allowed ID token signing algorithms",
            ),
            string_set("allowed_audiences", "Accepted `aud` claims").build(),
            string_set("claims_scopes", "Extra OIDC scopes to request").build(),
            string_set("account_claim_maps", "Claim mappings, e.g. `oid=sub`").build(),
            AttributeBuilder::new("idp_ca_certs", AttributeType::List(Box::new(AttributeType::String)))
                .description("PEM encoded CA certificates for the provider")
                .optional()
                .build(),
            AttributeBuilder::new("disable_discovered_config_validation", AttributeType::Bool)
                .description("Skip validating the provider's discovery document")
                .optional()
                .build(),
            is_primary_attribute(),
            state_attribute(),
        ]
    }

    async fn create(
        &self,
        client: &Client,
        plan: &OidcAuthMethodModel,
        secrets: &Secrets,
    ) -> Result<Tracked<OidcAuthMethodModel>, ApiError> {
        let attributes = OidcAuthMethodAttributes {
            issuer: plan.issuer.clone(),
            client_id: plan.client_id.clone(),
            client_secret: secrets.value("client_secret").map(str::to_string),
            max_age: plan.max_age,
            api_url_prefix: plan.api_url_prefix.clone(),
            callback_url: None,
            signing_algorithms: plan.signing_algorithms.clone(),
            allowed_audiences: plan.allowed_audiences.clone(),
            claims_scopes: plan.claims_scopes.clone(),
            account_claim_maps: plan.account_claim_maps.clone(),
            idp_ca_certs: plan.idp_ca_certs.clone(),
            disable_discovered_config_validation: plan.disable_discovered_config_validation,
            state: None,
        };
        let request = CreateAuthMethodRequest {
            scope_id: plan.scope_id.clone(),
            name: plan.name.clone(),
            description: plan.description.clone(),
            attributes: AuthMethodAttributes::Oidc(attributes),
        };
        let method = client.auth_methods().create(&request).await?;
        let primary = method.is_primary;
        self.finish(client, method, primary, plan).await
    }

    async fn read(&self, client: &Client, id: &str) -> Result<Tracked<OidcAuthMethodModel>, ApiError> {
        client.auth_methods().read(id).await?.try_into()
    }

    async fn update(
        &self,
        client: &Client,
        prior: &Tracked<OidcAuthMethodModel>,
        plan: &OidcAuthMethodModel,
        secrets: &Secrets,
    ) -> Result<Tracked<OidcAuthMethodModel>, ApiError> {
        let id = &prior.meta.id;
        let old = &prior.model;
        let mut body = UpdateBody::new(prior.meta.version);
        body.optional("name", &old.name, &plan.name)
            .optional("description", &old.description, &plan.description)
            .attribute_optional("issuer", &old.issuer, &plan.issuer)
            .attribute_optional("client_id", &old.client_id, &plan.client_id)
            .attribute_optional("max_age", &old.max_age, &plan.max_age)
            .attribute_optional("api_url_prefix", &old.api_url_prefix, &plan.api_url_prefix)
            .attribute_computed(
                "signing_algorithms",
                &non_empty(&old.signing_algorithms),
                &non_empty(&plan.signing_algorithms),
            )
            .attribute_optional(
                "allowed_audiences",
                &non_empty(&old.allowed_audiences),
                &non_empty(&plan.allowed_audiences),
            )
            .attribute_optional(
                "claims_scopes",
                &non_empty(&old.claims_scopes),
                &non_empty(&plan.claims_scopes),
            )
            .attribute_optional(
                "account_claim_maps",
                &non_empty(&old.account_claim_maps),
                &non_empty(&plan.account_claim_maps),
            )
            .attribute_optional(
                "idp_ca_certs",
                &non_empty(&old.idp_ca_certs),
                &non_empty(&plan.idp_ca_certs),
            );
        if secrets.changed("client_secret") {
            body.set_attribute("client_secret", secrets.value("client_secret"));
        }
        if body.has_changes() {
            if let Some(disable) = plan.disable_discovered_config_validation {
                body.set_attribute("disable_discovered_config_validation", disable);
            }
        }

        let method = if body.has_changes() {
            client.auth_methods().update(id, &body.into_value()).await?
        } else {
            client.auth_methods().read(id).await?
        };
        let prior_primary = old.is_primary_for_scope == Some(true);
        self.finish(client, method, prior_primary, plan).await
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
    use tfplug::types::{Dynamic, DynamicValue};

    #[tokio::test]
    async fn create_then_activate() {
        let mut server = Server::new_async().await;
        let create = server
            .mock("POST", "/v1/auth-methods")
            .match_body(Matcher::PartialJson(json!({
                "type": "oidc",
                "attributes": {
                    "issuer": "https://idp.example.com",
                    "client_id": "boundary",
                    "client_secret": "s3cret"
                }
            })))
            .with_body(
                r#"{"id":"amoidc_1234567890","scope_id":"global","version":1,"type":"oidc","attributes":{"issuer":"https://idp.example.com","client_id":"boundary","client_secret_hmac":"x","state":"inactive","callback_url":"https://boundary/v1/auth-methods/oidc:authenticate:callback"}}"#,
            )
            .create_async()
            .await;
        let activate = server
            .mock("POST", "/v1/auth-methods/amoidc_1234567890:change-state")
            .match_body(Matcher::Json(json!({
                "version": 1,
                "attributes": {"state": "active-public"}
            })))
            .with_body(
                r#"{"id":"amoidc_1234567890","scope_id":"global","version":2,"type":"oidc","attributes":{"issuer":"https://idp.example.com","client_id":"boundary","state":"active-public"}}"#,
            )
            .create_async()
            .await;

        let client = Client::new(&server.url(), false).unwrap();
        let plan = OidcAuthMethodModel {
            scope_id: "global".to_string(),
            issuer: Some("https://idp.example.com".to_string()),
            client_id: Some("boundary".to_string()),
            state: Some("active-public".to_string()),
            ..Default::default()
        };
        let config = DynamicValue::from_pairs([("client_secret", Dynamic::from("s3cret"))]);
        let secrets =
            Secrets::collect(AuthMethodOidcResource::SECRETS, &config, &DynamicValue::null()).unwrap();

        let method = AuthMethodOidcResource
            .create(&client, &plan, &secrets)
            .await
            .unwrap();

        create.assert_async().await;
        activate.assert_async().await;
        assert_eq!(method.meta.version, 2);
        assert_eq!(method.model.state.as_deref(), Some("active-public"));
    }
}
