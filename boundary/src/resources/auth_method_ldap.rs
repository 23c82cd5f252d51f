//! boundary_auth_method_ldap

use async_trait::async_trait;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType};
use tfplug::validator::ListLengthValidator;

use super::primary::{change_state, is_primary_attribute, state_attribute, sync_primary};
use super::{
    description_attribute, flag_attribute, name_attribute, non_empty, parent_attribute,
    BoundaryResource, Secret, Secrets, StateModel, StateReader, StateWriter, Tracked,
};
use crate::api::auth_methods::{
    AuthMethod, AuthMethodAttributes, CreateAuthMethodRequest, LdapAuthMethodAttributes,
};
use crate::api::{ApiError, Client, UpdateBody};
use crate::validators::BoundaryIdValidator;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LdapAuthMethodModel {
    pub scope_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub urls: Vec<String>,
    pub start_tls: Option<bool>,
    pub insecure_tls: Option<bool>,
    pub discover_dn: Option<bool>,
    pub anon_group_search: Option<bool>,
    pub enable_groups: Option<bool>,
    pub upn_domain: Option<String>,
    pub user_dn: Option<String>,
    pub user_attr: Option<String>,
    pub user_filter: Option<String>,
    pub group_dn: Option<String>,
    pub group_attr: Option<String>,
    pub group_filter: Option<String>,
    pub certificates: Vec<String>,
    pub bind_dn: Option<String>,
    pub is_primary_for_scope: Option<bool>,
    pub state: Option<String>,
}

/// String attributes sent verbatim, in schema order
const STRING_ATTRIBUTES: &[(&str, &str)] = &[
    ("upn_domain", "userPrincipalName domain appended to login names"),
    ("user_dn", "Base DN for user searches"),
    ("user_attr", "Attribute matched against the login name, e.g. `uid`"),
    ("user_filter", "Go template used to build the user search filter"),
    ("group_dn", "Base DN for group searches"),
    ("group_attr", "Attribute listing group membership, e.g. `member`"),
    ("group_filter", "Go template used to build the group search filter"),
    ("bind_dn", "DN used to bind for user and group searches"),
];

impl LdapAuthMethodModel {
    fn strings(&self) -> [&Option<String>; 8] {
        [
            &self.upn_domain,
            &self.user_dn,
            &self.user_attr,
            &self.user_filter,
            &self.group_dn,
            &self.group_attr,
            &self.group_filter,
            &self.bind_dn,
        ]
    }

    fn flags(&self) -> [(&'static str, Option<bool>); 5] {
        [
            ("start_tls", self.start_tls),
            ("insecure_tls", self.insecure_tls),
            ("discover_dn", self.discover_dn),
            ("anon_group_search", self.anon_group_search),
            ("enable_groups", self.enable_groups),
        ]
    }
}

impl StateModel for LdapAuthMethodModel {
    fn from_state(state: &StateReader<'_>) -> Result<Self, ApiError> {
        Ok(Self {
            scope_id: state.required_string("scope_id")?,
            name: state.string("name")?,
            description: state.string("description")?,
            urls: state.strings("urls")?,
            start_tls: state.bool("start_tls")?,
            insecure_tls: state.bool("insecure_tls")?,
            discover_dn: state.bool("discover_dn")?,
            anon_group_search: state.bool("anon_group_search")?,
            enable_groups: state.bool("enable_groups")?,
            upn_domain: state.string("upn_domain")?,
            user_dn: state.string("user_dn")?,
            user_attr: state.string("user_attr")?,
            user_filter: state.string("user_filter")?,
            group_dn: state.string("group_dn")?,
            group_attr: state.string("group_attr")?,
            group_filter: state.string("group_filter")?,
            certificates: state.strings("certificates")?,
            bind_dn: state.string("bind_dn")?,
            is_primary_for_scope: state.bool("is_primary_for_scope")?,
            state: state.string("state")?,
        })
    }

    fn write_state(&self, state: &mut StateWriter) {
        state
            .string("scope_id", Some(&self.scope_id))
            .string("name", self.name.as_deref())
            .string("description", self.description.as_deref())
            .strings("urls", &self.urls)
            .strings("certificates", &self.certificates)
            .bool("is_primary_for_scope", self.is_primary_for_scope)
            .string("state", self.state.as_deref());
        for ((name, _), value) in STRING_ATTRIBUTES.iter().zip(self.strings()) {
            state.string(name, value.as_deref());
        }
        for (name, value) in self.flags() {
            state.bool(name, value);
        }
    }
}

impl TryFrom<AuthMethod> for Tracked<LdapAuthMethodModel> {
    type Error = ApiError;

    fn try_from(method: AuthMethod) -> Result<Self, ApiError> {
        let AuthMethodAttributes::Ldap(attrs) = method.variant()? else {
            return Err(ApiError::ParseError(format!(
                "auth method {} is of type \"{}\", not ldap",
                method.meta.id, method.kind
            )));
        };
        let flag = |value: Option<bool>| Some(value.unwrap_or(false));
        Ok(Tracked {
            model: LdapAuthMethodModel {
                scope_id: method.meta.scope_id.clone().unwrap_or_default(),
                name: method.meta.name.clone(),
                description: method.meta.description.clone(),
                urls: attrs.urls,
                start_tls: flag(attrs.start_tls),
                insecure_tls: flag(attrs.insecure_tls),
                discover_dn: flag(attrs.discover_dn),
                anon_group_search: flag(attrs.anon_group_search),
                enable_groups: flag(attrs.enable_groups),
                upn_domain: attrs.upn_domain,
                user_dn: attrs.user_dn,
                user_attr: attrs.user_attr,
                user_filter: attrs.user_filter,
                group_dn: attrs.group_dn,
                group_attr: attrs.group_attr,
                group_filter: attrs.group_filter,
                certificates: attrs.certificates,
                bind_dn: attrs.bind_dn,
                is_primary_for_scope: Some(method.is_primary),
                state: attrs.state,
            },
            meta: method.meta,
        })
    }
}

#[derive(Default)]
pub struct AuthMethodLdapResource;

impl AuthMethodLdapResource {
    async fn finish(
        &self,
        client: &Client,
        method: AuthMethod,
        prior_primary: bool,
        plan: &LdapAuthMethodModel,
    ) -> Result<Tracked<LdapAuthMethodModel>, ApiError> {
        let id = method.meta.id.clone();
        let mut tracked: Tracked<LdapAuthMethodModel> = method.try_into()?;

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
        Ok(tracked)
    }
}

#[async_trait]
impl BoundaryResource for AuthMethodLdapResource {
    type Model = LdapAuthMethodModel;

    const TYPE_NAME: &'static str = "boundary_auth_method_ldap";
    const DESCRIPTION: &'static str = "An LDAP auth method";
    const SECRETS: &'static [Secret] = &[Secret::new("bind_password")];

    fn attributes(&self) -> Vec<Attribute> {
        let mut attributes = vec![
            parent_attribute(
                "scope_id",
                "The scope the auth method belongs to",
                BoundaryIdValidator::new(&["o"]).or_literal("global"),
            ),
            name_attribute(),
            description_attribute(),
            AttributeBuilder::new("urls", AttributeType::List(Box::new(AttributeType::String)))
                .description("LDAP server URLs, tried in order")
                .required()
                .validator(ListLengthValidator::create(Some(1), None))
                .build(),
            flag_attribute("start_tls", "Issue StartTLS after connecting"),
            flag_attribute("insecure_tls", "Skip verification of the server certificate"),
            flag_attribute("discover_dn", "Discover the user's DN with an anonymous search"),
            flag_attribute("anon_group_search", "Search groups anonymously"),
            flag_attribute("enable_groups", "Look up the user's groups at login"),
            AttributeBuilder::new(
                "certificates",
                AttributeType::List(Box::new(AttributeType::String)),
            )
            .description("PEM encoded CA certificates for the LDAP servers")
            .optional()
            .build(),
            AttributeBuilder::new("bind_password", AttributeType::String)
                .description("Password for bind_dn")
                .optional()
                .sensitive()
                .write_only()
                .build(),
            is_primary_attribute(),
            state_attribute(),
        ];
        attributes.extend(STRING_ATTRIBUTES.iter().map(|(name, description)| {
            AttributeBuilder::new(name, AttributeType::String)
                .description(description)
                .optional()
                .build()
        }));
        attributes
    }

    async fn create(
        &self,
        client: &Client,
        plan: &LdapAuthMethodModel,
        secrets: &Secrets,
    ) -> Result<Tracked<LdapAuthMethodModel>, ApiError> {
        let attributes = LdapAuthMethodAttributes {
            urls: plan.urls.clone(),
            start_tls: plan.start_tls,
            insecure_tls: plan.insecure_tls,
            discover_dn: plan.discover_dn,
            anon_group_search: plan.anon_group_search,
            enable_groups: plan.enable_groups,
            upn_domain: plan.upn_domain.clone(),
            user_dn: plan.user_dn.clone(),
            user_attr: plan.user_attr.clone(),
            user_filter: plan.user_filter.clone(),
            group_dn: plan.group_dn.clone(),
            group_attr: plan.group_attr.clone(),
            group_filter: plan.group_filter.clone(),
            certificates: plan.certificates.clone(),
            bind_dn: plan.bind_dn.clone(),
            bind_password: secrets.value("bind_password").map(str::to_string),
            state: None,
        };
        let method = client
            .auth_methods()
            .create(&CreateAuthMethodRequest {
                scope_id: plan.scope_id.clone(),
                name: plan.name.clone(),
                description: plan.description.clone(),
                attributes: AuthMethodAttributes::Ldap(attributes),
            })
            .await?;
        let primary = method.is_primary;
        self.finish(client, method, primary, plan).await
    }

    async fn read(&self, client: &Client, id: &str) -> Result<Tracked<LdapAuthMethodModel>, ApiError> {
        client.auth_methods().read(id).await?.try_into()
    }

    async fn update(
        &self,
        client: &Client,
        prior: &Tracked<LdapAuthMethodModel>,
        plan: &LdapAuthMethodModel,
        secrets: &Secrets,
    ) -> Result<Tracked<LdapAuthMethodModel>, ApiError> {
        let id = &prior.meta.id;
        let old = &prior.model;
        let mut body = UpdateBody::new(prior.meta.version);
        body.optional("name", &old.name, &plan.name)
            .optional("description", &old.description, &plan.description)
            .attribute_optional(
                "certificates",
                &non_empty(&old.certificates),
                &non_empty(&plan.certificates),
            );
        if old.urls != plan.urls {
            body.set_attribute("urls", &plan.urls);
        }
        for ((name, _), (prior_value, planned)) in STRING_ATTRIBUTES
            .iter()
            .zip(old.strings().into_iter().zip(plan.strings()))
        {
            body.attribute_optional(name, prior_value, planned);
        }
        for ((name, prior_flag), (_, planned)) in old.flags().into_iter().zip(plan.flags()) {
            body.attribute_computed(name, &prior_flag, &planned);
        }
        if secrets.changed("bind_password") {
            body.set_attribute("bind_password", secrets.value("bind_password"));
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

    fn prior() -> Tracked<LdapAuthMethodModel> {
        Tracked {
            meta: crate::api::ItemMeta {
                id: "amldap_1234567890".to_string(),
                version: 4,
                ..Default::default()
            },
            model: LdapAuthMethodModel {
                scope_id: "global".to_string(),
                urls: vec!["ldaps://ldap.example.com".to_string()],
                start_tls: Some(false),
                insecure_tls: Some(false),
                discover_dn: Some(false),
                anon_group_search: Some(false),
                enable_groups: Some(false),
                user_dn: Some("ou=people,dc=example,dc=com".to_string()),
                is_primary_for_scope: Some(false),
                state: Some("active-public".to_string()),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn update_sends_changed_fields_and_rotated_password() {
        let mut server = Server::new_async().await;
        let patch = server
            .mock("PATCH", "/v1/auth-methods/amldap_1234567890")
            .match_body(Matcher::Json(json!({
                "version": 4,
                "attributes": {
                    "enable_groups": true,
                    "group_dn": "ou=groups,dc=example,dc=com",
                    "user_dn": null,
                    "bind_password": "n3w"
                }
            })))
            .with_body(
                r#"{"id":"amldap_1234567890","scope_id":"global","version":5,"type":"ldap","attributes":{"urls":["ldaps://ldap.example.com"],"enable_groups":true,"group_dn":"ou=groups,dc=example,dc=com","state":"active-public"}}"#,
            )
            .create_async()
            .await;

        let client = Client::new(&server.url(), false).unwrap();
        let prior = prior();
        let plan = LdapAuthMethodModel {
            enable_groups: Some(true),
            group_dn: Some("ou=groups,dc=example,dc=com".to_string()),
            user_dn: None,
            ..prior.model.clone()
        };
        let config = DynamicValue::from_pairs([("bind_password", Dynamic::from("n3w"))]);
        let secrets =
            Secrets::collect(AuthMethodLdapResource::SECRETS, &config, &DynamicValue::null()).unwrap();

        let method = AuthMethodLdapResource
            .update(&client, &prior, &plan, &secrets)
            .await
            .unwrap();

        patch.assert_async().await;
        assert_eq!(method.meta.version, 5);
        assert_eq!(method.model.enable_groups, Some(true));
        assert_eq!(method.model.start_tls, Some(false));
    }
}
