//! boundary_account_ldap

use async_trait::async_trait;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType};

use super::{
    description_attribute, name_attribute, parent_attribute, BoundaryResource, Secrets,
    StateModel, StateReader, StateWriter, Tracked,
};
use crate::api::accounts::{Account, AccountAttributes, CreateAccountRequest, LdapAccountAttributes};
use crate::api::{ApiError, Client, UpdateBody};
use crate::validators::BoundaryIdValidator;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LdapAccountModel {
    pub auth_method_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub login_name: String,
}

impl StateModel for LdapAccountModel {
    fn from_state(state: &StateReader<'_>) -> Result<Self, ApiError> {
        Ok(Self {
            auth_method_id: state.required_string("auth_method_id")?,
            name: state.string("name")?,
            description: state.string("description")?,
            login_name: state.required_string("login_name")?,
        })
    }

    fn write_state(&self, state: &mut StateWriter) {
        state
            .string("auth_method_id", Some(&self.auth_method_id))
            .string("name", self.name.as_deref())
            .string("description", self.description.as_deref())
            .string("login_name", Some(&self.login_name));
    }
}

impl TryFrom<Account> for Tracked<LdapAccountModel> {
    type Error = ApiError;

    fn try_from(account: Account) -> Result<Self, ApiError> {
        let AccountAttributes::Ldap(attrs) = account.variant()? else {
            return Err(ApiError::ParseError(format!(
                "account {} is of type \"{}\", not ldap",
                account.meta.id, account.kind
            )));
        };
        Ok(Tracked {
            model: LdapAccountModel {
                auth_method_id: account.auth_method_id,
                name: account.meta.name.clone(),
                description: account.meta.description.clone(),
                login_name: attrs.login_name.unwrap_or_default(),
            },
            meta: account.meta,
        })
    }
}

#[derive(Default)]
pub struct AccountLdapResource;

#[async_trait]
impl BoundaryResource for AccountLdapResource {
    type Model = LdapAccountModel;

    const TYPE_NAME: &'static str = "boundary_account_ldap";
    const DESCRIPTION: &'static str = "An account in an LDAP auth method";

    fn attributes(&self) -> Vec<Attribute> {
        vec![
            parent_attribute(
                "auth_method_id",
                "The LDAP auth method the account belongs to",
                BoundaryIdValidator::new(&["amldap"]),
            ),
            name_attribute(),
            description_attribute(),
            AttributeBuilder::new("login_name", AttributeType::String)
                .description("The directory login name")
                .required()
                .build(),
        ]
    }

    async fn create(
        &self,
        client: &Client,
        plan: &LdapAccountModel,
        _secrets: &Secrets,
    ) -> Result<Tracked<LdapAccountModel>, ApiError> {
        let request = CreateAccountRequest {
            auth_method_id: plan.auth_method_id.clone(),
            name: plan.name.clone(),
            description: plan.description.clone(),
            attributes: AccountAttributes::Ldap(LdapAccountAttributes {
                login_name: Some(plan.login_name.clone()),
            }),
        };
        client.accounts().create(&request).await?.try_into()
    }

    async fn read(&self, client: &Client, id: &str) -> Result<Tracked<LdapAccountModel>, ApiError> {
        client.accounts().read(id).await?.try_into()
    }

    async fn update(
        &self,
        client: &Client,
        prior: &Tracked<LdapAccountModel>,
        plan: &LdapAccountModel,
        _secrets: &Secrets,
    ) -> Result<Tracked<LdapAccountModel>, ApiError> {
        let mut body = UpdateBody::new(prior.meta.version);
        body.optional("name", &prior.model.name, &plan.name)
            .optional("description", &prior.model.description, &plan.description)
            .attribute_optional(
                "login_name",
                &Some(&prior.model.login_name),
                &Some(&plan.login_name),
            );
        if !body.has_changes() {
            return self.read(client, &prior.meta.id).await;
        }
        client
            .accounts()
            .update(&prior.meta.id, &body.into_value())
            .await?
            .try_into()
    }

    async fn delete(&self, client: &Client, id: &str) -> Result<(), ApiError> {
        client.accounts().delete(id).await
    }
}
