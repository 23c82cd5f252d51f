//! boundary_account_oidc

use async_trait::async_trait;
use tfplug::plan_modifier::{RequiresReplace, UseStateForUnknown};
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType};

use super::{
    description_attribute, name_attribute, parent_attribute, BoundaryResource, Secrets,
    StateModel, StateReader, StateWriter, Tracked,
};
use crate::api::accounts::{Account, AccountAttributes, CreateAccountRequest, OidcAccountAttributes};
use crate::api::{ApiError, Client, UpdateBody};
use crate::validators::BoundaryIdValidator;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OidcAccountModel {
    pub auth_method_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub issuer: Option<String>,
    pub subject: String,
}

impl StateModel for OidcAccountModel {
    fn from_state(state: &StateReader<'_>) -> Result<Self, ApiError> {
        Ok(Self {
            auth_method_id: state.required_string("auth_method_id")?,
            name: state.string("name")?,
            description: state.string("description")?,
            issuer: state.string("issuer")?,
            subject: state.required_string("subject")?,
        })
    }

    fn write_state(&self, state: &mut StateWriter) {
        state
            .string("auth_method_id", Some(&self.auth_method_id))
            .string("name", self.name.as_deref())
            .string("description", self.description.as_deref())
            .string("issuer", self.issuer.as_deref())
            .string("subject", Some(&self.subject));
    }
}

impl TryFrom<Account> for Tracked<OidcAccountModel> {
    type Error = ApiError;

    fn try_from(account: Account) -> Result<Self, ApiError> {
        let AccountAttributes::Oidc(attrs) = account.variant()? else {
            return Err(ApiError::ParseError(format!(
                "account {} is of type \"{}\", not oidc",
                account.meta.id, account.kind
            )));
        };
        Ok(Tracked {
            model: OidcAccountModel {
                auth_method_id: account.auth_method_id,
                name: account.meta.name.clone(),
                description: account.meta.description.clone(),
                issuer: attrs.issuer,
                subject: attrs.subject.unwrap_or_default(),
            },
            meta: account.meta,
        })
    }
}

#[derive(Default)]
pub struct AccountOidcResource;

#[async_trait]
impl BoundaryResource for AccountOidcResource {
    type Model = OidcAccountModel;

    const TYPE_NAME: &'static str = "boundary_account_oidc";
    const DESCRIPTION: &'static str = "An account in an OIDC auth method, matched on issuer and subject";

    fn attributes(&self) -> Vec<Attribute> {
        vec![
            parent_attribute(
                "auth_method_id",
                "The OIDC auth method the account belongs to",
                BoundaryIdValidator::new(&["amoidc"]),
            ),
            name_attribute(),
            description_attribute(),
            AttributeBuilder::new("issuer", AttributeType::String)
                .description("Issuer of the account's tokens; defaults to the auth method's issuer")
                .optional()
                .computed()
                .plan_modifier(UseStateForUnknown::create())
                .plan_modifier(RequiresReplace::create())
                .build(),
            AttributeBuilder::new("subject", AttributeType::String)
                .description("The `sub` claim identifying the user at the provider")
                .required()
                .plan_modifier(RequiresReplace::create())
                .build(),
        ]
    }

    async fn create(
        &self,
        client: &Client,
        plan: &OidcAccountModel,
        _secrets: &Secrets,
    ) -> Result<Tracked<OidcAccountModel>, ApiError> {
        let request = CreateAccountRequest {
            auth_method_id: plan.auth_method_id.clone(),
            name: plan.name.clone(),
            description: plan.description.clone(),
            attributes: AccountAttributes::Oidc(OidcAccountAttributes {
                issuer: plan.issuer.clone(),
                subject: Some(plan.subject.clone()),
                ..Default::default()
            }),
        };
        client.accounts().create(&request).await?.try_into()
    }

    async fn read(&self, client: &Client, id: &str) -> Result<Tracked<OidcAccountModel>, ApiError> {
        client.accounts().read(id).await?.try_into()
    }

    async fn update(
        &self,
        client: &Client,
        prior: &Tracked<OidcAccountModel>,
        plan: &OidcAccountModel,
        _secrets: &Secrets,
    ) -> Result<Tracked<OidcAccountModel>, ApiError> {
        let mut body = UpdateBody::new(prior.meta.version);
        body.optional("name", &prior.model.name, &plan.name)
            .optional("description", &prior.model.description, &plan.description);
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

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn issuer_defaults_from_the_server() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1/accounts")
            .with_body(
                r#"{"id":"acctoidc_1234567890","auth_method_id":"amoidc_1234567890","type":"oidc","version":1,"attributes":{"issuer":"https://idp.example.com","subject":"alice","email":"alice@example.com"}}"#,
            )
            .create_async()
            .await;

        let client = Client::new(&server.url(), false).unwrap();
        let plan = OidcAccountModel {
            auth_method_id: "amoidc_1234567890".to_string(),
            subject: "alice".to_string(),
            ..Default::default()
        };
        let account = AccountOidcResource
            .create(&client, &plan, &Secrets::default())
            .await
            .unwrap();
        assert_eq!(account.model.issuer.as_deref(), Some("https://idp.example.com"));
        assert_eq!(account.model.subject, "alice");
    }
}
