//! boundary_account_password

use async_trait::async_trait;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType};
use tracing::info;

use super::{
    description_attribute, name_attribute, parent_attribute, BoundaryResource, Secret, Secrets,
    StateModel, StateReader, StateWriter, Tracked,
};
use crate::api::accounts::{
    Account, AccountAttributes, CreateAccountRequest, PasswordAccountAttributes,
    SetPasswordRequest,
};
use crate::api::{ApiError, Client, UpdateBody};
use crate::validators::BoundaryIdValidator;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PasswordAccountModel {
    pub auth_method_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub login_name: String,
}

impl StateModel for PasswordAccountModel {
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

impl TryFrom<Account> for Tracked<PasswordAccountModel> {
    type Error = ApiError;

    fn try_from(account: Account) -> Result<Self, ApiError> {
        let AccountAttributes::Password(attrs) = account.variant()? else {
            return Err(ApiError::ParseError(format!(
                "account {} is of type \"{}\", not password",
                account.meta.id, account.kind
            )));
        };
        Ok(Tracked {
            model: PasswordAccountModel {
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
pub struct AccountPasswordResource;

#[async_trait]
impl BoundaryResource for AccountPasswordResource {
    type Model = PasswordAccountModel;

    const TYPE_NAME: &'static str = "boundary_account_password";
    const DESCRIPTION: &'static str = "An account in a password auth method";
    const SECRETS: &'static [Secret] = &[Secret::new("password")];

    fn attributes(&self) -> Vec<Attribute> {
        vec![
            parent_attribute(
                "auth_method_id",
                "The password auth method the account belongs to",
                BoundaryIdValidator::new(&["ampw"]),
            ),
            name_attribute(),
            description_attribute(),
            AttributeBuilder::new("login_name", AttributeType::String)
                .description("The name used to log in")
                .required()
                .build(),
            AttributeBuilder::new("password", AttributeType::String)
                .description("The account's password; changes are applied with set-password")
                .optional()
                .sensitive()
                .write_only()
                .build(),
        ]
    }

    async fn create(
        &self,
        client: &Client,
        plan: &PasswordAccountModel,
        secrets: &Secrets,
    ) -> Result<Tracked<PasswordAccountModel>, ApiError> {
        let request = CreateAccountRequest {
            auth_method_id: plan.auth_method_id.clone(),
            name: plan.name.clone(),
            description: plan.description.clone(),
            attributes: AccountAttributes::Password(PasswordAccountAttributes {
                login_name: Some(plan.login_name.clone()),
                password: secrets.value("password").map(str::to_string),
            }),
        };
        client.accounts().create(&request).await?.try_into()
    }

    async fn read(&self, client: &Client, id: &str) -> Result<Tracked<PasswordAccountModel>, ApiError> {
        client.accounts().read(id).await?.try_into()
    }

    async fn update(
        &self,
        client: &Client,
        prior: &Tracked<PasswordAccountModel>,
        plan: &PasswordAccountModel,
        secrets: &Secrets,
    ) -> Result<Tracked<PasswordAccountModel>, ApiError> {
        let id = &prior.meta.id;
        let mut version = prior.meta.version;
        let mut latest: Option<Account> = None;

        let mut body = UpdateBody::new(version);
        body.optional("name", &prior.model.name, &plan.name)
            .optional("description", &prior.model.description, &plan.description)
            .attribute_optional(
                "login_name",
                &Some(&prior.model.login_name),
                &Some(&plan.login_name),
            );
        if body.has_changes() {
            let account = client.accounts().update(id, &body.into_value()).await?;
            version = account.meta.version;
            latest = Some(account);
        }

        // A removed password cannot be unset, only replaced
        if let (true, Some(password)) = (secrets.changed("password"), secrets.value("password")) {
            let request = SetPasswordRequest {
                version,
                password: password.to_string(),
            };
            latest = Some(client.accounts().action(id, "set-password", &request).await?);
            info!(id = %id, "password changed");
        }

        match latest {
            Some(account) => account.try_into(),
            None => self.read(client, id).await,
        }
    }

    async fn delete(&self, client: &Client, id: &str) -> Result<(), ApiError> {
        client.accounts().delete(id).await
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use crate::api::ItemMeta;
    use crate::digest::secret_digest;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use tfplug::types::{Dynamic, DynamicValue};

    fn prior() -> Tracked<PasswordAccountModel> {
        Tracked {
            meta: ItemMeta {
                id: "acctpw_1234567890".to_string(),
                version: 2,
                ..Default::default()
            },
            model: PasswordAccountModel {
                auth_method_id: "ampw_1234567890".to_string(),
                login_name: "jeff".to_string(),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn create_sends_password_once() {
        let mut server = Server::new_async().await;
        let create = server
            .mock("POST", "/v1/accounts")
            .match_body(Matcher::Json(json!({
                "auth_method_id": "ampw_1234567890",
                "type": "password",
                "attributes": {"login_name": "jeff", "password": "hunter22"}
            })))
            .with_body(
                r#"{"id":"acctpw_1234567890","auth_method_id":"ampw_1234567890","type":"password","version":1,"attributes":{"login_name":"jeff"}}"#,
            )
            .create_async()
            .await;

        let client = Client::new(&server.url(), false).unwrap();
        let config = DynamicValue::from_pairs([("password", Dynamic::from("hunter22"))]);
        let secrets =
            Secrets::collect(AccountPasswordResource::SECRETS, &config, &DynamicValue::null()).unwrap();
        let account = AccountPasswordResource
            .create(&client, &prior().model, &secrets)
            .await
            .unwrap();

        create.assert_async().await;
        assert_eq!(account.model, prior().model);
    }

    #[tokio::test]
    async fn changed_password_uses_set_password_with_the_patched_version() {
        let mut server = Server::new_async().await;
        let patch = server
            .mock("PATCH", "/v1/accounts/acctpw_1234567890")
            .match_body(Matcher::Json(json!({"version": 2, "name": "Jeff"})))
            .with_body(
                r#"{"id":"acctpw_1234567890","auth_method_id":"ampw_1234567890","name":"Jeff","type":"password","version":3,"attributes":{"login_name":"jeff"}}"#,
            )
            .create_async()
            .await;
        let set_password = server
            .mock("POST", "/v1/accounts/acctpw_1234567890:set-password")
            .match_body(Matcher::Json(json!({"version": 3, "password": "n3w-password"})))
            .with_body(
                r#"{"id":"acctpw_1234567890","auth_method_id":"ampw_1234567890","name":"Jeff","type":"password","version":4,"attributes":{"login_name":"jeff"}}"#,
            )
            .create_async()
            .await;

        let client = Client::new(&server.url(), false).unwrap();
        let prior = prior();
        let plan = PasswordAccountModel {
            name: Some("Jeff".to_string()),
            ..prior.model.clone()
        };
        let config = DynamicValue::from_pairs([("password", Dynamic::from("n3w-password"))]);
        let prior_state =
            DynamicValue::from_pairs([("password_digest", Dynamic::from(secret_digest("old")))]);
        let secrets =
            Secrets::collect(AccountPasswordResource::SECRETS, &config, &prior_state).unwrap();

        let account = AccountPasswordResource
            .update(&client, &prior, &plan, &secrets)
            .await
            .unwrap();

        patch.assert_async().await;
        set_password.assert_async().await;
        assert_eq!(account.meta.version, 4);
    }
}
