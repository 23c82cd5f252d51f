//! boundary_credential_username_password

use async_trait::async_trait;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType};

use super::{
    description_attribute, name_attribute, parent_attribute, BoundaryResource, Secret, Secrets,
    StateModel, StateReader, StateWriter, Tracked,
};
use crate::api::credentials::{
    CreateCredentialRequest, Credential, CredentialAttributes, UsernamePasswordAttributes,
};
use crate::api::{ApiError, Client, UpdateBody};
use crate::validators::BoundaryIdValidator;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsernamePasswordModel {
    pub credential_store_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub username: String,
}

impl StateModel for UsernamePasswordModel {
    fn from_state(state: &StateReader<'_>) -> Result<Self, ApiError> {
        Ok(Self {
            credential_store_id: state.required_string("credential_store_id")?,
            name: state.string("name")?,
            description: state.string("description")?,
            username: state.required_string("username")?,
        })
    }

    fn write_state(&self, state: &mut StateWriter) {
        state
            .string("credential_store_id", Some(&self.credential_store_id))
            .string("name", self.name.as_deref())
            .string("description", self.description.as_deref())
            .string("username", Some(&self.username));
    }
}

impl TryFrom<Credential> for Tracked<UsernamePasswordModel> {
    type Error = ApiError;

    fn try_from(credential: Credential) -> Result<Self, ApiError> {
        let CredentialAttributes::UsernamePassword(attrs) = credential.variant()? else {
            return Err(ApiError::ParseError(format!(
                "credential {} is of type \"{}\", not username_password",
                credential.meta.id, credential.kind
            )));
        };
        Ok(Tracked {
            model: UsernamePasswordModel {
                credential_store_id: credential.credential_store_id,
                name: credential.meta.name.clone(),
                description: credential.meta.description.clone(),
                username: attrs.username,
            },
            meta: credential.meta,
        })
    }
}

#[derive(Default)]
pub struct CredentialUsernamePasswordResource;

#[async_trait]
impl BoundaryResource for CredentialUsernamePasswordResource {
    type Model = UsernamePasswordModel;

    const TYPE_NAME: &'static str = "boundary_credential_username_password";
    const DESCRIPTION: &'static str = "A username and password held in a static credential store";
    const SECRETS: &'static [Secret] = &[Secret::new("password")];

    fn attributes(&self) -> Vec<Attribute> {
        vec![
            parent_attribute(
                "credential_store_id",
                "The static credential store holding the credential",
                BoundaryIdValidator::new(&["csst"]),
            ),
            name_attribute(),
            description_attribute(),
            AttributeBuilder::new("username", AttributeType::String)
                .required()
                .build(),
            AttributeBuilder::new("password", AttributeType::String)
                .required()
                .sensitive()
                .write_only()
                .build(),
        ]
    }

    async fn create(
        &self,
        client: &Client,
        plan: &UsernamePasswordModel,
        secrets: &Secrets,
    ) -> Result<Tracked<UsernamePasswordModel>, ApiError> {
        let request = CreateCredentialRequest {
            credential_store_id: plan.credential_store_id.clone(),
            name: plan.name.clone(),
            description: plan.description.clone(),
            attributes: CredentialAttributes::UsernamePassword(UsernamePasswordAttributes {
                username: plan.username.clone(),
                password: secrets.value("password").map(str::to_string),
            }),
        };
        client.credentials().create(&request).await?.try_into()
    }

    async fn read(&self, client: &Client, id: &str) -> Result<Tracked<UsernamePasswordModel>, ApiError> {
        client.credentials().read(id).await?.try_into()
    }

    async fn update(
        &self,
        client: &Client,
        prior: &Tracked<UsernamePasswordModel>,
        plan: &UsernamePasswordModel,
        secrets: &Secrets,
    ) -> Result<Tracked<UsernamePasswordModel>, ApiError> {
        let mut body = UpdateBody::new(prior.meta.version);
        body.optional("name", &prior.model.name, &plan.name)
            .optional("description", &prior.model.description, &plan.description)
            .attribute_optional(
                "username",
                &Some(&prior.model.username),
                &Some(&plan.username),
            );
        if secrets.changed("password") {
            body.set_attribute("password", secrets.value("password"));
        }
        if !body.has_changes() {
            return self.read(client, &prior.meta.id).await;
        }
        client
            .credentials()
            .update(&prior.meta.id, &body.into_value())
            .await?
            .try_into()
    }

    async fn delete(&self, client: &Client, id: &str) -> Result<(), ApiError> {
        client.credentials().delete(id).await
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
    async fn password_is_sent_but_never_read_back() {
        let mut server = Server::new_async().await;
        let create = server
            .mock("POST", "/v1/credentials")
            .match_body(Matcher::Json(json!({
                "credential_store_id": "csst_1234567890",
                "type": "username_password",
                "attributes": {"username": "postgres", "password": "hunter22"}
            })))
            .with_body(
                r#"{"id":"credup_1234567890","credential_store_id":"csst_1234567890","type":"username_password","version":1,"attributes":{"username":"postgres","password_hmac":"x1"}}"#,
            )
            .create_async()
            .await;

        let client = Client::new(&server.url(), false).unwrap();
        let plan = UsernamePasswordModel {
            credential_store_id: "csst_1234567890".to_string(),
            username: "postgres".to_string(),
            ..Default::default()
        };
        let config = DynamicValue::from_pairs([("password", Dynamic::from("hunter22"))]);
        let secrets = Secrets::collect(
            CredentialUsernamePasswordResource::SECRETS,
            &config,
            &DynamicValue::null(),
        )
        .unwrap();

        let credential = CredentialUsernamePasswordResource
            .create(&client, &plan, &secrets)
            .await
            .unwrap();
        create.assert_async().await;
        assert_eq!(credential.model, plan);
    }
}
