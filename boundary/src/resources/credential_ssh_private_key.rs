//! boundary_credential_ssh_private_key

use async_trait::async_trait;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType};

use super::{
    description_attribute, name_attribute, parent_attribute, BoundaryResource, Secret, Secrets,
    StateModel, StateReader, StateWriter, Tracked,
};
use crate::api::credentials::{
    CreateCredentialRequest, Credential, CredentialAttributes, SshPrivateKeyAttributes,
};
use crate::api::{ApiError, Client, UpdateBody};
use crate::validators::BoundaryIdValidator;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SshPrivateKeyModel {
    pub credential_store_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub username: String,
}

impl StateModel for SshPrivateKeyModel {
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

impl TryFrom<Credential> for Tracked<SshPrivateKeyModel> {
    type Error = ApiError;

    fn try_from(credential: Credential) -> Result<Self, ApiError> {
        let CredentialAttributes::SshPrivateKey(attrs) = credential.variant()? else {
            return Err(ApiError::ParseError(format!(
                "credential {} is of type \"{}\", not ssh_private_key",
                credential.meta.id, credential.kind
            )));
        };
        Ok(Tracked {
            model: SshPrivateKeyModel {
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
pub struct CredentialSshPrivateKeyResource;

#[async_trait]
impl BoundaryResource for CredentialSshPrivateKeyResource {
    type Model = SshPrivateKeyModel;

    const TYPE_NAME: &'static str = "boundary_credential_ssh_private_key";
    const DESCRIPTION: &'static str = "An SSH private key held in a static credential store";
    const SECRETS: &'static [Secret] = &[
        Secret::new("private_key"),
        Secret::new("private_key_passphrase"),
    ];

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
            AttributeBuilder::new("private_key", AttributeType::String)
                .description("PEM encoded private key")
                .required()
                .sensitive()
                .write_only()
                .build(),
            AttributeBuilder::new("private_key_passphrase", AttributeType::String)
                .description("Passphrase protecting the private key")
                .optional()
                .sensitive()
                .write_only()
                .build(),
        ]
    }

    async fn create(
        &self,
        client: &Client,
        plan: &SshPrivateKeyModel,
        secrets: &Secrets,
    ) -> Result<Tracked<SshPrivateKeyModel>, ApiError> {
        let request = CreateCredentialRequest {
            credential_store_id: plan.credential_store_id.clone(),
            name: plan.name.clone(),
            description: plan.description.clone(),
            attributes: CredentialAttributes::SshPrivateKey(SshPrivateKeyAttributes {
                username: plan.username.clone(),
                private_key: secrets.value("private_key").map(str::to_string),
                private_key_passphrase: secrets
                    .value("private_key_passphrase")
                    .map(str::to_string),
            }),
        };
        client.credentials().create(&request).await?.try_into()
    }

    async fn read(&self, client: &Client, id: &str) -> Result<Tracked<SshPrivateKeyModel>, ApiError> {
        client.credentials().read(id).await?.try_into()
    }

    async fn update(
        &self,
        client: &Client,
        prior: &Tracked<SshPrivateKeyModel>,
        plan: &SshPrivateKeyModel,
        secrets: &Secrets,
    ) -> Result<Tracked<SshPrivateKeyModel>, ApiError> {
        let mut body = UpdateBody::new(prior.meta.version);
        body.optional("name", &prior.model.name, &plan.name)
            .optional("description", &prior.model.description, &plan.description)
            .attribute_optional(
                "username",
                &Some(&prior.model.username),
                &Some(&plan.username),
            );
        // Key and passphrase are validated together by the server
        if secrets.changed("private_key") || secrets.changed("private_key_passphrase") {
            body.set_attribute("private_key", secrets.value("private_key"))
                .set_attribute(
                    "private_key_passphrase",
                    secrets.value("private_key_passphrase"),
                );
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
