//! boundary_credential_store_vault

use async_trait::async_trait;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType};

use super::{
    description_attribute, flag_attribute, name_attribute, parent_attribute, BoundaryResource,
    Secret, Secrets, StateModel, StateReader, StateWriter, Tracked,
};
use crate::api::credential_stores::{
    CreateCredentialStoreRequest, CredentialStore, CredentialStoreAttributes,
    VaultCredentialStoreAttributes,
};
use crate::api::{ApiError, Client, UpdateBody};
use crate::validators::BoundaryIdValidator;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VaultCredentialStoreModel {
    pub scope_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: String,
    pub namespace: Option<String>,
    pub ca_cert: Option<String>,
    pub tls_server_name: Option<String>,
    pub tls_skip_verify: Option<bool>,
    pub client_certificate: Option<String>,
    pub worker_filter: Option<String>,
}

impl StateModel for VaultCredentialStoreModel {
    fn from_state(state: &StateReader<'_>) -> Result<Self, ApiError> {
        Ok(Self {
            scope_id: state.required_string("scope_id")?,
            name: state.string("name")?,
            description: state.string("description")?,
            address: state.required_string("address")?,
            namespace: state.string("namespace")?,
            ca_cert: state.string("ca_cert")?,
            tls_server_name: state.string("tls_server_name")?,
            tls_skip_verify: state.bool("tls_skip_verify")?,
            client_certificate: state.string("client_certificate")?,
            worker_filter: state.string("worker_filter")?,
        })
    }

    fn write_state(&self, state: &mut StateWriter) {
        state
            .string("scope_id", Some(&self.scope_id))
            .string("name", self.name.as_deref())
            .string("description", self.description.as_deref())
            .string("address", Some(&self.address))
            .string("namespace", self.namespace.as_deref())
            .string("ca_cert", self.ca_cert.as_deref())
            .string("tls_server_name", self.tls_server_name.as_deref())
            .bool("tls_skip_verify", self.tls_skip_verify)
            .string("client_certificate", self.client_certificate.as_deref())
            .string("worker_filter", self.worker_filter.as_deref());
    }
}

impl TryFrom<CredentialStore> for Tracked<VaultCredentialStoreModel> {
    type Error = ApiError;

    fn try_from(store: CredentialStore) -> Result<Self, ApiError> {
        let CredentialStoreAttributes::Vault(attrs) = store.variant()? else {
            return Err(ApiError::ParseError(format!(
                "credential store {} is of type \"{}\", not vault",
                store.meta.id, store.kind
            )));
        };
        Ok(Tracked {
            model: VaultCredentialStoreModel {
                scope_id: store.meta.scope_id.clone().unwrap_or_default(),
                name: store.meta.name.clone(),
                description: store.meta.description.clone(),
                address: attrs.address,
                namespace: attrs.namespace,
                ca_cert: attrs.ca_cert,
                tls_server_name: attrs.tls_server_name,
                tls_skip_verify: Some(attrs.tls_skip_verify.unwrap_or(false)),
                client_certificate: attrs.client_certificate,
                worker_filter: attrs.worker_filter,
            },
            meta: store.meta,
        })
    }
}

fn optional_string(name: &str, description: &str) -> Attribute {
    AttributeBuilder::new(name, AttributeType::String)
        .description(description)
        .optional()
        .build()
}

fn secret_string(name: &str, description: &str) -> AttributeBuilder {
    AttributeBuilder::new(name, AttributeType::String)
        .description(description)
        .sensitive()
        .write_only()
}

#[derive(Default)]
pub struct CredentialStoreVaultResource;

#[async_trait]
impl BoundaryResource for CredentialStoreVaultResource {
    type Model = VaultCredentialStoreModel;

    const TYPE_NAME: &'static str = "boundary_credential_store_vault";
    const DESCRIPTION: &'static str = "A credential store backed by HashiCorp Vault";
    const SECRETS: &'static [Secret] = &[
        Secret::new("token"),
        Secret::new("client_certificate_key"),
    ];

    fn attributes(&self) -> Vec<Attribute> {
        vec![
            parent_attribute(
                "scope_id",
                "The project the store belongs to",
                BoundaryIdValidator::new(&["p"]),
            ),
            name_attribute(),
            description_attribute(),
            AttributeBuilder::new("address", AttributeType::String)
                .description("Address of the Vault server")
                .required()
                .build(),
            optional_string("namespace", "Vault namespace"),
            optional_string("ca_cert", "PEM encoded CA certificate for the Vault server"),
            optional_string("tls_server_name", "Server name used for TLS verification"),
            flag_attribute("tls_skip_verify", "Skip TLS verification of the Vault server"),
            optional_string("client_certificate", "PEM encoded client certificate"),
            optional_string("worker_filter", "Filter selecting the workers that can reach Vault"),
            secret_string("token", "Periodic, renewable Vault token used by Boundary")
                .required()
                .build(),
            secret_string("client_certificate_key", "Private key of the client certificate")
                .optional()
                .build(),
        ]
    }

    async fn create(
        &self,
        client: &Client,
        plan: &VaultCredentialStoreModel,
        secrets: &Secrets,
    ) -> Result<Tracked<VaultCredentialStoreModel>, ApiError> {
        let attributes = VaultCredentialStoreAttributes {
            address: plan.address.clone(),
            namespace: plan.namespace.clone(),
            ca_cert: plan.ca_cert.clone(),
            tls_server_name: plan.tls_server_name.clone(),
            tls_skip_verify: plan.tls_skip_verify,
            token: secrets.value("token").map(str::to_string),
            client_certificate: plan.client_certificate.clone(),
            client_certificate_key: secrets.value("client_certificate_key").map(str::to_string),
            worker_filter: plan.worker_filter.clone(),
        };
        let request = CreateCredentialStoreRequest {
            scope_id: plan.scope_id.clone(),
            name: plan.name.clone(),
            description: plan.description.clone(),
            attributes: CredentialStoreAttributes::Vault(attributes),
        };
        client.credential_stores().create(&request).await?.try_into()
    }

    async fn read(
        &self,
        client: &Client,
        id: &str,
    ) -> Result<Tracked<VaultCredentialStoreModel>, ApiError> {
        client.credential_stores().read(id).await?.try_into()
    }

    async fn update(
        &self,
        client: &Client,
        prior: &Tracked<VaultCredentialStoreModel>,
        plan: &VaultCredentialStoreModel,
        secrets: &Secrets,
    ) -> Result<Tracked<VaultCredentialStoreModel>, ApiError> {
        let old = &prior.model;
        let mut body = UpdateBody::new(prior.meta.version);
        body.optional("name", &old.name, &plan.name)
            .optional("description", &old.description, &plan.description)
            .attribute_optional("address", &Some(&old.address), &Some(&plan.address))
            .attribute_optional("namespace", &old.namespace, &plan.namespace)
            .attribute_optional("ca_cert", &old.ca_cert, &plan.ca_cert)
            .attribute_optional("tls_server_name", &old.tls_server_name, &plan.tls_server_name)
            .attribute_computed("tls_skip_verify", &old.tls_skip_verify, &plan.tls_skip_verify)
            .attribute_optional(
                "client_certificate",
                &old.client_certificate,
                &plan.client_certificate,
            )
            .attribute_optional("worker_filter", &old.worker_filter, &plan.worker_filter);
        for secret in Self::SECRETS {
            if secrets.changed(secret.attribute) {
                body.set_attribute(secret.attribute, secrets.value(secret.attribute));
            }
        }
        if !body.has_changes() {
            return self.read(client, &prior.meta.id).await;
        }
        client
            .credential_stores()
            .update(&prior.meta.id, &body.into_value())
            .await?
            .try_into()
    }

    async fn delete(&self, client: &Client, id: &str) -> Result<(), ApiError> {
        client.credential_stores().delete(id).await
    }
}
