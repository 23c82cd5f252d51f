//! boundary_credential_library_vault_ssh_certificate

use std::collections::HashMap;

use async_trait::async_trait;
use tfplug::plan_modifier::UseStateForUnknown;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tfplug::validator::OneOfValidator;

use super::{
    description_attribute, name_attribute, optional_computed, parent_attribute,
    BoundaryResource, Secrets, StateModel, StateReader, StateWriter, Tracked,
};
use crate::api::credential_libraries::{
    CreateCredentialLibraryRequest, CredentialLibrary, CredentialLibraryAttributes,
    VaultSshCertificateAttributes,
};
use crate::api::{ApiError, Client, UpdateBody};
use crate::validators::BoundaryIdValidator;

const KEY_TYPES: &[&str] = &["ed25519", "ecdsa", "rsa"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SshCertificateLibraryModel {
    pub credential_store_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub path: String,
    pub username: String,
    pub key_type: Option<String>,
    pub key_bits: Option<u32>,
    pub ttl: Option<String>,
    pub key_id: Option<String>,
    pub critical_options: HashMap<String, String>,
    pub extensions: HashMap<String, String>,
}

impl StateModel for SshCertificateLibraryModel {
    fn from_state(state: &StateReader<'_>) -> Result<Self, ApiError> {
        Ok(Self {
            credential_store_id: state.required_string("credential_store_id")?,
            name: state.string("name")?,
            description: state.string("description")?,
            path: state.required_string("path")?,
            username: state.required_string("username")?,
            key_type: state.string("key_type")?,
            key_bits: state.number("key_bits")?,
            ttl: state.string("ttl")?,
            key_id: state.string("key_id")?,
            critical_options: state.string_map("critical_options")?,
            extensions: state.string_map("extensions")?,
        })
    }

    fn write_state(&self, state: &mut StateWriter) {
        state
            .string("credential_store_id", Some(&self.credential_store_id))
            .string("name", self.name.as_deref())
            .string("description", self.description.as_deref())
            .string("path", Some(&self.path))
            .string("username", Some(&self.username))
            .string("key_type", self.key_type.as_deref())
            .number("key_bits", self.key_bits)
            .string("ttl", self.ttl.as_deref())
            .string("key_id", self.key_id.as_deref())
            .string_map("critical_options", &self.critical_options)
            .string_map("extensions", &self.extensions);
    }
}

impl TryFrom<CredentialLibrary> for Tracked<SshCertificateLibraryModel> {
    type Error = ApiError;

    fn try_from(library: CredentialLibrary) -> Result<Self, ApiError> {
        let CredentialLibraryAttributes::VaultSshCertificate(attrs) = library.variant()? else {
            return Err(ApiError::ParseError(format!(
                "credential library {} is of type \"{}\", not vault-ssh-certificate",
                library.meta.id, library.kind
            )));
        };
        Ok(Tracked {
            model: SshCertificateLibraryModel {
                credential_store_id: library.credential_store_id,
                name: library.meta.name.clone(),
                description: library.meta.description.clone(),
                path: attrs.path,
                username: attrs.username,
                key_type: attrs.key_type,
                key_bits: attrs.key_bits,
                ttl: attrs.ttl,
                key_id: attrs.key_id,
                critical_options: attrs.critical_options,
                extensions: attrs.extensions,
            },
            meta: library.meta,
        })
    }
}

/// Maps are replaced whole; an emptied map is sent as null
fn non_empty_map(map: &HashMap<String, String>) -> Option<&HashMap<String, String>> {
    (!map.is_empty()).then_some(map)
}

#[derive(Default)]
pub struct CredentialLibraryVaultSshCertificateResource;

#[async_trait]
impl BoundaryResource for CredentialLibraryVaultSshCertificateResource {
    type Model = SshCertificateLibraryModel;

    const TYPE_NAME: &'static str = "boundary_credential_library_vault_ssh_certificate";
    const DESCRIPTION: &'static str = "A library issuing SSH certificates signed by Vault";

    fn attributes(&self) -> Vec<Attribute> {
        let optional = |name: &str, description: &str| {
            AttributeBuilder::new(name, AttributeType::String)
                .description(description)
                .optional()
                .build()
        };
        let map = |name: &str, description: &str| {
            AttributeBuilder::new(name, AttributeType::Map(Box::new(AttributeType::String)))
                .description(description)
                .optional()
                .build()
        };
        vec![
            parent_attribute(
                "credential_store_id",
                "The Vault credential store the library belongs to",
                BoundaryIdValidator::new(&["csvlt"]),
            ),
            name_attribute(),
            description_attribute(),
            AttributeBuilder::new("path", AttributeType::String)
                .description("Vault path of the SSH sign or issue endpoint")
                .required()
                .build(),
            AttributeBuilder::new("username", AttributeType::String)
                .description("Username the certificate is valid for")
                .required()
                .build(),
            AttributeBuilder::new("key_type", AttributeType::String)
                .description("Key type: ed25519, ecdsa or rsa")
                .optional()
                .computed()
                .validator(OneOfValidator::create(KEY_TYPES))
                .plan_modifier(UseStateForUnknown::create())
                .build(),
            optional_computed("key_bits", AttributeType::Number, "Key size in bits"),
            optional("ttl", "Requested certificate lifetime, e.g. `1h`"),
            optional("key_id", "Key id written into the certificate"),
            map("critical_options", "Critical options set on the certificate"),
            map("extensions", "Extensions set on the certificate"),
        ]
    }

    fn validate(&self, config: &DynamicValue) -> Vec<Diagnostic> {
        let key_type = config
            .get_optional_string(&AttributePath::new("key_type"))
            .ok()
            .flatten();
        let bits = config
            .get_optional_int(&AttributePath::new("key_bits"))
            .ok()
            .flatten();

        match (key_type.as_deref(), bits) {
            (Some("ed25519"), Some(bits)) if bits != 0 => vec![Diagnostic::error(
                "key_bits does not apply to ed25519",
                format!("ed25519 keys have a fixed size; remove key_bits = {}", bits),
            )
            .with_attribute(AttributePath::new("key_bits"))],
            _ => vec![],
        }
    }

    async fn create(
        &self,
        client: &Client,
        plan: &SshCertificateLibraryModel,
        _secrets: &Secrets,
    ) -> Result<Tracked<SshCertificateLibraryModel>, ApiError> {
        let attributes = VaultSshCertificateAttributes {
            path: plan.path.clone(),
            username: plan.username.clone(),
            key_type: plan.key_type.clone(),
            key_bits: plan.key_bits,
            ttl: plan.ttl.clone(),
            key_id: plan.key_id.clone(),
            critical_options: plan.critical_options.clone(),
            extensions: plan.extensions.clone(),
        };
        let request = CreateCredentialLibraryRequest {
            credential_store_id: plan.credential_store_id.clone(),
            name: plan.name.clone(),
            description: plan.description.clone(),
            credential_type: None,
            attributes: CredentialLibraryAttributes::VaultSshCertificate(attributes),
        };
        client.credential_libraries().create(&request).await?.try_into()
    }

    async fn read(
        &self,
        client: &Client,
        id: &str,
    ) -> Result<Tracked<SshCertificateLibraryModel>, ApiError> {
        client.credential_libraries().read(id).await?.try_into()
    }

    async fn update(
        &self,
        client: &Client,
        prior: &Tracked<SshCertificateLibraryModel>,
        plan: &SshCertificateLibraryModel,
        _secrets: &Secrets,
    ) -> Result<Tracked<SshCertificateLibraryModel>, ApiError> {
        let old = &prior.model;
        let mut body = UpdateBody::new(prior.meta.version);
        body.optional("name", &old.name, &plan.name)
            .optional("description", &old.description, &plan.description)
            .attribute_optional("path", &Some(&old.path), &Some(&plan.path))
            .attribute_optional("username", &Some(&old.username), &Some(&plan.username))
            .attribute_computed("key_type", &old.key_type, &plan.key_type)
            .attribute_computed("key_bits", &old.key_bits, &plan.key_bits)
            .attribute_optional("ttl", &old.ttl, &plan.ttl)
            .attribute_optional("key_id", &old.key_id, &plan.key_id)
            .attribute_optional(
                "critical_options",
                &non_empty_map(&old.critical_options),
                &non_empty_map(&plan.critical_options),
            )
            .attribute_optional(
                "extensions",
                &non_empty_map(&old.extensions),
                &non_empty_map(&plan.extensions),
            );
        if !body.has_changes() {
            return self.read(client, &prior.meta.id).await;
        }
        client
            .credential_libraries()
            .update(&prior.meta.id, &body.into_value())
            .await?
            .try_into()
    }

    async fn delete(&self, client: &Client, id: &str) -> Result<(), ApiError> {
        client.credential_libraries().delete(id).await
    }
}
